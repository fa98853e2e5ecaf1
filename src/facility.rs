//! Facility input, validation, and load breakdown.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RateTable;
use crate::error::AnalysisError;

/// Hours in a non-leap year.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Building category, used to pick the value of lost load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    Commercial,
    Industrial,
    Residential,
    Hospital,
    School,
    Warehouse,
    DataCenter,
}

impl FacilityType {
    pub const ALL: [Self; 7] = [
        Self::Commercial,
        Self::Industrial,
        Self::Residential,
        Self::Hospital,
        Self::School,
        Self::Warehouse,
        Self::DataCenter,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commercial => "commercial",
            Self::Industrial => "industrial",
            Self::Residential => "residential",
            Self::Hospital => "hospital",
            Self::School => "school",
            Self::Warehouse => "warehouse",
            Self::DataCenter => "data_center",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityType {
    type Err = String;

    /// Case-insensitive; accepts spaces or hyphens in place of underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        Self::ALL
            .into_iter()
            .find(|ft| ft.as_str() == key)
            .ok_or_else(|| format!("unknown facility type \"{s}\""))
    }
}

/// Site key into the rate-constant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    BatonRouge,
    NewOrleans,
    Lafayette,
    Shreveport,
    LakeCharles,
}

impl Location {
    pub const ALL: [Self; 5] = [
        Self::BatonRouge,
        Self::NewOrleans,
        Self::Lafayette,
        Self::Shreveport,
        Self::LakeCharles,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BatonRouge => "baton_rouge",
            Self::NewOrleans => "new_orleans",
            Self::Lafayette => "lafayette",
            Self::Shreveport => "shreveport",
            Self::LakeCharles => "lake_charles",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        Self::ALL
            .into_iter()
            .find(|loc| loc.as_str() == key)
            .ok_or_else(|| format!("unknown location \"{s}\""))
    }
}

fn normalize_key(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Raw analysis request, as submitted by a caller.
///
/// Optional fields fall back to the reference defaults (Baton Rouge, 30%
/// critical / 40% essential load, 24 h backup, every component enabled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilityInput {
    /// Display name; not used by any formula.
    #[serde(default)]
    pub facility_name: Option<String>,
    pub facility_type: String,
    #[serde(default = "default_location")]
    pub location: String,
    pub peak_demand_kw: f64,
    pub annual_consumption_kwh: f64,
    #[serde(default = "default_critical_load_percent")]
    pub critical_load_percent: f64,
    #[serde(default = "default_essential_load_percent")]
    pub essential_load_percent: f64,
    #[serde(default = "default_backup_duration_hours")]
    pub backup_duration_hours: f64,
    #[serde(default = "enabled")]
    pub grid_connected: bool,
    #[serde(default = "enabled")]
    pub include_solar: bool,
    #[serde(default = "enabled")]
    pub include_battery: bool,
    #[serde(default = "enabled")]
    pub include_generator: bool,
}

fn default_location() -> String {
    Location::BatonRouge.as_str().to_string()
}

fn default_critical_load_percent() -> f64 {
    30.0
}

fn default_essential_load_percent() -> f64 {
    40.0
}

fn default_backup_duration_hours() -> f64 {
    24.0
}

fn enabled() -> bool {
    true
}

/// Validated, immutable facility profile.
///
/// Only constructed through [`validate`], so every downstream stage can rely
/// on the range invariants without re-checking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityProfile {
    pub facility_name: Option<String>,
    pub facility_type: FacilityType,
    pub location: Location,
    /// Peak electrical demand (kW, > 0).
    pub peak_demand_kw: f64,
    /// Annual energy consumption (kWh, > 0).
    pub annual_consumption_kwh: f64,
    /// Share of peak that must ride through outages (0, 100].
    pub critical_load_percent: f64,
    /// Share of peak that should ride through outages (0, 100].
    pub essential_load_percent: f64,
    /// Required battery ride-through (hours, >= 0).
    pub backup_duration_hours: f64,
    pub grid_connected: bool,
    pub include_solar: bool,
    pub include_battery: bool,
    pub include_generator: bool,
}

impl FacilityProfile {
    /// Critical load (kW).
    pub fn critical_load_kw(&self) -> f64 {
        self.peak_demand_kw * self.critical_load_percent / 100.0
    }

    /// Essential load (kW).
    pub fn essential_load_kw(&self) -> f64 {
        self.peak_demand_kw * self.essential_load_percent / 100.0
    }
}

/// Validates a raw request against range rules and the rate table.
///
/// # Errors
///
/// Returns `AnalysisError::Validation` naming the first offending field, or
/// `AnalysisError::Configuration` if the location has no rate entry.
pub fn validate(input: &FacilityInput, rates: &RateTable) -> Result<FacilityProfile, AnalysisError> {
    let facility_type = input
        .facility_type
        .parse::<FacilityType>()
        .map_err(|e| AnalysisError::validation("facility_type", e))?;

    finite("peak_demand_kw", input.peak_demand_kw)?;
    if input.peak_demand_kw <= 0.0 {
        return Err(AnalysisError::validation("peak_demand_kw", "must be > 0"));
    }

    finite("annual_consumption_kwh", input.annual_consumption_kwh)?;
    if input.annual_consumption_kwh <= 0.0 {
        return Err(AnalysisError::validation(
            "annual_consumption_kwh",
            "must be > 0",
        ));
    }

    percent("critical_load_percent", input.critical_load_percent)?;
    percent("essential_load_percent", input.essential_load_percent)?;
    if input.critical_load_percent + input.essential_load_percent > 100.0 {
        return Err(AnalysisError::validation(
            "essential_load_percent",
            format!(
                "critical ({}) + essential ({}) must not exceed 100",
                input.critical_load_percent, input.essential_load_percent
            ),
        ));
    }

    finite("backup_duration_hours", input.backup_duration_hours)?;
    if input.backup_duration_hours < 0.0 {
        return Err(AnalysisError::validation(
            "backup_duration_hours",
            "must be >= 0",
        ));
    }

    let location = input
        .location
        .parse::<Location>()
        .map_err(AnalysisError::Configuration)?;
    rates.resolve(location)?;

    Ok(FacilityProfile {
        facility_name: input.facility_name.clone(),
        facility_type,
        location,
        peak_demand_kw: input.peak_demand_kw,
        annual_consumption_kwh: input.annual_consumption_kwh,
        critical_load_percent: input.critical_load_percent,
        essential_load_percent: input.essential_load_percent,
        backup_duration_hours: input.backup_duration_hours,
        grid_connected: input.grid_connected,
        include_solar: input.include_solar,
        include_battery: input.include_battery,
        include_generator: input.include_generator,
    })
}

fn finite(field: &'static str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::validation(field, "must be a finite number"))
    }
}

fn percent(field: &'static str, value: f64) -> Result<(), AnalysisError> {
    finite(field, value)?;
    if value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(AnalysisError::validation(field, "must be in (0, 100]"))
    }
}

/// Load breakdown derived from the facility profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadAnalysis {
    pub peak_demand_kw: f64,
    pub average_demand_kw: f64,
    pub critical_load_kw: f64,
    pub essential_load_kw: f64,
    pub non_critical_load_kw: f64,
    /// Critical plus essential load (kW).
    pub backup_load_kw: f64,
    /// Average over peak demand.
    pub load_factor: f64,
    pub annual_consumption_kwh: f64,
}

impl LoadAnalysis {
    pub fn from_profile(profile: &FacilityProfile) -> Self {
        let critical = profile.critical_load_kw();
        let essential = profile.essential_load_kw();
        let average = profile.annual_consumption_kwh / HOURS_PER_YEAR;
        Self {
            peak_demand_kw: profile.peak_demand_kw,
            average_demand_kw: average,
            critical_load_kw: critical,
            essential_load_kw: essential,
            non_critical_load_kw: (profile.peak_demand_kw - critical - essential).max(0.0),
            backup_load_kw: critical + essential,
            load_factor: average / profile.peak_demand_kw,
            annual_consumption_kwh: profile.annual_consumption_kwh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> FacilityInput {
        FacilityInput {
            facility_name: Some("Plant".into()),
            facility_type: "industrial".into(),
            location: "baton_rouge".into(),
            peak_demand_kw: 500.0,
            annual_consumption_kwh: 2_000_000.0,
            critical_load_percent: 30.0,
            essential_load_percent: 40.0,
            backup_duration_hours: 24.0,
            grid_connected: true,
            include_solar: true,
            include_battery: true,
            include_generator: true,
        }
    }

    fn field_of(err: AnalysisError) -> &'static str {
        match err {
            AnalysisError::Validation { field, .. } => field,
            AnalysisError::Configuration(_) => "<configuration>",
        }
    }

    #[test]
    fn valid_input_passes() {
        let profile = validate(&input(), &RateTable::louisiana());
        assert!(profile.is_ok(), "{profile:?}");
        let profile = profile.ok();
        assert_eq!(
            profile.as_ref().map(|p| p.facility_type),
            Some(FacilityType::Industrial)
        );
        assert_eq!(profile.map(|p| p.location), Some(Location::BatonRouge));
    }

    #[test]
    fn rejects_non_positive_peak() {
        let mut i = input();
        i.peak_demand_kw = 0.0;
        let err = validate(&i, &RateTable::louisiana()).unwrap_err();
        assert_eq!(field_of(err), "peak_demand_kw");
    }

    #[test]
    fn rejects_nan_consumption() {
        let mut i = input();
        i.annual_consumption_kwh = f64::NAN;
        let err = validate(&i, &RateTable::louisiana()).unwrap_err();
        assert_eq!(field_of(err), "annual_consumption_kwh");
    }

    #[test]
    fn rejects_zero_critical_percent() {
        let mut i = input();
        i.critical_load_percent = 0.0;
        let err = validate(&i, &RateTable::louisiana()).unwrap_err();
        assert_eq!(field_of(err), "critical_load_percent");
    }

    #[test]
    fn rejects_percent_sum_over_100() {
        let mut i = input();
        i.critical_load_percent = 60.0;
        i.essential_load_percent = 50.0;
        let err = validate(&i, &RateTable::louisiana()).unwrap_err();
        assert_eq!(field_of(err), "essential_load_percent");
    }

    #[test]
    fn accepts_percent_sum_exactly_100() {
        let mut i = input();
        i.critical_load_percent = 50.0;
        i.essential_load_percent = 50.0;
        assert!(validate(&i, &RateTable::louisiana()).is_ok());
    }

    #[test]
    fn rejects_negative_backup() {
        let mut i = input();
        i.backup_duration_hours = -1.0;
        let err = validate(&i, &RateTable::louisiana()).unwrap_err();
        assert_eq!(field_of(err), "backup_duration_hours");
    }

    #[test]
    fn zero_backup_is_valid() {
        let mut i = input();
        i.backup_duration_hours = 0.0;
        assert!(validate(&i, &RateTable::louisiana()).is_ok());
    }

    #[test]
    fn unknown_facility_type_is_validation_error() {
        let mut i = input();
        i.facility_type = "spaceport".into();
        let err = validate(&i, &RateTable::louisiana()).unwrap_err();
        assert_eq!(field_of(err), "facility_type");
    }

    #[test]
    fn unknown_location_is_configuration_error() {
        let mut i = input();
        i.location = "houston".into();
        let err = validate(&i, &RateTable::louisiana());
        assert!(matches!(err, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn location_missing_from_table_is_configuration_error() {
        let err = validate(&input(), &RateTable::default());
        assert!(matches!(err, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn parsing_is_lenient_about_case_and_separators() {
        assert_eq!(
            "Data Center".parse::<FacilityType>(),
            Ok(FacilityType::DataCenter)
        );
        assert_eq!("New-Orleans".parse::<Location>(), Ok(Location::NewOrleans));
    }

    #[test]
    fn json_defaults_match_reference_values() {
        let json = r#"{"facility_type":"hospital","peak_demand_kw":1594.0,"annual_consumption_kwh":10459200.0}"#;
        let i: FacilityInput = serde_json::from_str(json).expect("minimal request should parse");
        assert_eq!(i.location, "baton_rouge");
        assert_eq!(i.critical_load_percent, 30.0);
        assert_eq!(i.essential_load_percent, 40.0);
        assert_eq!(i.backup_duration_hours, 24.0);
        assert!(i.grid_connected && i.include_solar && i.include_battery && i.include_generator);
    }

    #[test]
    fn load_analysis_breakdown() {
        let profile = validate(&input(), &RateTable::louisiana()).expect("valid input");
        let load = LoadAnalysis::from_profile(&profile);
        assert!((load.critical_load_kw - 150.0).abs() < 1e-9);
        assert!((load.essential_load_kw - 200.0).abs() < 1e-9);
        assert!((load.non_critical_load_kw - 150.0).abs() < 1e-9);
        assert!((load.backup_load_kw - 350.0).abs() < 1e-9);
        assert!((load.average_demand_kw - 2_000_000.0 / 8760.0).abs() < 1e-9);
        assert!((load.load_factor - 2_000_000.0 / (500.0 * 8760.0)).abs() < 1e-12);
    }
}
