//! TOML-based rate-constant tables and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::facility::{FacilityType, Location};

/// Rate constants for every known location.
///
/// Keys are location names as they appear in requests (`"baton_rouge"`).
/// Load from TOML with [`RateTable::from_toml_file`] or use
/// [`RateTable::louisiana`] for the built-in table. A table is read-only once
/// loaded and is shared by every analysis run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateTable {
    /// Constants keyed by location name.
    #[serde(default)]
    pub locations: BTreeMap<String, RateConstants>,
}

/// Economic and tariff constants for one location.
///
/// Every section has defaults matching the Louisiana reference data, so a
/// TOML location entry only needs to list the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateConstants {
    /// Equipment unit costs and soft-cost fractions.
    #[serde(default)]
    pub equipment: EquipmentCosts,
    /// Annual operations and maintenance rates.
    #[serde(default)]
    pub om: OmRates,
    /// Tax credits and other incentives.
    #[serde(default)]
    pub incentives: Incentives,
    /// One-time utility and permitting fees.
    #[serde(default)]
    pub fees: ProjectFees,
    /// Discounting and project horizon.
    #[serde(default)]
    pub finance: FinanceParams,
    /// Solar resource at the site.
    #[serde(default)]
    pub solar: SolarResource,
    /// Utility energy, demand and time-of-use rates.
    #[serde(default)]
    pub tariff: Tariff,
    /// Battery dispatch assumptions used for savings.
    #[serde(default)]
    pub battery: BatteryOperation,
    /// Baseline grid reliability and backup assumptions.
    #[serde(default)]
    pub reliability: ReliabilityIndices,
    /// Value of lost load per facility type ($/kWh unserved).
    #[serde(default)]
    pub outage_value: OutageValue,
}

/// Equipment unit costs (NREL ATB 2024) and soft-cost fractions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquipmentCosts {
    /// Solar PV ($/kW).
    pub solar_per_kw: f64,
    /// Battery energy capacity ($/kWh).
    pub battery_per_kwh: f64,
    /// Standby generator ($/kW).
    pub generator_per_kw: f64,
    /// Inverter / power conversion ($/kW).
    pub inverter_per_kw: f64,
    /// Balance of system as a fraction of equipment cost.
    pub bos_fraction: f64,
    /// Installation labour as a fraction of equipment cost.
    pub installation_fraction: f64,
}

impl Default for EquipmentCosts {
    fn default() -> Self {
        Self {
            solar_per_kw: 1551.0,
            battery_per_kwh: 485.0,
            generator_per_kw: 800.0,
            inverter_per_kw: 150.0,
            bos_fraction: 0.15,
            installation_fraction: 0.10,
        }
    }
}

/// Annual O&M rates per unit of installed size.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OmRates {
    /// Solar ($/kW-year).
    pub solar_per_kw_year: f64,
    /// Battery ($/kWh-year).
    pub battery_per_kwh_year: f64,
    /// Generator ($/kW-year).
    pub generator_per_kw_year: f64,
}

impl Default for OmRates {
    fn default() -> Self {
        Self {
            solar_per_kw_year: 14.0,
            battery_per_kwh_year: 9.0,
            generator_per_kw_year: 15.0,
        }
    }
}

/// Investment tax credit and state incentive rates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Incentives {
    /// Federal ITC base rate.
    pub itc_base_rate: f64,
    /// Energy-community bonus adder.
    pub energy_community_bonus: f64,
    /// Domestic-content bonus adder.
    pub domestic_content_bonus: f64,
    /// State credit as a fraction of the ITC-eligible base.
    pub state_incentive_rate: f64,
}

impl Default for Incentives {
    fn default() -> Self {
        Self {
            itc_base_rate: 0.30,
            energy_community_bonus: 0.0,
            domestic_content_bonus: 0.0,
            state_incentive_rate: 0.0,
        }
    }
}

impl Incentives {
    /// Effective ITC rate: base plus adders, capped at 100%.
    pub fn itc_rate(&self) -> f64 {
        (self.itc_base_rate + self.energy_community_bonus + self.domestic_content_bonus).min(1.0)
    }
}

/// Flat one-time fees added to the net project cost ($).
///
/// Louisiana commercial interconnection is $75 and parish permits run
/// $50-500; both default to zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectFees {
    pub interconnection_fee: f64,
    pub permit_fee: f64,
}

impl ProjectFees {
    pub fn total(&self) -> f64 {
        self.interconnection_fee + self.permit_fee
    }
}

/// Discounting parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceParams {
    /// Nominal discount rate.
    pub discount_rate: f64,
    /// Annual utility price escalation.
    pub escalation_rate: f64,
    /// Project lifetime (years).
    pub project_lifetime_years: u32,
}

impl Default for FinanceParams {
    fn default() -> Self {
        Self {
            discount_rate: 0.06,
            escalation_rate: 0.02,
            project_lifetime_years: 25,
        }
    }
}

/// Solar resource parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarResource {
    /// Annual AC capacity factor (0.0-1.0).
    pub capacity_factor: f64,
    /// Annual output degradation (0.0-1.0).
    pub degradation_rate: f64,
}

impl Default for SolarResource {
    fn default() -> Self {
        Self {
            capacity_factor: 0.269,
            degradation_rate: 0.005,
        }
    }
}

/// Utility tariff (Entergy Louisiana reference values).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tariff {
    /// Retail energy rate ($/kWh).
    pub energy_rate: f64,
    /// Credit for exported energy ($/kWh).
    pub export_credit_rate: f64,
    /// Share of solar output consumed on site (0.0-1.0).
    pub self_consumption_fraction: f64,
    /// Demand charge ($/kW-month).
    pub demand_rate_per_kw_month: f64,
    /// TOU on-peak energy rate ($/kWh).
    pub on_peak_rate: f64,
    /// TOU off-peak energy rate ($/kWh).
    pub off_peak_rate: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            energy_rate: 0.0945,
            export_credit_rate: 0.0259,
            self_consumption_fraction: 0.80,
            demand_rate_per_kw_month: 15.315,
            on_peak_rate: 0.0165,
            off_peak_rate: 0.00607,
        }
    }
}

impl Tariff {
    /// Value of one kWh of solar output.
    ///
    /// Self-consumed energy earns the retail rate; the remainder earns the
    /// export credit, or nothing when the site is islanded.
    pub fn blended_energy_rate(&self, grid_connected: bool) -> f64 {
        let exported = if grid_connected {
            (1.0 - self.self_consumption_fraction) * self.export_credit_rate
        } else {
            0.0
        };
        self.self_consumption_fraction * self.energy_rate + exported
    }
}

/// Battery dispatch assumptions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryOperation {
    /// Full arbitrage cycles per year.
    pub cycles_per_year: f64,
    /// Round-trip efficiency (0.0-1.0].
    pub round_trip_efficiency: f64,
    /// Fraction of battery power available for peak shaving.
    pub peak_shaving_factor: f64,
}

impl Default for BatteryOperation {
    fn default() -> Self {
        Self {
            cycles_per_year: 264.0,
            round_trip_efficiency: 0.85,
            peak_shaving_factor: 0.80,
        }
    }
}

/// Baseline reliability (EIA-861, major events included).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReliabilityIndices {
    /// SAIDI (minutes/year).
    pub saidi_minutes: f64,
    /// SAIFI (interruptions/year).
    pub saifi: f64,
    /// Hours a generator can run on stored fuel.
    pub generator_fuel_hours: f64,
}

impl Default for ReliabilityIndices {
    fn default() -> Self {
        Self {
            saidi_minutes: 652.5,
            saifi: 2.495,
            generator_fuel_hours: 72.0,
        }
    }
}

/// Interruption cost per kWh of unserved critical load (DOE ICE).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutageValue {
    pub commercial: f64,
    pub industrial: f64,
    pub residential: f64,
    pub hospital: f64,
    pub school: f64,
    pub warehouse: f64,
    pub data_center: f64,
}

impl Default for OutageValue {
    fn default() -> Self {
        Self {
            commercial: 25.0,
            industrial: 15.0,
            residential: 5.0,
            hospital: 100.0,
            school: 20.0,
            warehouse: 10.0,
            data_center: 150.0,
        }
    }
}

impl OutageValue {
    /// Value of lost load for a facility type ($/kWh).
    pub fn for_facility(&self, facility_type: FacilityType) -> f64 {
        match facility_type {
            FacilityType::Commercial => self.commercial,
            FacilityType::Industrial => self.industrial,
            FacilityType::Residential => self.residential,
            FacilityType::Hospital => self.hospital,
            FacilityType::School => self.school,
            FacilityType::Warehouse => self.warehouse,
            FacilityType::DataCenter => self.data_center,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"locations.baton_rouge.tariff.energy_rate"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl RateTable {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["louisiana", "high_incentive"];

    /// Returns the Louisiana reference table: every supported location with
    /// the Entergy Louisiana tariff and EIA-861 reliability figures.
    pub fn louisiana() -> Self {
        Self::uniform(&RateConstants::default())
    }

    /// Returns the Louisiana table with both ITC bonus adders applied.
    pub fn high_incentive() -> Self {
        Self::uniform(&RateConstants {
            incentives: Incentives {
                energy_community_bonus: 0.10,
                domestic_content_bonus: 0.10,
                ..Incentives::default()
            },
            ..RateConstants::default()
        })
    }

    fn uniform(constants: &RateConstants) -> Self {
        let locations = Location::ALL
            .iter()
            .map(|loc| (loc.as_str().to_string(), constants.clone()))
            .collect();
        Self { locations }
    }

    /// Loads a table from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "louisiana" => Ok(Self::louisiana()),
            "high_incentive" => Ok(Self::high_incentive()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "rates".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a table from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Looks up the constants for a location.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Configuration` if the table has no entry.
    pub fn resolve(&self, location: Location) -> Result<&RateConstants, AnalysisError> {
        self.locations.get(location.as_str()).ok_or_else(|| {
            AnalysisError::Configuration(format!(
                "no rate constants configured for location \"{location}\""
            ))
        })
    }

    /// Validates all entries and returns a list of errors.
    ///
    /// Returns an empty vector if the table is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.locations.is_empty() {
            errors.push(ConfigError {
                field: "locations".into(),
                message: "at least one location is required".into(),
            });
        }

        for (key, rc) in &self.locations {
            if key.parse::<Location>().is_err() {
                errors.push(ConfigError {
                    field: format!("locations.{key}"),
                    message: format!(
                        "unknown location, expected one of: {}",
                        Location::ALL.map(Location::as_str).join(", ")
                    ),
                });
            }
            rc.validate_into(key, &mut errors);
        }

        errors
    }
}

impl RateConstants {
    fn validate_into(&self, key: &str, errors: &mut Vec<ConfigError>) {
        let mut check = |section: &str, name: &str, value: f64, ok: bool, rule: &str| {
            if !value.is_finite() || !ok {
                errors.push(ConfigError {
                    field: format!("locations.{key}.{section}.{name}"),
                    message: rule.to_string(),
                });
            }
        };
        let unit = |v: f64| (0.0..=1.0).contains(&v);

        let eq = &self.equipment;
        for (name, v) in [
            ("solar_per_kw", eq.solar_per_kw),
            ("battery_per_kwh", eq.battery_per_kwh),
            ("generator_per_kw", eq.generator_per_kw),
            ("inverter_per_kw", eq.inverter_per_kw),
            ("bos_fraction", eq.bos_fraction),
            ("installation_fraction", eq.installation_fraction),
        ] {
            check("equipment", name, v, v >= 0.0, "must be >= 0");
        }

        let om = &self.om;
        for (name, v) in [
            ("solar_per_kw_year", om.solar_per_kw_year),
            ("battery_per_kwh_year", om.battery_per_kwh_year),
            ("generator_per_kw_year", om.generator_per_kw_year),
        ] {
            check("om", name, v, v >= 0.0, "must be >= 0");
        }

        let inc = &self.incentives;
        for (name, v) in [
            ("itc_base_rate", inc.itc_base_rate),
            ("energy_community_bonus", inc.energy_community_bonus),
            ("domestic_content_bonus", inc.domestic_content_bonus),
            ("state_incentive_rate", inc.state_incentive_rate),
        ] {
            check("incentives", name, v, unit(v), "must be in [0.0, 1.0]");
        }

        for (name, v) in [
            ("interconnection_fee", self.fees.interconnection_fee),
            ("permit_fee", self.fees.permit_fee),
        ] {
            check("fees", name, v, v >= 0.0, "must be >= 0");
        }

        let fin = &self.finance;
        check(
            "finance",
            "discount_rate",
            fin.discount_rate,
            fin.discount_rate > -1.0,
            "must be > -1.0",
        );
        check(
            "finance",
            "escalation_rate",
            fin.escalation_rate,
            fin.escalation_rate > -1.0,
            "must be > -1.0",
        );
        check(
            "finance",
            "project_lifetime_years",
            f64::from(fin.project_lifetime_years),
            fin.project_lifetime_years > 0,
            "must be > 0",
        );

        let sol = &self.solar;
        check(
            "solar",
            "capacity_factor",
            sol.capacity_factor,
            unit(sol.capacity_factor),
            "must be in [0.0, 1.0]",
        );
        check(
            "solar",
            "degradation_rate",
            sol.degradation_rate,
            unit(sol.degradation_rate),
            "must be in [0.0, 1.0]",
        );

        let t = &self.tariff;
        for (name, v) in [
            ("energy_rate", t.energy_rate),
            ("export_credit_rate", t.export_credit_rate),
            ("demand_rate_per_kw_month", t.demand_rate_per_kw_month),
            ("on_peak_rate", t.on_peak_rate),
            ("off_peak_rate", t.off_peak_rate),
        ] {
            check("tariff", name, v, v >= 0.0, "must be >= 0");
        }
        check(
            "tariff",
            "self_consumption_fraction",
            t.self_consumption_fraction,
            unit(t.self_consumption_fraction),
            "must be in [0.0, 1.0]",
        );

        let bat = &self.battery;
        check(
            "battery",
            "cycles_per_year",
            bat.cycles_per_year,
            bat.cycles_per_year >= 0.0,
            "must be >= 0",
        );
        check(
            "battery",
            "round_trip_efficiency",
            bat.round_trip_efficiency,
            bat.round_trip_efficiency > 0.0 && bat.round_trip_efficiency <= 1.0,
            "must be in (0.0, 1.0]",
        );
        check(
            "battery",
            "peak_shaving_factor",
            bat.peak_shaving_factor,
            unit(bat.peak_shaving_factor),
            "must be in [0.0, 1.0]",
        );

        let rel = &self.reliability;
        for (name, v) in [
            ("saidi_minutes", rel.saidi_minutes),
            ("saifi", rel.saifi),
            ("generator_fuel_hours", rel.generator_fuel_hours),
        ] {
            check("reliability", name, v, v >= 0.0, "must be >= 0");
        }

        let ov = &self.outage_value;
        for ft in FacilityType::ALL {
            let v = ov.for_facility(ft);
            check("outage_value", ft.as_str(), v, v >= 0.0, "must be >= 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn louisiana_preset_valid() {
        let table = RateTable::louisiana();
        let errors = table.validate();
        assert!(errors.is_empty(), "louisiana should be valid: {errors:?}");
        assert_eq!(table.locations.len(), Location::ALL.len());
    }

    #[test]
    fn from_preset_unknown() {
        let err = RateTable::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in RateTable::PRESETS {
            let table = RateTable::from_preset(name);
            assert!(table.is_ok(), "preset \"{name}\" should load");
            let errors = table.as_ref().map(RateTable::validate).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn high_incentive_raises_itc() {
        let base = RateTable::louisiana();
        let high = RateTable::high_incentive();
        let base_rate = base.resolve(Location::BatonRouge).map(|r| r.incentives.itc_rate());
        let high_rate = high.resolve(Location::BatonRouge).map(|r| r.incentives.itc_rate());
        assert_eq!(base_rate, Ok(0.30));
        assert!((high_rate.unwrap_or(0.0) - 0.50).abs() < 1e-12);
    }

    #[test]
    fn itc_rate_is_capped() {
        let inc = Incentives {
            itc_base_rate: 0.8,
            energy_community_bonus: 0.3,
            domestic_content_bonus: 0.3,
            state_incentive_rate: 0.0,
        };
        assert_eq!(inc.itc_rate(), 1.0);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[locations.new_orleans.tariff]
energy_rate = 0.12

[locations.shreveport]
"#;
        let table = RateTable::from_toml_str(toml);
        assert!(table.is_ok(), "partial TOML should parse: {:?}", table.err());
        let table = table.unwrap_or_default();
        let nola = table.resolve(Location::NewOrleans).ok();
        assert_eq!(nola.map(|r| r.tariff.energy_rate), Some(0.12));
        // untouched values keep their defaults
        assert_eq!(nola.map(|r| r.tariff.off_peak_rate), Some(0.00607));
        assert_eq!(nola.map(|r| r.equipment.solar_per_kw), Some(1551.0));
        assert!(table.resolve(Location::Shreveport).is_ok());
        assert!(table.resolve(Location::BatonRouge).is_err());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[locations.baton_rouge.tariff]
bogus_field = 1.0
"#;
        assert!(RateTable::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_unknown_location_key() {
        let toml = r#"
[locations.atlantis]
"#;
        let table = RateTable::from_toml_str(toml).unwrap_or_default();
        let errors = table.validate();
        assert!(errors.iter().any(|e| e.field == "locations.atlantis"));
    }

    #[test]
    fn validation_catches_bad_fraction() {
        let mut table = RateTable::louisiana();
        if let Some(rc) = table.locations.get_mut("lafayette") {
            rc.tariff.self_consumption_fraction = 1.5;
            rc.battery.round_trip_efficiency = 0.0;
            rc.finance.project_lifetime_years = 0;
        }
        let errors = table.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"locations.lafayette.tariff.self_consumption_fraction"));
        assert!(fields.contains(&"locations.lafayette.battery.round_trip_efficiency"));
        assert!(fields.contains(&"locations.lafayette.finance.project_lifetime_years"));
    }

    #[test]
    fn validation_catches_empty_table() {
        let errors = RateTable::default().validate();
        assert!(errors.iter().any(|e| e.field == "locations"));
    }

    #[test]
    fn resolve_missing_location_is_configuration_error() {
        let table = RateTable::default();
        let err = table.resolve(Location::LakeCharles);
        assert!(matches!(err, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn blended_rate_drops_export_when_islanded() {
        let t = Tariff::default();
        let on_grid = t.blended_energy_rate(true);
        let off_grid = t.blended_energy_rate(false);
        assert!((on_grid - (0.8 * 0.0945 + 0.2 * 0.0259)).abs() < 1e-12);
        assert!((off_grid - 0.8 * 0.0945).abs() < 1e-12);
    }
}
