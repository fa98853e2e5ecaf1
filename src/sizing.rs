//! DER sizing from the facility profile.

use std::fmt;

use serde::Serialize;

use crate::facility::FacilityProfile;

/// Solar oversizing relative to peak demand, covering losses and self-consumption.
pub const SOLAR_COVERAGE_FACTOR: f64 = 1.2;
/// Energy-to-power ratio of the battery system (hours).
pub const BATTERY_DURATION_HOURS: f64 = 4.0;
/// Generator headroom over critical plus essential load.
pub const GENERATOR_SAFETY_MARGIN: f64 = 1.25;

/// Sized microgrid configuration.
///
/// Disabled components are exactly zero and contribute nothing to any
/// downstream sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerDesign {
    /// Solar PV nameplate (kW).
    pub solar_pv_kw: f64,
    /// Battery energy capacity (kWh).
    pub battery_kwh: f64,
    /// Battery power rating (kW).
    pub battery_kw: f64,
    /// Standby generator rating (kW).
    pub generator_kw: f64,
    /// Shared solar/battery inverter rating (kW).
    pub inverter_kw: f64,
    /// Solar plus generator nameplate (kW).
    pub total_generation_kw: f64,
    /// Solar share of total generation (0.0-1.0).
    pub renewable_fraction: f64,
    /// Share of critical load served by battery and solar (0.0-1.0).
    pub critical_load_coverage: f64,
    /// Critical load (kW).
    pub critical_load_kw: f64,
    /// Essential load (kW).
    pub essential_load_kw: f64,
}

impl DerDesign {
    /// Sizes every enabled component for the given profile.
    pub fn size(profile: &FacilityProfile) -> Self {
        let critical_load_kw = profile.critical_load_kw();
        let essential_load_kw = profile.essential_load_kw();

        let solar_pv_kw = if profile.include_solar {
            profile.peak_demand_kw * SOLAR_COVERAGE_FACTOR
        } else {
            0.0
        };

        let battery_kwh = if profile.include_battery {
            critical_load_kw * profile.backup_duration_hours
        } else {
            0.0
        };
        let battery_kw = if battery_kwh > 0.0 {
            battery_kwh / BATTERY_DURATION_HOURS
        } else {
            0.0
        };

        let generator_kw = if profile.include_generator {
            (critical_load_kw + essential_load_kw) * GENERATOR_SAFETY_MARGIN
        } else {
            0.0
        };

        // Solar and battery share one conversion path, so the larger source sets the rating.
        let inverter_kw = solar_pv_kw.max(battery_kw);
        let total_generation_kw = solar_pv_kw + generator_kw;

        let renewable_fraction = if solar_pv_kw > 0.0 {
            solar_pv_kw / total_generation_kw
        } else {
            0.0
        };

        let critical_load_coverage = if critical_load_kw > 0.0 {
            ((battery_kw + solar_pv_kw) / critical_load_kw).min(1.0)
        } else {
            0.0
        };

        Self {
            solar_pv_kw,
            battery_kwh,
            battery_kw,
            generator_kw,
            inverter_kw,
            total_generation_kw,
            renewable_fraction,
            critical_load_coverage,
            critical_load_kw,
            essential_load_kw,
        }
    }

    /// True when every component sized to zero.
    pub fn is_empty(&self) -> bool {
        self.solar_pv_kw == 0.0 && self.battery_kwh == 0.0 && self.generator_kw == 0.0
    }
}

impl fmt::Display for DerDesign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- System Design ---")?;
        writeln!(f, "Solar PV:              {:.1} kW", self.solar_pv_kw)?;
        writeln!(
            f,
            "Battery:               {:.1} kWh / {:.1} kW",
            self.battery_kwh, self.battery_kw
        )?;
        writeln!(f, "Generator:             {:.1} kW", self.generator_kw)?;
        writeln!(f, "Inverter:              {:.1} kW", self.inverter_kw)?;
        writeln!(f, "Total generation:      {:.1} kW", self.total_generation_kw)?;
        writeln!(
            f,
            "Renewable fraction:    {:.1}%",
            self.renewable_fraction * 100.0
        )?;
        write!(
            f,
            "Critical coverage:     {:.1}%",
            self.critical_load_coverage * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::{FacilityType, Location};

    fn profile() -> FacilityProfile {
        FacilityProfile {
            facility_name: None,
            facility_type: FacilityType::Commercial,
            location: Location::BatonRouge,
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

    #[test]
    fn reference_facility_sizes() {
        let d = DerDesign::size(&profile());
        assert!((d.solar_pv_kw - 600.0).abs() < 1e-9);
        assert!((d.critical_load_kw - 150.0).abs() < 1e-9);
        assert!((d.battery_kwh - 3600.0).abs() < 1e-9);
        assert!((d.battery_kw - 900.0).abs() < 1e-9);
        assert!((d.generator_kw - 437.5).abs() < 1e-9);
        assert!((d.inverter_kw - 900.0).abs() < 1e-9);
        assert!((d.total_generation_kw - 1037.5).abs() < 1e-9);
        assert!((d.renewable_fraction - 600.0 / 1037.5).abs() < 1e-12);
        assert_eq!(d.critical_load_coverage, 1.0);
    }

    #[test]
    fn all_disabled_is_empty_design() {
        let mut p = profile();
        p.include_solar = false;
        p.include_battery = false;
        p.include_generator = false;
        let d = DerDesign::size(&p);
        assert!(d.is_empty());
        assert_eq!(d.inverter_kw, 0.0);
        assert_eq!(d.total_generation_kw, 0.0);
        assert_eq!(d.renewable_fraction, 0.0);
        assert_eq!(d.critical_load_coverage, 0.0);
    }

    #[test]
    fn zero_backup_gives_zero_battery_power() {
        let mut p = profile();
        p.backup_duration_hours = 0.0;
        let d = DerDesign::size(&p);
        assert_eq!(d.battery_kwh, 0.0);
        assert_eq!(d.battery_kw, 0.0);
        assert!(!d.battery_kw.is_nan());
    }

    #[test]
    fn coverage_from_solar_only_when_battery_is_empty() {
        let mut p = profile();
        p.backup_duration_hours = 0.0;
        p.include_solar = false;
        let d = DerDesign::size(&p);
        assert_eq!(d.critical_load_coverage, 0.0);

        p.include_solar = true;
        p.peak_demand_kw = 100.0;
        p.critical_load_percent = 100.0;
        let d = DerDesign::size(&p);
        // 120 kW of solar against 100 kW of critical load
        assert_eq!(d.critical_load_coverage, 1.0);
    }

    #[test]
    fn partial_coverage_without_solar() {
        let mut p = profile();
        p.include_solar = false;
        p.backup_duration_hours = 2.0;
        let d = DerDesign::size(&p);
        // 150 kW critical * 2 h = 300 kWh -> 75 kW
        assert!((d.battery_kw - 75.0).abs() < 1e-9);
        assert!((d.critical_load_coverage - 0.5).abs() < 1e-12);
        assert_eq!(d.renewable_fraction, 0.0);
    }

    #[test]
    fn generator_only_has_no_renewables() {
        let mut p = profile();
        p.include_solar = false;
        p.include_battery = false;
        let d = DerDesign::size(&p);
        assert!((d.generator_kw - 437.5).abs() < 1e-9);
        assert_eq!(d.renewable_fraction, 0.0);
        assert_eq!(d.inverter_kw, 0.0);
    }

    #[test]
    fn doubling_peak_doubles_sizes() {
        let base = DerDesign::size(&profile());
        let mut p = profile();
        p.peak_demand_kw *= 2.0;
        let doubled = DerDesign::size(&p);
        assert!((doubled.solar_pv_kw - 2.0 * base.solar_pv_kw).abs() < 1e-9);
        assert!((doubled.critical_load_kw - 2.0 * base.critical_load_kw).abs() < 1e-9);
        assert!((doubled.generator_kw - 2.0 * base.generator_kw).abs() < 1e-9);
    }
}
