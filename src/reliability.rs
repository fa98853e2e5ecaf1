//! Backup coverage and avoided-outage value.

use std::fmt;

use serde::Serialize;

use crate::config::RateConstants;
use crate::facility::FacilityProfile;
use crate::sizing::DerDesign;

/// Reliability assessment of a design against the baseline grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityResult {
    /// Backup commitment the battery is sized for (hours).
    pub backup_duration_hours: f64,
    pub critical_load_coverage_percent: f64,
    /// Baseline SAIDI in hours.
    pub expected_outage_hours_per_year: f64,
    /// Baseline SAIFI.
    pub expected_interruptions_per_year: f64,
    /// Battery commitment plus generator fuel autonomy (hours).
    pub ride_through_hours: f64,
    /// Value of critical load kept online per year ($).
    pub avoided_outage_cost: f64,
    /// Share of baseline outage exposure eliminated (0-100).
    pub reliability_improvement_percent: f64,
}

impl ReliabilityResult {
    pub fn assess(design: &DerDesign, profile: &FacilityProfile, rates: &RateConstants) -> Self {
        let rel = &rates.reliability;
        let expected_outage_hours_per_year = rel.saidi_minutes / 60.0;
        let coverage = design.critical_load_coverage;

        let battery_hours = if design.battery_kwh > 0.0 {
            profile.backup_duration_hours
        } else {
            0.0
        };
        let generator_hours = if design.generator_kw > 0.0 {
            rel.generator_fuel_hours
        } else {
            0.0
        };
        let ride_through_hours = battery_hours + generator_hours;

        let voll = rates.outage_value.for_facility(profile.facility_type);
        let avoided_outage_cost =
            expected_outage_hours_per_year * coverage * voll * design.critical_load_kw;

        let reliability_improvement_percent = if expected_outage_hours_per_year > 0.0 {
            let duration_share = (ride_through_hours / expected_outage_hours_per_year).min(1.0);
            100.0 * (coverage * duration_share).min(1.0)
        } else {
            0.0
        };

        Self {
            backup_duration_hours: profile.backup_duration_hours,
            critical_load_coverage_percent: coverage * 100.0,
            expected_outage_hours_per_year,
            expected_interruptions_per_year: rel.saifi,
            ride_through_hours,
            avoided_outage_cost,
            reliability_improvement_percent,
        }
    }
}

impl fmt::Display for ReliabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Reliability ---")?;
        writeln!(
            f,
            "Baseline outages:      {:.1} h/yr ({:.2} events)",
            self.expected_outage_hours_per_year, self.expected_interruptions_per_year
        )?;
        writeln!(f, "Ride-through:          {:.1} h", self.ride_through_hours)?;
        writeln!(
            f,
            "Critical coverage:     {:.1}%",
            self.critical_load_coverage_percent
        )?;
        writeln!(f, "Avoided outage cost:   ${:.0}/yr", self.avoided_outage_cost)?;
        write!(
            f,
            "Improvement:           {:.1}%",
            self.reliability_improvement_percent
        )
    }
}
