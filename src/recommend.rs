//! Rule-based advisory text derived from the analysis outputs.

use crate::costs::CostBreakdown;
use crate::facility::FacilityProfile;
use crate::finance::FinancialResult;
use crate::reliability::ReliabilityResult;
use crate::sizing::DerDesign;

/// Payback above which the design is flagged as slow to recover cost.
pub const PAYBACK_THRESHOLD_YEARS: f64 = 10.0;
/// Renewable share below which more solar is suggested.
pub const MIN_RENEWABLE_FRACTION: f64 = 0.2;
/// Reliability improvement above which outages are considered handled.
pub const HIGH_RELIABILITY_PERCENT: f64 = 90.0;
/// Annual avoided outage cost worth calling out.
pub const AVOIDED_COST_HIGHLIGHT: f64 = 10_000.0;

/// Borrowed view of every stage output, evaluated by the rules in order.
pub struct RecommendationInputs<'a> {
    pub profile: &'a FacilityProfile,
    pub design: &'a DerDesign,
    pub costs: &'a CostBreakdown,
    pub financial: &'a FinancialResult,
    pub reliability: &'a ReliabilityResult,
    /// Project lifetime used for the NPV (years).
    pub lifetime_years: u32,
}

/// Produces the ordered advisory list.
///
/// Deterministic: the same inputs always yield the same strings in the same
/// order. An empty design short-circuits to a single advisory.
pub fn recommendations(inputs: &RecommendationInputs<'_>) -> Vec<String> {
    let RecommendationInputs {
        profile,
        design,
        costs,
        financial,
        reliability,
        lifetime_years,
    } = *inputs;

    if design.is_empty() {
        return vec![
            "No distributed energy resources were selected; enable solar, battery storage, or a \
             generator to design a microgrid."
                .to_string(),
        ];
    }

    let mut out = Vec::new();

    if design.solar_pv_kw > 0.0 {
        out.push(format!(
            "Install {:.0} kW of solar PV, supplying {:.0}% of generation capacity with clean energy.",
            design.solar_pv_kw,
            design.renewable_fraction * 100.0
        ));
    }

    if design.battery_kwh > 0.0 {
        out.push(format!(
            "Deploy {:.0} kWh / {:.0} kW of battery storage for {:.1} hours of critical-load backup and demand charge management.",
            design.battery_kwh, design.battery_kw, profile.backup_duration_hours
        ));
    }

    if design.generator_kw > 0.0 {
        out.push(format!(
            "Include a {:.0} kW backup generator for extended outages ({:.0} hours of total ride-through).",
            design.generator_kw, reliability.ride_through_hours
        ));
    }

    if design.critical_load_kw > 0.0 && design.critical_load_coverage < 1.0 {
        out.push(format!(
            "Battery and solar cover only {:.0}% of the {:.0} kW critical load; the backup requirement is not fully met.",
            design.critical_load_coverage * 100.0,
            design.critical_load_kw
        ));
    }

    if design.renewable_fraction < MIN_RENEWABLE_FRACTION {
        if profile.include_solar {
            out.push(format!(
                "Renewable share is {:.0}%; consider a larger solar array to reach at least {:.0}%.",
                design.renewable_fraction * 100.0,
                MIN_RENEWABLE_FRACTION * 100.0
            ));
        } else {
            out.push(
                "Add solar PV to raise the renewable share and offset energy purchases.".to_string(),
            );
        }
    }

    match financial.simple_payback_years {
        Some(years) if years <= PAYBACK_THRESHOLD_YEARS => out.push(format!(
            "Attractive {years:.1}-year payback, helped by a ${:.0} federal tax credit.",
            financial.federal_itc
        )),
        slow => {
            let payback = slow.map_or_else(
                || "is never reached".to_string(),
                |years| format!("is {years:.1} years"),
            );
            if design.battery_kwh > 0.0 {
                out.push(format!(
                    "Simple payback {payback}; consider reducing battery size (currently ${:.0} of capital) to shorten it.",
                    costs.battery_cost
                ));
            } else {
                out.push(format!(
                    "Simple payback {payback}; revisit component selection to improve project economics."
                ));
            }
        }
    }

    if financial.npv > 0.0 {
        out.push(format!(
            "Positive NPV of ${:.0} indicates financial viability over the {lifetime_years}-year project life.",
            financial.npv
        ));
    }

    if financial.irr.is_none() {
        out.push(
            "IRR could not be determined for this cash-flow profile; rely on NPV and payback instead."
                .to_string(),
        );
    }

    if reliability.reliability_improvement_percent > HIGH_RELIABILITY_PERCENT {
        out.push(format!(
            "Microgrid provides {:.0}% reliability improvement, virtually eliminating outage impacts.",
            reliability.reliability_improvement_percent
        ));
    }

    if reliability.avoided_outage_cost > AVOIDED_COST_HIGHLIGHT {
        out.push(format!(
            "Estimated ${:.0}/year in avoided outage costs justifies the resilience investment.",
            reliability.avoided_outage_cost
        ));
    }

    if profile.grid_connected {
        out.push(
            "Use grid-forming inverters for seamless islanding during hurricane-season grid outages."
                .to_string(),
        );
    } else {
        out.push(
            "Site is islanded: size fuel logistics and storage for continuous off-grid operation."
                .to_string(),
        );
    }

    out
}
