//! End-to-end analysis pipeline.
//!
//! Validation, sizing, costing, finance, reliability and recommendations run
//! strictly in that order. Each stage reads the validated profile and the
//! outputs of earlier stages only.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::{RateConstants, RateTable};
use crate::costs::CostBreakdown;
use crate::error::AnalysisError;
use crate::facility::{self, FacilityInput, FacilityProfile, LoadAnalysis};
use crate::finance::FinancialResult;
use crate::recommend::{self, RecommendationInputs};
use crate::reliability::ReliabilityResult;
use crate::sizing::DerDesign;

/// Aggregated result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub facility: LoadAnalysis,
    pub design: DerDesign,
    pub costs: CostBreakdown,
    pub financial: FinancialResult,
    pub reliability: ReliabilityResult,
    pub recommendations: Vec<String>,
}

/// Validates a request, resolves its rate constants, and runs every stage.
///
/// # Errors
///
/// Returns `AnalysisError::Validation` for caller input outside the accepted
/// ranges, or `AnalysisError::Configuration` when the location has no rate
/// entry. Inputs that are finite but large enough to overflow a derived size,
/// cost, or cash-flow figure are also rejected as `Validation`. No partial
/// result is produced on error.
pub fn analyze(input: &FacilityInput, rates: &RateTable) -> Result<AnalysisResult, AnalysisError> {
    let profile = facility::validate(input, rates)?;
    let constants = rates.resolve(profile.location)?;
    debug!(
        facility_type = %profile.facility_type,
        location = %profile.location,
        peak_demand_kw = profile.peak_demand_kw,
        "validated facility profile"
    );
    let result = analyze_profile(&profile, constants);
    ensure_finite(&result)?;
    Ok(result)
}

/// Rejects results where a derived figure overflowed to infinity or NaN.
///
/// Battery energy is the only figure driven by `backup_duration_hours`;
/// everything else scales with `peak_demand_kw`.
fn ensure_finite(result: &AnalysisResult) -> Result<(), AnalysisError> {
    if !result.design.battery_kwh.is_finite() {
        return Err(AnalysisError::validation(
            "backup_duration_hours",
            "too large: derived battery capacity is not finite",
        ));
    }

    let d = &result.design;
    let c = &result.costs;
    let fin = &result.financial;
    let rel = &result.reliability;
    let figures = [
        d.solar_pv_kw,
        d.generator_kw,
        d.inverter_kw,
        d.total_generation_kw,
        c.total_capital_cost,
        c.annual_om_cost,
        fin.net_cost_after_incentives,
        fin.annual_savings,
        fin.npv,
        rel.avoided_outage_cost,
    ];
    let optional = [fin.simple_payback_years, fin.irr, fin.lcoe];
    if figures.iter().all(|v| v.is_finite())
        && optional.iter().flatten().all(|v| v.is_finite())
    {
        Ok(())
    } else {
        Err(AnalysisError::validation(
            "peak_demand_kw",
            "too large: derived costs or cash flows are not finite",
        ))
    }
}

/// Runs the pipeline on an already validated profile. Total, but does not
/// screen for overflow the way [`analyze`] does.
pub fn analyze_profile(profile: &FacilityProfile, rates: &RateConstants) -> AnalysisResult {
    let facility = LoadAnalysis::from_profile(profile);

    let design = DerDesign::size(profile);
    debug!(
        solar_pv_kw = design.solar_pv_kw,
        battery_kwh = design.battery_kwh,
        generator_kw = design.generator_kw,
        "sized design"
    );

    let costs = CostBreakdown::estimate(&design, rates);
    debug!(total_capital_cost = costs.total_capital_cost, "estimated costs");

    let financial = FinancialResult::analyze(&costs, &design, profile, rates);
    debug!(
        annual_savings = financial.annual_savings,
        npv = financial.npv,
        "computed financials"
    );

    let reliability = ReliabilityResult::assess(&design, profile, rates);
    debug!(
        improvement_percent = reliability.reliability_improvement_percent,
        "assessed reliability"
    );

    let recommendations = recommend::recommendations(&RecommendationInputs {
        profile,
        design: &design,
        costs: &costs,
        financial: &financial,
        reliability: &reliability,
        lifetime_years: rates.finance.project_lifetime_years,
    });

    AnalysisResult {
        facility,
        design,
        costs,
        financial,
        reliability,
        recommendations,
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let load = &self.facility;
        writeln!(f, "--- Facility ---")?;
        writeln!(f, "Peak demand:           {:.1} kW", load.peak_demand_kw)?;
        writeln!(f, "Average demand:        {:.1} kW", load.average_demand_kw)?;
        writeln!(f, "Load factor:           {:.3}", load.load_factor)?;
        writeln!(
            f,
            "Critical / essential:  {:.1} kW / {:.1} kW",
            load.critical_load_kw, load.essential_load_kw
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.design)?;
        writeln!(f)?;
        writeln!(f, "{}", self.costs)?;
        writeln!(f)?;
        writeln!(f, "{}", self.financial)?;
        writeln!(f)?;
        writeln!(f, "{}", self.reliability)?;
        writeln!(f)?;
        write!(f, "--- Recommendations ---")?;
        for (i, rec) in self.recommendations.iter().enumerate() {
            write!(f, "\n{:>2}. {rec}", i + 1)?;
        }
        Ok(())
    }
}
