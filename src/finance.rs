//! Incentives, savings, and discounted cash-flow metrics.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::config::RateConstants;
use crate::costs::CostBreakdown;
use crate::error::ConvergenceError;
use crate::facility::{FacilityProfile, HOURS_PER_YEAR};
use crate::sizing::DerDesign;

/// Lower bound of the IRR search bracket.
pub const IRR_LOW: f64 = -0.99;
/// Upper bound of the IRR search bracket.
pub const IRR_HIGH: f64 = 10.0;
/// Maximum bisection steps.
pub const IRR_MAX_ITERATIONS: usize = 200;
/// Bracket half-width at which the rate is accepted.
pub const IRR_TOLERANCE: f64 = 1e-9;

/// Incentive-adjusted financial metrics.
///
/// `simple_payback_years`, `irr` and `lcoe` are `None` when undefined
/// (non-positive savings, no IRR root, no energy produced) and serialize as
/// `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialResult {
    /// Effective ITC rate applied.
    pub itc_rate: f64,
    pub federal_itc: f64,
    /// Federal ITC plus state incentives.
    pub total_incentives: f64,
    pub net_cost_after_incentives: f64,
    pub annual_solar_production_kwh: f64,
    pub energy_offset_savings: f64,
    /// Peak reduction credited to the battery (kW).
    pub demand_reduction_kw: f64,
    pub demand_charge_savings: f64,
    pub tou_arbitrage_savings: f64,
    /// First-year savings; may be zero or negative.
    pub annual_savings: f64,
    pub simple_payback_years: Option<f64>,
    pub npv: f64,
    pub irr: Option<f64>,
    /// Levelized cost of solar energy ($/kWh).
    pub lcoe: Option<f64>,
}

impl FinancialResult {
    /// Computes incentives, savings, and cash-flow metrics for a priced design.
    ///
    /// Never fails: an IRR that cannot be bracketed is logged and reported as
    /// `None`.
    pub fn analyze(
        costs: &CostBreakdown,
        design: &DerDesign,
        profile: &FacilityProfile,
        rates: &RateConstants,
    ) -> Self {
        let inc = &rates.incentives;
        let itc_rate = inc.itc_rate();
        let eligible = costs.itc_eligible_cost();
        let federal_itc = eligible * itc_rate;
        let total_incentives = federal_itc + eligible * inc.state_incentive_rate;
        let net_cost_after_incentives =
            costs.total_capital_cost - total_incentives + rates.fees.total();

        let tariff = &rates.tariff;
        let annual_solar_production_kwh =
            design.solar_pv_kw * rates.solar.capacity_factor * HOURS_PER_YEAR;
        let energy_offset_savings =
            annual_solar_production_kwh * tariff.blended_energy_rate(profile.grid_connected);

        let bat = &rates.battery;
        let (demand_reduction_kw, demand_charge_savings, tou_arbitrage_savings) =
            if profile.grid_connected {
                let reduction = (design.battery_kw * bat.peak_shaving_factor)
                    .min(profile.peak_demand_kw);
                let demand = reduction * tariff.demand_rate_per_kw_month * 12.0;
                let arbitrage = design.battery_kwh
                    * bat.cycles_per_year
                    * (tariff.on_peak_rate - tariff.off_peak_rate)
                    * bat.round_trip_efficiency;
                (reduction, demand, arbitrage)
            } else {
                (0.0, 0.0, 0.0)
            };

        let annual_savings = energy_offset_savings + demand_charge_savings + tou_arbitrage_savings;

        let simple_payback_years = if annual_savings > 0.0 {
            Some(net_cost_after_incentives / annual_savings).filter(|y| y.is_finite())
        } else {
            None
        };

        let fin = &rates.finance;
        let flows = cash_flows(
            net_cost_after_incentives,
            annual_savings,
            fin.escalation_rate,
            fin.project_lifetime_years,
        );
        let npv = npv(fin.discount_rate, &flows);
        let irr = match irr(&flows) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!(error = %e, annual_savings, net_cost_after_incentives, "IRR unavailable");
                None
            }
        };

        let lcoe = lcoe(
            net_cost_after_incentives,
            costs.annual_om_cost,
            annual_solar_production_kwh,
            rates,
        );

        Self {
            itc_rate,
            federal_itc,
            total_incentives,
            net_cost_after_incentives,
            annual_solar_production_kwh,
            energy_offset_savings,
            demand_reduction_kw,
            demand_charge_savings,
            tou_arbitrage_savings,
            annual_savings,
            simple_payback_years,
            npv,
            irr,
            lcoe,
        }
    }
}

/// Builds the project cash-flow series.
///
/// Index 0 is the up-front net cost (negative); years `1..=lifetime` carry
/// `annual_savings * (1 + escalation)^t`.
pub fn cash_flows(net_cost: f64, annual_savings: f64, escalation: f64, lifetime: u32) -> Vec<f64> {
    let mut flows = Vec::with_capacity(lifetime as usize + 1);
    flows.push(-net_cost);
    for year in 1..=lifetime {
        flows.push(annual_savings * (1.0 + escalation).powf(f64::from(year)));
    }
    flows
}

/// Net present value of `flows` at `rate`, with `flows[t]` discounted by `(1 + rate)^t`.
pub fn npv(rate: f64, flows: &[f64]) -> f64 {
    let base = 1.0 + rate;
    let mut factor = 1.0;
    let mut total = 0.0;
    for cf in flows {
        total += cf / factor;
        factor *= base;
    }
    total
}

/// Internal rate of return by bisection over [`IRR_LOW`, `IRR_HIGH`].
///
/// # Errors
///
/// Returns `ConvergenceError::NoSignChange` if NPV does not change sign over
/// the bracket, or `ConvergenceError::IterationBudget` if the bracket does not
/// shrink below [`IRR_TOLERANCE`] within [`IRR_MAX_ITERATIONS`] steps.
pub fn irr(flows: &[f64]) -> Result<f64, ConvergenceError> {
    let mut low = IRR_LOW;
    let mut high = IRR_HIGH;
    let mut f_low = npv(low, flows);
    let f_high = npv(high, flows);

    if !f_low.is_finite() || !f_high.is_finite() || f_low * f_high > 0.0 {
        return Err(ConvergenceError::NoSignChange { low, high });
    }
    if f_low == 0.0 && f_high == 0.0 {
        return Err(ConvergenceError::NoSignChange { low, high });
    }
    if f_low == 0.0 {
        return Ok(low);
    }
    if f_high == 0.0 {
        return Ok(high);
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        let f_mid = npv(mid, flows);
        if f_mid == 0.0 || 0.5 * (high - low) < IRR_TOLERANCE {
            return Ok(mid);
        }
        if f_low * f_mid < 0.0 {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }

    Err(ConvergenceError::IterationBudget {
        iterations: IRR_MAX_ITERATIONS,
    })
}

/// Levelized cost of solar energy over the project life.
///
/// Returns `None` when no energy is produced.
fn lcoe(net_cost: f64, annual_om: f64, first_year_kwh: f64, rates: &RateConstants) -> Option<f64> {
    let d = rates.finance.discount_rate;
    let degradation = rates.solar.degradation_rate;

    let mut discounted_om = 0.0;
    let mut discounted_kwh = 0.0;
    for year in 1..=rates.finance.project_lifetime_years {
        let t = f64::from(year);
        let discount = (1.0 + d).powf(t);
        discounted_om += annual_om / discount;
        discounted_kwh += first_year_kwh * (1.0 - degradation).powf(t - 1.0) / discount;
    }

    if discounted_kwh > 0.0 {
        Some((net_cost + discounted_om) / discounted_kwh)
    } else {
        None
    }
}

impl fmt::Display for FinancialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Financial Analysis ---")?;
        writeln!(
            f,
            "Federal ITC:           ${:.0} ({:.0}%)",
            self.federal_itc,
            self.itc_rate * 100.0
        )?;
        writeln!(f, "Net cost:              ${:.0}", self.net_cost_after_incentives)?;
        writeln!(f, "Annual savings:        ${:.0}", self.annual_savings)?;
        match self.simple_payback_years {
            Some(years) => writeln!(f, "Simple payback:        {years:.1} years")?,
            None => writeln!(f, "Simple payback:        n/a")?,
        }
        writeln!(f, "NPV:                   ${:.0}", self.npv)?;
        match self.irr {
            Some(rate) => writeln!(f, "IRR:                   {:.2}%", rate * 100.0)?,
            None => writeln!(f, "IRR:                   n/a")?,
        }
        match self.lcoe {
            Some(lcoe) => write!(f, "LCOE:                  ${lcoe:.4}/kWh"),
            None => write!(f, "LCOE:                  n/a"),
        }
    }
}
