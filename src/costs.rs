//! Capital and O&M cost estimation.

use std::fmt;

use serde::Serialize;

use crate::config::RateConstants;
use crate::sizing::DerDesign;

/// Capital and operating cost breakdown for a design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub solar_pv_cost: f64,
    pub battery_cost: f64,
    pub generator_cost: f64,
    pub inverter_cost: f64,
    /// Sum of the four component costs.
    pub equipment_cost: f64,
    pub bos_cost: f64,
    pub installation_cost: f64,
    /// Equipment plus BOS plus installation.
    pub total_capital_cost: f64,
    /// Capital cost per kW of generation; 0 when nothing generates.
    pub cost_per_kw: f64,
    pub annual_om_cost: f64,
}

impl CostBreakdown {
    /// Prices a design with the given constants.
    ///
    /// BOS and installation are fractions of equipment cost, inverter
    /// included. O&M scales with the installed size of each component.
    pub fn estimate(design: &DerDesign, rates: &RateConstants) -> Self {
        let eq = &rates.equipment;
        let solar_pv_cost = design.solar_pv_kw * eq.solar_per_kw;
        let battery_cost = design.battery_kwh * eq.battery_per_kwh;
        let generator_cost = design.generator_kw * eq.generator_per_kw;
        let inverter_cost = design.inverter_kw * eq.inverter_per_kw;

        let equipment_cost = solar_pv_cost + battery_cost + generator_cost + inverter_cost;
        let bos_cost = equipment_cost * eq.bos_fraction;
        let installation_cost = equipment_cost * eq.installation_fraction;
        let total_capital_cost = equipment_cost + bos_cost + installation_cost;

        let cost_per_kw = if design.total_generation_kw > 0.0 {
            total_capital_cost / design.total_generation_kw
        } else {
            0.0
        };

        let om = &rates.om;
        let annual_om_cost = design.solar_pv_kw * om.solar_per_kw_year
            + design.battery_kwh * om.battery_per_kwh_year
            + design.generator_kw * om.generator_per_kw_year;

        Self {
            solar_pv_cost,
            battery_cost,
            generator_cost,
            inverter_cost,
            equipment_cost,
            bos_cost,
            installation_cost,
            total_capital_cost,
            cost_per_kw,
            annual_om_cost,
        }
    }

    /// Equipment cost that qualifies for the investment tax credit.
    pub fn itc_eligible_cost(&self) -> f64 {
        self.solar_pv_cost + self.battery_cost
    }
}

impl fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Cost Estimate ---")?;
        writeln!(f, "Solar PV:              ${:.0}", self.solar_pv_cost)?;
        writeln!(f, "Battery:               ${:.0}", self.battery_cost)?;
        writeln!(f, "Generator:             ${:.0}", self.generator_cost)?;
        writeln!(f, "Inverter:              ${:.0}", self.inverter_cost)?;
        writeln!(f, "Balance of system:     ${:.0}", self.bos_cost)?;
        writeln!(f, "Installation:          ${:.0}", self.installation_cost)?;
        writeln!(f, "Total capital:         ${:.0}", self.total_capital_cost)?;
        writeln!(f, "Cost per kW:           ${:.0}", self.cost_per_kw)?;
        write!(f, "Annual O&M:            ${:.0}", self.annual_om_cost)
    }
}
