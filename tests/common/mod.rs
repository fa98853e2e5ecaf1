//! Shared fixtures for integration tests.

#![allow(dead_code)]

use mgce::config::RateTable;
use mgce::facility::FacilityInput;

/// Reference facility: 500 kW peak, 2 GWh/yr, 30% critical, 40% essential,
/// 24 h backup, every component enabled, grid-connected in Baton Rouge.
pub fn reference_input() -> FacilityInput {
    FacilityInput {
        facility_name: Some("Reference Office Park".into()),
        facility_type: "commercial".into(),
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

/// Built-in Louisiana rate table.
pub fn reference_rates() -> RateTable {
    RateTable::louisiana()
}

/// Request body for the reference facility.
pub fn reference_json() -> String {
    serde_json::to_string(&reference_input()).unwrap()
}
