//! Shared primitive types used across the calculation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one bonus calculation (bonus_calculation_1 row).
pub type CalculationId = i64;

/// Identity of the marketing campaign the calculation belongs to.
pub type CampaignId = i64;

/// Tariff product identity.
pub type Pid = String;

/// Geographic area grouping a tariff is offered in.
pub type AreaCollection = i64;

/// Consumption tier in kWh.
pub type Consumption = i64;

/// Competitive rank, lower is better.
pub type Rank = i64;

/// Product category of a calculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electricity,
    Gas,
}

impl Category {
    /// Price files for electricity are named `Strom...`; everything else is gas.
    pub fn from_marketdata_name(name: &str) -> Self {
        if name.starts_with("Strom") {
            Category::Electricity
        } else {
            Category::Gas
        }
    }

    /// Value of the `type` columns in the reference tables.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Category::Electricity => "Strom",
            Category::Gas         => "Gas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}
