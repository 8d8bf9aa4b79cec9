//! Entities flowing through a calculation run.
//!
//! Everything except ResultRow is a read-only snapshot loaded once per run.

use crate::types::{AreaCollection, CalculationId, CampaignId, Consumption, Pid, Rank};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One competitor offer from the market-price snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub consumption:   Consumption,
    pub zip:           String,
    pub city:          String,
    pub rank:          Rank,
    pub provider:      String,
    pub price_sum_net: f64,
}

/// Maps a (zip, city) to the area grouping of the bonus programme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAssignment {
    pub zip:             String,
    pub city:            String,
    pub area_collection: AreaCollection,
    pub area_type:       Option<String>,
}

/// Caps and rank thresholds of one consumption band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTierConfig {
    pub consumption_from:         Consumption,
    pub consumption_until:        Consumption,
    pub area_type:                Option<String>,
    pub abssteps:                 f64,
    pub max_bonus_sum_percentage: f64,
    pub max_bonus_sum_abs:        f64,
    pub max_bonus_nc_abs:         f64,
    pub max_bonus_nc_percentage:  f64,
    pub min_bonus_ib_abs:         f64,
    pub max_bonus_ib_abs:         f64,
    pub lowest_rank:              Rank,
    pub highest_rank:             Rank,
    pub maxamortisation:          f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffDefinition {
    pub pid:               Pid,
    pub area_collection:   AreaCollection,
    pub basicrate:         f64,
    pub basicrate_margin:  f64,
    pub kwhrate:           f64,
    pub kwhrate_margin:    f64,
    pub consumption_from:  Consumption,
    pub consumption_until: Consumption,
}

/// Flat internal cost, broadcast to every computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModelInternal {
    pub oneoff: f64,
    pub pa:     f64,
}

/// Acquisition cost per consumption band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModelProvision {
    pub consumption_from:  Consumption,
    pub consumption_until: Consumption,
    pub oneoff:            f64,
    pub pa:                f64,
}

/// All reference data of one calculation, as of one business date.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub tiers:          Vec<BonusTierConfig>,
    pub tariffs:        Vec<TariffDefinition>,
    pub cost_internal:  Option<CostModelInternal>,
    pub cost_provision: Vec<CostModelProvision>,
    pub areas:          Vec<AreaAssignment>,
}

/// Bonus split of one tariff at one location for one consumption range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub pid:                  Pid,
    pub zip:                  String,
    pub city:                 String,
    pub consumption_from:     Consumption,
    pub consumption_until:    Consumption,
    pub nc:                   f64,
    pub ib:                   f64,
    pub bonuscampaign_id:     CampaignId,
    pub bonuscalculation1_id: CalculationId,
    pub date_calculated:      NaiveDate,
}

/// A bonus calculation (bonus_calculation_1 row): which product it prices
/// and which cost models apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDefinition {
    pub calculation_id:          CalculationId,
    pub campaign_id:             CampaignId,
    pub product_ext_name:        String,
    pub costmodelinternal_name:  String,
    pub costmodelprovision_name: String,
}

/// Inclusive date window a reference row is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub from:  NaiveDate,
    pub until: NaiveDate,
}

impl Validity {
    pub fn new(from: NaiveDate, until: NaiveDate) -> Self {
        Self { from, until }
    }
}

/// One usage-billing ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingEntry {
    pub inserted:               NaiveDateTime,
    pub department_responsible: String,
    pub billing_name:           String,
    pub amount:                 i64,
}
