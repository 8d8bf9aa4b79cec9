//! Reference data writes. The back office owns these tables in production;
//! tests and local replays fill them through here.

use super::BonusStore;
use crate::{
    error::BonusResult,
    model::{
        AreaAssignment, BonusTierConfig, CalculationDefinition, CostModelInternal,
        CostModelProvision, TariffDefinition, Validity,
    },
    types::{AreaCollection, CalculationId, Category},
};
use rusqlite::params;

impl BonusStore {
pub fn insert_calculation(&self, calc: &CalculationDefinition) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO bonus_calculation_1 (
            bonuscalculation1_id, bonuscampaign_id, product_ext_name,
            costmodelinternal_name, costmodelprovision_name
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            calc.calculation_id,
            calc.campaign_id,
            calc.product_ext_name,
            calc.costmodelinternal_name,
            calc.costmodelprovision_name,
        ],
    )?;
    Ok(())
}

pub fn insert_tier(&self, calculation_id: CalculationId, tier: &BonusTierConfig) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO bonus_calculation_2_market (
            bonuscalculation1_id, consumption_from, consumption_until, area_type,
            abssteps, max_bonus_sum_percentage, max_bonus_sum_abs,
            max_bonus_nc_abs, max_bonus_nc_percentage,
            min_bonus_ib_abs, max_bonus_ib_abs,
            lowest_rank, highest_rank, maxamortisation
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            calculation_id,
            tier.consumption_from,
            tier.consumption_until,
            tier.area_type,
            tier.abssteps,
            tier.max_bonus_sum_percentage,
            tier.max_bonus_sum_abs,
            tier.max_bonus_nc_abs,
            tier.max_bonus_nc_percentage,
            tier.min_bonus_ib_abs,
            tier.max_bonus_ib_abs,
            tier.lowest_rank,
            tier.highest_rank,
            tier.maxamortisation,
        ],
    )?;
    Ok(())
}

pub fn insert_tariff(
    &self,
    tariff_name: &str,
    category: Category,
    tariff: &TariffDefinition,
    validity: Validity,
) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO tariffs_available (
            pid, tariff_name, type, area_collection,
            basicrate, basicrate_margin, kwhrate, kwhrate_margin,
            consumption_from, consumption_until,
            available_bonus_from, available_bonus_until
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            tariff.pid,
            tariff_name,
            category.as_db_str(),
            tariff.area_collection,
            tariff.basicrate,
            tariff.basicrate_margin,
            tariff.kwhrate,
            tariff.kwhrate_margin,
            tariff.consumption_from,
            tariff.consumption_until,
            validity.from,
            validity.until,
        ],
    )?;
    Ok(())
}

pub fn insert_cost_internal(
    &self,
    name: &str,
    cost: &CostModelInternal,
    validity: Validity,
) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO cost_model_internal (
            costmodelinternal_name, costmodelinternal_oneoff, costmodelinternal_pa,
            costmodelinternal_bonus_validfrom, costmodelinternal_bonus_validuntil
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, cost.oneoff, cost.pa, validity.from, validity.until],
    )?;
    Ok(())
}

pub fn insert_cost_provision(
    &self,
    name: &str,
    cost: &CostModelProvision,
    validity: Validity,
) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO cost_model_provision (
            costmodelprovision_name, consumption_from, consumption_until,
            costmodelprovision_oneoff, costmodelprovision_pa,
            costmodelprovision_bonus_validfrom, costmodelprovision_bonus_validuntil
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            name,
            cost.consumption_from,
            cost.consumption_until,
            cost.oneoff,
            cost.pa,
            validity.from,
            validity.until,
        ],
    )?;
    Ok(())
}

pub fn insert_area_definition(
    &self,
    area_collection: AreaCollection,
    category: Category,
    validity: Validity,
) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO area_definition (
            area_collection, type, available_bonus_from, available_bonus_until
        ) VALUES (?1, ?2, ?3, ?4)",
        params![area_collection, category.as_db_str(), validity.from, validity.until],
    )?;
    Ok(())
}

pub fn insert_area_assignment(&self, area: &AreaAssignment) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO area_assignment (area_collection, zip, city, area_type)
         VALUES (?1, ?2, ?3, ?4)",
        params![area.area_collection, area.zip, area.city, area.area_type],
    )?;
    Ok(())
}
}
