use super::BonusStore;
use crate::{
    error::{BonusError, BonusResult},
    model::{
        AreaAssignment, BonusTierConfig, CalculationDefinition, CostModelInternal,
        CostModelProvision, ReferenceData, TariffDefinition,
    },
    types::{CalculationId, Category},
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

impl BonusStore {
pub fn calculation(&self, calculation_id: CalculationId) -> BonusResult<Option<CalculationDefinition>> {
    Ok(self
        .conn
        .query_row(
            "SELECT bonuscalculation1_id, bonuscampaign_id, product_ext_name,
                    costmodelinternal_name, costmodelprovision_name
             FROM bonus_calculation_1
             WHERE bonuscalculation1_id = ?1",
            params![calculation_id],
            |row| {
                Ok(CalculationDefinition {
                    calculation_id:          row.get(0)?,
                    campaign_id:             row.get(1)?,
                    product_ext_name:        row.get(2)?,
                    costmodelinternal_name:  row.get(3)?,
                    costmodelprovision_name: row.get(4)?,
                })
            },
        )
        .optional()?)
}

/// Everything the engine needs for one calculation, as valid on `date`.
///
/// Errors when the calculation is unknown or has no internal cost model on
/// that date. Empty tier, tariff or area sets only warn: the run then
/// produces an empty result.
pub fn load_reference_data(
    &self,
    calculation_id: CalculationId,
    category: Category,
    date: NaiveDate,
) -> BonusResult<ReferenceData> {
    if self.calculation(calculation_id)?.is_none() {
        return Err(BonusError::Configuration(format!(
            "bonus calculation {calculation_id} does not exist"
        )));
    }

    let tiers = self.tiers_for(calculation_id)?;
    let tariffs = self.tariffs_for(calculation_id, category, date)?;
    let mut internal = self.cost_internal_for(calculation_id, date)?;
    let cost_provision = self.cost_provision_for(calculation_id, date)?;
    let areas = self.areas_for(category, date)?;

    if internal.is_empty() {
        return Err(BonusError::Configuration(format!(
            "bonus calculation {calculation_id} has no internal cost model valid on {date}"
        )));
    }
    if internal.len() > 1 {
        log::warn!(
            "calc={calculation_id} {} internal cost model rows valid on {date}, using the first",
            internal.len()
        );
    }
    let cost_internal = Some(internal.swap_remove(0));

    for (what, count) in [
        ("tier", tiers.len()),
        ("tariff", tariffs.len()),
        ("provision cost", cost_provision.len()),
        ("area", areas.len()),
    ] {
        if count == 0 {
            log::warn!("calc={calculation_id} no {what} rows for {category} on {date}");
        }
    }
    log::info!(
        "calc={calculation_id} reference data: {} tiers, {} tariffs, {} provision bands, {} areas",
        tiers.len(),
        tariffs.len(),
        cost_provision.len(),
        areas.len()
    );

    Ok(ReferenceData { tiers, tariffs, cost_internal, cost_provision, areas })
}

// ── Queries ────────────────────────────────────────────────────

fn tiers_for(&self, calculation_id: CalculationId) -> BonusResult<Vec<BonusTierConfig>> {
    let mut stmt = self.conn.prepare(
        "SELECT DISTINCT m.consumption_from, m.consumption_until, m.area_type,
                m.abssteps, m.max_bonus_sum_percentage, m.max_bonus_sum_abs,
                m.max_bonus_nc_abs, m.max_bonus_nc_percentage,
                m.min_bonus_ib_abs, m.max_bonus_ib_abs,
                m.lowest_rank, m.highest_rank, m.maxamortisation
         FROM bonus_calculation_2_market m
         JOIN bonus_calculation_1 c ON c.bonuscalculation1_id = m.bonuscalculation1_id
         WHERE m.bonuscalculation1_id = ?1
         ORDER BY m.area_type, m.consumption_until, m.consumption_from",
    )?;
    let rows = stmt
        .query_map(params![calculation_id], |row| {
            Ok(BonusTierConfig {
                consumption_from:         row.get(0)?,
                consumption_until:        row.get(1)?,
                area_type:                row.get(2)?,
                abssteps:                 row.get(3)?,
                max_bonus_sum_percentage: row.get(4)?,
                max_bonus_sum_abs:        row.get(5)?,
                max_bonus_nc_abs:         row.get(6)?,
                max_bonus_nc_percentage:  row.get(7)?,
                min_bonus_ib_abs:         row.get(8)?,
                max_bonus_ib_abs:         row.get(9)?,
                lowest_rank:              row.get(10)?,
                highest_rank:             row.get(11)?,
                maxamortisation:          row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn tariffs_for(
    &self,
    calculation_id: CalculationId,
    category: Category,
    date: NaiveDate,
) -> BonusResult<Vec<TariffDefinition>> {
    let mut stmt = self.conn.prepare(
        "SELECT t.pid, t.area_collection, t.basicrate, t.basicrate_margin,
                t.kwhrate, t.kwhrate_margin, t.consumption_from, t.consumption_until
         FROM tariffs_available t
         JOIN bonus_calculation_1 c ON c.product_ext_name = t.tariff_name
         WHERE c.bonuscalculation1_id = ?1
           AND t.type = ?2
           AND ?3 BETWEEN t.available_bonus_from AND t.available_bonus_until
         ORDER BY t.id",
    )?;
    let rows = stmt
        .query_map(params![calculation_id, category.as_db_str(), date], |row| {
            Ok(TariffDefinition {
                pid:               row.get(0)?,
                area_collection:   row.get(1)?,
                basicrate:         row.get(2)?,
                basicrate_margin:  row.get(3)?,
                kwhrate:           row.get(4)?,
                kwhrate_margin:    row.get(5)?,
                consumption_from:  row.get(6)?,
                consumption_until: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn cost_internal_for(
    &self,
    calculation_id: CalculationId,
    date: NaiveDate,
) -> BonusResult<Vec<CostModelInternal>> {
    let mut stmt = self.conn.prepare(
        "SELECT i.costmodelinternal_oneoff, i.costmodelinternal_pa
         FROM cost_model_internal i
         JOIN bonus_calculation_1 c ON c.costmodelinternal_name = i.costmodelinternal_name
         WHERE c.bonuscalculation1_id = ?1
           AND ?2 BETWEEN i.costmodelinternal_bonus_validfrom
                      AND i.costmodelinternal_bonus_validuntil
         ORDER BY i.id",
    )?;
    let rows = stmt
        .query_map(params![calculation_id, date], |row| {
            Ok(CostModelInternal { oneoff: row.get(0)?, pa: row.get(1)? })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn cost_provision_for(
    &self,
    calculation_id: CalculationId,
    date: NaiveDate,
) -> BonusResult<Vec<CostModelProvision>> {
    let mut stmt = self.conn.prepare(
        "SELECT p.consumption_from, p.consumption_until,
                p.costmodelprovision_oneoff, p.costmodelprovision_pa
         FROM cost_model_provision p
         JOIN bonus_calculation_1 c ON c.costmodelprovision_name = p.costmodelprovision_name
         WHERE c.bonuscalculation1_id = ?1
           AND ?2 BETWEEN p.costmodelprovision_bonus_validfrom
                      AND p.costmodelprovision_bonus_validuntil
         ORDER BY p.consumption_until, p.id",
    )?;
    let rows = stmt
        .query_map(params![calculation_id, date], |row| {
            Ok(CostModelProvision {
                consumption_from:  row.get(0)?,
                consumption_until: row.get(1)?,
                oneoff:            row.get(2)?,
                pa:                row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn areas_for(&self, category: Category, date: NaiveDate) -> BonusResult<Vec<AreaAssignment>> {
    let mut stmt = self.conn.prepare(
        "SELECT a.zip, a.city, a.area_collection, a.area_type
         FROM area_assignment a
         JOIN area_definition d ON d.area_collection = a.area_collection
         WHERE d.type = ?1
           AND ?2 BETWEEN d.available_bonus_from AND d.available_bonus_until
         ORDER BY a.id",
    )?;
    let rows = stmt
        .query_map(params![category.as_db_str(), date], |row| {
            Ok(AreaAssignment {
                zip:             row.get(0)?,
                city:            row.get(1)?,
                area_collection: row.get(2)?,
                area_type:       row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
}
