use super::BonusStore;
use crate::{
    error::BonusResult,
    model::{BillingEntry, ResultRow},
    types::CalculationId,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::params;

impl BonusStore {
// ── Bonus results ──────────────────────────────────────────────

/// Remove the results of one calculation and business date.
/// Returns the number of rows deleted.
pub fn delete_results(&self, calculation_id: CalculationId, date: NaiveDate) -> BonusResult<usize> {
    let deleted = self.conn.execute(
        "DELETE FROM bonus_results
         WHERE bonuscalculation1_id = ?1 AND date_calculated = ?2",
        params![calculation_id, date],
    )?;
    Ok(deleted)
}

/// Insert one batch of result rows in a single transaction.
pub fn insert_results(&self, rows: &[ResultRow]) -> BonusResult<()> {
    let tx = self.conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO bonus_results (
                pid, zip, city, consumption_from, consumption_until,
                nc, ib, bonuscampaign_id, bonuscalculation1_id, date_calculated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.pid,
                row.zip,
                row.city,
                row.consumption_from,
                row.consumption_until,
                row.nc,
                row.ib,
                row.bonuscampaign_id,
                row.bonuscalculation1_id,
                row.date_calculated,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Stored results of one calculation and date, ordered by
/// (pid, zip, city, consumption_from).
pub fn results_for(&self, calculation_id: CalculationId, date: NaiveDate) -> BonusResult<Vec<ResultRow>> {
    let mut stmt = self.conn.prepare(
        "SELECT pid, zip, city, consumption_from, consumption_until,
                nc, ib, bonuscampaign_id, bonuscalculation1_id, date_calculated
         FROM bonus_results
         WHERE bonuscalculation1_id = ?1 AND date_calculated = ?2
         ORDER BY pid, zip, city, consumption_from",
    )?;
    let rows = stmt
        .query_map(params![calculation_id, date], |row| {
            Ok(ResultRow {
                pid:                  row.get(0)?,
                zip:                  row.get(1)?,
                city:                 row.get(2)?,
                consumption_from:     row.get(3)?,
                consumption_until:    row.get(4)?,
                nc:                   row.get(5)?,
                ib:                   row.get(6)?,
                bonuscampaign_id:     row.get(7)?,
                bonuscalculation1_id: row.get(8)?,
                date_calculated:      row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_results(&self, calculation_id: CalculationId, date: NaiveDate) -> BonusResult<i64> {
    let count = self.conn.query_row(
        "SELECT COUNT(*) FROM bonus_results
         WHERE bonuscalculation1_id = ?1 AND date_calculated = ?2",
        params![calculation_id, date],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Billing ledger ─────────────────────────────────────────────

pub fn append_billing(
    &self,
    inserted: NaiveDateTime,
    department_responsible: &str,
    billing_name: &str,
    amount: i64,
) -> BonusResult<()> {
    self.conn.execute(
        "INSERT INTO billing (inserted, department_responsible, billing_name, amount)
         VALUES (?1, ?2, ?3, ?4)",
        params![inserted, department_responsible, billing_name, amount],
    )?;
    Ok(())
}

/// Ledger rows in insertion order.
pub fn billing_entries(&self) -> BonusResult<Vec<BillingEntry>> {
    let mut stmt = self.conn.prepare(
        "SELECT inserted, department_responsible, billing_name, amount
         FROM billing ORDER BY id",
    )?;
    let entries = stmt
        .query_map([], |row| {
            Ok(BillingEntry {
                inserted:               row.get(0)?,
                department_responsible: row.get(1)?,
                billing_name:           row.get(2)?,
                amount:                 row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
}
