//! Result persister. Replaces the results of one calculation day and
//! books the run in the usage-billing ledger.
//!
//! Delete, inserts and the ledger row are separate statements without a
//! spanning lock; runs of the same calculation must not overlap.

use crate::{
    error::{BonusError, BonusResult},
    model::ResultRow,
    store::BonusStore,
    types::CalculationId,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Ledger description of a calculation run.
pub fn billing_name(calculation_id: CalculationId) -> String {
    format!("bonuscalculation {calculation_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistOutcome {
    pub deleted: usize,
    pub written: usize,
    pub batches: usize,
}

pub struct ResultPersister<'a> {
    store:      &'a BonusStore,
    batch_size: usize,
}

impl<'a> ResultPersister<'a> {
    pub fn new(store: &'a BonusStore, batch_size: usize) -> BonusResult<Self> {
        if batch_size == 0 {
            return Err(BonusError::Configuration("insert batch size must be at least 1".into()));
        }
        Ok(Self { store, batch_size })
    }

    /// Replace the stored results of (`calculation_id`, `date`) with `rows`
    /// and append `(inserted, requester_suffix, "bonuscalculation {id}", rows)`
    /// to the billing ledger.
    pub fn persist(
        &self,
        calculation_id: CalculationId,
        date: NaiveDate,
        rows: &[ResultRow],
        requester_suffix: &str,
        inserted: NaiveDateTime,
    ) -> BonusResult<PersistOutcome> {
        let deleted = self.store.delete_results(calculation_id, date)?;
        log::debug!("calc={calculation_id} deleted {deleted} previous rows for {date}");

        let mut batches = 0;
        for chunk in rows.chunks(self.batch_size) {
            self.store.insert_results(chunk)?;
            batches += 1;
            log::debug!("calc={calculation_id} batch {batches}: {} rows", chunk.len());
        }

        self.store.append_billing(
            inserted,
            requester_suffix,
            &billing_name(calculation_id),
            rows.len() as i64,
        )?;
        log::info!(
            "calc={calculation_id} wrote {} rows in {batches} batches for {date}",
            rows.len()
        );

        Ok(PersistOutcome { deleted, written: rows.len(), batches })
    }
}
