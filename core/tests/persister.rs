mod common;

use bonus_core::{
    error::BonusError,
    model::ResultRow,
    persister::{billing_name, ResultPersister},
    store::BonusStore,
};
use chrono::NaiveDateTime;
use common::*;

fn store() -> BonusStore {
    let store = BonusStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn now() -> NaiveDateTime {
    business_date().and_hms_opt(6, 30, 0).unwrap()
}

fn rows(count: i64) -> Vec<ResultRow> {
    (0..count)
        .map(|i| ResultRow {
            pid:                  "P1".into(),
            zip:                  "10115".into(),
            city:                 "Berlin".into(),
            consumption_from:     i * 100,
            consumption_until:    i * 100 + 99,
            nc:                   50.0,
            ib:                   10.0,
            bonuscampaign_id:     CAMPAIGN,
            bonuscalculation1_id: CALC,
            date_calculated:      business_date(),
        })
        .collect()
}

#[test]
fn writes_rows_in_bounded_batches() {
    init_logging();
    let store = store();
    let persister = ResultPersister::new(&store, 3).unwrap();

    let outcome = persister.persist(CALC, business_date(), &rows(7), "crm", now()).unwrap();

    assert_eq!(outcome.written, 7);
    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.deleted, 0);
    assert_eq!(store.results_for(CALC, business_date()).unwrap(), rows(7));
}

#[test]
fn rerun_on_the_same_day_replaces_the_results() {
    let store = store();
    let persister = ResultPersister::new(&store, 30_000).unwrap();

    persister.persist(CALC, business_date(), &rows(5), "crm", now()).unwrap();
    let first = store.results_for(CALC, business_date()).unwrap();

    let outcome = persister.persist(CALC, business_date(), &rows(5), "crm", now()).unwrap();
    let second = store.results_for(CALC, business_date()).unwrap();

    assert_eq!(outcome.deleted, 5);
    assert_eq!(first, second);
    assert_eq!(store.count_results(CALC, business_date()).unwrap(), 5);
}

#[test]
fn other_days_and_calculations_are_left_alone() {
    let store = store();
    let persister = ResultPersister::new(&store, 30_000).unwrap();
    let yesterday = date(2024, 2, 29);

    let old: Vec<ResultRow> = rows(2)
        .into_iter()
        .map(|r| ResultRow { date_calculated: yesterday, ..r })
        .collect();
    persister.persist(CALC, yesterday, &old, "crm", now()).unwrap();

    let other: Vec<ResultRow> = rows(3)
        .into_iter()
        .map(|r| ResultRow { bonuscalculation1_id: CALC + 1, ..r })
        .collect();
    persister.persist(CALC + 1, business_date(), &other, "crm", now()).unwrap();

    persister.persist(CALC, business_date(), &rows(4), "crm", now()).unwrap();

    assert_eq!(store.count_results(CALC, yesterday).unwrap(), 2);
    assert_eq!(store.count_results(CALC + 1, business_date()).unwrap(), 3);
    assert_eq!(store.count_results(CALC, business_date()).unwrap(), 4);
}

#[test]
fn each_run_appends_one_billing_entry() {
    let store = store();
    let persister = ResultPersister::new(&store, 2).unwrap();

    persister.persist(CALC, business_date(), &rows(5), "crm", now()).unwrap();
    persister.persist(CALC, business_date(), &[], "pricing", now()).unwrap();

    let ledger = store.billing_entries().unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].inserted, now());
    assert_eq!(ledger[0].department_responsible, "crm");
    assert_eq!(ledger[0].billing_name, "bonuscalculation 17");
    assert_eq!(ledger[0].amount, 5);
    assert_eq!(ledger[1].department_responsible, "pricing");
    assert_eq!(ledger[1].amount, 0);
}

#[test]
fn empty_result_still_clears_the_day() {
    let store = store();
    let persister = ResultPersister::new(&store, 30_000).unwrap();

    persister.persist(CALC, business_date(), &rows(3), "crm", now()).unwrap();
    let outcome = persister.persist(CALC, business_date(), &[], "crm", now()).unwrap();

    assert_eq!(outcome.deleted, 3);
    assert_eq!(outcome.batches, 0);
    assert_eq!(store.count_results(CALC, business_date()).unwrap(), 0);
}

#[test]
fn zero_batch_size_is_rejected() {
    let store = store();
    assert!(matches!(
        ResultPersister::new(&store, 0),
        Err(BonusError::Configuration(_))
    ));
}

#[test]
fn billing_name_carries_the_calculation() {
    assert_eq!(billing_name(3), "bonuscalculation 3");
}
