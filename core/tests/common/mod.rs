//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use bonus_core::{
    allocation::{EngineSettings, ResultStamp},
    config::DEFAULT_EXCLUDED_PROVIDER,
    model::{
        AreaAssignment, BonusTierConfig, CalculationDefinition, CostModelInternal,
        CostModelProvision, PriceObservation, ReferenceData, TariffDefinition, Validity,
    },
    store::BonusStore,
    types::Category,
};
use chrono::NaiveDate;

pub const CALC: i64 = 17;
pub const CAMPAIGN: i64 = 4;
pub const PRODUCT: &str = "Strom Online";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn business_date() -> NaiveDate {
    date(2024, 3, 1)
}

pub fn all_year() -> Validity {
    Validity::new(date(2024, 1, 1), date(2024, 12, 31))
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        excluded_provider: DEFAULT_EXCLUDED_PROVIDER.to_string(),
        round_eonprice:    false,
    }
}

pub fn stamp() -> ResultStamp {
    ResultStamp { calculation_id: CALC, campaign_id: CAMPAIGN, date: business_date() }
}

pub fn obs(consumption: i64, zip: &str, city: &str, rank: i64, provider: &str, price: f64) -> PriceObservation {
    PriceObservation {
        consumption,
        zip:           zip.to_string(),
        city:          city.to_string(),
        rank,
        provider:      provider.to_string(),
        price_sum_net: price,
    }
}

/// One band 0..=5000 with abssteps 5, nc cap 50, ib 10..=100, sum cap 200,
/// ranks 1..=1.
pub fn tier() -> BonusTierConfig {
    BonusTierConfig {
        consumption_from:         0,
        consumption_until:        5000,
        area_type:                None,
        abssteps:                 5.0,
        max_bonus_sum_percentage: 1.0,
        max_bonus_sum_abs:        200.0,
        max_bonus_nc_abs:         50.0,
        max_bonus_nc_percentage:  1.0,
        min_bonus_ib_abs:         10.0,
        max_bonus_ib_abs:         100.0,
        lowest_rank:              1,
        highest_rank:             1,
        maxamortisation:          1.0,
    }
}

/// Tariff priced at 60 + 0.5 per kWh, so 560 at 1000 kWh.
pub fn tariff(pid: &str) -> TariffDefinition {
    TariffDefinition {
        pid:               pid.to_string(),
        area_collection:   1,
        basicrate:         60.0,
        basicrate_margin:  100.0,
        kwhrate:           0.5,
        kwhrate_margin:    0.1,
        consumption_from:  0,
        consumption_until: 10_000,
    }
}

pub fn area(zip: &str, city: &str) -> AreaAssignment {
    AreaAssignment {
        zip:             zip.to_string(),
        city:            city.to_string(),
        area_collection: 1,
        area_type:       None,
    }
}

pub fn provision() -> CostModelProvision {
    CostModelProvision { consumption_from: 0, consumption_until: 100_000, oneoff: 0.0, pa: 0.0 }
}

pub fn reference() -> ReferenceData {
    ReferenceData {
        tiers:          vec![tier()],
        tariffs:        vec![tariff("P1")],
        cost_internal:  Some(CostModelInternal { oneoff: 0.0, pa: 0.0 }),
        cost_provision: vec![provision()],
        areas:          vec![area("10115", "Berlin")],
    }
}

pub fn calculation() -> CalculationDefinition {
    CalculationDefinition {
        calculation_id:          CALC,
        campaign_id:             CAMPAIGN,
        product_ext_name:        PRODUCT.to_string(),
        costmodelinternal_name:  "internal-2024".to_string(),
        costmodelprovision_name: "provision-2024".to_string(),
    }
}

/// Migrated in-memory store holding `reference()` for electricity, valid
/// all of 2024.
pub fn seeded_store() -> BonusStore {
    let store = BonusStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    seed(&store, &reference());
    store
}

pub fn seed(store: &BonusStore, data: &ReferenceData) {
    let calc = calculation();
    store.insert_calculation(&calc).unwrap();
    for t in &data.tiers {
        store.insert_tier(CALC, t).unwrap();
    }
    for t in &data.tariffs {
        store.insert_tariff(PRODUCT, Category::Electricity, t, all_year()).unwrap();
    }
    if let Some(internal) = &data.cost_internal {
        store
            .insert_cost_internal(&calc.costmodelinternal_name, internal, all_year())
            .unwrap();
    }
    for p in &data.cost_provision {
        store
            .insert_cost_provision(&calc.costmodelprovision_name, p, all_year())
            .unwrap();
    }
    let mut collections: Vec<i64> = data.areas.iter().map(|a| a.area_collection).collect();
    collections.sort_unstable();
    collections.dedup();
    for collection in collections {
        store
            .insert_area_definition(collection, Category::Electricity, all_year())
            .unwrap();
    }
    for a in &data.areas {
        store.insert_area_assignment(a).unwrap();
    }
}
