//! One bonus calculation run, end to end.
//!
//! RUN ORDER (fixed):
//!   1. locate and decode the price snapshot (today, else yesterday)
//!   2. load the reference data valid on the business date
//!   3. allocate bonuses (pure, no I/O)
//!   4. replace the day's results and append the billing entry
//!
//! RULES:
//!   - Nothing is written before step 4; a failing run leaves the database
//!     untouched.
//!   - Results are stamped with the business date even when yesterday's
//!     snapshot was used.

use crate::{
    allocation::{self, EngineSettings, ResultStamp, StageTrace},
    clock::BusinessClock,
    config::AppConfig,
    error::BonusResult,
    persister::ResultPersister,
    snapshot::{LocalObjectStore, ObjectStore, SnapshotLoader},
    store::BonusStore,
    types::{CalculationId, CampaignId, Category},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the caller asks for: a calculation of a campaign, priced against
/// one market-data file, billed to a requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub calculation_id:   CalculationId,
    pub campaign_id:      CampaignId,
    /// Price file identifier, e.g. `Strom_Online.zip`.
    pub marketdata_name:  String,
    pub requester_suffix: String,
}

impl CalculationRequest {
    pub fn category(&self) -> Category {
        Category::from_marketdata_name(&self.marketdata_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub job_id:         String,
    pub calculation_id: CalculationId,
    pub campaign_id:    CampaignId,
    pub category:       Category,
    pub snapshot_key:   String,
    pub business_date:  NaiveDate,
    pub observations:   usize,
    pub skipped_rows:   usize,
    pub rows_deleted:   usize,
    pub rows_written:   usize,
    pub stages:         Vec<StageTrace>,
}

pub struct BonusJob<S: ObjectStore> {
    pub config: AppConfig,
    pub clock:  BusinessClock,
    store:      BonusStore,
    objects:    S,
}

impl BonusJob<LocalObjectStore> {
    /// Wire a job from configuration: opens and migrates the database and
    /// reads snapshots from `snapshot_root`.
    pub fn from_config(config: AppConfig) -> BonusResult<Self> {
        config.validate()?;
        let store = BonusStore::open_configured(&config.database_path)?;
        store.migrate()?;
        let objects = LocalObjectStore::new(&config.snapshot_root);
        let clock = config.clock()?;
        Ok(Self::new(config, store, objects, clock))
    }
}

impl<S: ObjectStore> BonusJob<S> {
    pub fn new(config: AppConfig, store: BonusStore, objects: S, clock: BusinessClock) -> Self {
        Self { config, clock, store, objects }
    }

    /// Replace the clock, e.g. to replay a past business date.
    pub fn with_clock(mut self, clock: BusinessClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &BonusStore {
        &self.store
    }

    pub fn run(&self, request: &CalculationRequest) -> BonusResult<RunSummary> {
        let job_id = Uuid::new_v4().to_string();
        let calc = request.calculation_id;
        let category = request.category();
        let business_date = self.clock.today();

        log::info!(
            "calc={calc} job={job_id} campaign={} marketdata={} suffix={} category={category} date={business_date}",
            request.campaign_id,
            request.marketdata_name,
            request.requester_suffix,
        );

        let snapshot = SnapshotLoader::new(&self.objects, &self.clock).load(&request.marketdata_name)?;
        let observations = snapshot.observations.len();
        log::info!("calc={calc} snapshot {}: {observations} observations", snapshot.key);
        if snapshot.skipped > 0 {
            log::warn!(
                "calc={calc} snapshot {}: skipped {} rows with null location, rank or price",
                snapshot.key,
                snapshot.skipped
            );
        }

        let reference = self.store.load_reference_data(calc, category, business_date)?;

        let stamp = ResultStamp {
            calculation_id: calc,
            campaign_id:    request.campaign_id,
            date:           business_date,
        };
        let settings = EngineSettings::from_config(&self.config);
        let allocation = allocation::allocate(snapshot.observations, &reference, &settings, stamp)?;

        let persister = ResultPersister::new(&self.store, self.config.insert_batch_size)?;
        let outcome = persister.persist(
            calc,
            business_date,
            &allocation.rows,
            &request.requester_suffix,
            self.clock.now(),
        )?;

        log::info!("calc={calc} job={job_id} done, {} rows", outcome.written);

        Ok(RunSummary {
            job_id,
            calculation_id: calc,
            campaign_id: request.campaign_id,
            category,
            snapshot_key: snapshot.key,
            business_date,
            observations,
            skipped_rows: snapshot.skipped,
            rows_deleted: outcome.deleted,
            rows_written: outcome.written,
            stages: allocation.stages,
        })
    }
}
