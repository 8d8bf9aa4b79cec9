//! Bonus allocation engine. Turns a price snapshot plus reference data into
//! the bonus split per tariff, location and consumption range.
//!
//! STAGE ORDER (fixed, each stage consumes the previous stage's output):
//!    1. clean            dedup observations, drop the excluded provider
//!    2. geo join         attach area collection / area type by (zip, city)
//!    3. tier match       forward asof on consumption, by area type if used
//!    4. tariff join      by area collection, within the tariff's range
//!    5. cost attach      internal cost broadcast, provision forward asof
//!                        (optional: no band means no amortisable margin)
//!    6. price & caps     tariff price, caps, affordability and rank filter
//!    7. bonus split      bonus needed, ib / nc, coverage filter
//!    8. selection        one candidate per (pid, zip, city, consumption)
//!    9. re-split         final nc / ib without rounding
//!   10. stitching        contiguous consumption ranges per (pid, zip, city)
//!
//! RULE: the engine is pure. It reads its inputs, never the store.

pub mod asof;
mod bonus;
mod selection;

pub use bonus::{round_cents, round_down, round_up};

use crate::{
    config::AppConfig,
    error::{BonusError, BonusResult},
    model::{
        AreaAssignment, BonusTierConfig, CostModelInternal, CostModelProvision,
        PriceObservation, ReferenceData, ResultRow, TariffDefinition,
    },
    types::{AreaCollection, CalculationId, CampaignId, Consumption, Rank},
};
use asof::{ForwardIndex, PartitionedForwardIndex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub excluded_provider: String,
    pub round_eonprice:    bool,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            excluded_provider: config.excluded_provider.clone(),
            round_eonprice:    config.round_eonprice,
        }
    }
}

/// Identity stamped on every result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultStamp {
    pub calculation_id: CalculationId,
    pub campaign_id:    CampaignId,
    pub date:           NaiveDate,
}

/// Row count and duration of one engine stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub stage:      String,
    pub rows_out:   usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub rows:   Vec<ResultRow>,
    pub stages: Vec<StageTrace>,
}

/// A snapshot observation after cleaning; the provider is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketQuote {
    pub consumption:   Consumption,
    pub zip:           String,
    pub city:          String,
    pub rank:          Rank,
    pub price_sum_net: f64,
}

#[derive(Debug, Clone, Copy)]
struct Located<'a> {
    quote: &'a MarketQuote,
    area:  &'a AreaAssignment,
}

#[derive(Debug, Clone, Copy)]
struct Tiered<'a> {
    quote: &'a MarketQuote,
    area:  &'a AreaAssignment,
    tier:  &'a BonusTierConfig,
}

#[derive(Debug, Clone, Copy)]
struct Tariffed<'a> {
    quote:  &'a MarketQuote,
    tier:   &'a BonusTierConfig,
    tariff: &'a TariffDefinition,
}

/// A quote with everything needed to price it (output of stage 5).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'a> {
    pub quote:     &'a MarketQuote,
    pub tier:      &'a BonusTierConfig,
    pub tariff:    &'a TariffDefinition,
    pub internal:  CostModelInternal,
    pub provision: Option<&'a CostModelProvision>,
}

/// A priced and split candidate. Equality covers every column, which is
/// what "identical rows" means in stage 8.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BonusCandidate<'a> {
    pub pid:               &'a str,
    pub zip:               &'a str,
    pub city:              &'a str,
    pub consumption_from:  Consumption,
    pub consumption_until: Consumption,
    pub rank:              Rank,
    pub eonprice:          f64,
    pub price_sum_net:     f64,
    pub max_bonus_sum_abs: f64,
    pub max_bonus_ib_abs:  f64,
    pub min_bonus_ib_abs:  f64,
    pub lowest_rank:       Rank,
    pub max_bonus_pm_abs:  f64,
    pub abssteps:          f64,
    pub max_bonus_nc_abs:  f64,
    pub bonus_needed:      f64,
    pub ib:                f64,
    pub nc:                f64,
}

/// Run all stages. Groups without a surviving candidate produce no row.
pub fn allocate(
    observations: Vec<PriceObservation>,
    reference: &ReferenceData,
    settings: &EngineSettings,
    stamp: ResultStamp,
) -> BonusResult<Allocation> {
    validate(reference)?;
    let internal = reference.cost_internal.ok_or_else(|| {
        BonusError::Computation("no internal cost model row to broadcast".into())
    })?;

    let mut trace = Tracer::new(stamp.calculation_id);

    let quotes = clean(observations, &settings.excluded_provider);
    trace.record("clean", quotes.len());

    let located = geo_join(&quotes, &reference.areas);
    trace.record("geo_join", located.len());

    let tiered = match_tiers(&located, &reference.tiers);
    trace.record("tier_match", tiered.len());

    let tariffed = join_tariffs(&tiered, &reference.tariffs);
    trace.record("tariff_join", tariffed.len());

    let candidates = attach_costs(&tariffed, internal, &reference.cost_provision);
    trace.record("cost_attach", candidates.len());

    let priced: Vec<_> = candidates
        .into_iter()
        .filter_map(|c| bonus::price(c, settings.round_eonprice))
        .collect();
    trace.record("price_caps", priced.len());

    let split: Vec<_> = priced.into_iter().filter_map(bonus::split).collect();
    trace.record("bonus_split", split.len());

    let mut selected = selection::select(split);
    trace.record("selection", selected.len());

    selected.iter_mut().for_each(selection::resplit);
    trace.record("resplit", selected.len());

    let mut rows: Vec<ResultRow> = selected
        .into_iter()
        .map(|c| ResultRow {
            pid:                  c.pid.to_string(),
            zip:                  c.zip.to_string(),
            city:                 c.city.to_string(),
            consumption_from:     c.consumption_from,
            consumption_until:    c.consumption_until,
            nc:                   c.nc,
            ib:                   c.ib,
            bonuscampaign_id:     stamp.campaign_id,
            bonuscalculation1_id: stamp.calculation_id,
            date_calculated:      stamp.date,
        })
        .collect();
    selection::stitch(&mut rows);
    trace.record("stitching", rows.len());

    Ok(Allocation { rows, stages: trace.finish() })
}

fn validate(reference: &ReferenceData) -> BonusResult<()> {
    if let Some(tier) = reference
        .tiers
        .iter()
        .find(|t| !(t.abssteps.is_finite() && t.abssteps > 0.0))
    {
        return Err(BonusError::Computation(format!(
            "tier {}..{} has abssteps {}, expected a positive step",
            tier.consumption_from, tier.consumption_until, tier.abssteps
        )));
    }
    Ok(())
}

// ── Stage 1 ────────────────────────────────────────────────────

/// First occurrence of each (consumption, zip, city, rank) wins, even when
/// it belongs to the excluded provider.
fn clean(observations: Vec<PriceObservation>, excluded_provider: &str) -> Vec<MarketQuote> {
    let mut seen: HashSet<(Consumption, String, String, Rank)> = HashSet::new();
    observations
        .into_iter()
        .filter(|o| seen.insert((o.consumption, o.zip.clone(), o.city.clone(), o.rank)))
        .filter(|o| o.provider != excluded_provider)
        .map(|o| MarketQuote {
            consumption:   o.consumption,
            zip:           o.zip,
            city:          o.city,
            rank:          o.rank,
            price_sum_net: o.price_sum_net,
        })
        .collect()
}

// ── Stage 2 ────────────────────────────────────────────────────

fn geo_join<'a>(quotes: &'a [MarketQuote], areas: &'a [AreaAssignment]) -> Vec<Located<'a>> {
    let mut by_location: HashMap<(&str, &str), Vec<&'a AreaAssignment>> = HashMap::new();
    for area in areas {
        by_location
            .entry((area.zip.as_str(), area.city.as_str()))
            .or_default()
            .push(area);
    }

    let mut located = Vec::new();
    for quote in quotes {
        if let Some(matches) = by_location.get(&(quote.zip.as_str(), quote.city.as_str())) {
            located.extend(matches.iter().map(|&area| Located { quote, area }));
        }
    }
    located
}

// ── Stage 3 ────────────────────────────────────────────────────

enum TierMatcher<'a> {
    Flat(ForwardIndex<'a, BonusTierConfig>),
    ByAreaType(PartitionedForwardIndex<'a, String, BonusTierConfig>),
}

impl<'a> TierMatcher<'a> {
    fn new(tiers: &'a [BonusTierConfig]) -> Self {
        let until = |t: &BonusTierConfig| t.consumption_until;
        if tiers.iter().any(|t| t.area_type.is_some()) {
            TierMatcher::ByAreaType(PartitionedForwardIndex::new(
                tiers,
                |t: &BonusTierConfig| t.area_type.clone(),
                until,
            ))
        } else {
            TierMatcher::Flat(ForwardIndex::new(tiers, until))
        }
    }

    fn find(&self, area_type: Option<&str>, consumption: Consumption) -> Option<&'a BonusTierConfig> {
        match self {
            TierMatcher::Flat(index)       => index.find(consumption),
            TierMatcher::ByAreaType(index) => {
                area_type.and_then(|kind| index.find(kind, consumption))
            }
        }
    }
}

fn match_tiers<'a>(located: &[Located<'a>], tiers: &'a [BonusTierConfig]) -> Vec<Tiered<'a>> {
    let matcher = TierMatcher::new(tiers);
    located
        .iter()
        .filter_map(|l| {
            matcher
                .find(l.area.area_type.as_deref(), l.quote.consumption)
                .map(|tier| Tiered { quote: l.quote, area: l.area, tier })
        })
        .collect()
}

// ── Stage 4 ────────────────────────────────────────────────────

fn join_tariffs<'a>(tiered: &[Tiered<'a>], tariffs: &'a [TariffDefinition]) -> Vec<Tariffed<'a>> {
    let mut by_area: HashMap<AreaCollection, Vec<&'a TariffDefinition>> = HashMap::new();
    for tariff in tariffs {
        by_area.entry(tariff.area_collection).or_default().push(tariff);
    }

    let mut joined = Vec::new();
    for t in tiered {
        let Some(candidates) = by_area.get(&t.area.area_collection) else {
            continue;
        };
        let consumption = t.quote.consumption;
        joined.extend(
            candidates
                .iter()
                .copied()
                .filter(|tariff| {
                    tariff.consumption_from <= consumption && consumption <= tariff.consumption_until
                })
                .map(|tariff| Tariffed { quote: t.quote, tier: t.tier, tariff }),
        );
    }
    joined
}

// ── Stage 5 ────────────────────────────────────────────────────

fn attach_costs<'a>(
    tariffed: &[Tariffed<'a>],
    internal: CostModelInternal,
    provisions: &'a [CostModelProvision],
) -> Vec<Candidate<'a>> {
    let index = ForwardIndex::new(provisions, |p| p.consumption_until);
    tariffed
        .iter()
        .map(|t| Candidate {
            quote: t.quote,
            tier: t.tier,
            tariff: t.tariff,
            internal,
            provision: index.find(t.quote.consumption),
        })
        .collect()
}

// ── Tracing ────────────────────────────────────────────────────

struct Tracer {
    calculation_id: CalculationId,
    last:           Instant,
    stages:         Vec<StageTrace>,
}

impl Tracer {
    fn new(calculation_id: CalculationId) -> Self {
        Self { calculation_id, last: Instant::now(), stages: Vec::new() }
    }

    fn record(&mut self, stage: &str, rows_out: usize) {
        let elapsed_ms = self.last.elapsed().as_millis() as u64;
        log::debug!(
            "calc={} step {} {stage}: {rows_out} rows in {elapsed_ms}ms",
            self.calculation_id,
            self.stages.len() + 1,
        );
        self.stages.push(StageTrace { stage: stage.to_string(), rows_out, elapsed_ms });
        self.last = Instant::now();
    }

    fn finish(self) -> Vec<StageTrace> {
        self.stages
    }
}
