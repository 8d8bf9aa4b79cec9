//! Candidate selection, final re-split and range stitching (stages 8–10).

use super::BonusCandidate;
use crate::{model::ResultRow, types::Consumption};
use std::collections::BTreeMap;

type OfferKey<'a> = (&'a str, &'a str, &'a str, Consumption);

/// Stage 8. One candidate per (pid, zip, city, consumption_from).
///
/// The pool of a group is the union of
///   A: rows at the group's minimum rank, and
///   B: rows within `lowest_rank` whose margin ceiling covers the need,
/// de-duplicated. From the pool the lowest `bonus_needed` wins, then the
/// lowest rank, then the first row in pool order.
pub(crate) fn select(candidates: Vec<BonusCandidate<'_>>) -> Vec<BonusCandidate<'_>> {
    let mut groups: BTreeMap<OfferKey<'_>, Vec<BonusCandidate<'_>>> = BTreeMap::new();
    for candidate in candidates {
        let key = (candidate.pid, candidate.zip, candidate.city, candidate.consumption_from);
        groups.entry(key).or_default().push(candidate);
    }

    groups
        .into_values()
        .filter_map(|group| pick(&group))
        .collect()
}

fn pick<'a>(group: &[BonusCandidate<'a>]) -> Option<BonusCandidate<'a>> {
    let min_rank = group.iter().map(|c| c.rank).min()?;

    let set_a = group.iter().filter(|c| c.rank == min_rank);
    let set_b = group
        .iter()
        .filter(|c| c.rank <= c.lowest_rank && c.max_bonus_pm_abs >= c.bonus_needed);

    let mut pool: Vec<&BonusCandidate<'a>> = Vec::new();
    for candidate in set_a.chain(set_b) {
        if !pool.iter().any(|kept| *kept == candidate) {
            pool.push(candidate);
        }
    }

    let min_needed = pool
        .iter()
        .map(|c| c.bonus_needed)
        .fold(f64::INFINITY, f64::min);
    pool.retain(|c| c.bonus_needed == min_needed);

    let min_pool_rank = pool.iter().map(|c| c.rank).min()?;
    pool.into_iter()
        .find(|c| c.rank == min_pool_rank)
        .cloned()
}

/// Stage 9. Moves as much of the need as the cap allows into nc; the rest
/// is instant bonus. Amounts are not re-rounded here.
pub(crate) fn resplit(candidate: &mut BonusCandidate<'_>) {
    candidate.nc = candidate
        .max_bonus_nc_abs
        .min(candidate.bonus_needed - candidate.ib);
    candidate.ib = candidate.bonus_needed - candidate.nc;
}

/// Stage 10. Sorts rows by (pid, zip, city, consumption_from) and closes
/// every range one below the start of the next range of its group. The last
/// range of a group keeps its tariff upper bound.
pub(crate) fn stitch(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| {
        a.pid
            .cmp(&b.pid)
            .then_with(|| a.zip.cmp(&b.zip))
            .then_with(|| a.city.cmp(&b.city))
            .then_with(|| a.consumption_from.cmp(&b.consumption_from))
    });

    for i in 1..rows.len() {
        let (head, tail) = rows.split_at_mut(i);
        let current = &mut head[i - 1];
        let next = &tail[0];
        if current.pid == next.pid && current.zip == next.zip && current.city == next.city {
            current.consumption_until = next.consumption_from - 1;
        }
    }
}
