//! Price, caps and bonus split of a single candidate (stages 6 and 7).
//!
//! All amounts are rounded to the tier's `abssteps`; caps round down,
//! needs round up.

use super::{BonusCandidate, Candidate};

pub fn round_up(value: f64, step: f64) -> f64 {
    (value / step).ceil() * step
}

pub fn round_down(value: f64, step: f64) -> f64 {
    (value / step).floor() * step
}

/// Two decimals, halves to even.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Candidate with its tariff price and effective caps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Priced<'a> {
    pub candidate:         Candidate<'a>,
    pub eonprice:          f64,
    pub max_bonus_sum_abs: f64,
    pub max_bonus_nc_abs:  f64,
    pub max_bonus_pm_abs:  f64,
}

/// Stage 6. Returns None when the candidate cannot reach the market price
/// under its caps, or is already ranked better than the tier allows.
pub(crate) fn price(candidate: Candidate<'_>, round_eonprice: bool) -> Option<Priced<'_>> {
    let Candidate { quote, tier, tariff, internal, provision } = candidate;
    let step = tier.abssteps;
    let consumption = quote.consumption as f64;

    let mut eonprice = tariff.basicrate + consumption * tariff.kwhrate;
    if round_eonprice {
        eonprice = round_cents(eonprice);
    }

    let sum_cap = round_down(
        (eonprice * tier.max_bonus_sum_percentage).min(tier.max_bonus_sum_abs),
        step,
    );
    let max_bonus_nc_abs =
        round_down(eonprice * tier.max_bonus_nc_percentage, step).min(tier.max_bonus_nc_abs);
    let max_bonus_sum_abs = (max_bonus_nc_abs + tier.max_bonus_ib_abs).min(sum_cap);

    if eonprice - max_bonus_sum_abs > quote.price_sum_net {
        return None;
    }
    if quote.rank < tier.highest_rank {
        return None;
    }

    // Without a provision band the margin is unknown; such a row can still
    // win on rank but never qualifies through the margin.
    let max_bonus_pm_abs = match provision {
        Some(provision) => {
            let amortisable = tier.maxamortisation
                * (tariff.basicrate_margin + consumption * tariff.kwhrate_margin
                    - internal.pa
                    - provision.pa)
                - internal.oneoff
                - provision.oneoff;
            round_down(amortisable, step).max(0.0)
        }
        None => 0.0,
    };

    Some(Priced {
        candidate,
        eonprice,
        max_bonus_sum_abs,
        max_bonus_nc_abs,
        max_bonus_pm_abs,
    })
}

/// Stage 7. Returns None when nc + ib cannot cover the bonus needed.
pub(crate) fn split(priced: Priced<'_>) -> Option<BonusCandidate<'_>> {
    let Candidate { quote, tier, tariff, .. } = priced.candidate;
    let step = tier.abssteps;

    let bonus_needed = round_up((priced.eonprice - quote.price_sum_net).max(0.0), step);

    let ib = round_up(tier.min_bonus_ib_abs, step);
    // max then min, not clamp: a misconfigured negative nc cap must not panic.
    let nc = round_up(bonus_needed - ib, step)
        .max(0.0)
        .min(priced.max_bonus_nc_abs);
    let ib = round_up(bonus_needed - nc, step);

    if nc + ib < bonus_needed {
        return None;
    }

    Some(BonusCandidate {
        pid:               tariff.pid.as_str(),
        zip:               quote.zip.as_str(),
        city:              quote.city.as_str(),
        consumption_from:  quote.consumption,
        consumption_until: tariff.consumption_until,
        rank:              quote.rank,
        eonprice:          priced.eonprice,
        price_sum_net:     quote.price_sum_net,
        max_bonus_sum_abs: priced.max_bonus_sum_abs,
        max_bonus_ib_abs:  tier.max_bonus_ib_abs,
        min_bonus_ib_abs:  tier.min_bonus_ib_abs,
        lowest_rank:       tier.lowest_rank,
        max_bonus_pm_abs:  priced.max_bonus_pm_abs,
        abssteps:          step,
        max_bonus_nc_abs:  priced.max_bonus_nc_abs,
        bonus_needed,
        ib,
        nc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_snaps_to_step() {
        assert_eq!(round_up(60.0, 5.0), 60.0);
        assert_eq!(round_up(60.01, 5.0), 65.0);
        assert_eq!(round_up(0.0, 5.0), 0.0);
        assert_eq!(round_down(64.99, 5.0), 60.0);
        assert_eq!(round_down(-1.0, 5.0), -5.0);
        assert_eq!(round_up(7.0, 10.0), 10.0);
    }

    #[test]
    fn cents_round_half_to_even() {
        assert_eq!(round_cents(560.125), 560.12);
        assert_eq!(round_cents(560.375), 560.38);
        assert_eq!(round_cents(560.625), 560.62);
        assert_eq!(round_cents(560.004), 560.0);
    }
}
