/// Map a discount rank onto `[min_discount, max_discount]`.
///
/// The rank is normalized against `[rank_min, rank_max]` and inverted, so
/// the lowest rank receives `max_discount` and the highest `min_discount`.
/// A degenerate domain (`rank_min == rank_max`) yields `max_discount` for
/// every rank. Ranks outside the domain extrapolate linearly; no clamp is
/// applied here.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn compute_discount(
    rank: f64,
    rank_min: f64,
    rank_max: f64,
    min_discount: f64,
    max_discount: f64,
) -> f64 {
    let normalized = if rank_max == rank_min {
        0.0
    } else {
        (rank - rank_min) / (rank_max - rank_min)
    };
    let inverted = 1.0 - normalized;
    min_discount + inverted * (max_discount - min_discount)
}
