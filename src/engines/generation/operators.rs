use rand::Rng;

/// Index drawn with probability proportional to its weight. Returns `None`
/// when every weight is zero.
pub fn weighted_choice<R: Rng + ?Sized>(weights: &[u32], rng: &mut R) -> Option<usize> {
    let total: u64 = weights.iter().copied().map(u64::from).sum();
    if total == 0 {
        return None;
    }

    let mut spin = rng.gen_range(0..total);
    for (index, weight) in weights.iter().copied().map(u64::from).enumerate() {
        if spin < weight {
            return Some(index);
        }
        spin -= weight;
    }
    None
}

/// Roulette wheel walk: subtracts each fitness from `value` in iteration order
/// and stops at the first member that brings it to zero or below. Falls back
/// to the first member (callers iterate fittest first).
pub fn roulette_walk<'a, T, I>(members: I, value: f64) -> Option<&'a T>
where
    I: IntoIterator<Item = (f64, &'a T)>,
{
    let mut remaining = value;
    let mut first = None;

    for (fitness, member) in members {
        first.get_or_insert(member);
        remaining -= fitness;
        if remaining <= 0.0 {
            return Some(member);
        }
    }

    first
}
