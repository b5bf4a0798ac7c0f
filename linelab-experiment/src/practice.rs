use linelab_core::{Judgment, Trial};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

/// Builds a practice set from a series' trials: up to `per_category` drawn
/// from the "same" and "different" subsets without replacement (fewer if a
/// subset is smaller), shuffled together. Re-derived on every practice
/// entry, never cached.
pub fn build_practice_set<R: Rng>(trials: &[Trial], per_category: usize, rng: &mut R) -> Vec<Trial> {
    let same: Vec<Trial> = trials
        .iter()
        .copied()
        .filter(|t| t.ground_truth() == Judgment::Same)
        .collect();
    let different: Vec<Trial> = trials
        .iter()
        .copied()
        .filter(|t| t.ground_truth() == Judgment::Different)
        .collect();

    let mut set: Vec<Trial> = same
        .choose_multiple(rng, per_category)
        .chain(different.choose_multiple(rng, per_category))
        .copied()
        .collect();
    set.shuffle(rng);
    set
}
