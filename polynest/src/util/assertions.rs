//! Checks intended for use in `debug_assert!` statements.

use crate::entities::PartInstance;
use crate::opt::ga::Individual;

/// `true` when both placements cover exactly the same instance id set.
pub fn same_id_set(a: &[PartInstance], b: &[PartInstance]) -> bool {
    let mut a_ids: Vec<usize> = a.iter().map(|p| p.id).collect();
    let mut b_ids: Vec<usize> = b.iter().map(|p| p.id).collect();
    a_ids.sort_unstable();
    b_ids.sort_unstable();
    a_ids == b_ids
}

/// `true` when an individual is internally consistent: one rotation per
/// placement entry and no duplicate instance ids.
pub fn individual_is_coherent(individual: &Individual) -> bool {
    let mut ids: Vec<usize> = individual.placement.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len() == individual.placement.len()
        && individual.placement.len() == individual.rotation.len()
}
