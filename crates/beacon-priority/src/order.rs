//! Priority ordering helpers

use beacon_core::Scored;

/// Sort by score descending. Stable: equal scores keep their relative order.
pub fn sort_by_priority<T: Scored>(items: &mut [T]) {
    items.sort_by(|a, b| b.score().cmp(&a.score()));
}

/// Owned variant of [`sort_by_priority`]
pub fn sorted_by_priority<T: Scored>(mut items: Vec<T>) -> Vec<T> {
    sort_by_priority(&mut items);
    items
}

/// Check that a sequence never increases in score
pub fn is_priority_ordered<T: Scored>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0].score() >= w[1].score())
}
