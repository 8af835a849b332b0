//! External collaborators: player id generation and the shuffle used for
//! role assignment.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::engine::models::{PlayerId, PlayerSeat};

pub trait IdSource {
    fn new_id(&mut self) -> PlayerId;
}

/// Random 64-bit hex tokens.
pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for RandomIds {
    fn new_id(&mut self) -> PlayerId {
        format!("{:016x}", self.rng.gen::<u64>())
    }
}

/// `p1`, `p2`, ... in call order.
#[derive(Default)]
pub struct SequentialIds {
    next: u32,
}

impl IdSource for SequentialIds {
    fn new_id(&mut self) -> PlayerId {
        self.next += 1;
        format!("p{}", self.next)
    }
}

/// Seat a list of names, asking `ids` for one token per player.
pub fn seat_players<I, S>(ids: &mut dyn IdSource, names: I) -> Vec<PlayerSeat>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(|name| PlayerSeat::new(ids.new_id(), name))
        .collect()
}

/// Uniform permutation of a list.
pub trait Shuffle {
    fn shuffle<T>(&mut self, items: Vec<T>) -> Vec<T>;
}

/// Fisher-Yates over a seedable RNG.
pub struct SeededShuffle {
    rng: StdRng,
}

impl SeededShuffle {
    /// `None` draws a seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Shuffle for SeededShuffle {
    fn shuffle<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        items.shuffle(&mut self.rng);
        items
    }
}

/// Leaves the order untouched. Handy for deterministic tests.
pub struct NoShuffle;

impl Shuffle for NoShuffle {
    fn shuffle<T>(&mut self, items: Vec<T>) -> Vec<T> {
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::default();
        let seats = seat_players(&mut ids, ["Ann", "Bob"]);
        assert_eq!(seats[0], PlayerSeat::new("p1", "Ann"));
        assert_eq!(seats[1], PlayerSeat::new("p2", "Bob"));
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let mut ids = RandomIds::seeded(7);
        let a = ids.new_id();
        let b = ids.new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible_permutation() {
        let items: Vec<u32> = (0..20).collect();
        let a = SeededShuffle::new(Some(42)).shuffle(items.clone());
        let b = SeededShuffle::new(Some(42)).shuffle(items.clone());
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, items);
    }

    #[test]
    fn test_no_shuffle_keeps_order() {
        assert_eq!(NoShuffle.shuffle(vec![3, 1, 2]), vec![3, 1, 2]);
    }
}
