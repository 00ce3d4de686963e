//! Selection of the next transaction a customer works on.

use crate::config::Selection;
use crate::model::Transaction;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Picks one unfinished transaction index per step.
#[derive(Debug, Clone)]
pub enum Picker {
    Random,
    RoundRobin { next: usize },
}

impl Picker {
    pub fn new(selection: Selection) -> Self {
        match selection {
            Selection::Random => Picker::Random,
            Selection::RoundRobin => Picker::RoundRobin { next: 0 },
        }
    }

    /// Index of an unfinished transaction, or `None` if all are finished.
    pub fn pick(&mut self, transactions: &[Transaction], rng: &mut impl Rng) -> Option<usize> {
        match self {
            Picker::Random => {
                let unfinished: Vec<usize> = transactions
                    .iter()
                    .enumerate()
                    .filter(|(_, txn)| !txn.is_finished())
                    .map(|(i, _)| i)
                    .collect();
                unfinished.choose(rng).copied()
            }
            Picker::RoundRobin { next } => {
                let len = transactions.len();
                let index = (0..len)
                    .map(|offset| (*next + offset) % len)
                    .find(|&i| !transactions[i].is_finished())?;
                *next = index + 1;
                Some(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceVector;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transactions(finished: &[bool]) -> Vec<Transaction> {
        finished
            .iter()
            .map(|&done| {
                let mut txn = Transaction::new(ResourceVector::from([1]));
                if done {
                    txn.advance();
                    txn.advance();
                }
                txn
            })
            .collect()
    }

    #[test]
    fn test_round_robin_skips_finished() {
        let txns = transactions(&[false, true, false]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut picker = Picker::new(Selection::RoundRobin);

        assert_eq!(picker.pick(&txns, &mut rng), Some(0));
        assert_eq!(picker.pick(&txns, &mut rng), Some(2));
        assert_eq!(picker.pick(&txns, &mut rng), Some(0));
    }

    #[test]
    fn test_random_only_returns_unfinished() {
        let txns = transactions(&[true, false, true, false]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut picker = Picker::new(Selection::Random);

        for _ in 0..50 {
            let index = picker.pick(&txns, &mut rng).unwrap();
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_nothing_to_pick() {
        let mut rng = StdRng::seed_from_u64(0);
        let done = transactions(&[true, true]);
        assert_eq!(Picker::new(Selection::Random).pick(&done, &mut rng), None);
        assert_eq!(Picker::new(Selection::RoundRobin).pick(&done, &mut rng), None);
        assert_eq!(Picker::new(Selection::RoundRobin).pick(&[], &mut rng), None);
    }
}
