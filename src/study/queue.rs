//! Round queue construction.

use rand::seq::SliceRandom;
use rand::Rng;

use super::card::StudyCard;
use super::level::Level;

/// Builds the presentation order for the next round.
///
/// Returns indices into `cards` for every unmastered card, lowest level first,
/// each level shuffled independently. `None` when every card is mastered.
pub fn build_round<R: Rng + ?Sized>(cards: &[StudyCard], rng: &mut R) -> Option<Vec<usize>> {
    let mut buckets: [Vec<usize>; Level::COUNT] = Default::default();
    for (i, card) in cards.iter().enumerate().filter(|(_, c)| !c.mastered) {
        buckets[card.level.index()].push(i);
    }

    if buckets.iter().all(Vec::is_empty) {
        return None;
    }

    let mut queue = Vec::with_capacity(buckets.iter().map(Vec::len).sum());
    for bucket in &mut buckets {
        bucket.shuffle(rng);
        queue.append(bucket);
    }
    Some(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Card;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn cards_at(levels: &[u8]) -> Vec<StudyCard> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                let mut card =
                    StudyCard::from_card(&Card::new(format!("q{}", i), format!("a{}", i)));
                card.level = Level::new(level).unwrap();
                card
            })
            .collect()
    }

    #[test]
    fn test_all_mastered_yields_none() {
        let mut cards = cards_at(&[1, 3]);
        for card in &mut cards {
            card.mastered = true;
        }
        let mut rng = StdRng::seed_from_u64(7);
        assert!(build_round(&cards, &mut rng).is_none());
        assert!(build_round(&[], &mut rng).is_none());
    }

    #[test]
    fn test_contains_exactly_unmastered_in_level_order() {
        let mut cards = cards_at(&[4, 1, 6, 2, 1, 4, 3]);
        cards[2].mastered = true;
        cards[5].mastered = true;
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let queue = build_round(&cards, &mut rng).unwrap();

            let mut sorted = queue.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 3, 4, 6]);

            let levels: Vec<Level> = queue.iter().map(|&i| cards[i].level).collect();
            assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_ties_are_shuffled_uniformly() {
        let cards = cards_at(&[2, 2, 2]);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut seen: HashMap<Vec<usize>, usize> = HashMap::new();

        for _ in 0..1200 {
            let queue = build_round(&cards, &mut rng).unwrap();
            *seen.entry(queue).or_default() += 1;
        }

        // 3! orderings, ~200 each when uniform
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&n| n > 120 && n < 280), "{:?}", seen);
    }
}
