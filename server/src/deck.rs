//! Solution draw and card dealing

use clue_shared::{Card, Declaration};
use rand::seq::SliceRandom;
use rand::Rng;

/// Result of a deal: the hidden solution and one hand per seat, in seat order.
#[derive(Debug, Clone)]
pub struct Deal {
    pub solution: Declaration,
    pub hands: Vec<Vec<Card>>,
}

/// Draws one card per band for the solution, shuffles the other 18 and
/// deals them round the table. With `18 % players` leftovers, the first
/// seats get one card more. `players` must be at least 1.
pub fn deal<R: Rng + ?Sized>(rng: &mut R, players: usize) -> Deal {
    let solution = Declaration::new(
        pick(rng, Card::rooms()),
        pick(rng, Card::weapons()),
        pick(rng, Card::suspects()),
    );

    let mut rest: Vec<Card> = Card::deck()
        .into_iter()
        .filter(|card| !solution.contains(*card))
        .collect();
    rest.shuffle(rng);

    let seats = players.max(1);
    let mut hands = vec![Vec::with_capacity(rest.len() / seats + 1); seats];
    for (i, card) in rest.into_iter().enumerate() {
        hands[i % seats].push(card);
    }

    Deal { solution, hands }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, band: Vec<Card>) -> Card {
    band[rng.gen_range(0..band.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clue_shared::DECK_SIZE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_deal_partitions_the_deck() {
        let mut rng = StdRng::seed_from_u64(42);
        for players in 2..=6 {
            let deal = deal(&mut rng, players);
            assert!(deal.solution.is_well_formed());

            let mut seen: HashSet<Card> = deal.solution.cards().into_iter().collect();
            for hand in &deal.hands {
                for card in hand {
                    assert!(seen.insert(*card), "{card} dealt twice");
                }
            }
            assert_eq!(seen.len(), DECK_SIZE);
        }
    }

    #[test]
    fn test_hand_sizes() {
        let mut rng = StdRng::seed_from_u64(7);
        for players in 2..=6 {
            let deal = deal(&mut rng, players);
            let sizes: Vec<usize> = deal.hands.iter().map(Vec::len).collect();
            assert_eq!(sizes.len(), players);
            assert_eq!(sizes.iter().sum::<usize>(), 18);

            let max = *sizes.iter().max().unwrap();
            let min = *sizes.iter().min().unwrap();
            assert!(max - min <= 1);
            // extras go to the first seats
            assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_deal_is_reproducible_with_seed() {
        let a = deal(&mut StdRng::seed_from_u64(99), 4);
        let b = deal(&mut StdRng::seed_from_u64(99), 4);
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.hands, b.hands);
    }

    #[test]
    fn test_three_players_get_six_each() {
        let deal = deal(&mut StdRng::seed_from_u64(1), 3);
        assert!(deal.hands.iter().all(|h| h.len() == 6));
    }
}
