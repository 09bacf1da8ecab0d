//! Cards of the mystery: six weapons, nine rooms and six suspects.
//!
//! The discriminants follow the printed deck order and the three bands are
//! contiguous, so every classification is a range test.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Card {
    // Weapons
    Candlestick = 1,
    Knife,
    LeadPipe,
    Revolver,
    Rope,
    Wrench,

    // Rooms
    Kitchen,
    Ballroom,
    Conservatory,
    DiningRoom,
    BilliardRoom,
    Library,
    Lounge,
    Hall,
    Study,

    // Suspects
    MissScarlett,
    RevGreen,
    ColMustard,
    ProfPlum,
    MrsPeacock,
    MrsWhite,
}

/// The band a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Weapon,
    Room,
    Suspect,
}

pub const DECK_SIZE: usize = 21;

impl Card {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_weapon(self) -> bool {
        (Card::Candlestick.index()..=Card::Wrench.index()).contains(&self.index())
    }

    pub fn is_room(self) -> bool {
        (Card::Kitchen.index()..=Card::Study.index()).contains(&self.index())
    }

    pub fn is_character(self) -> bool {
        (Card::MissScarlett.index()..=Card::MrsWhite.index()).contains(&self.index())
    }

    pub fn kind(self) -> CardKind {
        if self.is_weapon() {
            CardKind::Weapon
        } else if self.is_room() {
            CardKind::Room
        } else {
            CardKind::Suspect
        }
    }

    /// Every card of the given band, in deck order.
    pub fn of_kind(kind: CardKind) -> Vec<Card> {
        Card::iter().filter(|c| c.kind() == kind).collect()
    }

    pub fn weapons() -> Vec<Card> {
        Card::of_kind(CardKind::Weapon)
    }

    pub fn rooms() -> Vec<Card> {
        Card::of_kind(CardKind::Room)
    }

    pub fn suspects() -> Vec<Card> {
        Card::of_kind(CardKind::Suspect)
    }

    /// The whole deck in printed order.
    pub fn deck() -> Vec<Card> {
        Card::iter().collect()
    }
}

/// A (room, weapon, suspect) triple. Used both for the hidden solution and
/// for a player's accusation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
    pub room: Card,
    pub weapon: Card,
    pub suspect: Card,
}

impl Declaration {
    pub fn new(room: Card, weapon: Card, suspect: Card) -> Self {
        Self {
            room,
            weapon,
            suspect,
        }
    }

    /// True when each field holds a card from its own band.
    pub fn is_well_formed(&self) -> bool {
        self.room.is_room() && self.weapon.is_weapon() && self.suspect.is_character()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.room == card || self.weapon == card || self.suspect == card
    }

    pub fn cards(&self) -> [Card; 3] {
        [self.room, self.weapon, self.suspect]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deck_has_all_cards() {
        let deck = Card::deck();
        assert_eq!(deck.len(), DECK_SIZE);
        assert_eq!(deck.first(), Some(&Card::Candlestick));
        assert_eq!(deck.last(), Some(&Card::MrsWhite));
        assert_eq!(Card::MrsWhite.index(), 21);
    }

    #[test]
    fn test_bands_are_disjoint() {
        for card in Card::iter() {
            let flags = [card.is_weapon(), card.is_room(), card.is_character()];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{card}");
        }
        assert_eq!(Card::weapons().len(), 6);
        assert_eq!(Card::rooms().len(), 9);
        assert_eq!(Card::suspects().len(), 6);
    }

    #[test]
    fn test_kind_boundaries() {
        assert_eq!(Card::Wrench.kind(), CardKind::Weapon);
        assert_eq!(Card::Kitchen.kind(), CardKind::Room);
        assert_eq!(Card::Study.kind(), CardKind::Room);
        assert_eq!(Card::MissScarlett.kind(), CardKind::Suspect);
    }

    #[test]
    fn test_card_names() {
        assert_eq!(Card::LeadPipe.to_string(), "lead_pipe");
        assert_eq!(Card::from_str("miss_scarlett"), Ok(Card::MissScarlett));
        assert!(Card::from_str("butler").is_err());
    }

    #[test]
    fn test_declaration_well_formed() {
        let good = Declaration::new(Card::Hall, Card::Rope, Card::ProfPlum);
        assert!(good.is_well_formed());
        assert!(good.contains(Card::Rope));
        assert!(!good.contains(Card::Knife));

        let swapped = Declaration::new(Card::Rope, Card::Hall, Card::ProfPlum);
        assert!(!swapped.is_well_formed());
    }
}
