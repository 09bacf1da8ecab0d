use clue_shared::{Card, Declaration, PawnPosition, PlayerId};

/// One seat at a table
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub character: Option<Card>,
    pub vote: bool,
    pub hand: Vec<Card>,
    /// Meaningless until the game starts.
    pub position: PawnPosition,
    pub declaration: Option<Declaration>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            character: None,
            vote: false,
            hand: Vec::new(),
            position: PawnPosition::Hallway { x: 0, y: 0 },
            declaration: None,
        }
    }

    pub fn has_card(&self, card: Card) -> bool {
        self.hand.contains(&card)
    }

    /// True when any card of the query is in this hand.
    pub fn can_refute(&self, query: &Declaration) -> bool {
        query.cards().iter().any(|card| self.has_card(*card))
    }

    /// A player fails by declaring anything other than the solution.
    pub fn has_failed(&self, solution: &Declaration) -> bool {
        matches!(self.declaration, Some(declared) if declared != *solution)
    }

    pub fn occupies(&self, x: u8, y: u8) -> bool {
        self.position.cell() == Some((x, y))
    }
}
