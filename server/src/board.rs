//! Static board of the mystery mansion
//!
//! The board is a 24x25 grid of walls and corridor cells. Rooms are not
//! cells: a pawn inside a room has no coordinates. A door cell is a corridor
//! cell in front of a room entrance, and is the only place a pawn can enter
//! or leave that room from. Four corner rooms are linked pairwise by secret
//! passages.

use clue_shared::Card;

pub const WIDTH: u8 = 24;
pub const HEIGHT: u8 = 25;

// '#' wall, '.' corridor, letters are door cells of the room they name:
// K kitchen, B ballroom, C conservatory, D dining room, I billiard room,
// L library, O lounge, H hall, S study.
const LAYOUT: [&str; HEIGHT as usize] = [
    "########################", // 00
    "#######...####...#######", // 01
    "######..########..######", // 02
    "######..########..######", // 03
    "######..########..######", // 04
    "######.B########B.######", // 05
    "######..########..C....#", // 06
    "....K...########.......#", // 07
    "#........B....B...######", // 08
    "#####............I######", // 09
    "########..#####...######", // 10
    "########..#####...######", // 11
    "########D.#####...######", // 12
    "########..#####.....L.I#", // 13
    "########..#####...######", // 14
    "########..#####..#######", // 15
    "#.....D...#####.L#######", // 16
    "#..........HH....#######", // 17
    "#.....O..######...######", // 18
    "#######..######........#", // 19
    "#######..######..S.....#", // 20
    "#######..######..#######", // 21
    "#######..######..#######", // 22
    "#######..######..#######", // 23
    "################.#######", // 24
];

const SECRET_PASSAGES: [(Card, Card); 2] = [
    (Card::Kitchen, Card::Study),
    (Card::Lounge, Card::Conservatory),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Corridor,
    /// Walkable corridor cell in front of the given room.
    Door(Card),
}

impl Cell {
    fn from_symbol(symbol: u8) -> Cell {
        match symbol {
            b'.' => Cell::Corridor,
            b'K' => Cell::Door(Card::Kitchen),
            b'B' => Cell::Door(Card::Ballroom),
            b'C' => Cell::Door(Card::Conservatory),
            b'D' => Cell::Door(Card::DiningRoom),
            b'I' => Cell::Door(Card::BilliardRoom),
            b'L' => Cell::Door(Card::Library),
            b'O' => Cell::Door(Card::Lounge),
            b'H' => Cell::Door(Card::Hall),
            b'S' => Cell::Door(Card::Study),
            _ => Cell::Wall,
        }
    }

    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall)
    }
}

pub fn in_bounds(x: i32, y: i32) -> bool {
    (0..WIDTH as i32).contains(&x) && (0..HEIGHT as i32).contains(&y)
}

/// Cell at the given coordinates, `None` when out of bounds.
pub fn cell(x: u8, y: u8) -> Option<Cell> {
    LAYOUT
        .get(y as usize)
        .and_then(|row| row.as_bytes().get(x as usize))
        .map(|symbol| Cell::from_symbol(*symbol))
}

pub fn is_walkable(x: u8, y: u8) -> bool {
    cell(x, y).map_or(false, Cell::is_walkable)
}

pub fn is_door_of(x: u8, y: u8, room: Card) -> bool {
    cell(x, y) == Some(Cell::Door(room))
}

/// Orthogonal neighbours, Manhattan distance exactly one.
pub fn are_adjacent(a: (u8, u8), b: (u8, u8)) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}

pub fn secret_passage(from: Card, to: Card) -> bool {
    SECRET_PASSAGES
        .iter()
        .any(|&(a, b)| (a, b) == (from, to) || (b, a) == (from, to))
}

/// Rim square a suspect's pawn starts on.
pub fn start_position(suspect: Card) -> Option<(u8, u8)> {
    match suspect {
        Card::MissScarlett => Some((7, 24)),
        Card::RevGreen => Some((14, 0)),
        Card::ColMustard => Some((0, 17)),
        Card::ProfPlum => Some((23, 19)),
        Card::MrsPeacock => Some((23, 7)),
        Card::MrsWhite => Some((9, 0)),
        _ => None,
    }
}
