//! Wire vocabulary shared by the server and its clients.
//!
//! Enums are externally tagged so the same types travel unchanged through
//! both JSON and bincode.

use crate::card::{Card, Declaration};
use crate::error::ClueError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seat identifier, 1..=6 in join order.
pub type PlayerId = u32;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// Where a pawn stands: inside a room, or on a hallway cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PawnPosition {
    Room(Card),
    Hallway { x: u8, y: u8 },
}

impl PawnPosition {
    pub fn room(&self) -> Option<Card> {
        match self {
            PawnPosition::Room(room) => Some(*room),
            PawnPosition::Hallway { .. } => None,
        }
    }

    pub fn cell(&self) -> Option<(u8, u8)> {
        match self {
            PawnPosition::Room(_) => None,
            PawnPosition::Hallway { x, y } => Some((*x, *y)),
        }
    }
}

/// Destination of a single `move` request.
pub type MoveTarget = PawnPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Forming,
    NewTurn,
    Moving,
    Querying,
    TrySolution,
    Ended,
}

/// What a player did. The accompanying [`StateDelta`] says what changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    Start,
    RollDice { dice1: u8, dice2: u8 },
    MoveInHallway { x: u8, y: u8 },
    EnterRoom { room: Card },
    QuerySolution { character: Card, weapon: Card },
    NoCardToReveal,
    RevealCard { card: Option<Card> },
    DeclareSolution { declaration: Declaration },
    Pass,
    GameOver,
}

/// Fields of the game state touched by one record. Untouched fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    pub phase: Option<Phase>,
    pub current_player: Option<PlayerId>,
    pub dice: Option<(u8, u8)>,
    pub remaining_steps: Option<u8>,
    pub positions: Option<BTreeMap<PlayerId, PawnPosition>>,
    pub query: Option<Declaration>,
    pub revealer: Option<PlayerId>,
    pub revealed: Option<bool>,
    pub revealed_card: Option<Card>,
    pub failed_player: Option<PlayerId>,
    pub solution: Option<Declaration>,
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: PlayerId,
    /// Unix milliseconds.
    pub timestamp: u64,
    #[serde(rename = "move")]
    pub action: Move,
    pub delta: StateDelta,
}

/// Presence and setup state of one seat, as shown to co-players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub player_id: PlayerId,
    pub name: String,
    pub character: Option<Card>,
    pub online: bool,
}

/// Summary of a table the user sits at, sent on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSynopsis {
    pub game_id: String,
    pub my_player_id: PlayerId,
    pub players: Vec<UserState>,
    pub game: StateDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    SignIn { name: String, token: Option<String> },
    CreateGame,
    JoinGame { game_id: String },
    SelectChar { character: Card },
    VoteStart { vote: bool },
    RollDices,
    Move { target: MoveTarget },
    QuerySolution { character: Card, weapon: Card },
    Reveal { card: Option<Card> },
    DeclareSolution { declaration: Declaration },
    Pass,
}

impl Request {
    /// Message-kind tag, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::SignIn { .. } => "sign_in",
            Request::CreateGame => "create_game",
            Request::JoinGame { .. } => "join_game",
            Request::SelectChar { .. } => "select_char",
            Request::VoteStart { .. } => "vote_start",
            Request::RollDices => "roll_dices",
            Request::Move { .. } => "move",
            Request::QuerySolution { .. } => "query_solution",
            Request::Reveal { .. } => "reveal",
            Request::DeclareSolution { .. } => "declare_solution",
            Request::Pass => "pass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub req_id: u32,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMessage {
    SignInResponse {
        token: String,
        running_games: Vec<GameSynopsis>,
    },
    CreateGameResp {
        game_id: String,
        my_player_id: PlayerId,
    },
    JoinGameResp {
        players: Vec<UserState>,
        my_player_id: PlayerId,
    },
    Ack,
    NotifyUserState(UserState),
    NotifyGameStarted {
        players_order: Vec<PlayerId>,
        deck: Vec<Card>,
    },
    NotifyMoveRecord(MoveRecord),
    Error {
        code: ClueError,
    },
}

/// Outbound frame. `req_id` echoes the request it answers; broadcasts carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFrame {
    pub req_id: Option<u32>,
    pub message: ServerMessage,
}

impl ServerFrame {
    pub fn response(req_id: u32, message: ServerMessage) -> Self {
        Self {
            req_id: Some(req_id),
            message,
        }
    }

    pub fn notify(message: ServerMessage) -> Self {
        Self {
            req_id: None,
            message,
        }
    }
}
