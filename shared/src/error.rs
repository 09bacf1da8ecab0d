//! Rejection codes returned to the requesting client.
//!
//! Every variant is an expected outcome of a rule check. The snake_case
//! serde name is the code that travels in an `error` frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueError {
    // Session
    #[error("sign in first")]
    NotSignedIn,
    #[error("unknown token")]
    UnknownToken,
    #[error("token belongs to another user")]
    TokenMismatch,
    #[error("connection already signed in")]
    AlreadySignedIn,

    // Table membership
    #[error("table is full")]
    TableIsFull,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("unknown game")]
    UnknownGame,
    #[error("already playing at a table")]
    AlreadyPlaying,
    #[error("seat already has a live connection")]
    AlreadyConnected,
    #[error("too many games for this user")]
    TooManyGames,
    #[error("not seated at a table")]
    NotPlaying,

    // Setup
    #[error("character already taken")]
    AlreadySelected,
    #[error("card is not a character")]
    NotACharacter,
    #[error("select a character first")]
    CharacterNotSelected,
    #[error("not enough players")]
    NotEnoughPlayers,

    // Turn
    #[error("not your turn")]
    NotYourTurn,
    #[error("you are not the one revealing")]
    NotTheRevealer,
    #[error("illegal in the current state")]
    IllegalState,

    // Move legality
    #[error("illegal move")]
    IllegalMove,
    #[error("not in a room")]
    NotInARoom,
    #[error("card is not a weapon")]
    NotAWeapon,
    #[error("card is not a room")]
    NotARoom,

    // Reveal integrity
    #[error("card is not in your hand")]
    NotYourCard,
    #[error("card was not part of the query")]
    CardNotQueried,
    #[error("you hold a queried card and must show it")]
    MustShowACard,
}

impl ClueError {
    /// Wire code of the error, e.g. `not_your_turn`.
    pub fn code(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }
}

pub type ClueResult<T> = Result<T, ClueError>;
