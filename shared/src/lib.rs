//! Types shared by the Clue table server and its clients: the card set,
//! request and notification frames, error codes and the frame codec.

pub mod card;
pub mod codec;
pub mod error;
pub mod protocol;

pub use card::{Card, CardKind, Declaration, DECK_SIZE};
pub use codec::{CodecError, WireFormat};
pub use error::{ClueError, ClueResult};
pub use protocol::{
    GameSynopsis, Move, MoveRecord, MoveTarget, PawnPosition, Phase, PlayerId, Request,
    RequestFrame, ServerFrame, ServerMessage, StateDelta, UserState, MAX_PLAYERS, MIN_PLAYERS,
};
