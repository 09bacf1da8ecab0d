//! One game table: the state machine plus who sits where and who is online.

use crate::client_manager::ConnectionId;
use crate::game::Game;
use clue_shared::{ClueResult, PlayerId, UserState};
use rand::rngs::StdRng;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Seat {
    pub token: String,
    pub name: String,
    pub connection: Option<ConnectionId>,
}

pub struct Table {
    pub id: String,
    pub game: Game,
    seats: BTreeMap<PlayerId, Seat>,
}

impl Table {
    pub fn new(id: String, rng: StdRng) -> Self {
        Self {
            id,
            game: Game::new(rng),
            seats: BTreeMap::new(),
        }
    }

    /// Seats a user at the table. The seat starts offline.
    pub fn seat(&mut self, token: &str, name: &str) -> ClueResult<PlayerId> {
        let player_id = self.game.add_player()?;
        self.seats.insert(
            player_id,
            Seat {
                token: token.to_string(),
                name: name.to_string(),
                connection: None,
            },
        );
        Ok(player_id)
    }

    pub fn get_seat(&self, player_id: PlayerId) -> Option<&Seat> {
        self.seats.get(&player_id)
    }

    pub fn connect(&mut self, player_id: PlayerId, connection: ConnectionId) {
        if let Some(seat) = self.seats.get_mut(&player_id) {
            seat.connection = Some(connection);
        }
    }

    /// Marks the seat offline if `connection` is still the one bound to it.
    pub fn disconnect(&mut self, player_id: PlayerId, connection: ConnectionId) -> bool {
        match self.seats.get_mut(&player_id) {
            Some(seat) if seat.connection == Some(connection) => {
                seat.connection = None;
                true
            }
            _ => false,
        }
    }

    pub fn user_state(&self, player_id: PlayerId) -> Option<UserState> {
        let seat = self.seats.get(&player_id)?;
        Some(UserState {
            player_id,
            name: seat.name.clone(),
            character: self.game.player(player_id).and_then(|p| p.character),
            online: seat.connection.is_some(),
        })
    }

    pub fn user_states(&self) -> Vec<UserState> {
        self.seats
            .keys()
            .filter_map(|player_id| self.user_state(*player_id))
            .collect()
    }

    /// Online seats and their connections.
    pub fn connections(&self) -> Vec<(PlayerId, ConnectionId)> {
        self.seats
            .iter()
            .filter_map(|(player_id, seat)| seat.connection.map(|conn| (*player_id, conn)))
            .collect()
    }
}
