//! Signed-in users, keyed by their reconnection token.
//!
//! A token is handed out on first sign-in. Presenting it again from a new
//! connection re-attaches the same user, with every table they sit at.

use crate::utils::{random_id, TOKEN_LEN};
use clue_shared::{ClueError, ClueResult, PlayerId};
use rand::Rng;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct User {
    pub token: String,
    pub name: String,
    /// Tables the user sits at: game id and seat.
    pub games: Vec<(String, PlayerId)>,
}

impl User {
    pub fn seat_at(&self, game_id: &str) -> Option<PlayerId> {
        self.games
            .iter()
            .find(|(id, _)| id == game_id)
            .map(|(_, seat)| *seat)
    }
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user under a fresh token.
    pub fn sign_in<R: Rng + ?Sized>(&mut self, rng: &mut R, name: &str) -> String {
        let mut token = random_id(rng, TOKEN_LEN);
        while self.users.contains_key(&token) {
            token = random_id(rng, TOKEN_LEN);
        }
        self.users.insert(
            token.clone(),
            User {
                token: token.clone(),
                name: name.to_string(),
                games: Vec::new(),
            },
        );
        token
    }

    /// Looks up a returning user. A known token under another name is rejected.
    pub fn authenticate(&mut self, token: &str, name: &str) -> ClueResult<&mut User> {
        let user = self.users.get_mut(token).ok_or(ClueError::UnknownToken)?;
        if user.name != name {
            return Err(ClueError::TokenMismatch);
        }
        Ok(user)
    }

    pub fn get(&self, token: &str) -> Option<&User> {
        self.users.get(token)
    }

    pub fn get_mut(&mut self, token: &str) -> Option<&mut User> {
        self.users.get_mut(token)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
