//! # Clue Table Server Library
//!
//! This library is the authoritative server for a turn-based deduction board
//! game in the style of Cluedo. Two to six remote players sit at a table,
//! pick a suspect each, and race to name the room, weapon and suspect of the
//! hidden solution. The server holds the only true copy of every table and
//! enforces every rule; clients merely render what they are told.
//!
//! ## Core Responsibilities
//!
//! ### Rule Enforcement
//! Every request names an acting player and is validated against the board,
//! the phase and the turn before anything changes. A rejected request leaves
//! the game untouched and is answered with an error code sent only to the
//! requester.
//!
//! ### Hidden Information
//! Each player's hand and the solution are secret. A card shown in answer
//! to a query is visible only to the asker and the player who showed it.
//! Records are stored whole and redacted per recipient on the way out.
//!
//! ### Presence and Reconnection
//! Sign-in hands out a token. A player who drops can come back with that
//! token and gets the start notice with their hand, followed by the whole
//! history as they are allowed to see it.
//!
//! ## Architecture Design
//!
//! ### Single Processing Point
//! All users, tables and connection bindings live inside one [`hub::Hub`]
//! owned by one task. Connection tasks feed it through a bounded channel
//! and it processes one message at a time, so no state is ever shared
//! behind a lock.
//!
//! ### Per-Connection Workers
//! Each WebSocket gets a reader task and a writer task. The reader enforces
//! an inactivity deadline; the writer sends keepalive pings and bounds every
//! write. Outbound queues are bounded and filled with `try_send`, so a slow
//! client is disconnected instead of slowing down the table.
//!
//! ## Module Organization
//!
//! - `board`: static grid, door cells, secret passages, start squares
//! - `deck`: solution draw and dealing
//! - `player`, `game`: the turn and phase state machine
//! - `history`: append-only move log and per-viewer redaction
//! - `users`, `table`, `client_manager`: who is signed in, seated and connected
//! - `hub`: the processing point
//! - `connection`, `network`: WebSocket workers and the listener
//! - `config`: runtime settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use clue_server::config::ServerConfig;
//! use clue_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = Server::bind(ServerConfig {
//!         bind_addr: "127.0.0.1:8080".to_string(),
//!         ..ServerConfig::default()
//!     })
//!     .await?;
//!
//!     // Serves until Ctrl+C
//!     server.run().await
//! }
//! ```

pub mod board;
pub mod client_manager;
pub mod config;
pub mod connection;
pub mod deck;
pub mod game;
pub mod history;
pub mod hub;
pub mod network;
pub mod player;
pub mod table;
pub mod users;
pub mod utils;
