//! Single serialized processing point
//!
//! The hub owns every user, table and connection binding. Connection tasks
//! never touch game state; they send [`HubMessage`]s into the hub's bounded
//! inbox and the hub handles one message at a time, start to finish.
//!
//! Replies and notifications are queued with `try_send`, one batch per
//! recipient per handled message, so a rejoin replay of any length costs a
//! single queue slot. A recipient whose outbound queue is full (or already
//! closed) is dropped after the current message: its sender is released,
//! its seat goes offline and co-players are told. A stuck client therefore
//! never holds up anyone else.

use crate::client_manager::{ClientManager, ConnectionId, FrameBatch};
use crate::config::ServerConfig;
use crate::game::Game;
use crate::history::as_view_of;
use crate::table::Table;
use crate::users::UserDirectory;
use crate::utils::{random_id, GAME_ID_LEN};
use clue_shared::{
    Card, ClueError, ClueResult, GameSynopsis, MoveRecord, PlayerId, Request, RequestFrame,
    ServerFrame, ServerMessage,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Messages from connection tasks and the listener to the hub
#[derive(Debug)]
pub enum HubMessage {
    Register {
        conn: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::Sender<FrameBatch>,
    },
    Unregister {
        conn: ConnectionId,
    },
    Request {
        conn: ConnectionId,
        frame: RequestFrame,
    },
    Shutdown,
}

type Outbox = Vec<(ConnectionId, ServerFrame)>;

pub struct Hub {
    clients: ClientManager,
    users: UserDirectory,
    tables: HashMap<String, Table>,
    rng: StdRng,
    max_games_per_user: usize,
    pending_drops: Vec<ConnectionId>,
}

impl Hub {
    pub fn new(config: &ServerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            clients: ClientManager::new(config.max_connections),
            users: UserDirectory::new(),
            tables: HashMap::new(),
            rng,
            max_games_per_user: config.max_games_per_user,
            pending_drops: Vec::new(),
        }
    }

    /// Drains the inbox until it closes or a shutdown arrives.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<HubMessage>) {
        info!("Hub running");
        while let Some(message) = inbox.recv().await {
            if !self.handle(message) {
                break;
            }
        }
        self.clients.clear();
        info!("Hub stopped");
    }

    /// Processes one message to completion. Returns false on shutdown.
    pub fn handle(&mut self, message: HubMessage) -> bool {
        match message {
            HubMessage::Register {
                conn,
                addr,
                outbound,
            } => {
                if !self.clients.add_client(conn, addr, outbound) {
                    warn!("Rejecting connection {} from {}: server full", conn, addr);
                }
            }
            HubMessage::Unregister { conn } => self.drop_connection(conn),
            HubMessage::Request { conn, frame } => self.handle_request(conn, frame),
            HubMessage::Shutdown => {
                info!("Hub shutting down, closing {} connections", self.clients.len());
                self.clients.clear();
                return false;
            }
        }

        self.flush_drops();
        true
    }

    pub fn table(&self, game_id: &str) -> Option<&Table> {
        self.tables.get(game_id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    fn handle_request(&mut self, conn: ConnectionId, frame: RequestFrame) {
        let RequestFrame { req_id, request } = frame;
        let kind = request.kind();
        debug!("Connection {} sent {} (req {})", conn, kind, req_id);

        let mut outbox = Outbox::new();
        if let Err(code) = self.process(conn, req_id, request, &mut outbox) {
            debug!("Rejected {} from connection {}: {}", kind, conn, code.code());
            outbox.push((
                conn,
                ServerFrame::response(req_id, ServerMessage::Error { code }),
            ));
        }
        self.deliver(outbox);
    }

    fn process(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        request: Request,
        outbox: &mut Outbox,
    ) -> ClueResult<()> {
        match request {
            Request::SignIn { name, token } => self.sign_in(conn, req_id, name, token, outbox),
            Request::CreateGame => self.create_game(conn, req_id, outbox),
            Request::JoinGame { game_id } => self.join_game(conn, req_id, &game_id, outbox),
            Request::SelectChar { character } => self.select_char(conn, req_id, character, outbox),
            Request::VoteStart { vote } => self.vote_start(conn, req_id, vote, outbox),
            Request::RollDices => self.play(conn, req_id, outbox, |game, me| {
                game.roll_dice(me).map(|record| vec![record])
            }),
            Request::Move { target } => self.play(conn, req_id, outbox, |game, me| {
                game.move_to(me, target).map(|record| vec![record])
            }),
            Request::QuerySolution { character, weapon } => {
                self.play(conn, req_id, outbox, |game, me| {
                    game.query_solution(me, character, weapon)
                        .map(|record| vec![record])
                })
            }
            Request::Reveal { card } => self.play(conn, req_id, outbox, |game, me| {
                game.reveal(me, card).map(|record| vec![record])
            }),
            Request::DeclareSolution { declaration } => {
                self.play(conn, req_id, outbox, |game, me| {
                    game.check_solution(me, declaration)
                })
            }
            Request::Pass => self.play(conn, req_id, outbox, |game, me| {
                game.pass(me).map(|record| vec![record])
            }),
        }
    }

    fn sign_in(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        name: String,
        token: Option<String>,
        outbox: &mut Outbox,
    ) -> ClueResult<()> {
        let client = self.clients.get(&conn).ok_or(ClueError::NotSignedIn)?;
        if client.user.is_some() {
            return Err(ClueError::AlreadySignedIn);
        }

        let token = match token {
            Some(token) => {
                self.users.authenticate(&token, &name)?;
                token
            }
            None => self.users.sign_in(&mut self.rng, &name),
        };

        let running_games = self.synopses(&token);
        if let Some(client) = self.clients.get_mut(&conn) {
            client.user = Some(token.clone());
        }
        info!(
            "{} signed in on connection {} with {} running games",
            name,
            conn,
            running_games.len()
        );

        outbox.push((
            conn,
            ServerFrame::response(
                req_id,
                ServerMessage::SignInResponse {
                    token,
                    running_games,
                },
            ),
        ));
        Ok(())
    }

    fn create_game(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        outbox: &mut Outbox,
    ) -> ClueResult<()> {
        let token = self.free_user(conn)?;
        let user = self.users.get(&token).ok_or(ClueError::UnknownToken)?;
        if user.games.len() >= self.max_games_per_user {
            return Err(ClueError::TooManyGames);
        }
        let name = user.name.clone();

        let game_id = self.new_game_id();
        let mut table = Table::new(game_id.clone(), StdRng::seed_from_u64(self.rng.gen()));
        let player_id = table.seat(&token, &name)?;
        table.connect(player_id, conn);
        self.tables.insert(game_id.clone(), table);
        self.bind(conn, &token, &game_id, player_id, true);
        info!("{} created game {}", name, game_id);

        outbox.push((
            conn,
            ServerFrame::response(
                req_id,
                ServerMessage::CreateGameResp {
                    game_id,
                    my_player_id: player_id,
                },
            ),
        ));
        Ok(())
    }

    /// Joins a table, or returns to the seat the user already holds there.
    ///
    /// The joiner first gets the seat list, then, for a running game, the
    /// start notice with their own hand and the whole history as they may
    /// see it. Only after that are the others told the seat is online.
    fn join_game(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        game_id: &str,
        outbox: &mut Outbox,
    ) -> ClueResult<()> {
        let token = self.free_user(conn)?;
        let game_id = game_id.trim().to_uppercase();
        let user = self.users.get(&token).ok_or(ClueError::UnknownToken)?;
        let name = user.name.clone();
        let existing = user.seat_at(&game_id);
        let games = user.games.len();

        let table = self
            .tables
            .get_mut(&game_id)
            .ok_or(ClueError::UnknownGame)?;
        let player_id = match existing {
            Some(player_id) => {
                if table
                    .get_seat(player_id)
                    .map_or(false, |seat| seat.connection.is_some())
                {
                    return Err(ClueError::AlreadyConnected);
                }
                player_id
            }
            None => {
                if games >= self.max_games_per_user {
                    return Err(ClueError::TooManyGames);
                }
                table.seat(&token, &name)?
            }
        };
        table.connect(player_id, conn);

        outbox.push((
            conn,
            ServerFrame::response(
                req_id,
                ServerMessage::JoinGameResp {
                    players: table.user_states(),
                    my_player_id: player_id,
                },
            ),
        ));
        if table.game.is_started() {
            outbox.push((conn, game_started(&table.game, player_id)));
            for record in table.game.history().view_for(player_id) {
                outbox.push((
                    conn,
                    ServerFrame::notify(ServerMessage::NotifyMoveRecord(record)),
                ));
            }
        }
        notify_presence(outbox, table, player_id, false);

        info!(
            "{} {} game {} as player {}",
            name,
            if existing.is_some() { "rejoined" } else { "joined" },
            game_id,
            player_id
        );
        self.bind(conn, &token, &game_id, player_id, existing.is_none());
        Ok(())
    }

    fn select_char(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        character: Card,
        outbox: &mut Outbox,
    ) -> ClueResult<()> {
        let (table, me) = self.bound_table(conn)?;
        let changed = table.game.select_character(me, character)?;

        outbox.push((conn, ack(req_id)));
        if changed {
            notify_presence(outbox, table, me, true);
        }
        Ok(())
    }

    fn vote_start(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        vote: bool,
        outbox: &mut Outbox,
    ) -> ClueResult<()> {
        let (table, me) = self.bound_table(conn)?;
        let started = table.game.vote_start(me, vote)?;

        outbox.push((conn, ack(req_id)));
        if let Some(record) = started {
            info!("Game {} started", table.id);
            for (member, member_conn) in table.connections() {
                outbox.push((member_conn, game_started(&table.game, member)));
                outbox.push((
                    member_conn,
                    ServerFrame::notify(ServerMessage::NotifyMoveRecord(as_view_of(
                        &record, member,
                    ))),
                ));
            }
        }
        Ok(())
    }

    /// Runs one game action for the seat bound to `conn` and fans the
    /// resulting records out to every online member.
    fn play<F>(
        &mut self,
        conn: ConnectionId,
        req_id: u32,
        outbox: &mut Outbox,
        action: F,
    ) -> ClueResult<()>
    where
        F: FnOnce(&mut Game, PlayerId) -> ClueResult<Vec<MoveRecord>>,
    {
        let (table, me) = self.bound_table(conn)?;
        let records = action(&mut table.game, me)?;

        outbox.push((conn, ack(req_id)));
        for record in &records {
            broadcast_record(outbox, table, record);
        }
        Ok(())
    }

    fn synopses(&self, token: &str) -> Vec<GameSynopsis> {
        let Some(user) = self.users.get(token) else {
            return Vec::new();
        };
        user.games
            .iter()
            .filter_map(|(game_id, player_id)| {
                let table = self.tables.get(game_id)?;
                Some(GameSynopsis {
                    game_id: game_id.clone(),
                    my_player_id: *player_id,
                    players: table.user_states(),
                    game: table.game.full_state(*player_id),
                })
            })
            .collect()
    }

    /// Token of the signed-in user on `conn`, which must not be playing yet.
    fn free_user(&self, conn: ConnectionId) -> ClueResult<String> {
        let client = self.clients.get(&conn).ok_or(ClueError::NotSignedIn)?;
        let token = client.user.clone().ok_or(ClueError::NotSignedIn)?;
        if client.table.is_some() {
            return Err(ClueError::AlreadyPlaying);
        }
        Ok(token)
    }

    fn bound_table(&mut self, conn: ConnectionId) -> ClueResult<(&mut Table, PlayerId)> {
        let client = self.clients.get(&conn).ok_or(ClueError::NotSignedIn)?;
        if client.user.is_none() {
            return Err(ClueError::NotSignedIn);
        }
        let (game_id, player_id) = client.table.clone().ok_or(ClueError::NotPlaying)?;
        let table = self
            .tables
            .get_mut(&game_id)
            .ok_or(ClueError::UnknownGame)?;
        Ok((table, player_id))
    }

    fn bind(
        &mut self,
        conn: ConnectionId,
        token: &str,
        game_id: &str,
        player_id: PlayerId,
        new_seat: bool,
    ) {
        if new_seat {
            if let Some(user) = self.users.get_mut(token) {
                user.games.push((game_id.to_string(), player_id));
            }
        }
        if let Some(client) = self.clients.get_mut(&conn) {
            client.table = Some((game_id.to_string(), player_id));
        }
    }

    fn new_game_id(&mut self) -> String {
        loop {
            let id = random_id(&mut self.rng, GAME_ID_LEN);
            if !self.tables.contains_key(&id) {
                return id;
            }
        }
    }

    fn deliver(&mut self, outbox: Outbox) {
        for (conn, frames) in batch_by_connection(outbox) {
            let Some(client) = self.clients.get(&conn) else {
                continue;
            };
            if !client.send(frames) && !self.pending_drops.contains(&conn) {
                warn!("Outbound queue of connection {} is full, dropping it", conn);
                self.pending_drops.push(conn);
            }
        }
    }

    fn flush_drops(&mut self) {
        while let Some(conn) = self.pending_drops.pop() {
            self.drop_connection(conn);
        }
    }

    /// Forgets a connection and takes its seat offline. The game itself is
    /// left untouched.
    fn drop_connection(&mut self, conn: ConnectionId) {
        let Some(client) = self.clients.remove_client(&conn) else {
            return;
        };
        let Some((game_id, player_id)) = client.table else {
            return;
        };
        let Some(table) = self.tables.get_mut(&game_id) else {
            return;
        };

        if table.disconnect(player_id, conn) {
            let mut outbox = Outbox::new();
            notify_presence(&mut outbox, table, player_id, false);
            self.deliver(outbox);
        }
    }
}

/// Groups frames per recipient, keeping first-appearance order of the
/// recipients and the original order within each batch.
fn batch_by_connection(outbox: Outbox) -> Vec<(ConnectionId, FrameBatch)> {
    let mut batches: Vec<(ConnectionId, FrameBatch)> = Vec::new();
    for (conn, frame) in outbox {
        match batches.iter_mut().find(|(id, _)| *id == conn) {
            Some((_, frames)) => frames.push(frame),
            None => batches.push((conn, vec![frame])),
        }
    }
    batches
}

fn ack(req_id: u32) -> ServerFrame {
    ServerFrame::response(req_id, ServerMessage::Ack)
}

fn game_started(game: &Game, viewer: PlayerId) -> ServerFrame {
    ServerFrame::notify(ServerMessage::NotifyGameStarted {
        players_order: game.turn_order(),
        deck: game.hand(viewer),
    })
}

/// Tells the table about `player_id`'s seat. `include_self` also tells the
/// player themselves.
fn notify_presence(outbox: &mut Outbox, table: &Table, player_id: PlayerId, include_self: bool) {
    let Some(state) = table.user_state(player_id) else {
        return;
    };
    for (member, conn) in table.connections() {
        if member != player_id || include_self {
            outbox.push((
                conn,
                ServerFrame::notify(ServerMessage::NotifyUserState(state.clone())),
            ));
        }
    }
}

fn broadcast_record(outbox: &mut Outbox, table: &Table, record: &MoveRecord) {
    for (member, conn) in table.connections() {
        outbox.push((
            conn,
            ServerFrame::notify(ServerMessage::NotifyMoveRecord(as_view_of(record, member))),
        ));
    }
}
