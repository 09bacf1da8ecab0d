//! Turn and phase state machine of one table
//!
//! A game goes `Forming -> NewTurn -> Moving -> Querying -> TrySolution`
//! and back to `NewTurn` until somebody names the solution or everybody but
//! one player has failed an accusation. Every mutating call names the acting
//! player, is validated in full before anything changes, and on success
//! returns the record(s) it appended to the history.

use crate::board;
use crate::deck;
use crate::history::History;
use crate::player::Player;
use crate::utils::get_timestamp;
use clue_shared::{
    Card, ClueError, ClueResult, Declaration, Move, MoveRecord, MoveTarget, PawnPosition, Phase,
    PlayerId, StateDelta, MAX_PLAYERS, MIN_PLAYERS,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

pub struct Game {
    phase: Phase,
    /// Seats in turn order once the game has started, join order before.
    players: Vec<Player>,
    current: usize,
    dice: (u8, u8),
    remaining_steps: u8,
    query: Option<Declaration>,
    /// Seat expected to answer the pending query.
    revealer: Option<usize>,
    revealed: bool,
    revealed_card: Option<Card>,
    revealed_by: Option<PlayerId>,
    solution: Option<Declaration>,
    history: History,
    rng: StdRng,
}

impl Game {
    pub fn new(rng: StdRng) -> Self {
        Self {
            phase: Phase::Forming,
            players: Vec::new(),
            current: 0,
            dice: (0, 0),
            remaining_steps: 0,
            query: None,
            revealer: None,
            revealed: false,
            revealed_card: None,
            revealed_by: None,
            solution: None,
            history: History::new(),
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::Forming
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        if self.is_started() {
            self.players.get(self.current).map(|p| p.id)
        } else {
            None
        }
    }

    pub fn revealer(&self) -> Option<PlayerId> {
        self.revealer.and_then(|seat| self.players.get(seat)).map(|p| p.id)
    }

    pub fn turn_order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn hand(&self, id: PlayerId) -> Vec<Card> {
        self.player(id).map(|p| p.hand.clone()).unwrap_or_default()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The hidden solution. Must never reach a client before the game ends.
    pub fn solution(&self) -> Option<Declaration> {
        self.solution
    }

    /// The player whose declaration matches the solution, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        let solution = self.solution?;
        self.players
            .iter()
            .find(|p| p.declaration == Some(solution))
            .map(|p| p.id)
    }

    pub fn positions(&self) -> BTreeMap<PlayerId, PawnPosition> {
        self.players.iter().map(|p| (p.id, p.position)).collect()
    }

    /// Seats a new player. Ids are handed out in join order starting at 1.
    pub fn add_player(&mut self) -> ClueResult<PlayerId> {
        if self.is_started() {
            return Err(ClueError::GameAlreadyStarted);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(ClueError::TableIsFull);
        }

        let id = self.players.len() as PlayerId + 1;
        self.players.push(Player::new(id));
        Ok(id)
    }

    /// Claims a suspect. Returns false when the player already had it.
    pub fn select_character(&mut self, me: PlayerId, character: Card) -> ClueResult<bool> {
        if self.is_started() {
            return Err(ClueError::GameAlreadyStarted);
        }
        let seat = self.seat_of(me)?;
        if !character.is_character() {
            return Err(ClueError::NotACharacter);
        }
        if self.players[seat].character == Some(character) {
            return Ok(false);
        }
        if self.players.iter().any(|p| p.character == Some(character)) {
            return Err(ClueError::AlreadySelected);
        }

        self.players[seat].character = Some(character);
        Ok(true)
    }

    /// Records a start vote. Once every seat has voted yes, with at least
    /// two seats, the game starts and the start record is returned.
    pub fn vote_start(&mut self, me: PlayerId, vote: bool) -> ClueResult<Option<MoveRecord>> {
        if self.is_started() {
            return Err(ClueError::GameAlreadyStarted);
        }
        let seat = self.seat_of(me)?;
        if self.players[seat].character.is_none() {
            return Err(ClueError::CharacterNotSelected);
        }

        self.players[seat].vote = vote;
        if self.players.len() >= MIN_PLAYERS && self.players.iter().all(|p| p.vote) {
            return self.start().map(Some);
        }
        Ok(None)
    }

    /// Shuffles the seats, deals and puts every pawn on its start square.
    pub fn start(&mut self) -> ClueResult<MoveRecord> {
        if self.is_started() {
            return Err(ClueError::GameAlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(ClueError::NotEnoughPlayers);
        }
        if self.players.iter().any(|p| p.character.is_none()) {
            return Err(ClueError::CharacterNotSelected);
        }

        self.players.shuffle(&mut self.rng);
        let deal = deck::deal(&mut self.rng, self.players.len());
        for (player, hand) in self.players.iter_mut().zip(deal.hands) {
            player.hand = hand;
            if let Some((x, y)) = player.character.and_then(board::start_position) {
                player.position = PawnPosition::Hallway { x, y };
            }
        }
        self.solution = Some(deal.solution);
        self.current = 0;
        self.phase = Phase::NewTurn;

        info!("Game started with turn order {:?}", self.turn_order());

        let first = self.players[0].id;
        let delta = StateDelta {
            phase: Some(Phase::NewTurn),
            current_player: Some(first),
            positions: Some(self.positions()),
            ..Default::default()
        };
        Ok(self.append(first, Move::Start, delta))
    }

    pub fn roll_dice(&mut self, me: PlayerId) -> ClueResult<MoveRecord> {
        self.ensure_turn(me, Phase::NewTurn)?;
        let dice1 = self.rng.gen_range(1..=6);
        let dice2 = self.rng.gen_range(1..=6);
        Ok(self.apply_roll(me, dice1, dice2))
    }

    fn apply_roll(&mut self, me: PlayerId, dice1: u8, dice2: u8) -> MoveRecord {
        self.dice = (dice1, dice2);
        self.remaining_steps = dice1 + dice2;
        self.phase = Phase::Moving;

        let delta = StateDelta {
            phase: Some(Phase::Moving),
            dice: Some(self.dice),
            remaining_steps: Some(self.remaining_steps),
            ..Default::default()
        };
        self.append(me, Move::RollDice { dice1, dice2 }, delta)
    }

    /// One step of movement, or entering a room.
    ///
    /// Stepping out of a room lands on one of its door cells. Rooms are
    /// entered from their door cell or, between linked corner rooms, through
    /// a secret passage. Entering a room ends movement; running out of steps
    /// in the hallway skips the query.
    pub fn move_to(&mut self, me: PlayerId, target: MoveTarget) -> ClueResult<MoveRecord> {
        let seat = self.ensure_turn(me, Phase::Moving)?;
        let here = self.players[seat].position;

        let (action, cost) = match (target, here) {
            (PawnPosition::Room(room), _) if !room.is_room() => {
                return Err(ClueError::NotARoom);
            }
            (PawnPosition::Room(room), PawnPosition::Room(current)) => {
                if room != current && !board::secret_passage(current, room) {
                    return Err(ClueError::IllegalMove);
                }
                (Move::EnterRoom { room }, 0)
            }
            (PawnPosition::Room(room), PawnPosition::Hallway { x, y }) => {
                if !board::is_door_of(x, y, room) {
                    return Err(ClueError::IllegalMove);
                }
                (Move::EnterRoom { room }, 0)
            }
            (PawnPosition::Hallway { x, y }, PawnPosition::Room(current)) => {
                if !board::is_door_of(x, y, current) || self.is_occupied(x, y) {
                    return Err(ClueError::IllegalMove);
                }
                (Move::MoveInHallway { x, y }, 1)
            }
            (PawnPosition::Hallway { x, y }, PawnPosition::Hallway { x: hx, y: hy }) => {
                if !board::are_adjacent((hx, hy), (x, y))
                    || !board::is_walkable(x, y)
                    || self.is_occupied(x, y)
                {
                    return Err(ClueError::IllegalMove);
                }
                (Move::MoveInHallway { x, y }, 1)
            }
        };

        let moved = target != here;
        self.players[seat].position = target;
        self.remaining_steps = self.remaining_steps.saturating_sub(cost);
        self.phase = match action {
            Move::EnterRoom { .. } => Phase::Querying,
            _ if self.remaining_steps == 0 => Phase::TrySolution,
            _ => Phase::Moving,
        };
        self.revealer = None;

        let delta = StateDelta {
            phase: Some(self.phase),
            remaining_steps: Some(self.remaining_steps),
            positions: moved.then(|| BTreeMap::from([(me, target)])),
            ..Default::default()
        };
        Ok(self.append(me, action, delta))
    }

    /// Suggests `character` with `weapon` in the room the asker stands in.
    ///
    /// The named suspect's pawn is dragged into that room. The next seat
    /// after the asker becomes the revealer. Players knocked out by a wrong
    /// accusation still hold cards, so they stay in the revealing order;
    /// only the turn rotation skips them.
    pub fn query_solution(
        &mut self,
        me: PlayerId,
        character: Card,
        weapon: Card,
    ) -> ClueResult<MoveRecord> {
        let seat = self.ensure_turn(me, Phase::Querying)?;
        if self.revealer.is_some() {
            return Err(ClueError::IllegalState);
        }
        let room = self.players[seat]
            .position
            .room()
            .ok_or(ClueError::NotInARoom)?;
        if !character.is_character() {
            return Err(ClueError::NotACharacter);
        }
        if !weapon.is_weapon() {
            return Err(ClueError::NotAWeapon);
        }

        let query = Declaration::new(room, weapon, character);
        self.query = Some(query);

        let mut moved = BTreeMap::new();
        if let Some(suspect) = self
            .players
            .iter_mut()
            .find(|p| p.character == Some(character))
        {
            if suspect.position != PawnPosition::Room(room) {
                suspect.position = PawnPosition::Room(room);
                moved.insert(suspect.id, suspect.position);
            }
        }

        let revealer = (seat + 1) % self.players.len();
        self.revealer = Some(revealer);

        let delta = StateDelta {
            phase: Some(Phase::Querying),
            query: Some(query),
            revealer: Some(self.players[revealer].id),
            positions: (!moved.is_empty()).then_some(moved),
            ..Default::default()
        };
        Ok(self.append(me, Move::QuerySolution { character, weapon }, delta))
    }

    /// Answers the pending query, either showing a card or declaring none.
    pub fn reveal(&mut self, me: PlayerId, card: Option<Card>) -> ClueResult<MoveRecord> {
        if self.phase != Phase::Querying {
            return Err(ClueError::IllegalState);
        }
        let seat = self.seat_of(me)?;
        let (revealer, query) = match (self.revealer, self.query) {
            (Some(revealer), Some(query)) => (revealer, query),
            _ => return Err(ClueError::IllegalState),
        };
        if seat != revealer {
            return Err(ClueError::NotTheRevealer);
        }
        let asker = self.players[self.current].id;

        match card {
            Some(card) => {
                if !self.players[seat].has_card(card) {
                    return Err(ClueError::NotYourCard);
                }
                if !query.contains(card) {
                    return Err(ClueError::CardNotQueried);
                }

                self.phase = Phase::TrySolution;
                self.revealer = None;
                self.revealed = true;
                self.revealed_card = Some(card);
                self.revealed_by = Some(me);

                // current_player names the asker, who may see the card
                let delta = StateDelta {
                    phase: Some(Phase::TrySolution),
                    current_player: Some(asker),
                    revealed: Some(true),
                    revealed_card: Some(card),
                    ..Default::default()
                };
                Ok(self.append(me, Move::RevealCard { card: Some(card) }, delta))
            }
            None => {
                if self.players[seat].can_refute(&query) {
                    return Err(ClueError::MustShowACard);
                }

                let next = (seat + 1) % self.players.len();
                let delta = if next == self.current {
                    self.phase = Phase::TrySolution;
                    self.revealer = None;
                    self.revealed = false;
                    self.revealed_card = None;
                    StateDelta {
                        phase: Some(Phase::TrySolution),
                        revealed: Some(false),
                        ..Default::default()
                    }
                } else {
                    self.revealer = Some(next);
                    StateDelta {
                        phase: Some(Phase::Querying),
                        revealer: Some(self.players[next].id),
                        ..Default::default()
                    }
                };
                Ok(self.append(me, Move::NoCardToReveal, delta))
            }
        }
    }

    /// Skips the query, or ends the turn.
    pub fn pass(&mut self, me: PlayerId) -> ClueResult<MoveRecord> {
        if !matches!(self.phase, Phase::Querying | Phase::TrySolution) {
            return Err(ClueError::IllegalState);
        }
        let seat = self.seat_of(me)?;
        if seat != self.current {
            return Err(ClueError::NotYourTurn);
        }

        let delta = if self.phase == Phase::Querying {
            if self.revealer.is_some() {
                return Err(ClueError::NotYourTurn);
            }
            self.phase = Phase::TrySolution;
            StateDelta {
                phase: Some(Phase::TrySolution),
                ..Default::default()
            }
        } else {
            self.advance_turn();
            StateDelta {
                phase: Some(Phase::NewTurn),
                current_player: Some(self.players[self.current].id),
                ..Default::default()
            }
        };
        Ok(self.append(me, Move::Pass, delta))
    }

    /// Accuses. A correct declaration wins; a wrong one knocks the player out
    /// of the rotation, and ends the game once at most one contender is left.
    pub fn check_solution(
        &mut self,
        me: PlayerId,
        declaration: Declaration,
    ) -> ClueResult<Vec<MoveRecord>> {
        let seat = self.ensure_turn(me, Phase::TrySolution)?;
        if !declaration.room.is_room() {
            return Err(ClueError::NotARoom);
        }
        if !declaration.weapon.is_weapon() {
            return Err(ClueError::NotAWeapon);
        }
        if !declaration.suspect.is_character() {
            return Err(ClueError::NotACharacter);
        }
        let solution = self.solution.ok_or(ClueError::IllegalState)?;

        self.players[seat].declaration = Some(declaration);
        let action = Move::DeclareSolution { declaration };

        if declaration == solution {
            self.phase = Phase::Ended;
            info!("Player {} solved the mystery", me);
            let delta = StateDelta {
                phase: Some(Phase::Ended),
                solution: Some(solution),
                winner: Some(me),
                ..Default::default()
            };
            return Ok(vec![self.append(me, action, delta)]);
        }

        self.advance_turn();
        let next = self.players[self.current].id;
        let mut records = vec![self.append(
            me,
            action,
            StateDelta {
                phase: Some(Phase::NewTurn),
                current_player: Some(next),
                failed_player: Some(me),
                ..Default::default()
            },
        )];

        if self.contenders() <= 1 {
            self.phase = Phase::Ended;
            info!("Game over, nobody solved the mystery");
            let delta = StateDelta {
                phase: Some(Phase::Ended),
                solution: Some(solution),
                ..Default::default()
            };
            records.push(self.append(next, Move::GameOver, delta));
        } else {
            debug!("Player {} failed, player {} is next", me, next);
        }

        Ok(records)
    }

    /// Snapshot of the game as `viewer` may see it.
    pub fn full_state(&self, viewer: PlayerId) -> StateDelta {
        let mut state = StateDelta {
            phase: Some(self.phase),
            ..Default::default()
        };

        match self.phase {
            Phase::Forming => {}
            Phase::Ended => {
                state.positions = Some(self.positions());
                state.solution = self.solution;
                state.winner = self.winner();
            }
            phase => {
                state.current_player = self.current_player();
                state.positions = Some(self.positions());
                match phase {
                    Phase::Moving => {
                        state.dice = Some(self.dice);
                        state.remaining_steps = Some(self.remaining_steps);
                    }
                    Phase::Querying => {
                        state.query = self.query;
                        state.revealer = self.revealer();
                    }
                    Phase::TrySolution => {
                        state.query = self.query;
                        state.revealed = Some(self.revealed);
                        if state.current_player == Some(viewer) || self.revealed_by == Some(viewer)
                        {
                            state.revealed_card = self.revealed_card;
                        }
                    }
                    _ => {}
                }
            }
        }

        state
    }

    fn seat_of(&self, id: PlayerId) -> ClueResult<usize> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(ClueError::NotPlaying)
    }

    /// Checks that the game is running, that `me` holds the turn and that
    /// the game is in `phase`. Returns the seat of `me`.
    fn ensure_turn(&self, me: PlayerId, phase: Phase) -> ClueResult<usize> {
        if matches!(self.phase, Phase::Forming | Phase::Ended) {
            return Err(ClueError::IllegalState);
        }
        let seat = self.seat_of(me)?;
        if seat != self.current {
            return Err(ClueError::NotYourTurn);
        }
        if self.phase != phase {
            return Err(ClueError::IllegalState);
        }
        Ok(seat)
    }

    fn is_failed(&self, seat: usize) -> bool {
        self.solution
            .map_or(false, |solution| self.players[seat].has_failed(&solution))
    }

    fn contenders(&self) -> usize {
        (0..self.players.len())
            .filter(|seat| !self.is_failed(*seat))
            .count()
    }

    fn is_occupied(&self, x: u8, y: u8) -> bool {
        self.players.iter().any(|p| p.occupies(x, y))
    }

    /// Hands the turn to the next seat still in the game and clears the
    /// per-turn state.
    fn advance_turn(&mut self) {
        let n = self.players.len();
        self.current = (1..=n)
            .map(|k| (self.current + k) % n)
            .find(|seat| !self.is_failed(*seat))
            .unwrap_or(self.current);
        self.phase = Phase::NewTurn;
        self.dice = (0, 0);
        self.remaining_steps = 0;
        self.query = None;
        self.revealer = None;
        self.revealed = false;
        self.revealed_card = None;
        self.revealed_by = None;
    }

    fn append(&mut self, player: PlayerId, action: Move, delta: StateDelta) -> MoveRecord {
        let record = MoveRecord {
            player,
            timestamp: get_timestamp(),
            action,
            delta,
        };
        self.history.push(record.clone());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::as_view_of;
    use rand::SeedableRng;
    use tokio_test::{assert_err, assert_ok};

    fn forming_game(players: usize) -> Game {
        let mut game = Game::new(StdRng::seed_from_u64(11));
        let suspects = Card::suspects();
        for suspect in suspects.iter().take(players) {
            let id = game.add_player().unwrap();
            game.select_character(id, *suspect).unwrap();
        }
        game
    }

    fn started_game(players: usize) -> Game {
        let mut game = forming_game(players);
        for id in 1..=players as PlayerId {
            game.vote_start(id, true).unwrap();
        }
        assert!(game.is_started());
        game
    }

    fn seat_id(game: &Game, seat: usize) -> PlayerId {
        game.players[seat].id
    }

    #[test]
    fn test_add_player_limits() {
        let mut game = Game::new(StdRng::seed_from_u64(1));
        for expected in 1..=6 {
            assert_eq!(game.add_player(), Ok(expected));
        }
        assert_eq!(game.add_player(), Err(ClueError::TableIsFull));
    }

    #[test]
    fn test_cannot_join_running_game() {
        let mut game = started_game(2);
        assert_eq!(game.add_player(), Err(ClueError::GameAlreadyStarted));
    }

    #[test]
    fn test_select_character() {
        let mut game = Game::new(StdRng::seed_from_u64(1));
        let a = game.add_player().unwrap();
        let b = game.add_player().unwrap();

        assert_eq!(game.select_character(a, Card::Rope), Err(ClueError::NotACharacter));
        assert_eq!(game.select_character(a, Card::ProfPlum), Ok(true));
        assert_eq!(game.select_character(a, Card::ProfPlum), Ok(false));
        assert_eq!(
            game.select_character(b, Card::ProfPlum),
            Err(ClueError::AlreadySelected)
        );
        assert_eq!(game.select_character(a, Card::MrsWhite), Ok(true));
        assert_eq!(game.select_character(b, Card::ProfPlum), Ok(true));
        assert_eq!(game.select_character(9, Card::RevGreen), Err(ClueError::NotPlaying));
    }

    #[test]
    fn test_vote_requires_character_and_two_players() {
        let mut game = Game::new(StdRng::seed_from_u64(1));
        let a = game.add_player().unwrap();
        assert_eq!(game.vote_start(a, true), Err(ClueError::CharacterNotSelected));

        game.select_character(a, Card::RevGreen).unwrap();
        assert_eq!(game.vote_start(a, true), Ok(None));
        assert!(!game.is_started());
        assert_eq!(game.start(), Err(ClueError::NotEnoughPlayers));

        let b = game.add_player().unwrap();
        game.select_character(b, Card::ColMustard).unwrap();
        let start = game.vote_start(b, true).unwrap().unwrap();
        assert_eq!(start.action, Move::Start);
        assert_eq!(game.phase(), Phase::NewTurn);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_three_player_start() {
        let game = started_game(3);
        assert_eq!(game.phase(), Phase::NewTurn);
        assert_eq!(game.current_player(), Some(game.turn_order()[0]));
        for player in game.players() {
            assert_eq!(player.hand.len(), 6);
            let (x, y) = board::start_position(player.character.unwrap()).unwrap();
            assert_eq!(player.position, PawnPosition::Hallway { x, y });
        }
        let start = game.history().last().unwrap();
        assert_eq!(start.delta.positions.as_ref().map(|p| p.len()), Some(3));
        assert!(game.solution().unwrap().is_well_formed());
    }

    #[test]
    fn test_roll_dice() {
        let mut game = started_game(2);
        let other = seat_id(&game, 1);
        let me = seat_id(&game, 0);

        assert_eq!(game.roll_dice(other), Err(ClueError::NotYourTurn));
        let record = game.roll_dice(me).unwrap();
        match record.action {
            Move::RollDice { dice1, dice2 } => {
                assert!((1..=6).contains(&dice1));
                assert!((1..=6).contains(&dice2));
                assert_eq!(record.delta.remaining_steps, Some(dice1 + dice2));
            }
            unexpected => panic!("unexpected move {unexpected:?}"),
        }
        assert_eq!(game.phase(), Phase::Moving);
        assert_eq!(game.roll_dice(me), Err(ClueError::IllegalState));
    }

    #[test]
    fn test_rejections_leave_history_alone() {
        let mut game = started_game(3);
        let (a, b) = (seat_id(&game, 0), seat_id(&game, 1));
        let before = game.history().len();

        assert_err!(game.roll_dice(b));
        assert_err!(game.pass(a));
        assert_err!(game.reveal(b, None));
        assert_err!(game.move_to(a, PawnPosition::Room(Card::Hall)));
        assert_eq!(game.history().len(), before);

        assert_ok!(game.roll_dice(a));
        assert_eq!(game.history().len(), before + 1);
    }

    #[test]
    fn test_seven_steps_skip_the_query() {
        let mut game = started_game(3);
        let me = seat_id(&game, 0);
        game.players[0].position = PawnPosition::Hallway { x: 7, y: 1 };
        game.apply_roll(me, 3, 4);

        for y in 2..=8 {
            let record = game.move_to(me, PawnPosition::Hallway { x: 7, y }).unwrap();
            assert_eq!(record.delta.remaining_steps, Some(8 - y));
        }
        assert_eq!(game.phase(), Phase::TrySolution);
        assert_eq!(
            game.query_solution(me, Card::RevGreen, Card::Rope),
            Err(ClueError::IllegalState)
        );
    }

    #[test]
    fn test_illegal_steps_change_nothing() {
        let mut game = started_game(2);
        let me = seat_id(&game, 0);
        game.players[0].position = PawnPosition::Hallway { x: 7, y: 1 };
        game.players[1].position = PawnPosition::Hallway { x: 7, y: 2 };
        game.apply_roll(me, 1, 1);
        let before = game.history().len();

        // occupied
        assert_eq!(
            game.move_to(me, PawnPosition::Hallway { x: 7, y: 2 }),
            Err(ClueError::IllegalMove)
        );
        // wall
        assert_eq!(
            game.move_to(me, PawnPosition::Hallway { x: 7, y: 0 }),
            Err(ClueError::IllegalMove)
        );
        // not adjacent
        assert_eq!(
            game.move_to(me, PawnPosition::Hallway { x: 9, y: 1 }),
            Err(ClueError::IllegalMove)
        );
        // off the board
        assert_eq!(
            game.move_to(me, PawnPosition::Hallway { x: 200, y: 1 }),
            Err(ClueError::IllegalMove)
        );
        // not in front of the kitchen door
        assert_eq!(
            game.move_to(me, PawnPosition::Room(Card::Kitchen)),
            Err(ClueError::IllegalMove)
        );
        assert_eq!(
            game.move_to(me, PawnPosition::Room(Card::Rope)),
            Err(ClueError::NotARoom)
        );

        assert_eq!(game.history().len(), before);
        assert_eq!(game.players[0].position, PawnPosition::Hallway { x: 7, y: 1 });
        assert_eq!(game.remaining_steps, 2);
    }

    #[test]
    fn test_enter_and_leave_rooms() {
        let mut game = started_game(2);
        let me = seat_id(&game, 0);
        game.players[0].position = PawnPosition::Hallway { x: 4, y: 7 };
        game.apply_roll(me, 2, 2);

        game.move_to(me, PawnPosition::Room(Card::Kitchen)).unwrap();
        assert_eq!(game.phase(), Phase::Querying);
        assert_eq!(game.remaining_steps, 4);

        // next turn, leave through the door
        game.phase = Phase::Moving;
        assert_eq!(
            game.move_to(me, PawnPosition::Hallway { x: 5, y: 7 }),
            Err(ClueError::IllegalMove)
        );
        let record = game.move_to(me, PawnPosition::Hallway { x: 4, y: 7 }).unwrap();
        assert_eq!(record.action, Move::MoveInHallway { x: 4, y: 7 });
        assert_eq!(game.remaining_steps, 3);
        assert_eq!(game.phase(), Phase::Moving);
    }

    #[test]
    fn test_secret_passage_and_staying() {
        let mut game = started_game(2);
        let me = seat_id(&game, 0);
        game.players[0].position = PawnPosition::Room(Card::Kitchen);
        game.apply_roll(me, 1, 2);

        assert_eq!(
            game.move_to(me, PawnPosition::Room(Card::Hall)),
            Err(ClueError::IllegalMove)
        );
        let record = game.move_to(me, PawnPosition::Room(Card::Study)).unwrap();
        assert_eq!(game.phase(), Phase::Querying);
        assert_eq!(
            record.delta.positions,
            Some(BTreeMap::from([(me, PawnPosition::Room(Card::Study))]))
        );

        game.phase = Phase::Moving;
        let record = game.move_to(me, PawnPosition::Room(Card::Study)).unwrap();
        assert_eq!(record.delta.positions, None);
        assert_eq!(game.phase(), Phase::Querying);
    }

    #[test]
    fn test_query_passes_to_second_revealer() {
        let mut game = started_game(3);
        let asker = seat_id(&game, 0);
        let second = seat_id(&game, 1);
        let third = seat_id(&game, 2);
        let suspect = game.players[1].character.unwrap();

        game.players[0].hand = vec![Card::Candlestick];
        game.players[1].hand = vec![Card::Knife];
        game.players[2].hand = vec![Card::Rope, Card::Hall];
        game.players[0].position = PawnPosition::Hallway { x: 4, y: 7 };
        game.apply_roll(asker, 3, 3);
        game.move_to(asker, PawnPosition::Room(Card::Kitchen)).unwrap();

        let query = game.query_solution(asker, suspect, Card::Rope).unwrap();
        assert_eq!(query.delta.revealer, Some(second));
        // the named suspect is dragged into the kitchen
        assert_eq!(game.players[1].position, PawnPosition::Room(Card::Kitchen));
        assert_eq!(
            query.delta.query,
            Some(Declaration::new(Card::Kitchen, Card::Rope, suspect))
        );

        assert_eq!(game.reveal(third, None), Err(ClueError::NotTheRevealer));
        assert_eq!(game.pass(asker), Err(ClueError::NotYourTurn));

        let none = game.reveal(second, None).unwrap();
        assert_eq!(none.action, Move::NoCardToReveal);
        assert_eq!(game.revealer(), Some(third));

        assert_eq!(game.reveal(third, None), Err(ClueError::MustShowACard));
        assert_eq!(
            game.reveal(third, Some(Card::Knife)),
            Err(ClueError::NotYourCard)
        );
        assert_eq!(
            game.reveal(third, Some(Card::Hall)),
            Err(ClueError::CardNotQueried)
        );

        let shown = game.reveal(third, Some(Card::Rope)).unwrap();
        assert_eq!(game.phase(), Phase::TrySolution);

        assert_eq!(as_view_of(&shown, asker).delta.revealed_card, Some(Card::Rope));
        assert_eq!(as_view_of(&shown, third).delta.revealed_card, Some(Card::Rope));
        let hidden = as_view_of(&shown, second);
        assert_eq!(hidden.delta.revealed_card, None);
        assert_eq!(hidden.action, Move::RevealCard { card: None });

        assert_eq!(game.full_state(asker).revealed_card, Some(Card::Rope));
        assert_eq!(game.full_state(third).revealed_card, Some(Card::Rope));
        assert_eq!(game.full_state(second).revealed_card, None);
    }

    #[test]
    fn test_nobody_can_reveal() {
        let mut game = started_game(2);
        let asker = seat_id(&game, 0);
        let other = seat_id(&game, 1);
        game.players[1].hand = vec![Card::Knife];
        game.players[0].position = PawnPosition::Room(Card::Hall);
        game.phase = Phase::Querying;

        game.query_solution(asker, Card::MrsWhite, Card::Rope).unwrap();
        let record = game.reveal(other, None).unwrap();
        assert_eq!(record.delta.phase, Some(Phase::TrySolution));
        assert_eq!(record.delta.revealed, Some(false));
        assert_eq!(game.revealer(), None);
    }

    #[test]
    fn test_query_needs_a_room() {
        let mut game = started_game(2);
        let me = seat_id(&game, 0);
        game.phase = Phase::Querying;
        assert_eq!(
            game.query_solution(me, Card::MrsWhite, Card::Rope),
            Err(ClueError::NotInARoom)
        );
        game.players[0].position = PawnPosition::Room(Card::Hall);
        assert_eq!(
            game.query_solution(me, Card::Rope, Card::Rope),
            Err(ClueError::NotACharacter)
        );
        assert_eq!(
            game.query_solution(me, Card::MrsWhite, Card::Hall),
            Err(ClueError::NotAWeapon)
        );
    }

    #[test]
    fn test_pass_rotates_turns() {
        let mut game = started_game(3);
        let first = seat_id(&game, 0);
        let second = seat_id(&game, 1);
        game.phase = Phase::Querying;

        let record = game.pass(first).unwrap();
        assert_eq!(record.delta.phase, Some(Phase::TrySolution));
        let record = game.pass(first).unwrap();
        assert_eq!(record.delta.phase, Some(Phase::NewTurn));
        assert_eq!(record.delta.current_player, Some(second));
        assert_eq!(game.current_player(), Some(second));

        assert_eq!(game.pass(second), Err(ClueError::IllegalState));
    }

    #[test]
    fn test_correct_accusation_wins() {
        let mut game = started_game(3);
        let me = seat_id(&game, 0);
        let solution = game.solution().unwrap();
        game.phase = Phase::TrySolution;

        let records = game.check_solution(me, solution).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].delta.phase, Some(Phase::Ended));
        assert_eq!(records[0].delta.winner, Some(me));
        assert_eq!(game.winner(), Some(me));
        assert_eq!(game.full_state(seat_id(&game, 2)).solution, Some(solution));
        assert_eq!(game.roll_dice(me), Err(ClueError::IllegalState));
        assert_eq!(game.pass(me), Err(ClueError::IllegalState));
    }

    fn wrong(solution: Declaration) -> Declaration {
        let room = Card::rooms()
            .into_iter()
            .find(|r| *r != solution.room)
            .unwrap();
        Declaration::new(room, solution.weapon, solution.suspect)
    }

    #[test]
    fn test_wrong_accusations_end_the_game() {
        let mut game = started_game(3);
        let solution = game.solution().unwrap();
        let (a, b, c) = (seat_id(&game, 0), seat_id(&game, 1), seat_id(&game, 2));

        game.phase = Phase::TrySolution;
        assert_eq!(
            game.check_solution(a, Declaration::new(Card::Rope, Card::Rope, Card::Rope)),
            Err(ClueError::NotARoom)
        );
        let records = game.check_solution(a, wrong(solution)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].delta.failed_player, Some(a));
        assert_eq!(records[0].delta.current_player, Some(b));
        assert_eq!(game.phase(), Phase::NewTurn);

        // b passes, c passes, rotation skips a
        game.phase = Phase::TrySolution;
        game.pass(b).unwrap();
        assert_eq!(game.current_player(), Some(c));
        game.phase = Phase::TrySolution;
        game.pass(c).unwrap();
        assert_eq!(game.current_player(), Some(b));

        game.phase = Phase::TrySolution;
        let records = game.check_solution(b, wrong(solution)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].action, Move::GameOver);
        assert_eq!(records[1].player, c);
        assert_eq!(records[1].delta.phase, Some(Phase::Ended));
        assert_eq!(records[1].delta.solution, Some(solution));
        assert_eq!(records[1].delta.winner, None);
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_failed_player_still_reveals() {
        let mut game = started_game(3);
        let solution = game.solution().unwrap();
        let (a, b) = (seat_id(&game, 0), seat_id(&game, 1));
        game.players[0].declaration = Some(wrong(solution));
        game.current = 2;
        let c = seat_id(&game, 2);
        game.players[2].position = PawnPosition::Room(Card::Lounge);
        game.phase = Phase::Querying;

        let record = game.query_solution(c, Card::ProfPlum, Card::Wrench).unwrap();
        assert_eq!(record.delta.revealer, Some(a));
        assert_ne!(record.delta.revealer, Some(b));
    }

    #[test]
    fn test_full_state_per_phase() {
        let mut game = forming_game(2);
        assert_eq!(game.full_state(1).phase, Some(Phase::Forming));
        assert_eq!(game.full_state(1).positions, None);

        game.start().unwrap();
        let me = seat_id(&game, 0);
        let state = game.full_state(me);
        assert_eq!(state.current_player, Some(me));
        assert_eq!(state.positions.map(|p| p.len()), Some(2));
        assert_eq!(state.solution, None);

        game.apply_roll(me, 5, 6);
        let state = game.full_state(me);
        assert_eq!(state.dice, Some((5, 6)));
        assert_eq!(state.remaining_steps, Some(11));
    }
}
