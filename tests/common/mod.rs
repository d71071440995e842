//! Deterministic engine core used by the integration tests.
//!
//! The engine plays by a simplified rulebook (own piece on the source, no own
//! piece on the destination, drops from hand onto empty squares, pawns step
//! one rank forward) and searches
//! according to a [`SearchPlan`] chosen by the test. Everything it is told is
//! recorded in a shared [`Probe`] the test can inspect while the engine is
//! owned by the session manager.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use shogi_session::board::{BoardState, Move, Piece, PieceKind, Position, Side, Square};
use shogi_session::engine::{
    EngineCommand, EngineCore, EngineError, GameStatus, MoveFlags, SearchError, SearchLimits,
};
use shogi_session::session::{GameSetup, InstanceId, SessionConfig, SessionManager};
use shogi_session::sync::AbortSignal;

/// How the next searches behave.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchPlan {
    /// Step the first own piece (in square order) one rank forward
    #[default]
    FirstMove,
    /// Report that every move leaves the king capturable
    KingHang,
    /// Fail with the given diagnostic
    Fail(String),
    /// Set the resigned flag and return the null move
    Resign,
    /// The game is already over with these flags; return the null move
    Finished(GameStatus),
    /// Spin until the abort signal is raised, then return the null move
    UntilAborted,
}

/// Script and observations shared between a test and its engine.
#[derive(Debug, Default)]
pub struct Probe {
    pub plan: SearchPlan,
    /// Flags raised after each successful move
    pub status_after_move: GameStatus,
    pub init_error: Option<String>,

    pub init_calls: usize,
    pub new_games: usize,
    pub commands: Vec<EngineCommand>,
    pub limits: Option<SearchLimits>,
    pub workers: Option<usize>,
    pub clocks: Option<(u32, u32)>,
    pub searches_started: usize,
    pub saw_abort: bool,
    pub human_moves: usize,
}

pub type SharedProbe = Arc<Mutex<Probe>>;

pub struct ScriptedEngine {
    position: Position,
    history: Vec<Position>,
    status: GameStatus,
    probe: SharedProbe,
}

impl ScriptedEngine {
    pub fn new() -> (Self, SharedProbe) {
        let probe = SharedProbe::default();
        let engine = ScriptedEngine {
            position: Position::default(),
            history: Vec::new(),
            status: GameStatus::NONE,
            probe: Arc::clone(&probe),
        };
        (engine, probe)
    }

    fn apply(&mut self, mv: Move) -> Result<(), EngineError> {
        let mover = self.position.turn;
        let to = mv.to().ok_or_else(|| EngineError::new("move has no destination"))?;
        let kind = mv
            .piece_after()
            .ok_or_else(|| EngineError::new("move has no piece"))?;
        let mut next = self.position.board.clone();

        if mv.is_drop() {
            let base = mv.piece().ok_or_else(|| EngineError::new("drop has no piece"))?;
            if next.piece_at(to).is_some() {
                return Err(EngineError::new("drop onto occupied square"));
            }
            let hand = next
                .hand(mover)
                .with_removed(base)
                .ok_or_else(|| EngineError::new("piece not in hand"))?;
            next.set_hand(mover, hand);
        } else {
            let from = mv.from().ok_or_else(|| EngineError::new("move has no source"))?;
            match next.piece_at(from) {
                Some(piece) if piece.side == mover => {}
                _ => return Err(EngineError::new("no own piece on source")),
            }
            if mv.piece() == Some(PieceKind::Pawn) && !steps_forward(mover, from, to) {
                return Err(EngineError::new("pawn must step one rank forward"));
            }
            match next.piece_at(to) {
                Some(piece) if piece.side == mover => {
                    return Err(EngineError::new("own piece on destination"));
                }
                Some(piece) => {
                    let hand = next
                        .hand(mover)
                        .with_added(piece.kind)
                        .ok_or_else(|| EngineError::new("hand overflow"))?;
                    next.set_hand(mover, hand);
                }
                None => {}
            }
            next.set(from, None);
        }
        next.set(to, Some(Piece::new(mover, kind)));

        self.history.push(self.position.clone());
        self.position = Position::new(next, mover.opponent());
        self.status = self.status.union(self.probe.lock().status_after_move);
        Ok(())
    }

    fn first_move(&self) -> Option<Move> {
        let turn = self.position.turn;
        let board = &self.position.board;
        (0..81).filter_map(Square::from_index).find_map(|from| {
            let piece = board.piece_at(from).filter(|p| p.side == turn)?;
            let rank = match turn {
                Side::Black => from.rank().checked_sub(1)?,
                Side::White => from.rank() + 1,
            };
            let to = Square::new(from.file(), rank)?;
            let captured = board.piece_at(to);
            if captured.is_some_and(|p| p.side == turn) {
                return None;
            }
            Some(Move::board_move(
                from,
                to,
                piece.kind,
                captured.map(|p| p.kind),
                false,
            ))
        })
    }
}

fn steps_forward(side: Side, from: Square, to: Square) -> bool {
    let ahead = match side {
        Side::Black => from.rank().checked_sub(1),
        Side::White => Some(from.rank() + 1),
    };
    from.file() == to.file() && ahead == Some(to.rank())
}

impl EngineCore for ScriptedEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        let mut probe = self.probe.lock();
        probe.init_calls += 1;
        match &probe.init_error {
            Some(message) => Err(EngineError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn new_game(&mut self, position: &Position) -> Result<(), EngineError> {
        self.probe.lock().new_games += 1;
        self.position = position.clone();
        self.history.clear();
        self.status = GameStatus::NONE;
        Ok(())
    }

    fn command(&mut self, command: EngineCommand) -> Result<(), EngineError> {
        self.probe.lock().commands.push(command);
        Ok(())
    }

    fn set_limits(&mut self, limits: &SearchLimits) {
        self.probe.lock().limits = Some(*limits);
    }

    fn set_workers(&mut self, workers: usize) {
        self.probe.lock().workers = Some(workers);
    }

    fn make_move(&mut self, mv: Move, flags: MoveFlags) -> Result<(), EngineError> {
        if flags == MoveFlags::HUMAN_MOVE {
            self.probe.lock().human_moves += 1;
        }
        self.apply(mv)
    }

    fn unmake_move(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.position = previous;
            self.status = GameStatus::NONE;
        }
    }

    fn search(&mut self, abort: &AbortSignal) -> Result<Move, SearchError> {
        let plan = {
            let mut probe = self.probe.lock();
            probe.searches_started += 1;
            probe.plan.clone()
        };
        match plan {
            SearchPlan::FirstMove => {
                let mv = self.first_move().ok_or(SearchError::KingHang)?;
                self.apply(mv)?;
                Ok(mv)
            }
            SearchPlan::KingHang => Err(SearchError::KingHang),
            SearchPlan::Fail(message) => Err(EngineError::new(message).into()),
            SearchPlan::Resign => {
                self.status = self.status.union(GameStatus::RESIGNED);
                Ok(Move::null())
            }
            SearchPlan::Finished(flags) => {
                self.status = flags;
                Ok(Move::null())
            }
            SearchPlan::UntilAborted => {
                while !abort.is_raised() {
                    thread::sleep(Duration::from_millis(1));
                }
                self.probe.lock().saw_abort = true;
                Ok(Move::null())
            }
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn board(&self) -> BoardState {
        self.position.board.clone()
    }

    fn turn(&self) -> Side {
        self.position.turn
    }

    fn reset_time(&mut self, black_secs: u32, white_secs: u32) {
        self.probe.lock().clocks = Some((black_secs, white_secs));
    }
}

/// An initialized manager around a fresh scripted engine.
pub fn ready_manager() -> (SessionManager<ScriptedEngine>, SharedProbe) {
    let (engine, probe) = ScriptedEngine::new();
    let manager = SessionManager::new(engine, SessionConfig::default());
    manager.initialize();
    (manager, probe)
}

/// Start a new game from the initial position and return its id.
pub fn new_game(manager: &SessionManager<ScriptedEngine>, difficulty: u32) -> InstanceId {
    let started = manager.start(
        InstanceId::NONE,
        &GameSetup::new(Position::default(), difficulty),
    );
    assert!(started.outcome.is_ok(), "{:?}", started.outcome);
    started.instance_id.expect("started game has an id")
}
