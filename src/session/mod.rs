//! Session manager: the single engine instance shared between a UI thread
//! and a computation thread.
//!
//! Every operation except [`SessionManager::abort`] runs under one mutex for
//! its full duration, so operations from different threads are totally
//! ordered. Each game started gets a fresh, strictly increasing instance id;
//! operations carrying an older id are rejected with
//! [`Status::InstanceSuperseded`] without touching the engine. The id check
//! and the mutation it guards happen under the same lock acquisition.
//!
//! # Example
//! ```ignore
//! let manager = SessionManager::new(engine, SessionConfig::default());
//! manager.initialize();
//! let started = manager.start(InstanceId::NONE, &GameSetup::new(Position::default(), 2));
//! let id = started.instance_id.unwrap();
//! let outcome = manager.human_move(id, "7776FU");
//! let reply = manager.computer_move(id);
//! ```

mod config;
mod outcome;

use std::fmt;

use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::{BoardState, Position};
use crate::engine::{EngineCore, MoveFlags, SearchError, SearchLimits};
use crate::sync::AbortSignal;

pub use config::{SessionConfig, DEFAULT_MAX_WORKERS};
pub use outcome::{Outcome, PlayedMove, Status};

/// Report an impossible internal state and abort the process.
///
/// Reserved for states that cannot arise unless the engine instance is
/// already corrupt; domain failures are reported through [`Status`] instead.
#[cold]
pub(crate) fn invariant_violation(args: fmt::Arguments<'_>) -> ! {
    log::error!("Aborted: invariant violation: {args}");
    std::process::abort()
}

/// Identifier of a game session. `0` means "no session".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceId(u32);

impl InstanceId {
    /// No session; passing it to `start` forces a new game
    pub const NONE: InstanceId = InstanceId(0);

    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        InstanceId(id)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for starting a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSetup {
    /// Initial board and side to move
    pub position: Position,
    /// Difficulty level (0 weakest; 4 and above search to the maximum depth)
    pub difficulty: u32,
    /// Requested search worker threads (clamped by the session config)
    pub workers: usize,
    /// Total think time for the game, in seconds
    pub total_time_secs: u32,
    /// Think time per move, in seconds
    pub per_turn_time_secs: u32,
}

impl GameSetup {
    /// A setup using the think-time budget for `difficulty` and one worker.
    #[must_use]
    pub fn new(position: Position, difficulty: u32) -> Self {
        let (total_time_secs, per_turn_time_secs) = crate::engine::think_time_for(difficulty);
        GameSetup {
            position,
            difficulty,
            workers: 1,
            total_time_secs,
            per_turn_time_secs,
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_think_time(mut self, total_time_secs: u32, per_turn_time_secs: u32) -> Self {
        self.total_time_secs = total_time_secs;
        self.per_turn_time_secs = per_turn_time_secs;
        self
    }
}

/// Result of [`SessionManager::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    /// The new or resumed session; `None` when setup had not succeeded
    pub instance_id: Option<InstanceId>,
    pub outcome: Outcome,
}

/// One-time engine setup state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Setup {
    Pending,
    Ready,
    Failed(String),
}

/// Everything guarded by the session lock.
struct Session<E> {
    engine: E,
    setup: Setup,
    instance_id: InstanceId,
    limits: Option<SearchLimits>,
}

impl<E: EngineCore> Session<E> {
    /// Reject an operation addressed to a session other than the live one.
    fn superseded(&self, label: &str, instance_id: InstanceId) -> Option<Outcome> {
        if instance_id == self.instance_id {
            return None;
        }
        log::debug!(
            "{label}: instance {instance_id} superseded by {}",
            self.instance_id
        );
        Some(Outcome::rejected(
            Status::InstanceSuperseded,
            "Another game already started",
        ))
    }
}

/// Owner of the single engine instance and its session identity.
pub struct SessionManager<E> {
    session: Mutex<Session<E>>,
    abort: AbortSignal,
    config: SessionConfig,
}

impl<E: EngineCore> SessionManager<E> {
    /// Wrap `engine`. No game is live until [`initialize`](Self::initialize)
    /// and [`start`](Self::start) succeed.
    pub fn new(engine: E, config: SessionConfig) -> Self {
        SessionManager {
            session: Mutex::new(Session {
                engine,
                setup: Setup::Pending,
                instance_id: InstanceId::NONE,
                limits: None,
            }),
            abort: AbortSignal::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the engine's one-time setup. Later calls do nothing.
    ///
    /// A failure is remembered and reported by every subsequent `start`.
    pub fn initialize(&self) {
        // Stop any stale search before waiting for the lock.
        self.abort.raise();
        let mut session = self.session.lock();
        if session.setup != Setup::Pending {
            return;
        }
        log::debug!("Start initializing engine");
        session.setup = match session.engine.initialize() {
            Ok(()) => Setup::Ready,
            Err(err) => {
                log::warn!("Engine initialization failed: {err}");
                Setup::Failed(format!("Failed to initialize engine: {err}"))
            }
        };
        log::debug!("Initialized engine");
    }

    /// Start a new game, or resume the live one when `resume` names it.
    ///
    /// Resuming performs no initialization. A new game gets a strictly greater
    /// id than any before it, a fresh engine position and difficulty limits.
    /// Either way the outcome carries the current board.
    pub fn start(&self, resume: InstanceId, setup: &GameSetup) -> Started {
        let mut session = self.session.lock();
        match &session.setup {
            Setup::Pending => {
                return Started {
                    instance_id: None,
                    outcome: Outcome::rejected(
                        Status::InitializationError,
                        "engine not yet initialized",
                    ),
                };
            }
            Setup::Failed(message) => {
                return Started {
                    instance_id: None,
                    outcome: Outcome::rejected(Status::InitializationError, message.clone()),
                };
            }
            Setup::Ready => {}
        }

        if !resume.is_none() && resume == session.instance_id {
            log::debug!("Resuming game {resume}");
        } else {
            let Some(next) = session.instance_id.get().checked_add(1) else {
                invariant_violation(format_args!("instance id space exhausted"));
            };
            session.instance_id = InstanceId(next);
            log::debug!(
                "Starting game {next}: difficulty={} total={}s per_turn={}s",
                setup.difficulty,
                setup.total_time_secs,
                setup.per_turn_time_secs
            );

            if let Err(err) = session.engine.new_game(&setup.position) {
                invariant_violation(format_args!("failed to initialize game: {err}"));
            }
            let policy = self.config.difficulty_policy();
            let limits = match policy.apply(
                &mut session.engine,
                setup.difficulty,
                setup.total_time_secs,
                setup.per_turn_time_secs,
            ) {
                Ok(limits) => limits,
                Err(err) => {
                    invariant_violation(format_args!("engine rejected configuration: {err}"))
                }
            };
            session.limits = Some(limits);

            let workers = self.config.workers(setup.workers);
            session.engine.set_workers(workers);
            log::debug!("Workers {workers}");
        }

        let instance_id = session.instance_id;
        let outcome = Outcome::report("Init", &session.engine, Status::Ok, None, None);
        Started {
            instance_id: Some(instance_id),
            outcome,
        }
    }

    /// Apply a human move given in CSA notation.
    pub fn human_move(&self, instance_id: InstanceId, notation: &str) -> Outcome {
        let mut session = self.session.lock();
        if let Some(rejected) = session.superseded("Human", instance_id) {
            return rejected;
        }

        let turn = session.engine.turn();
        let mv = match session.engine.board().parse_csa_move(turn, notation) {
            Ok(mv) => mv,
            Err(err) => {
                log::debug!("Failed to parse move: {notation}: {err}");
                return Outcome::report(
                    "Human",
                    &session.engine,
                    Status::IllegalMove,
                    Some(err.to_string()),
                    None,
                );
            }
        };

        if let Err(err) = session.engine.make_move(mv, MoveFlags::HUMAN_MOVE) {
            log::debug!("Failed to make move: {notation}: {err}");
            return Outcome::report(
                "Human",
                &session.engine,
                Status::IllegalMove,
                Some(err.to_string()),
                None,
            );
        }

        let played = PlayedMove::new(mv);
        log::debug!("Human: {}", played.notation);
        let status = Status::from_game_status(session.engine.status());
        Outcome::report("Human", &session.engine, status, None, Some(played))
    }

    /// Let the engine search and play a move under the session's limits.
    ///
    /// Holds the session lock for the whole search; [`abort`](Self::abort)
    /// is the only way to cut it short. An abort raised after this call was
    /// made stops the search, even if the call was still waiting for the lock.
    pub fn computer_move(&self, instance_id: InstanceId) -> Outcome {
        // Aborts from before this call are stale; those raised while waiting
        // for the lock still apply.
        let requested = self.abort.epoch();
        let mut session = self.session.lock();
        if let Some(rejected) = session.superseded("Computer", instance_id) {
            return rejected;
        }

        if !self.abort.rearm(requested) {
            log::debug!("Computer: aborted while waiting for the session");
        }
        let mv = match session.engine.search(&self.abort) {
            Ok(mv) => mv,
            Err(SearchError::KingHang) => {
                log::debug!("Computer: no move keeps the king safe");
                return Outcome::report(
                    "Computer",
                    &session.engine,
                    Status::NoValidMove,
                    None,
                    None,
                );
            }
            Err(SearchError::Failed(err)) => {
                log::warn!("Computer: search failed: {err}");
                return Outcome::report(
                    "Computer",
                    &session.engine,
                    Status::FatalError,
                    Some(err.message().to_string()),
                    None,
                );
            }
        };

        // The null move means the engine gave up; the flags say how.
        let played = if mv.is_null() {
            log::debug!("Computer: no move ({})", session.engine.status());
            None
        } else {
            let played = PlayedMove::new(mv);
            log::debug!("Computer: {:#x} {}", mv.raw(), played.notation);
            Some(played)
        };
        let status = Status::from_game_status(session.engine.status());
        Outcome::report("Computer", &session.engine, status, None, played)
    }

    /// Take back one ply, or two when `cookie2` is non-negative.
    ///
    /// The cookies are opaque move tokens from earlier outcomes; only the
    /// sign of `cookie2` is interpreted.
    pub fn undo(&self, instance_id: InstanceId, cookie1: i32, cookie2: i32) -> Outcome {
        log::debug!("Undo request: {cookie1:#x} {cookie2:#x}");
        let mut session = self.session.lock();
        if let Some(rejected) = session.superseded("Undo", instance_id) {
            return rejected;
        }

        session.engine.unmake_move();
        if cookie2 >= 0 {
            session.engine.unmake_move();
        }
        log::debug!("Undo: {cookie1:#x} {cookie2:#x}");
        Outcome::report("Undo", &session.engine, Status::Ok, None, None)
    }

    /// Reset both sides' remaining clocks on whichever session is live.
    pub fn reset_time(&self, black_secs: u32, white_secs: u32) {
        self.session.lock().engine.reset_time(black_secs, white_secs);
        log::debug!("Reset time: {black_secs} {white_secs}");
    }

    /// Ask an in-progress search to stop. Never blocks.
    ///
    /// Best-effort: the search notices at its next periodic check.
    pub fn abort(&self) {
        log::debug!("Aborting the game");
        self.abort.raise();
    }

    /// Id of the live session (`InstanceId::NONE` before the first start)
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.session.lock().instance_id
    }

    /// Limits installed by the last new game
    #[must_use]
    pub fn limits(&self) -> Option<SearchLimits> {
        self.session.lock().limits
    }

    /// Snapshot of the engine's current board
    #[must_use]
    pub fn board(&self) -> BoardState {
        self.session.lock().engine.board()
    }

    /// Run `f` with shared access to the engine, under the session lock.
    pub fn with_engine<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&E) -> R,
    {
        f(&self.session.lock().engine)
    }
}
