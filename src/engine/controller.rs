//! Asynchronous controller: drives a [`SessionManager`] from a dedicated
//! thread so the caller never blocks on a search.
//!
//! Commands are queued over a channel and executed in order; each produces at
//! most one [`Report`] on the caller-supplied channel. Only
//! [`Controller::abort`] bypasses the queue. Dropping the controller discards
//! whatever is still queued and interrupts the running search.

use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::{BoardState, Position, Side};
use crate::session::{GameSetup, InstanceId, Outcome, PlayedMove, SessionManager, Status};

use super::EngineCore;

/// Overall state of the game as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameState {
    Active,
    BlackWon,
    WhiteWon,
    Draw,
    FatalError,
}

impl GameState {
    #[must_use]
    pub const fn won_by(side: Side) -> GameState {
        match side {
            Side::Black => GameState::BlackWon,
            Side::White => GameState::WhiteWon,
        }
    }
}

/// A recorded move: CSA notation plus the mover's clock reading (elapsed
/// milliseconds) when the move was made.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Play {
    pub notation: String,
    pub end_time_ms: i64,
}

impl Play {
    pub fn new(notation: impl Into<String>, end_time_ms: i64) -> Self {
        Play {
            notation: notation.into(),
            end_time_ms,
        }
    }
}

/// Result of one controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Report {
    /// Session the command ran against
    pub instance_id: InstanceId,
    pub board: Option<BoardState>,
    /// Move made by the command, if any
    pub last_move: Option<PlayedMove>,
    /// Opaque token for `last_move`, to pass back to an undo
    pub last_move_cookie: Option<i32>,
    /// Plies rolled back (undo reports only)
    pub undo_moves: u32,
    pub last_player: Side,
    /// Who plays next; `None` once the game is no longer active
    pub next_player: Option<Side>,
    pub game_state: GameState,
    pub error_message: Option<String>,
}

impl Report {
    /// Translate a session outcome for the acting `player`.
    #[must_use]
    pub fn from_outcome(instance_id: InstanceId, outcome: Outcome, player: Side) -> Report {
        let last_move_cookie = outcome
            .played
            .as_ref()
            .and_then(|p| i32::try_from(p.value.raw()).ok());
        let mut report = Report {
            instance_id,
            board: outcome.board,
            last_move: outcome.played,
            last_move_cookie,
            undo_moves: 0,
            last_player: player,
            next_player: None,
            game_state: GameState::Active,
            error_message: outcome.error,
        };

        match outcome.status {
            Status::Ok => report.next_player = Some(player.opponent()),
            Status::IllegalMove => {
                report.next_player = Some(player);
                report.clear_move();
            }
            Status::FatalError | Status::InitializationError | Status::InstanceSuperseded => {
                report.game_state = GameState::FatalError;
                report.clear_move();
            }
            Status::Checkmate => report.finish(GameState::won_by(player), "Checkmate"),
            Status::NoValidMove => report.finish(GameState::won_by(player.opponent()), "Checkmate"),
            Status::Resigned => report.finish(GameState::won_by(player.opponent()), "Resigned"),
            Status::Draw => report.finish(GameState::Draw, "Draw"),
        }
        report
    }

    fn clear_move(&mut self) {
        self.last_move = None;
        self.last_move_cookie = None;
    }

    fn finish(&mut self, state: GameState, message: &str) {
        self.game_state = state;
        self.error_message = Some(message.to_string());
    }
}

/// Remaining-clock seconds `(black, white)` implied by the last recorded plays.
///
/// Plays alternate starting with Black. Each side's clock takes the end time
/// of its most recent play, rounded to the nearest second; negative readings
/// count as zero.
#[must_use]
pub fn clocks_from_plays(plays: &[Play]) -> (u32, u32) {
    let mut clocks = [0i64; 2];
    match plays.len() {
        0 => {}
        1 => clocks[Side::Black.index()] = plays[0].end_time_ms,
        len => {
            clocks[(len - 1) % 2] = plays[len - 1].end_time_ms;
            clocks[(len - 2) % 2] = plays[len - 2].end_time_ms;
        }
    }
    let secs = |ms: i64| u32::try_from((ms.max(0) + 500) / 1000).unwrap_or(u32::MAX);
    (secs(clocks[0]), secs(clocks[1]))
}

enum Command {
    Start {
        resume: InstanceId,
        position: Position,
        plays: Vec<Play>,
        preplay: usize,
        clocks: Option<(u32, u32)>,
    },
    HumanPlay {
        player: Side,
        notation: String,
    },
    ComputerPlay {
        player: Side,
    },
    Undo {
        player: Side,
        cookie1: i32,
        cookie2: i32,
    },
    Destroy,
}

/// Handle to the controller thread.
pub struct Controller<E: EngineCore + 'static> {
    manager: Arc<SessionManager<E>>,
    commands: Sender<Command>,
    closing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// How often a dropping controller re-raises the abort while it waits.
const SHUTDOWN_POLL: Duration = Duration::from_millis(5);

impl<E: EngineCore + 'static> Controller<E> {
    /// Spawn the controller thread. Games are played at `difficulty` with up
    /// to `workers` search threads; reports go to `reports`.
    pub fn spawn(
        manager: Arc<SessionManager<E>>,
        difficulty: u32,
        workers: usize,
        reports: Sender<Report>,
    ) -> io::Result<Self> {
        let (commands, inbox) = mpsc::channel();
        let closing = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            manager: Arc::clone(&manager),
            closing: Arc::clone(&closing),
            instance_id: InstanceId::NONE,
            difficulty,
            workers,
            reports,
        };
        let handle = thread::Builder::new()
            .name("session-controller".to_string())
            .spawn(move || worker.run(&inbox))?;
        Ok(Controller {
            manager,
            commands,
            closing,
            handle: Some(handle),
        })
    }

    /// Start (or resume) a game from `position`, then replay the first
    /// `preplay` of `plays` as human moves.
    pub fn start(
        &self,
        resume: InstanceId,
        position: Position,
        plays: Vec<Play>,
        preplay: usize,
        clocks: Option<(u32, u32)>,
    ) {
        self.send(Command::Start {
            resume,
            position,
            plays,
            preplay,
            clocks,
        });
    }

    /// `player` has made the move `notation`.
    pub fn human_play(&self, player: Side, notation: impl Into<String>) {
        self.send(Command::HumanPlay {
            player,
            notation: notation.into(),
        });
    }

    /// Ask the engine to move as `player`.
    pub fn computer_play(&self, player: Side) {
        self.send(Command::ComputerPlay { player });
    }

    /// Take back the last move, made by `player`.
    pub fn undo1(&self, player: Side, cookie: i32) {
        self.send(Command::Undo {
            player,
            cookie1: cookie,
            cookie2: -1,
        });
    }

    /// Take back the last two moves; `player` made the earlier one.
    pub fn undo2(&self, player: Side, cookie1: i32, cookie2: i32) {
        self.send(Command::Undo {
            player,
            cookie1,
            cookie2,
        });
    }

    /// Stop the controller thread once queued commands have run.
    pub fn destroy(&self) {
        self.send(Command::Destroy);
    }

    /// Interrupt a running search without waiting for the queue.
    pub fn abort(&self) {
        self.manager.abort();
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Controller thread has exited; command dropped");
        }
    }
}

impl<E: EngineCore + 'static> Drop for Controller<E> {
    fn drop(&mut self) {
        self.closing.store(true, Ordering::SeqCst);
        self.destroy();
        let Some(handle) = self.handle.take() else {
            return;
        };
        // A search may begin just after an abort; keep raising until the
        // thread has left.
        while !handle.is_finished() {
            self.manager.abort();
            thread::sleep(SHUTDOWN_POLL);
        }
        if handle.join().is_err() {
            log::error!("Controller thread panicked");
        }
    }
}

struct Worker<E> {
    manager: Arc<SessionManager<E>>,
    closing: Arc<AtomicBool>,
    instance_id: InstanceId,
    difficulty: u32,
    workers: usize,
    reports: Sender<Report>,
}

impl<E: EngineCore> Worker<E> {
    fn run(mut self, inbox: &Receiver<Command>) {
        while let Ok(command) = inbox.recv() {
            if self.closing.load(Ordering::SeqCst) {
                log::debug!("Controller dropped; discarding queued commands");
                break;
            }
            if self.handle(command).is_break() {
                break;
            }
        }
        log::debug!("Controller thread exiting");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Start {
                resume,
                position,
                plays,
                preplay,
                clocks,
            } => self.start(resume, position, &plays, preplay, clocks),
            Command::HumanPlay { player, notation } => {
                let outcome = self.manager.human_move(self.instance_id, &notation);
                self.reply(outcome, player, 0)
            }
            Command::ComputerPlay { player } => {
                let outcome = self.manager.computer_move(self.instance_id);
                self.reply(outcome, player, 0)
            }
            Command::Undo {
                player,
                cookie1,
                cookie2,
            } => {
                log::debug!("Undo {cookie1} {cookie2}");
                let outcome = self.manager.undo(self.instance_id, cookie1, cookie2);
                if cookie2 < 0 {
                    self.reply(outcome, player, 1)
                } else {
                    self.reply(outcome, player.opponent(), 2)
                }
            }
            Command::Destroy => {
                log::debug!("Destroy");
                ControlFlow::Break(())
            }
        }
    }

    fn reply(&self, outcome: Outcome, player: Side, undo_moves: u32) -> ControlFlow<()> {
        if outcome.status == Status::InstanceSuperseded {
            log::debug!("Instance {} deleted", self.instance_id);
            return ControlFlow::Break(());
        }
        let mut report = Report::from_outcome(self.instance_id, outcome, player);
        report.undo_moves = undo_moves;
        self.emit(report);
        ControlFlow::Continue(())
    }

    fn emit(&self, report: Report) {
        log::debug!(
            "Report: state={:?} next={:?} last={:?}",
            report.game_state,
            report.next_player,
            report.last_player
        );
        if self.reports.send(report).is_err() {
            log::debug!("Report receiver dropped");
        }
    }

    fn start(
        &mut self,
        resume: InstanceId,
        position: Position,
        plays: &[Play],
        preplay: usize,
        clocks: Option<(u32, u32)>,
    ) -> ControlFlow<()> {
        let next_player = position.turn;
        let setup = GameSetup::new(position, self.difficulty).with_workers(self.workers);
        let started = self.manager.start(resume, &setup);
        if let Some(id) = started.instance_id {
            self.instance_id = id;
        }

        let outcome = started.outcome;
        if outcome.status != Status::Ok {
            log::warn!(
                "Start failed: {} {}",
                outcome.status,
                outcome.error.as_deref().unwrap_or("")
            );
            self.emit(Report::from_outcome(self.instance_id, outcome, next_player));
            return ControlFlow::Continue(());
        }
        self.emit(Report {
            instance_id: self.instance_id,
            board: outcome.board,
            last_move: None,
            last_move_cookie: None,
            undo_moves: 0,
            last_player: next_player.opponent(),
            next_player: Some(next_player),
            game_state: GameState::Active,
            error_message: None,
        });

        let preplay = if preplay > plays.len() {
            log::warn!("Preplay count {preplay} exceeds {} recorded plays", plays.len());
            plays.len()
        } else {
            preplay
        };
        if preplay == 0 {
            if let Some((black, white)) = clocks {
                self.manager.reset_time(black, white);
            }
            return ControlFlow::Continue(());
        }

        let mut last = None;
        let mut player = next_player;
        for play in &plays[..preplay] {
            let mut outcome = self.manager.human_move(self.instance_id, &play.notation);
            match outcome.status {
                Status::InstanceSuperseded => {
                    log::debug!("Instance {} deleted during replay", self.instance_id);
                    return ControlFlow::Break(());
                }
                Status::IllegalMove => {
                    log::warn!("Recorded move {} rejected during replay", play.notation);
                    outcome.status = Status::FatalError;
                }
                _ => {}
            }
            let fatal = outcome.status == Status::FatalError;
            last = Some(Report::from_outcome(self.instance_id, outcome, player));
            if fatal {
                break;
            }
            player = player.opponent();
        }

        if let Some(mut report) = last {
            report.clear_move();
            self.emit(report);
        }
        let (black, white) = clocks_from_plays(&plays[..preplay]);
        self.manager.reset_time(black, white);
        ControlFlow::Continue(())
    }
}
