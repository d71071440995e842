mod common;

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use common::{new_game, ready_manager, ScriptedEngine, SearchPlan};
use shogi_session::board::{BoardState, Piece, PieceKind, Position, Side, Square};
use shogi_session::engine::{
    think_time_for, EngineCommand, EngineCore, GameStatus, MIN_MAX_DEPTH,
};
use shogi_session::session::{GameSetup, InstanceId, SessionConfig, SessionManager, Status};

fn sq(file: u8, rank: u8) -> Square {
    Square::new(file, rank).unwrap()
}

fn cookie(outcome: &shogi_session::session::Outcome) -> i32 {
    i32::try_from(outcome.played.as_ref().unwrap().value.raw()).unwrap()
}

#[test]
fn start_before_initialize_is_rejected() {
    let (engine, probe) = ScriptedEngine::new();
    let manager = SessionManager::new(engine, SessionConfig::default());

    let started = manager.start(InstanceId::NONE, &GameSetup::new(Position::default(), 0));
    assert_eq!(started.instance_id, None);
    assert_eq!(started.outcome.status, Status::InitializationError);
    assert_eq!(
        started.outcome.error.as_deref(),
        Some("engine not yet initialized")
    );
    assert!(started.outcome.board.is_none());
    assert_eq!(probe.lock().new_games, 0);
}

#[test]
fn failed_initialize_is_sticky() {
    let (engine, probe) = ScriptedEngine::new();
    probe.lock().init_error = Some("book file missing".to_string());
    let manager = SessionManager::new(engine, SessionConfig::default());
    manager.initialize();
    manager.initialize();
    assert_eq!(probe.lock().init_calls, 1);

    for _ in 0..2 {
        let started = manager.start(InstanceId::NONE, &GameSetup::new(Position::default(), 0));
        assert_eq!(started.instance_id, None);
        assert_eq!(started.outcome.status, Status::InitializationError);
        assert_eq!(
            started.outcome.error.as_deref(),
            Some("Failed to initialize engine: book file missing")
        );
    }
}

#[test]
fn initialize_runs_once() {
    let (manager, probe) = ready_manager();
    manager.initialize();
    assert_eq!(probe.lock().init_calls, 1);
}

#[test]
fn new_game_configures_engine() {
    let (manager, probe) = ready_manager();
    let started = manager.start(
        InstanceId::NONE,
        &GameSetup::new(Position::default(), 2).with_workers(64),
    );

    assert_eq!(started.instance_id, Some(InstanceId::new(1)));
    assert_eq!(started.outcome.status, Status::Ok);
    assert_eq!(started.outcome.board, Some(BoardState::initial()));

    let probe = probe.lock();
    assert_eq!(
        probe.commands,
        vec![
            EngineCommand::Ponder(false),
            EngineCommand::ResignThreshold(999_999)
        ]
    );
    let limits = probe.limits.unwrap();
    assert_eq!(limits.depth_limit, 4);
    assert_eq!(limits.node_limit, u64::MAX);
    assert_eq!(
        (limits.total_time_secs, limits.per_turn_time_secs),
        think_time_for(2)
    );
    assert_eq!(probe.workers, Some(4));
}

#[test]
fn worker_count_floors_at_one() {
    let (manager, probe) = ready_manager();
    manager.start(
        InstanceId::NONE,
        &GameSetup::new(Position::default(), 0).with_workers(0),
    );
    assert_eq!(probe.lock().workers, Some(1));
}

#[test]
fn strongest_level_uses_max_depth() {
    let (engine, probe) = ScriptedEngine::new();
    let manager = SessionManager::new(engine, SessionConfig::default().with_max_depth(40));
    manager.initialize();
    new_game(&manager, 9);
    assert_eq!(probe.lock().limits.unwrap().depth_limit, 40);
    assert_eq!(manager.limits().map(|l| l.depth_limit), Some(40));
    assert_eq!(manager.config().max_depth, 40);
    assert_eq!(manager.config().difficulty_policy().max_depth(), 40);
}

#[test]
fn shallow_max_depth_keeps_levels_ordered() {
    let (engine, _probe) = ScriptedEngine::new();
    let config = SessionConfig {
        max_depth: 2,
        ..SessionConfig::default()
    };
    let manager = SessionManager::new(engine, config);
    manager.initialize();

    new_game(&manager, 3);
    let level3 = manager.limits().unwrap().depth_limit;
    new_game(&manager, 4);
    let level4 = manager.limits().unwrap().depth_limit;
    assert_eq!(level3, 6);
    assert_eq!(level4, MIN_MAX_DEPTH);
}

#[test]
fn resume_keeps_game() {
    let (manager, probe) = ready_manager();
    let id = new_game(&manager, 1);
    assert!(manager.human_move(id, "7776FU").is_ok());
    let before = manager.board();

    let resumed = manager.start(id, &GameSetup::new(Position::default(), 1));
    assert_eq!(resumed.instance_id, Some(id));
    assert_eq!(resumed.outcome.status, Status::Ok);
    assert_eq!(resumed.outcome.board.as_ref(), Some(&before));
    assert_eq!(probe.lock().new_games, 1);
    assert_eq!(probe.lock().commands.len(), 2);
}

#[test]
fn stale_resume_starts_new_game() {
    let (manager, probe) = ready_manager();
    let first = new_game(&manager, 1);
    assert!(manager.human_move(first, "7776FU").is_ok());

    let started = manager.start(InstanceId::new(99), &GameSetup::new(Position::default(), 1));
    let second = started.instance_id.unwrap();
    assert!(second > first);
    assert_eq!(started.outcome.board, Some(BoardState::initial()));
    assert_eq!(probe.lock().new_games, 2);

    let third = manager
        .start(InstanceId::NONE, &GameSetup::new(Position::default(), 1))
        .instance_id
        .unwrap();
    assert!(third > second);
    assert_eq!(manager.instance_id(), third);
}

#[test]
fn superseded_operations_leave_board_untouched() {
    let (manager, probe) = ready_manager();
    let old = new_game(&manager, 0);
    let current = new_game(&manager, 0);
    assert!(manager.human_move(current, "2726FU").is_ok());
    let before = manager.board();

    let outcomes = [
        manager.human_move(old, "7776FU"),
        manager.computer_move(old),
        manager.undo(old, 0, -1),
    ];
    for outcome in outcomes {
        assert_eq!(outcome.status, Status::InstanceSuperseded);
        assert_eq!(outcome.error.as_deref(), Some("Another game already started"));
        assert!(outcome.board.is_none());
        assert!(outcome.played.is_none());
    }
    assert_eq!(manager.board(), before);
    assert_eq!(probe.lock().searches_started, 0);
    assert_eq!(probe.lock().human_moves, 1);
}

#[test]
fn human_move_applies_and_reports() {
    let (manager, _probe) = ready_manager();
    let id = new_game(&manager, 0);

    let outcome = manager.human_move(id, "+7776FU");
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.notation(), Some("7776FU"));
    let board = outcome.board.unwrap();
    assert_eq!(board.piece_at(sq(7, 7)), None);
    assert_eq!(
        board.piece_at(sq(7, 6)),
        Some(Piece::new(Side::Black, PieceKind::Pawn))
    );
    assert_eq!(manager.with_engine(|e| e.turn()), Side::White);
}

#[test]
fn unparsable_moves_are_illegal() {
    let (manager, probe) = ready_manager();
    let id = new_game(&manager, 0);

    for notation in ["", "7776", "5655FU", "7776KA", "-3334FU", "0055KI", "7776FU++++++"] {
        let outcome = manager.human_move(id, notation);
        assert_eq!(outcome.status, Status::IllegalMove, "{notation:?}");
        assert!(outcome.error.is_some(), "{notation:?}");
        assert!(outcome.played.is_none());
        assert_eq!(outcome.board, Some(BoardState::initial()), "{notation:?}");
    }
    assert_eq!(probe.lock().human_moves, 0);
}

#[test]
fn rules_illegal_move_is_rejected_by_engine() {
    let (manager, probe) = ready_manager();
    let id = new_game(&manager, 0);

    // Grammatical and fits the position, but a pawn cannot step backwards.
    let outcome = manager.human_move(id, "7778FU");
    assert_eq!(outcome.status, Status::IllegalMove);
    assert_eq!(outcome.error.as_deref(), Some("pawn must step one rank forward"));
    assert!(outcome.played.is_none());
    assert_eq!(outcome.board, Some(BoardState::initial()));
    assert_eq!(probe.lock().human_moves, 1);
    assert_eq!(manager.with_engine(|e| e.turn()), Side::Black);
}

#[test]
fn finished_game_reports_status_without_move() {
    let cases = [
        (GameStatus::MATED, Status::Checkmate),
        (GameStatus::DRAWN, Status::Draw),
        (GameStatus::RESIGNED, Status::Resigned),
    ];
    for (flags, expected) in cases {
        let (manager, probe) = ready_manager();
        let id = new_game(&manager, 0);
        probe.lock().plan = SearchPlan::Finished(flags);

        let outcome = manager.computer_move(id);
        assert_eq!(outcome.status, expected, "{flags}");
        assert!(outcome.played.is_none());
        assert_eq!(outcome.board, Some(BoardState::initial()));
    }
}

#[test]
fn computer_move_plays_for_side_to_move() {
    let (manager, _probe) = ready_manager();
    let id = new_game(&manager, 0);

    let outcome = manager.computer_move(id);
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.notation(), Some("9796FU"));

    let reply = manager.computer_move(id);
    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.notation(), Some("9192KY"));
    assert_eq!(
        reply.board.unwrap().piece_at(sq(9, 2)),
        Some(Piece::new(Side::White, PieceKind::Lance))
    );
}

#[test]
fn king_hang_reports_no_valid_move() {
    let (manager, probe) = ready_manager();
    let id = new_game(&manager, 0);
    probe.lock().plan = SearchPlan::KingHang;

    let outcome = manager.computer_move(id);
    assert_eq!(outcome.status, Status::NoValidMove);
    assert!(outcome.played.is_none());
    assert_eq!(outcome.board, Some(BoardState::initial()));
}

#[test]
fn search_failure_is_fatal_with_diagnostic() {
    let (manager, probe) = ready_manager();
    let id = new_game(&manager, 0);
    probe.lock().plan = SearchPlan::Fail("hash table allocation failed".to_string());

    let outcome = manager.computer_move(id);
    assert_eq!(outcome.status, Status::FatalError);
    assert_eq!(outcome.error.as_deref(), Some("hash table allocation failed"));
    assert!(outcome.played.is_none());
}

#[test]
fn resignation_has_no_move() {
    let (manager, probe) = ready_manager();
    let id = new_game(&manager, 0);
    probe.lock().plan = SearchPlan::Resign;

    let outcome = manager.computer_move(id);
    assert_eq!(outcome.status, Status::Resigned);
    assert!(outcome.played.is_none());
    assert!(outcome.board.is_some());
}

#[test]
fn status_flags_after_move() {
    let cases = [
        (GameStatus::MATED, Status::Checkmate),
        (GameStatus::DRAWN, Status::Draw),
        (GameStatus::MATED.union(GameStatus::DRAWN), Status::Checkmate),
        (GameStatus::DRAWN.union(GameStatus::RESIGNED), Status::Draw),
    ];
    for (flags, expected) in cases {
        let (manager, probe) = ready_manager();
        let id = new_game(&manager, 0);
        probe.lock().status_after_move = flags;

        let outcome = manager.human_move(id, "7776FU");
        assert_eq!(outcome.status, expected, "{flags}");
        assert_eq!(outcome.notation(), Some("7776FU"));

        let outcome = manager.computer_move(id);
        assert_eq!(outcome.status, expected, "{flags}");
        assert_eq!(outcome.notation(), Some("9192KY"));
    }
}

#[test]
fn undo_one_and_two_plies() {
    let (manager, _probe) = ready_manager();
    let id = new_game(&manager, 0);

    let first = manager.human_move(id, "7776FU");
    let after_first = first.board.clone().unwrap();
    let second = manager.human_move(id, "3334FU");
    assert!(second.is_ok());

    let undone = manager.undo(id, cookie(&second), -1);
    assert_eq!(undone.status, Status::Ok);
    assert_eq!(undone.board, Some(after_first));

    let second = manager.human_move(id, "3334FU");
    let undone = manager.undo(id, cookie(&second), cookie(&first));
    assert_eq!(undone.status, Status::Ok);
    assert_eq!(undone.board, Some(BoardState::initial()));
    assert_eq!(manager.with_engine(|e| e.turn()), Side::Black);
}

#[test]
fn undo_at_start_of_history_is_harmless() {
    let (manager, _probe) = ready_manager();
    let id = new_game(&manager, 0);
    let outcome = manager.undo(id, 0, 0);
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.board, Some(BoardState::initial()));
}

#[test]
fn capture_moves_piece_to_hand() {
    let (manager, _probe) = ready_manager();
    let id = new_game(&manager, 0);
    for notation in ["7776FU", "3334FU"] {
        assert!(manager.human_move(id, notation).is_ok());
    }
    let outcome = manager.human_move(id, "8822UM");
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.notation(), Some("8822UM"));
    let board = outcome.board.unwrap();
    assert_eq!(board.hand(Side::Black).count(PieceKind::Bishop), 1);
    assert_eq!(
        board.piece_at(sq(2, 2)),
        Some(Piece::new(Side::Black, PieceKind::Horse))
    );
}

#[test]
fn reset_time_reaches_engine() {
    let (manager, probe) = ready_manager();
    new_game(&manager, 0);
    manager.reset_time(300, 120);
    assert_eq!(probe.lock().clocks, Some((300, 120)));
}

#[test]
fn abort_interrupts_running_search() {
    let (manager, probe) = ready_manager();
    let manager = Arc::new(manager);
    let id = new_game(&manager, 5);
    probe.lock().plan = SearchPlan::UntilAborted;

    let searcher = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.computer_move(id))
    };
    while probe.lock().searches_started == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    manager.abort();

    let outcome = searcher.join().unwrap();
    assert_eq!(outcome.status, Status::Ok);
    assert!(outcome.played.is_none());
    assert!(probe.lock().saw_abort);
}

#[test]
fn abort_before_search_is_ignored() {
    let (manager, _probe) = ready_manager();
    let id = new_game(&manager, 0);
    manager.abort();
    let outcome = manager.computer_move(id);
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.notation(), Some("9796FU"));
}

#[test]
fn abort_while_waiting_for_lock_stops_search() {
    let (manager, probe) = ready_manager();
    let manager = Arc::new(manager);
    let id = new_game(&manager, 5);
    probe.lock().plan = SearchPlan::UntilAborted;

    // Hold the session lock until released.
    let (release, gate) = mpsc::channel::<()>();
    let (held, lock_taken) = mpsc::channel();
    let holder = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            manager.with_engine(|_| {
                held.send(()).unwrap();
                gate.recv().unwrap();
            });
        })
    };
    lock_taken.recv().unwrap();

    let (done, finished) = mpsc::channel();
    {
        let manager = Arc::clone(&manager);
        thread::spawn(move || done.send(manager.computer_move(id)).unwrap());
    }
    thread::sleep(Duration::from_millis(100));
    assert_eq!(probe.lock().searches_started, 0);
    manager.abort();
    release.send(()).unwrap();
    holder.join().unwrap();

    let outcome = finished
        .recv_timeout(Duration::from_secs(10))
        .expect("abort raised while waiting was lost");
    assert_eq!(outcome.status, Status::Ok);
    assert!(outcome.played.is_none());
    assert!(probe.lock().saw_abort);
}

#[test]
fn concurrent_starts_get_distinct_ids() {
    let (manager, _probe) = ready_manager();
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                manager
                    .start(InstanceId::NONE, &GameSetup::new(Position::default(), 0))
                    .instance_id
                    .unwrap()
            })
        })
        .collect();
    let mut ids: Vec<InstanceId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(manager.instance_id(), *ids.last().unwrap());
}

#[test]
fn handicap_position_is_taken_as_given() {
    let (manager, _probe) = ready_manager();
    let mut board = BoardState::initial();
    // Bishop handicap: White's bishop removed, White moves first.
    board.set(sq(2, 2), None);
    let position = Position::new(board.clone(), Side::White);

    let started = manager.start(InstanceId::NONE, &GameSetup::new(position, 3));
    let id = started.instance_id.unwrap();
    assert_eq!(started.outcome.board, Some(board));

    let outcome = manager.human_move(id, "3334FU");
    assert_eq!(outcome.status, Status::Ok);
    let outcome = manager.human_move(id, "7776FU");
    assert_eq!(outcome.status, Status::Ok);
}
