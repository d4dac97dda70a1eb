//! End-to-end session scenarios driven through the public key/pointer API.

use palavrinha_core::{
    Feedback, Key, LetterStatus, MemoryStorage, Mode, Outcome, PointerEvent, RevealTiming,
    RowKind, SessionCoordinator, SessionError, SessionStatus,
};

type Session = SessionCoordinator<MemoryStorage>;

fn answers(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Types `word`, submits it and completes the reveals instantly.
fn guess(session: &mut Session, word: &str) -> Vec<Feedback> {
    let mut feedback = Vec::new();
    for c in word.chars() {
        feedback.extend(session.handle_key(&Key::Char(c)));
    }
    feedback.extend(session.handle_key(&Key::Enter));
    feedback.extend(session.complete_pending_reveals());
    feedback
}

fn assert_lockstep(session: &Session) {
    for board in session.boards() {
        if board.outcome().is_active() {
            assert_eq!(
                board.local_active_row(),
                session.shared_active_row(),
                "board {} out of step",
                board.id()
            );
        }
    }
}

#[test]
fn test_solo_win_on_second_row() {
    let mut session = Session::open("solo", answers(&["termo"]), MemoryStorage::new()).unwrap();

    let first = guess(&mut session, "mrote");
    assert!(first.contains(&Feedback::RowAdvanced { row: 1 }));
    assert_eq!(
        session.boards()[0].rows()[0].statuses(),
        vec![LetterStatus::Present; 5]
    );

    let second = guess(&mut session, "termo");
    assert!(second.contains(&Feedback::BoardWon {
        board_id: 0,
        row: 1
    }));
    assert_eq!(second.last(), Some(&Feedback::SessionWon));

    let board = &session.boards()[0];
    assert!(board.rows()[1].is_solved());
    assert_eq!(board.outcome(), Outcome::Won);
    assert_eq!(session.winner_count(), 1);
    assert_eq!(session.status(), SessionStatus::Won);
}

#[test]
fn test_dupla_loss_does_not_touch_other_board() {
    let mut session =
        Session::open("dupla", answers(&["termo", "vasco"]), MemoryStorage::new()).unwrap();

    guess(&mut session, "mrote");
    guess(&mut session, "pulga");
    let won = guess(&mut session, "vasco");
    assert!(won.contains(&Feedback::BoardWon {
        board_id: 1,
        row: 2
    }));
    assert_eq!(session.status(), SessionStatus::InProgress);
    let b_saved = session.store().load(Mode::Dupla, 1);
    assert!(b_saved.winner());

    for row in 3..7 {
        assert_eq!(session.shared_active_row(), row);
        assert_lockstep(&session);
        guess(&mut session, "vasco");
    }

    let a = &session.boards()[0];
    let b = &session.boards()[1];
    assert_eq!(a.outcome(), Outcome::Lost);
    assert_eq!(b.outcome(), Outcome::Won);
    assert_eq!(b.local_active_row(), 2);
    assert!(b.rows()[3..].iter().all(|row| row.filled_count() == 0));

    assert_eq!(session.store().load(Mode::Dupla, 1), b_saved);
    assert!(!session.store().load(Mode::Dupla, 0).winner());
    assert_eq!(session.winner_count(), 1);
    assert_eq!(session.status(), SessionStatus::Lost);
}

#[test]
fn test_board_loss_signalled_once_and_session_lost() {
    let mut session = Session::open("solo", answers(&["termo"]), MemoryStorage::new()).unwrap();
    for _ in 0..5 {
        guess(&mut session, "pulga");
    }
    let last = guess(&mut session, "pulga");

    assert_eq!(
        last.iter()
            .filter(|f| matches!(f, Feedback::BoardLost { .. }))
            .count(),
        1
    );
    assert_eq!(last.last(), Some(&Feedback::SessionLost));
    assert!(last.contains(&Feedback::RowAdvanced { row: 6 }));
    assert_eq!(session.shared_active_row(), 6);
    assert!(session.input().is_exhausted());
    assert!(session.handle_key(&Key::Char('a')).is_empty());
}

#[test]
fn test_short_submit_only_shakes() {
    let mut session =
        Session::open("quarteto", Mode::Quarteto.default_answers(), MemoryStorage::new())
            .unwrap();
    for c in "ter".chars() {
        session.handle_key(&Key::Char(c));
    }

    let feedback = session.handle_key(&Key::Enter);
    let shaken: Vec<_> = feedback
        .iter()
        .filter_map(|f| match f {
            Feedback::Shake { board_id, row: 0 } => Some(*board_id),
            _ => None,
        })
        .collect();
    assert_eq!(shaken, vec![0, 1, 2, 3]);

    assert!(!session.is_revealing());
    assert_eq!(session.shared_active_row(), 0);
    for board in session.boards() {
        assert!(!board.rows()[0].is_revealed());
        assert_eq!(board.local_active_row(), 0);
    }
}

#[test]
fn test_double_submit_is_noop() {
    let mut session = Session::open("solo", answers(&["termo"]), MemoryStorage::new()).unwrap();
    for c in "mrote".chars() {
        session.handle_key(&Key::Char(c));
    }
    let first = session.handle_key(&Key::Enter);
    assert_eq!(first.len(), 1);

    let rows_before = session.boards()[0].rows().to_vec();
    assert!(session.handle_key(&Key::Enter).is_empty());
    assert_eq!(session.boards()[0].rows(), rows_before.as_slice());
    assert_eq!(session.pending_reveals().count(), 1);
}

#[test]
fn test_pointer_moves_shared_cursor() {
    let mut session =
        Session::open("dupla", answers(&["termo", "vasco"]), MemoryStorage::new()).unwrap();
    session.handle_pointer(PointerEvent::new(0, 3));
    session.handle_key(&Key::Char('m'));

    for board in session.boards() {
        assert_eq!(board.rows()[0].cells()[3].letter(), Some('m'));
        assert_eq!(board.cursor(), 4);
    }
    assert!(session.handle_pointer(PointerEvent::new(2, 0)).is_empty());
}

#[test]
fn test_resume_restores_progress() {
    let mut session =
        Session::open("dupla", answers(&["termo", "vasco"]), MemoryStorage::new()).unwrap();
    guess(&mut session, "mrote");
    guess(&mut session, "vasco");
    for c in "ab".chars() {
        session.handle_key(&Key::Char(c));
    }
    let storage = session.into_store().into_inner();

    let resumed =
        Session::resume(Mode::Dupla, answers(&["termo", "vasco"]), storage).unwrap();

    assert_eq!(resumed.shared_active_row(), 2);
    assert_eq!(resumed.winner_count(), 1);
    assert_eq!(resumed.status(), SessionStatus::InProgress);

    let a = &resumed.boards()[0];
    assert_eq!(a.outcome(), Outcome::None);
    assert_eq!(a.local_active_row(), 2);
    assert_eq!(a.rows()[0].kind(), RowKind::Shown);
    assert_eq!(a.rows()[2].kind(), RowKind::Active);
    assert_eq!(a.rows()[2].filled_count(), 0);

    let b = &resumed.boards()[1];
    assert_eq!(b.outcome(), Outcome::Won);
    assert_eq!(b.local_active_row(), 1);
    assert!(!b.is_subscribed());
}

#[test]
fn test_unknown_mode_and_bad_answers_rejected() {
    let err = Session::open("trio", answers(&["termo"]), MemoryStorage::new()).unwrap_err();
    assert!(matches!(err, SessionError::UnknownMode { .. }));

    let err = Session::open("dupla", answers(&["termo"]), MemoryStorage::new()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::AnswerCount {
            expected: 2,
            actual: 1,
            ..
        }
    ));

    let err = Session::open("solo", answers(&["tér1o"]), MemoryStorage::new()).unwrap_err();
    assert!(matches!(err, SessionError::InvalidAnswer { .. }));
}

#[test]
fn test_new_game_cancels_reveals_and_clears_mode() {
    let mut storage = MemoryStorage::new();
    {
        let mut solo = Session::open("solo", answers(&["termo"]), storage).unwrap();
        guess(&mut solo, "mrote");
        storage = solo.into_store().into_inner();
    }

    let mut session =
        Session::open("dupla", answers(&["termo", "vasco"]), storage).unwrap();
    guess(&mut session, "pulga");
    for c in "mrote".chars() {
        session.handle_key(&Key::Char(c));
    }
    session.handle_key(&Key::Enter);
    assert_eq!(session.pending_reveals().count(), 2);

    let feedback = session.new_game(answers(&["vasco", "termo"])).unwrap();
    assert_eq!(
        feedback
            .iter()
            .filter(|f| matches!(f, Feedback::RevealCancelled(_)))
            .count(),
        2
    );
    assert!(!session.is_revealing());
    assert_eq!(session.shared_active_row(), 0);
    assert_eq!(session.boards()[0].answer(), "vasco");
    assert_eq!(session.store().load_shared_row_active(Mode::Dupla), 0);
    assert_eq!(session.store().load_shared_row_active(Mode::Solo), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timed_reveals_commit_after_last_cell() {
    let mut session =
        Session::open("dupla", answers(&["termo", "vasco"]), MemoryStorage::new()).unwrap();
    for c in "termo".chars() {
        session.handle_key(&Key::Char(c));
    }
    session.handle_key(&Key::Enter);

    let timing = RevealTiming::default();
    let started = tokio::time::Instant::now();
    let feedback = session.run_reveals(timing).await;

    assert!(started.elapsed() >= timing.cell_done_after(4));
    assert!(feedback.contains(&Feedback::BoardWon {
        board_id: 0,
        row: 0
    }));
    assert!(feedback.contains(&Feedback::RowAdvanced { row: 1 }));
    assert_eq!(session.boards()[1].local_active_row(), 1);
    assert_lockstep(&session);
}

#[tokio::test(start_paused = true)]
async fn test_reset_aborts_running_reveal() {
    let mut session = Session::open("solo", answers(&["termo"]), MemoryStorage::new()).unwrap();
    for c in "mrote".chars() {
        session.handle_key(&Key::Char(c));
    }
    session.handle_key(&Key::Enter);

    let sequences = session.reveal_sequences(RevealTiming::default());
    assert_eq!(sequences.len(), 1);
    session.new_game(answers(&["vasco"])).unwrap();

    for sequence in sequences {
        assert!(sequence.run().await.is_err());
    }
    assert_eq!(session.boards()[0].local_active_row(), 0);
    assert!(!session.boards()[0].rows()[0].is_revealed());
}
