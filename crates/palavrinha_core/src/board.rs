//! Per-board guess state machine.
//!
//! A board is `Active` until one of its rows is all correct (`Won`) or it runs
//! out of rows (`Lost`). Both end states are terminal: the board drops its
//! subscription to the input stream and never mutates again until reset.
//!
//! Submitting a row scores it immediately but does not commit the outcome.
//! The board hands out a [`RevealTicket`] and stays locked until that ticket
//! is completed through [`BoardEngine::finish_reveal`].

use crate::{
    BoardId, BoardSnapshot, Dispatch, IntentKind, Mode, ModeConfig, Outcome, PersistenceStore,
    RevealGuard, RevealSequence, RevealTicket, RevealTiming, Row, RowKind, Storage, default_rows,
    evaluate,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

/// Notifications a board sends back to its coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// A submit was rejected because the row is not full.
    Shake {
        /// Rejecting board.
        board_id: BoardId,
        /// Rejected row.
        row: usize,
    },
    /// A row was scored and its reveal sequence may start.
    RevealStarted(RevealTicket),
    /// A pending reveal was abandoned.
    RevealCancelled(RevealTicket),
    /// The board moved on to its next row.
    Advanced {
        /// Board that advanced.
        board_id: BoardId,
        /// New active row.
        row: usize,
    },
    /// The board guessed its answer.
    Won {
        /// Winning board.
        board_id: BoardId,
        /// Winning row.
        row: usize,
    },
    /// The board ran out of rows.
    Lost {
        /// Losing board.
        board_id: BoardId,
    },
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Finished board, pending reveal, or the intent targets another row.
    Ignored,
    /// Row not full; a shake was signalled.
    Rejected,
    /// Row was already scored.
    AlreadyRevealed,
    /// Row scored; the reveal must complete before the outcome commits.
    Revealing(RevealTicket),
}

/// Owns one board: rows, cursor mirror and outcome.
#[derive(Debug)]
pub struct BoardEngine {
    id: BoardId,
    mode: Mode,
    config: ModeConfig,
    answer: String,
    rows: Vec<Row>,
    local_active_row: usize,
    cursor: usize,
    outcome: Outcome,
    revealing: Option<RevealTicket>,
    guard: RevealGuard,
    inbox: Option<broadcast::Receiver<Dispatch>>,
    outbox: mpsc::UnboundedSender<BoardEvent>,
}

impl BoardEngine {
    /// Creates a board on a fresh grid.
    #[instrument(skip(answer, inbox, outbox))]
    pub fn new(
        id: BoardId,
        mode: Mode,
        answer: impl Into<String>,
        inbox: broadcast::Receiver<Dispatch>,
        outbox: mpsc::UnboundedSender<BoardEvent>,
    ) -> Self {
        let config = mode.config();
        Self {
            id,
            mode,
            config,
            answer: answer.into().to_ascii_lowercase(),
            rows: default_rows(config.total_rows(), config.word_length()),
            local_active_row: 0,
            cursor: 0,
            outcome: Outcome::None,
            revealing: None,
            guard: RevealGuard::new(),
            inbox: Some(inbox),
            outbox,
        }
    }

    /// Rebuilds a board from its last snapshot.
    ///
    /// A winner flag restores `Won` with the active row frozen on the winning
    /// row; a grid with every row scored restores `Lost`. Otherwise the board
    /// resumes at `shared_row`, which must match its scored row count; a
    /// snapshot that disagrees with the shared row is discarded.
    #[instrument(skip(answer, snapshot, inbox, outbox))]
    pub fn restore(
        id: BoardId,
        mode: Mode,
        answer: impl Into<String>,
        snapshot: BoardSnapshot,
        shared_row: usize,
        inbox: broadcast::Receiver<Dispatch>,
        outbox: mpsc::UnboundedSender<BoardEvent>,
    ) -> Self {
        let mut board = Self::new(id, mode, answer, inbox, outbox);
        let (mut rows, winner) = snapshot.into_parts();
        let scored = rows.iter().take_while(|row| row.is_revealed()).count();
        let total = board.config.total_rows();

        for row in rows.iter_mut().filter(|row| row.is_revealed()) {
            row.set_kind(RowKind::Shown);
        }

        if winner && scored > 0 && rows[scored - 1].is_solved() {
            board.rows = rows;
            board.local_active_row = scored - 1;
            board.finish(Outcome::Won);
        } else if scored >= total {
            board.rows = rows;
            board.local_active_row = total;
            board.finish(Outcome::Lost);
        } else if scored == shared_row {
            let word_length = board.config.word_length();
            for (i, row) in rows.iter_mut().enumerate().skip(scored) {
                let kind = if i == scored {
                    RowKind::Active
                } else {
                    RowKind::Pending
                };
                *row = Row::new(word_length, kind);
            }
            board.rows = rows;
            board.local_active_row = scored;
        } else {
            warn!(
                board_id = id,
                scored, shared_row, "Snapshot out of step with the shared row; starting fresh"
            );
        }

        debug!(
            board_id = id,
            outcome = %board.outcome,
            row = board.local_active_row,
            "Board restored"
        );
        board
    }

    /// Board id.
    pub fn id(&self) -> BoardId {
        self.id
    }

    /// Secret answer.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// All rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Row this board is playing; frozen once the board finishes.
    pub fn local_active_row(&self) -> usize {
        self.local_active_row
    }

    /// Mirrored shared cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// True while a reveal is pending.
    pub fn is_animating(&self) -> bool {
        self.revealing.is_some()
    }

    /// True while the board listens to the shared input stream.
    pub fn is_subscribed(&self) -> bool {
        self.inbox.is_some()
    }

    /// Applies every dispatch waiting in the inbox; returns how many applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let received = match self.inbox.as_mut() {
                Some(inbox) => inbox.try_recv(),
                None => break,
            };
            match received {
                Ok(dispatch) => {
                    if self.apply(&dispatch) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(board_id = self.id, skipped, "Board lagged behind the input stream");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Applies one dispatch if it addresses this board's active row.
    pub fn apply(&mut self, dispatch: &Dispatch) -> bool {
        let intent = dispatch.intent();
        if self.outcome.is_finished() || intent.row_index() != self.local_active_row {
            trace!(board_id = self.id, ?intent, "Dispatch not addressed to this board");
            return false;
        }

        match intent.kind() {
            IntentKind::Letter { .. } | IntentKind::Backspace => {
                self.cursor = dispatch.cursor();
                self.mirror_typing(intent.row_index(), dispatch.buffer())
            }
            IntentKind::MoveCursor(_) | IntentKind::CellClick(_) => {
                self.cursor = dispatch.cursor();
                true
            }
            IntentKind::Submit => {
                self.submit_row(intent.row_index());
                true
            }
        }
    }

    /// Copies the shared row buffer into the active row.
    pub fn mirror_typing(&mut self, row_index: usize, content: &[Option<char>]) -> bool {
        if self.outcome.is_finished() || self.is_animating() || row_index != self.local_active_row
        {
            return false;
        }
        self.rows[self.local_active_row].set_letters(content);
        true
    }

    /// Scores the active row, or rejects it when it is not full.
    #[instrument(skip(self), fields(board_id = self.id))]
    pub fn submit_row(&mut self, row_index: usize) -> SubmitOutcome {
        if self.outcome.is_finished() || self.is_animating() || row_index != self.local_active_row
        {
            trace!("Submit ignored");
            return SubmitOutcome::Ignored;
        }

        let row = &mut self.rows[self.local_active_row];
        if row.filled_count() < self.config.word_length() {
            debug!(filled = row.filled_count(), "Row incomplete; shaking");
            self.emit(BoardEvent::Shake {
                board_id: self.id,
                row: row_index,
            });
            return SubmitOutcome::Rejected;
        }
        if row.is_revealed() {
            trace!("Row already revealed");
            return SubmitOutcome::AlreadyRevealed;
        }

        let statuses = evaluate(&row.word(), &self.answer);
        row.reveal(&statuses);
        let ticket = RevealTicket::new(self.id, row_index, self.guard.generation());
        self.revealing = Some(ticket);
        debug!(guess = %row.word(), ?statuses, "Row scored; reveal pending");
        self.emit(BoardEvent::RevealStarted(ticket));
        SubmitOutcome::Revealing(ticket)
    }

    /// Timed reveal for the pending ticket, if `ticket` is still current.
    pub fn reveal_sequence(
        &self,
        ticket: RevealTicket,
        timing: RevealTiming,
    ) -> Option<RevealSequence> {
        (self.revealing == Some(ticket)).then(|| {
            RevealSequence::new(
                ticket,
                self.config.word_length(),
                timing,
                self.guard.subscribe(),
            )
        })
    }

    /// Commits the outcome of a completed reveal and persists the board.
    ///
    /// Stale tickets (from before a reset, or already committed) are ignored.
    #[instrument(skip(self, store), fields(board_id = self.id, row = ticket.row()))]
    pub fn finish_reveal<S: Storage>(
        &mut self,
        ticket: RevealTicket,
        store: &mut PersistenceStore<S>,
    ) -> Option<Outcome> {
        if self.revealing != Some(ticket) {
            debug!("Stale reveal ticket ignored");
            return None;
        }
        self.revealing = None;

        if self.rows[self.local_active_row].is_solved() {
            self.finish(Outcome::Won);
            store.save(self.mode, self.id, &self.rows, true, None);
            info!(answer = %self.answer, "Board won");
            self.emit(BoardEvent::Won {
                board_id: self.id,
                row: self.local_active_row,
            });
            return Some(self.outcome);
        }

        self.local_active_row += 1;
        if self.local_active_row == self.config.total_rows() {
            self.finish(Outcome::Lost);
            store.save(self.mode, self.id, &self.rows, false, None);
            info!(answer = %self.answer, "Board lost");
            self.emit(BoardEvent::Lost { board_id: self.id });
            return Some(self.outcome);
        }

        self.rows[self.local_active_row].set_kind(RowKind::Active);
        self.cursor = 0;
        store.save(
            self.mode,
            self.id,
            &self.rows,
            false,
            Some(self.local_active_row),
        );
        self.emit(BoardEvent::Advanced {
            board_id: self.id,
            row: self.local_active_row,
        });
        Some(self.outcome)
    }

    /// Cancels any pending reveal without committing anything.
    #[instrument(skip(self), fields(board_id = self.id))]
    pub fn cancel_reveal(&mut self) {
        self.guard.cancel();
        if let Some(ticket) = self.revealing.take() {
            debug!(row = ticket.row(), "Pending reveal cancelled");
            self.emit(BoardEvent::RevealCancelled(ticket));
        }
    }

    /// Starts over on a fresh grid with a new answer and a fresh subscription.
    #[instrument(skip(self, answer, inbox), fields(board_id = self.id))]
    pub fn reset(&mut self, answer: impl Into<String>, inbox: broadcast::Receiver<Dispatch>) {
        self.cancel_reveal();
        self.answer = answer.into().to_ascii_lowercase();
        self.rows = default_rows(self.config.total_rows(), self.config.word_length());
        self.local_active_row = 0;
        self.cursor = 0;
        self.outcome = Outcome::None;
        self.inbox = Some(inbox);
        debug!("Board reset");
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.inbox = None;
    }

    fn emit(&self, event: BoardEvent) {
        if self.outbox.send(event).is_err() {
            trace!(board_id = self.id, ?event, "Coordinator gone; event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Intent, LetterStatus, MemoryStorage};

    struct Harness {
        board: BoardEngine,
        dispatch_tx: broadcast::Sender<Dispatch>,
        events: mpsc::UnboundedReceiver<BoardEvent>,
        store: PersistenceStore<MemoryStorage>,
    }

    impl Harness {
        fn new(mode: Mode, answer: &str) -> Self {
            let (dispatch_tx, inbox) = broadcast::channel(16);
            let (outbox, events) = mpsc::unbounded_channel();
            Self {
                board: BoardEngine::new(0, mode, answer, inbox, outbox),
                dispatch_tx,
                events,
                store: PersistenceStore::new(MemoryStorage::new()),
            }
        }

        fn type_row(&mut self, word: &str) {
            let row = self.board.local_active_row();
            let letters: Vec<_> = word.chars().map(Some).collect();
            assert!(self.board.mirror_typing(row, &letters));
        }

        fn play(&mut self, word: &str) -> Option<Outcome> {
            self.type_row(word);
            let row = self.board.local_active_row();
            let SubmitOutcome::Revealing(ticket) = self.board.submit_row(row) else {
                panic!("submit of {word} was not accepted");
            };
            self.board.finish_reveal(ticket, &mut self.store)
        }

        fn drain(&mut self) -> Vec<BoardEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    #[test]
    fn short_row_is_rejected_with_shake() {
        let mut h = Harness::new(Mode::Solo, "termo");
        h.board.mirror_typing(0, &[Some('t'), Some('e'), None, None, None]);

        assert_eq!(h.board.submit_row(0), SubmitOutcome::Rejected);
        assert_eq!(h.board.submit_row(0), SubmitOutcome::Rejected);

        assert!(!h.board.rows()[0].is_revealed());
        assert_eq!(h.board.local_active_row(), 0);
        assert_eq!(
            h.drain(),
            vec![
                BoardEvent::Shake { board_id: 0, row: 0 },
                BoardEvent::Shake { board_id: 0, row: 0 }
            ]
        );
    }

    #[test]
    fn submit_scores_then_waits_for_reveal() {
        let mut h = Harness::new(Mode::Solo, "termo");
        h.type_row("mrote");
        let SubmitOutcome::Revealing(ticket) = h.board.submit_row(0) else {
            panic!("expected reveal");
        };

        assert!(h.board.is_animating());
        assert_eq!(h.board.rows()[0].statuses(), vec![LetterStatus::Present; 5]);
        assert_eq!(h.board.local_active_row(), 0);
        assert!(!h.board.mirror_typing(0, &[Some('x'); 5]));
        assert_eq!(h.board.rows()[0].word(), "mrote");

        assert_eq!(h.board.finish_reveal(ticket, &mut h.store), Some(Outcome::None));
        assert_eq!(h.board.local_active_row(), 1);
        assert_eq!(h.board.rows()[1].kind(), RowKind::Active);
        assert_eq!(h.store.load_shared_row_active(Mode::Solo), 1);
    }

    #[test]
    fn duplicate_submit_changes_nothing() {
        let mut h = Harness::new(Mode::Solo, "termo");
        h.type_row("termo");
        let SubmitOutcome::Revealing(ticket) = h.board.submit_row(0) else {
            panic!("expected reveal");
        };
        let before = h.board.rows().to_vec();

        assert_eq!(h.board.submit_row(0), SubmitOutcome::Ignored);
        assert_eq!(h.board.rows(), before.as_slice());

        h.board.finish_reveal(ticket, &mut h.store);
        assert_eq!(h.board.outcome(), Outcome::Won);
        assert_eq!(h.board.submit_row(0), SubmitOutcome::Ignored);
        assert_eq!(h.board.finish_reveal(ticket, &mut h.store), None);
        assert_eq!(h.board.local_active_row(), 0);
        assert!(h.store.load(Mode::Solo, 0).winner());
    }

    #[test]
    fn all_correct_row_wins_and_unsubscribes() {
        let mut h = Harness::new(Mode::Solo, "termo");
        assert_eq!(h.play("mrote"), Some(Outcome::None));
        assert_eq!(h.play("termo"), Some(Outcome::Won));

        assert_eq!(h.board.local_active_row(), 1);
        assert!(!h.board.is_subscribed());
        let events = h.drain();
        assert!(events.contains(&BoardEvent::Won { board_id: 0, row: 1 }));
    }

    #[test]
    fn last_row_miss_loses() {
        let mut h = Harness::new(Mode::Solo, "termo");
        for _ in 0..5 {
            assert_eq!(h.play("vasco"), Some(Outcome::None));
        }
        assert_eq!(h.play("vasco"), Some(Outcome::Lost));
        assert_eq!(h.board.local_active_row(), 6);

        let snapshot = h.store.load(Mode::Solo, 0);
        assert!(!snapshot.winner());
        assert!(snapshot.rows().iter().all(Row::is_revealed));
    }

    #[test]
    fn reset_stales_pending_ticket() {
        let mut h = Harness::new(Mode::Solo, "termo");
        h.type_row("termo");
        let SubmitOutcome::Revealing(ticket) = h.board.submit_row(0) else {
            panic!("expected reveal");
        };

        h.board.reset("vasco", h.dispatch_tx.subscribe());

        assert_eq!(h.board.finish_reveal(ticket, &mut h.store), None);
        assert_eq!(h.board.outcome(), Outcome::None);
        assert!(h.board.rows().iter().all(|row| row.filled_count() == 0));
        assert_eq!(h.store.load(Mode::Solo, 0), BoardSnapshot::fresh(Mode::Solo));
        assert!(h.drain().contains(&BoardEvent::RevealCancelled(ticket)));
    }

    #[test]
    fn pump_applies_only_matching_rows() {
        let mut h = Harness::new(Mode::Solo, "termo");
        let buffer = vec![Some('t'), None, None, None, None];
        let here = Intent::new(IntentKind::Letter { letter: 't', cell: 0 }, 0);
        let elsewhere = Intent::new(IntentKind::Letter { letter: 't', cell: 0 }, 3);
        h.dispatch_tx
            .send(Dispatch::new(elsewhere, buffer.clone(), 1))
            .unwrap();
        h.dispatch_tx.send(Dispatch::new(here, buffer, 1)).unwrap();

        assert_eq!(h.board.pump(), 1);
        assert_eq!(h.board.rows()[0].word(), "t");
        assert_eq!(h.board.cursor(), 1);
    }

    #[test]
    fn restore_won_board_freezes_on_winning_row() {
        let mut h = Harness::new(Mode::Solo, "termo");
        h.play("mrote");
        h.play("termo");
        let snapshot = h.store.load(Mode::Solo, 0);

        let (_tx, inbox) = broadcast::channel(4);
        let (outbox, _events) = mpsc::unbounded_channel();
        let board = BoardEngine::restore(0, Mode::Solo, "termo", snapshot, 1, inbox, outbox);

        assert_eq!(board.outcome(), Outcome::Won);
        assert_eq!(board.local_active_row(), 1);
        assert_eq!(board.rows()[0].kind(), RowKind::Shown);
        assert!(!board.is_subscribed());
    }

    #[test]
    fn restore_active_board_resumes_on_shared_row() {
        let mut h = Harness::new(Mode::Solo, "termo");
        h.play("mrote");
        let snapshot = h.store.load(Mode::Solo, 0);

        let (_tx, inbox) = broadcast::channel(4);
        let (outbox, _events) = mpsc::unbounded_channel();
        let board = BoardEngine::restore(0, Mode::Solo, "termo", snapshot.clone(), 1, inbox, outbox);
        assert_eq!(board.outcome(), Outcome::None);
        assert_eq!(board.local_active_row(), 1);
        assert_eq!(board.rows()[1].kind(), RowKind::Active);

        let (_tx, inbox) = broadcast::channel(4);
        let (outbox, _events) = mpsc::unbounded_channel();
        let board = BoardEngine::restore(0, Mode::Solo, "termo", snapshot, 3, inbox, outbox);
        assert_eq!(board.local_active_row(), 0);
        assert!(board.rows().iter().all(|row| !row.is_revealed()));
    }
}
