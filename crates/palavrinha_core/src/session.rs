//! Session coordinator: one shared input stream driving every board of a mode.
//!
//! The coordinator owns the [`InputDispatcher`] and publishes each resulting
//! [`Dispatch`] on a broadcast channel. Every [`BoardEngine`] holds its own
//! subscription, filters by row and outcome, and reports back on an mpsc
//! channel which the coordinator turns into [`Feedback`] for the front end.
//!
//! Row transitions commit in lockstep: after a submit, the shared row only
//! advances once every reveal issued for it has completed.

use crate::{
    BoardEngine, BoardEvent, BoardId, Dispatch, InputDispatcher, Intent, IntentKind, Key, Mode,
    ModeConfig, Outcome, PersistenceStore, PointerEvent, RevealSequence, RevealTicket,
    RevealTiming, SessionError, Storage,
};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, trace, warn};

const DISPATCH_CAPACITY: usize = 64;

/// Signals for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// A letter landed in a cell.
    BumpCell {
        /// Shared row.
        row: usize,
        /// Cell that received the letter.
        cell: usize,
    },
    /// A board rejected an incomplete row.
    Shake {
        /// Rejecting board.
        board_id: BoardId,
        /// Rejected row.
        row: usize,
    },
    /// A row reveal should start animating.
    RevealStarted(RevealTicket),
    /// A row reveal was abandoned.
    RevealCancelled(RevealTicket),
    /// The shared row moved on.
    RowAdvanced {
        /// New shared active row.
        row: usize,
    },
    /// A board guessed its answer.
    BoardWon {
        /// Winning board.
        board_id: BoardId,
        /// Winning row.
        row: usize,
    },
    /// A board ran out of rows.
    BoardLost {
        /// Losing board.
        board_id: BoardId,
    },
    /// Every board was won.
    SessionWon,
    /// Every board finished and at least one was lost.
    SessionLost,
}

/// Overall state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// Some board is still playing.
    #[default]
    InProgress,
    /// Every board was won.
    Won,
    /// Every board finished, at least one lost.
    Lost,
}

/// Drives every board of one mode from a single input stream.
#[derive(Debug)]
pub struct SessionCoordinator<S> {
    mode: Mode,
    config: ModeConfig,
    boards: Vec<BoardEngine>,
    input: InputDispatcher,
    store: PersistenceStore<S>,
    dispatch_tx: broadcast::Sender<Dispatch>,
    events_rx: mpsc::UnboundedReceiver<BoardEvent>,
    pending: BTreeSet<RevealTicket>,
    completed: BTreeSet<RevealTicket>,
    winner_count: usize,
    status: SessionStatus,
}

impl<S: Storage> SessionCoordinator<S> {
    /// Parses `mode_key` and resumes that mode from `storage`.
    #[instrument(skip(answers, storage))]
    pub fn open(mode_key: &str, answers: Vec<String>, storage: S) -> Result<Self, SessionError> {
        let mode = Mode::parse(mode_key)?;
        Self::resume(mode, answers, storage)
    }

    /// Restores every board of `mode` from its last persisted snapshot.
    ///
    /// If the restored boards disagree with the stored shared row, the mode's
    /// progress is discarded and the session starts fresh.
    #[instrument(skip(answers, storage))]
    pub fn resume(mode: Mode, answers: Vec<String>, storage: S) -> Result<Self, SessionError> {
        let config = mode.config();
        let answers = validate_answers(mode, answers)?;
        let mut store = PersistenceStore::new(storage);
        let (dispatch_tx, _) = broadcast::channel(DISPATCH_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let shared_row = store.load_shared_row_active(mode);
        let mut boards: Vec<_> = answers
            .iter()
            .enumerate()
            .map(|(id, answer)| {
                BoardEngine::restore(
                    id,
                    mode,
                    answer.as_str(),
                    store.load(mode, id),
                    shared_row,
                    dispatch_tx.subscribe(),
                    events_tx.clone(),
                )
            })
            .collect();

        let in_step = boards
            .iter()
            .filter(|board| board.outcome().is_active())
            .all(|board| board.local_active_row() == shared_row);
        let input = if in_step {
            InputDispatcher::resume(config, shared_row)
        } else {
            warn!(%mode, shared_row, "Restored boards out of step; starting the mode fresh");
            store.clear_mode(mode);
            for (board, answer) in boards.iter_mut().zip(&answers) {
                board.reset(answer.as_str(), dispatch_tx.subscribe());
            }
            InputDispatcher::new(config)
        };

        let mut session = Self {
            mode,
            config,
            boards,
            input,
            store,
            dispatch_tx,
            events_rx,
            pending: BTreeSet::new(),
            completed: BTreeSet::new(),
            winner_count: 0,
            status: SessionStatus::InProgress,
        };
        session.winner_count = session
            .boards
            .iter()
            .filter(|board| board.outcome() == Outcome::Won)
            .count();
        session.refresh_status();

        info!(
            %mode,
            row = session.input.active_row(),
            winners = session.winner_count,
            status = %session.status,
            "Session ready"
        );
        Ok(session)
    }

    /// Mode being played.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Geometry of the mode.
    pub fn config(&self) -> ModeConfig {
        self.config
    }

    /// Boards in id order.
    pub fn boards(&self) -> &[BoardEngine] {
        &self.boards
    }

    /// One board by id.
    pub fn board(&self, id: usize) -> Option<&BoardEngine> {
        self.boards.get(id)
    }

    /// Shared typing state.
    pub fn input(&self) -> &InputDispatcher {
        &self.input
    }

    /// Shared active row.
    pub fn shared_active_row(&self) -> usize {
        self.input.active_row()
    }

    /// Boards won so far.
    pub fn winner_count(&self) -> usize {
        self.winner_count
    }

    /// Overall status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Snapshot store.
    pub fn store(&self) -> &PersistenceStore<S> {
        &self.store
    }

    /// True while a submitted row is waiting on reveals.
    pub fn is_revealing(&self) -> bool {
        !self.pending.is_empty() || !self.completed.is_empty()
    }

    /// Reveals waiting to complete.
    pub fn pending_reveals(&self) -> impl Iterator<Item = RevealTicket> + '_ {
        self.pending.iter().copied()
    }

    /// Routes a key press to every board playing the shared row.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn handle_key(&mut self, key: &Key) -> Vec<Feedback> {
        if self.is_locked() {
            return Vec::new();
        }
        let Some(intent) = self.input.handle_key(key) else {
            return Vec::new();
        };

        let mut feedback = Vec::new();
        if let IntentKind::Letter { cell, .. } = intent.kind() {
            feedback.push(Feedback::BumpCell {
                row: intent.row_index(),
                cell,
            });
        }
        self.fan_out(intent);
        feedback.extend(self.drain_events());
        feedback
    }

    /// Routes a tap on a cell.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<Feedback> {
        if self.is_locked() {
            return Vec::new();
        }
        let Some(intent) = self.input.handle_pointer(event) else {
            return Vec::new();
        };
        self.fan_out(intent);
        self.drain_events()
    }

    /// Timed reveal sequences for every pending ticket.
    pub fn reveal_sequences(&self, timing: RevealTiming) -> Vec<RevealSequence> {
        self.pending
            .iter()
            .filter_map(|&ticket| {
                self.boards
                    .get(ticket.board_id())
                    .and_then(|board| board.reveal_sequence(ticket, timing))
            })
            .collect()
    }

    /// Marks one reveal as finished.
    ///
    /// Outcomes commit only when the last reveal of the row completes, in
    /// board order, after which the shared row advances. Finished boards keep
    /// their own frozen row.
    #[instrument(skip(self), fields(mode = %self.mode, board_id = ticket.board_id(), row = ticket.row()))]
    pub fn complete_reveal(&mut self, ticket: RevealTicket) -> Vec<Feedback> {
        if !self.pending.remove(&ticket) {
            debug!("Unknown or stale reveal ticket");
            return Vec::new();
        }
        self.completed.insert(ticket);
        if !self.pending.is_empty() {
            trace!(waiting = self.pending.len(), "Waiting on other boards");
            return Vec::new();
        }

        for ticket in std::mem::take(&mut self.completed) {
            if let Some(board) = self.boards.get_mut(ticket.board_id()) {
                board.finish_reveal(ticket, &mut self.store);
            }
        }

        let mut feedback = self.drain_events();
        self.input.advance_row();
        feedback.push(Feedback::RowAdvanced {
            row: self.input.active_row(),
        });

        let before = self.status;
        self.refresh_status();
        match (before, self.status) {
            (SessionStatus::InProgress, SessionStatus::Won) => {
                info!(winners = self.winner_count, "Session won");
                feedback.push(Feedback::SessionWon);
            }
            (SessionStatus::InProgress, SessionStatus::Lost) => {
                info!(winners = self.winner_count, "Session lost");
                feedback.push(Feedback::SessionLost);
            }
            _ => {}
        }
        feedback
    }

    /// Completes every pending reveal immediately.
    pub fn complete_pending_reveals(&mut self) -> Vec<Feedback> {
        let tickets: Vec<_> = self.pending.iter().copied().collect();
        tickets
            .into_iter()
            .flat_map(|ticket| self.complete_reveal(ticket))
            .collect()
    }

    /// Plays every pending reveal with `timing` and commits the results.
    ///
    /// Sequences cancelled by a reset are dropped without committing. A
    /// sequence that fails for any other reason still commits its row.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn run_reveals(&mut self, timing: RevealTiming) -> Vec<Feedback> {
        let mut running = JoinSet::new();
        let mut tickets = HashMap::new();
        for sequence in self.reveal_sequences(timing) {
            let ticket = sequence.ticket();
            let task = running.spawn(sequence.run());
            tickets.insert(task.id(), ticket);
        }

        let mut feedback = Vec::new();
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(Ok(ticket)) => feedback.extend(self.complete_reveal(ticket)),
                Ok(Err(cancelled)) => feedback.extend(self.recover_reveal(cancelled.ticket)),
                Err(e) => {
                    warn!(error = %e, "Reveal task failed");
                    if let Some(ticket) = tickets.get(&e.id()) {
                        feedback.extend(self.recover_reveal(*ticket));
                    }
                }
            }
        }
        feedback
    }

    /// Starts the mode over with new answers and wipes its saved progress.
    #[instrument(skip(self, answers), fields(mode = %self.mode))]
    pub fn new_game(&mut self, answers: Vec<String>) -> Result<Vec<Feedback>, SessionError> {
        let answers = validate_answers(self.mode, answers)?;

        for (board, answer) in self.boards.iter_mut().zip(&answers) {
            board.reset(answer.as_str(), self.dispatch_tx.subscribe());
        }
        self.pending.clear();
        self.completed.clear();
        self.input.reset();
        self.winner_count = 0;
        self.status = SessionStatus::InProgress;
        self.store.clear_mode(self.mode);

        info!("New game started");
        Ok(self.drain_events())
    }

    /// Unwraps the snapshot store.
    pub fn into_store(self) -> PersistenceStore<S> {
        self.store
    }

    /// Commits a reveal whose sequence ended early, unless a reset already
    /// dropped it. Scores are on the row from the submit, so only the
    /// animation is lost.
    fn recover_reveal(&mut self, ticket: RevealTicket) -> Vec<Feedback> {
        if !self.pending.contains(&ticket) {
            debug!(board_id = ticket.board_id(), row = ticket.row(), "Reveal dropped");
            return Vec::new();
        }
        warn!(
            board_id = ticket.board_id(),
            row = ticket.row(),
            "Reveal ended early; committing without animation"
        );
        self.complete_reveal(ticket)
    }

    fn is_locked(&self) -> bool {
        if self.status != SessionStatus::InProgress {
            trace!(status = %self.status, "Session over; input ignored");
            return true;
        }
        if self.is_revealing() {
            trace!("Reveal in flight; input locked");
            return true;
        }
        false
    }

    fn fan_out(&mut self, intent: Intent) {
        let dispatch = Dispatch::new(intent, self.input.buffer().to_vec(), self.input.cursor());
        if self.dispatch_tx.send(dispatch).is_err() {
            debug!("No board subscribed; dispatch dropped");
            return;
        }
        for board in &mut self.boards {
            board.pump();
        }
    }

    fn drain_events(&mut self) -> Vec<Feedback> {
        let mut feedback = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            trace!(?event, "Board event");
            feedback.push(match event {
                BoardEvent::Shake { board_id, row } => Feedback::Shake { board_id, row },
                BoardEvent::RevealStarted(ticket) => {
                    self.pending.insert(ticket);
                    Feedback::RevealStarted(ticket)
                }
                BoardEvent::RevealCancelled(ticket) => Feedback::RevealCancelled(ticket),
                BoardEvent::Advanced { .. } => continue,
                BoardEvent::Won { board_id, row } => {
                    self.winner_count += 1;
                    Feedback::BoardWon { board_id, row }
                }
                BoardEvent::Lost { board_id } => Feedback::BoardLost { board_id },
            });
        }
        feedback
    }

    fn refresh_status(&mut self) {
        self.status = if self.winner_count == self.boards.len() {
            SessionStatus::Won
        } else if self.boards.iter().all(|board| board.outcome().is_finished()) {
            SessionStatus::Lost
        } else {
            SessionStatus::InProgress
        };
    }
}

/// Checks answer count and shape against the mode, lower-casing each answer.
pub fn validate_answers(mode: Mode, answers: Vec<String>) -> Result<Vec<String>, SessionError> {
    let config = mode.config();
    if answers.len() != config.board_count() {
        return Err(SessionError::AnswerCount {
            mode,
            expected: config.board_count(),
            actual: answers.len(),
        });
    }
    answers
        .into_iter()
        .map(|answer| {
            let valid = answer.len() == config.word_length()
                && answer.chars().all(|c| c.is_ascii_alphabetic());
            if valid {
                Ok(answer.to_ascii_lowercase())
            } else {
                Err(SessionError::InvalidAnswer {
                    answer,
                    expected: config.word_length(),
                })
            }
        })
        .collect()
}
