//! Cancelable reveal sequences.
//!
//! Submitting a row hands out a [`RevealTicket`]. The board stays locked until
//! the ticket is completed, and only a ticket carrying the board's current
//! generation can commit. Resetting a board bumps its generation through the
//! [`RevealGuard`], which both stales outstanding tickets and aborts any
//! [`RevealSequence`] still waiting on its timers.

use crate::BoardId;
use derive_more::{Display, Error};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, instrument, trace, warn};

/// Handle for one in-flight row reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevealTicket {
    board_id: BoardId,
    row: usize,
    generation: u64,
}

impl RevealTicket {
    pub(crate) fn new(board_id: BoardId, row: usize, generation: u64) -> Self {
        Self {
            board_id,
            row,
            generation,
        }
    }

    /// Board being revealed.
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Row being revealed.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Board generation the ticket was issued under.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-cell timing of a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    stagger: Duration,
    flip: Duration,
}

impl RevealTiming {
    /// Creates a timing: cell `i` starts after `i * stagger` and takes `flip`.
    pub const fn new(stagger: Duration, flip: Duration) -> Self {
        Self { stagger, flip }
    }

    /// No waiting at all.
    pub const fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Delay between consecutive cells starting to flip.
    pub fn stagger(&self) -> Duration {
        self.stagger
    }

    /// Duration of one cell flip.
    pub fn flip(&self) -> Duration {
        self.flip
    }

    /// Time until cell `index` finishes flipping.
    pub fn cell_done_after(&self, index: usize) -> Duration {
        self.stagger * u32::try_from(index).unwrap_or(u32::MAX) + self.flip
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::new(Duration::from_millis(300), Duration::from_millis(1000))
    }
}

/// Returned when a reveal sequence is abandoned before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display(
    "Reveal of board {} row {} was cancelled",
    ticket.board_id,
    ticket.row
)]
pub struct RevealCancelled {
    /// Ticket of the abandoned reveal.
    pub ticket: RevealTicket,
}

/// Generation counter owned by a board; changing it cancels pending reveals.
#[derive(Debug)]
pub struct RevealGuard {
    generation: watch::Sender<u64>,
}

impl RevealGuard {
    /// Starts at generation zero.
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Invalidates every ticket and sequence issued so far.
    #[instrument(skip(self))]
    pub fn cancel(&self) -> u64 {
        self.generation.send_modify(|generation| *generation += 1);
        let generation = self.generation();
        debug!(generation, "Reveal generation advanced");
        generation
    }

    /// Receiver that observes generation changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}

impl Default for RevealGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Timed, ordered per-cell reveal of one row.
#[derive(Debug)]
pub struct RevealSequence {
    ticket: RevealTicket,
    cells: usize,
    timing: RevealTiming,
    cancel: watch::Receiver<u64>,
}

impl RevealSequence {
    pub(crate) fn new(
        ticket: RevealTicket,
        cells: usize,
        timing: RevealTiming,
        cancel: watch::Receiver<u64>,
    ) -> Self {
        Self {
            ticket,
            cells,
            timing,
            cancel,
        }
    }

    /// Ticket this sequence completes.
    pub fn ticket(&self) -> RevealTicket {
        self.ticket
    }

    /// Waits for every cell to flip, or bails out when the owning board is
    /// reset or dropped.
    #[instrument(skip(self), fields(board_id = self.ticket.board_id, row = self.ticket.row))]
    pub async fn run(mut self) -> Result<RevealTicket, RevealCancelled> {
        let cancelled = RevealCancelled {
            ticket: self.ticket,
        };
        if *self.cancel.borrow() != self.ticket.generation {
            debug!("Reveal stale before it started");
            return Err(cancelled);
        }

        let mut flips = JoinSet::new();
        for cell in 0..self.cells {
            let delay = self.timing.cell_done_after(cell);
            flips.spawn(async move {
                tokio::time::sleep(delay).await;
                cell
            });
        }

        loop {
            tokio::select! {
                biased;

                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() != self.ticket.generation {
                        flips.abort_all();
                        debug!("Reveal cancelled");
                        return Err(cancelled);
                    }
                }

                flipped = flips.join_next() => match flipped {
                    Some(Ok(cell)) => trace!(cell, "Cell flipped"),
                    Some(Err(e)) => {
                        warn!(error = %e, "Cell flip task failed");
                        flips.abort_all();
                        return Err(cancelled);
                    }
                    None => {
                        debug!("Reveal complete");
                        return Ok(self.ticket);
                    }
                },
            }
        }
    }
}
