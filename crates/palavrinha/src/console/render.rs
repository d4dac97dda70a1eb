//! Stateless text rendering of a session.
//!
//! Cells print three columns wide: `[T]` correct, `(T)` present, ` t `
//! absent, ` T ` typed but unscored, ` . ` empty. The shared active row is
//! marked with `>` and the cursor cell with `_` when empty.

use palavrinha_core::{
    BoardEngine, Cell, Feedback, LetterStatus, Outcome, SessionCoordinator, SessionStatus, Storage,
};

const BOARD_GAP: &str = "   ";

/// Draws every board side by side, followed by a status line.
pub fn render<S: Storage>(session: &SessionCoordinator<S>) -> String {
    let config = session.config();
    let shared_row = session.shared_active_row();
    let cursor = session.input().cursor();
    let mut out = String::new();

    let headers: Vec<_> = session.boards().iter().map(header).collect();
    out.push_str("   ");
    out.push_str(&headers.join(BOARD_GAP));
    out.push('\n');

    for row in 0..config.total_rows() {
        let marker = if row == shared_row && session.status() == SessionStatus::InProgress {
            '>'
        } else {
            ' '
        };
        let cells: Vec<_> = session
            .boards()
            .iter()
            .map(|board| draw_row(board, row, shared_row, cursor))
            .collect();
        out.push_str(&format!("{marker}{:>2}", row + 1));
        out.push_str(&cells.join(BOARD_GAP));
        out.push('\n');
    }

    out.push_str(&status_line(session));
    out
}

fn header(board: &BoardEngine) -> String {
    let width = board.rows().first().map_or(0, |row| row.cells().len()) * 3;
    let label = match board.outcome() {
        Outcome::None => format!("#{}", board.id() + 1),
        Outcome::Won => format!("#{} won", board.id() + 1),
        Outcome::Lost => format!("#{} {}", board.id() + 1, board.answer().to_uppercase()),
    };
    format!("{label:<width$}")
}

fn draw_row(board: &BoardEngine, row: usize, shared_row: usize, cursor: usize) -> String {
    let Some(cells) = board.rows().get(row).map(|row| row.cells()) else {
        return String::new();
    };
    let typing = board.outcome().is_active() && row == shared_row;
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| draw_cell(cell, typing && i == cursor))
        .collect()
}

fn draw_cell(cell: &Cell, at_cursor: bool) -> String {
    match (cell.letter(), cell.status()) {
        (Some(c), LetterStatus::Correct) => format!("[{}]", c.to_ascii_uppercase()),
        (Some(c), LetterStatus::Present) => format!("({})", c.to_ascii_uppercase()),
        (Some(c), LetterStatus::Absent) => format!(" {} ", c),
        (Some(c), LetterStatus::Unknown) => format!(" {} ", c.to_ascii_uppercase()),
        (None, _) if at_cursor => " _ ".to_string(),
        (None, _) => " . ".to_string(),
    }
}

fn status_line<S: Storage>(session: &SessionCoordinator<S>) -> String {
    let config = session.config();
    match session.status() {
        SessionStatus::InProgress => format!(
            "{} - row {}/{} - solved {}/{}",
            session.mode(),
            (session.shared_active_row() + 1).min(config.total_rows()),
            config.total_rows(),
            session.winner_count(),
            config.board_count()
        ),
        SessionStatus::Won => format!("{} - all boards solved!", session.mode()),
        SessionStatus::Lost => format!(
            "{} - game over, solved {}/{} (:new to play again)",
            session.mode(),
            session.winner_count(),
            config.board_count()
        ),
    }
}

/// Human-readable line for a feedback signal, if it deserves one.
pub fn describe<S: Storage>(feedback: &Feedback, session: &SessionCoordinator<S>) -> Option<String> {
    match *feedback {
        Feedback::Shake { .. } => Some("Not enough letters".to_string()),
        Feedback::BoardWon { board_id, row } => Some(format!(
            "Board #{} solved on row {}",
            board_id + 1,
            row + 1
        )),
        Feedback::BoardLost { board_id } => {
            let answer = session.board(board_id).map(BoardEngine::answer)?;
            Some(format!(
                "Board #{} is out of rows; the word was {}",
                board_id + 1,
                answer.to_uppercase()
            ))
        }
        Feedback::SessionWon => Some("You solved every board!".to_string()),
        Feedback::SessionLost => Some("Game over".to_string()),
        _ => None,
    }
}
