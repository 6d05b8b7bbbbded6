//! Local-only trial board.
//!
//! A trial board never talks to a server: every entity it creates gets a
//! synthetic id drawn from a random UUID.

use uuid::Uuid;

use crate::model::{Board, Column, Task};

pub const TRIAL_SLUG: &str = "demo";

/// Random id in the unsigned 32-bit range.
pub fn synthetic_id() -> i64 {
    (Uuid::new_v4().as_u128() & 0xFFFF_FFFF) as i64
}

fn trial_column(title: &str, index: i64, wip_limit_on: bool, wip_limit: i64) -> Column {
    Column {
        board: TRIAL_SLUG.to_string(),
        column_id: synthetic_id(),
        column_title: title.to_string(),
        column_index: index,
        wip_limit_on,
        wip_limit,
        updated_at: String::new(),
    }
}

/// Column for a trial board, appended after the existing ones.
pub fn new_column(board: &Board, title: &str, wip_limit_on: bool, wip_limit: i64) -> Column {
    trial_column(title, board.columns.len() as i64, wip_limit_on, wip_limit)
}

/// Task for a trial board, appended at the end of its column.
pub fn new_task(board: &Board, column_id: i64, text: &str) -> Task {
    Task {
        board: TRIAL_SLUG.to_string(),
        column: column_id,
        task_id: synthetic_id(),
        task_index: board.column_task_count(column_id) as i64,
        text: text.to_string(),
        updated_at: String::new(),
    }
}

/// Starter board: To do, Doing and Done with one task.
pub fn trial_board() -> Board {
    let columns = vec![
        trial_column("To do", 0, true, 5),
        trial_column("Doing", 1, true, 3),
        trial_column("Done", 2, false, 5),
    ];
    let first = Task {
        board: TRIAL_SLUG.to_string(),
        column: columns[0].column_id,
        task_id: synthetic_id(),
        task_index: 0,
        text: "First task - edit, move, or delete!".to_string(),
        updated_at: String::new(),
    };

    Board {
        board_slug: TRIAL_SLUG.to_string(),
        board_title: "New kanban board".to_string(),
        activity_logs: Vec::new(),
        columns,
        memberships: Vec::new(),
        messages: Vec::new(),
        tasks: vec![first],
        created_at: String::new(),
        updated_at: String::new(),
        messages_allowed: false,
        new_members_allowed: false,
    }
}
