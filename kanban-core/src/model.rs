//! Board entities as they travel on the wire.
//!
//! Field names match the JSON payloads the board channel broadcasts, so the
//! same types decode a websocket `BOARD_LOADED` frame and an HTTP board read.

use serde::{Deserialize, Serialize};

/// A member's permission level on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Role {
    Admin = 1,
    Editor = 2,
    Viewer = 3,
}

impl Role {
    /// Admins and editors may change columns and tasks.
    pub fn can_edit(self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Admin),
            2 => Ok(Role::Editor),
            3 => Ok(Role::Viewer),
            other => Err(format!("role cannot be {other}")),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_slug: String,
    pub name: String,
    pub email: String,
}

/// An ordered lane holding tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub board: String,
    pub column_id: i64,
    pub column_title: String,
    /// Dense 0-based position among the board's columns.
    pub column_index: i64,
    pub wip_limit_on: bool,
    pub wip_limit: i64,
    pub updated_at: String,
}

/// A unit of work owned by exactly one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub board: String,
    /// Owning column id.
    pub column: i64,
    pub task_id: i64,
    /// Dense 0-based position within the owning column.
    pub task_index: i64,
    pub text: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub board: String,
    pub user: User,
    pub role: Role,
    pub display_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub board: String,
    pub msg_id: i64,
    pub sender: User,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub board: String,
    #[serde(default)]
    pub task: Option<i64>,
    #[serde(default)]
    pub command: Option<String>,
    pub msg: String,
    pub created_at: String,
}

/// Full board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub board_slug: String,
    pub board_title: String,
    pub activity_logs: Vec<ActivityLog>,
    pub columns: Vec<Column>,
    pub memberships: Vec<Membership>,
    pub messages: Vec<Message>,
    pub tasks: Vec<Task>,
    pub created_at: String,
    pub updated_at: String,
    pub messages_allowed: bool,
    pub new_members_allowed: bool,
}

/// Columns immediately left and right of a column, if their indices are
/// exactly one apart from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacentColumns<'a> {
    pub left: Option<&'a Column>,
    pub right: Option<&'a Column>,
}

impl Board {
    pub fn column(&self, column_id: i64) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn membership(&self, user_slug: &str) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.user.user_slug == user_slug)
    }

    /// Columns in display order.
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.column_index);
        columns
    }

    /// Tasks of one column in display order.
    pub fn column_tasks(&self, column_id: i64) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.column == column_id)
            .collect();
        tasks.sort_by_key(|t| t.task_index);
        tasks
    }

    pub fn column_task_count(&self, column_id: i64) -> usize {
        self.tasks.iter().filter(|t| t.column == column_id).count()
    }

    /// Neighbours a column can be moved toward with a single step.
    pub fn adjacent_columns(&self, column_id: i64) -> AdjacentColumns<'_> {
        let Some(this) = self.column(column_id) else {
            return AdjacentColumns::default();
        };
        AdjacentColumns {
            left: self
                .columns
                .iter()
                .find(|c| c.column_index == this.column_index - 1),
            right: self
                .columns
                .iter()
                .find(|c| c.column_index == this.column_index + 1),
        }
    }

    /// Whether a column holds more tasks than its enabled WIP limit allows.
    pub fn wip_exceeded(&self, column_id: i64) -> bool {
        match self.column(column_id) {
            Some(column) if column.wip_limit_on => {
                self.column_task_count(column_id) as i64 > column.wip_limit
            }
            _ => false,
        }
    }
}
