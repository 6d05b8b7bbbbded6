//! Editable UI intents.
//!
//! At most one form is open per board view. Opening a variant replaces
//! whatever was open before.

use crate::model::{Board, Role};
use crate::protocol::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardTitleForm {
    pub board_title: String,
}

/// Create (`column_id == None`) or rename a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnForm {
    pub column_id: Option<i64>,
    pub column_title: String,
    pub wip_limit_on: bool,
    pub wip_limit: i64,
}

impl Default for ColumnForm {
    fn default() -> Self {
        Self {
            column_id: None,
            column_title: String::new(),
            wip_limit_on: false,
            wip_limit: 5,
        }
    }
}

/// WIP settings of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMenu {
    pub column_id: i64,
    pub wip_limit_on: bool,
    pub wip_limit: i64,
}

/// Create (`task_id == None`) or edit a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub column_id: i64,
    pub task_id: Option<i64>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNameForm {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleForm {
    pub user_slug: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteForm {
    pub invite_email: String,
}

/// The single open form of a board view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveForm {
    #[default]
    None,
    BoardTitle(BoardTitleForm),
    Column(ColumnForm),
    ColumnOptions(ColumnMenu),
    Task(TaskForm),
    DisplayName(DisplayNameForm),
    Role(RoleForm),
    Invite(InviteForm),
}

/// A keystroke-level edit aimed at the open form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    BoardTitle(String),
    ColumnTitle(String),
    WipLimitOn(bool),
    WipLimit(i64),
    TaskText(String),
    DisplayName(String),
    Role(Role),
    InviteEmail(String),
}

impl ActiveForm {
    /// Title form prefilled from the board.
    pub fn board_title(board: &Board) -> Self {
        Self::BoardTitle(BoardTitleForm {
            board_title: board.board_title.clone(),
        })
    }

    /// Options menu prefilled from a column, if it exists.
    pub fn column_options(board: &Board, column_id: i64) -> Option<Self> {
        board.column(column_id).map(|column| {
            Self::ColumnOptions(ColumnMenu {
                column_id,
                wip_limit_on: column.wip_limit_on,
                wip_limit: column.wip_limit,
            })
        })
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Forms rendered inside the board options panel.
    pub fn in_options_panel(&self) -> bool {
        matches!(self, Self::DisplayName(_) | Self::Role(_) | Self::Invite(_))
    }

    pub fn is_member_form(&self) -> bool {
        matches!(self, Self::DisplayName(_) | Self::Role(_))
    }

    /// Forms that edit columns or tasks.
    pub fn is_column_form(&self) -> bool {
        matches!(self, Self::Column(_) | Self::ColumnOptions(_))
    }

    /// Column this form is about, if any.
    pub fn subject_column(&self) -> Option<i64> {
        match self {
            Self::Column(form) => form.column_id,
            Self::ColumnOptions(menu) => Some(menu.column_id),
            Self::Task(form) => Some(form.column_id),
            _ => None,
        }
    }

    /// Task this form is editing, if any.
    pub fn subject_task(&self) -> Option<i64> {
        match self {
            Self::Task(form) => form.task_id,
            _ => None,
        }
    }

    /// Apply one edit. Returns `false` when the input does not belong to the
    /// open form.
    pub fn apply_input(&mut self, input: FormInput) -> bool {
        match (self, input) {
            (Self::BoardTitle(form), FormInput::BoardTitle(title)) => form.board_title = title,
            (Self::Column(form), FormInput::ColumnTitle(title)) => form.column_title = title,
            (Self::Column(form), FormInput::WipLimitOn(on)) => form.wip_limit_on = on,
            (Self::Column(form), FormInput::WipLimit(limit)) => form.wip_limit = limit,
            (Self::ColumnOptions(menu), FormInput::WipLimitOn(on)) => menu.wip_limit_on = on,
            (Self::ColumnOptions(menu), FormInput::WipLimit(limit)) => menu.wip_limit = limit,
            (Self::Task(form), FormInput::TaskText(text)) => form.text = text,
            (Self::DisplayName(form), FormInput::DisplayName(name)) => form.display_name = name,
            (Self::Role(form), FormInput::Role(role)) => form.role = role,
            (Self::Invite(form), FormInput::InviteEmail(email)) => form.invite_email = email,
            _ => return false,
        }
        true
    }

    /// Command that submits this form to the board channel.
    pub fn to_command(&self) -> Option<Command> {
        let command = match self {
            Self::None => return None,
            Self::BoardTitle(form) => Command::UpdateBoardTitle {
                board_title: form.board_title.trim().to_string(),
            },
            Self::Column(form) => match form.column_id {
                Some(column_id) => Command::UpdateColumn {
                    column_id,
                    column_title: Some(form.column_title.trim().to_string()),
                    wip_limit_on: None,
                    wip_limit: None,
                },
                None => Command::CreateColumn {
                    column_title: form.column_title.trim().to_string(),
                    wip_limit_on: form.wip_limit_on,
                    wip_limit: form.wip_limit,
                },
            },
            Self::ColumnOptions(menu) => Command::UpdateColumn {
                column_id: menu.column_id,
                column_title: None,
                wip_limit_on: Some(menu.wip_limit_on),
                wip_limit: Some(menu.wip_limit),
            },
            Self::Task(form) => match form.task_id {
                Some(task_id) => Command::UpdateTask {
                    task_id,
                    text: form.text.trim().to_string(),
                },
                None => Command::CreateTask {
                    column_id: form.column_id,
                    text: form.text.trim().to_string(),
                },
            },
            Self::DisplayName(form) => Command::UpdateMemberDisplayName {
                display_name: form.display_name.trim().to_string(),
            },
            Self::Role(form) => Command::UpdateMemberRole {
                user_slug: form.user_slug.clone(),
                role: form.role,
            },
            Self::Invite(form) => Command::InviteMember {
                invite_email: form.invite_email.trim().to_lowercase(),
            },
        };
        Some(command)
    }
}
