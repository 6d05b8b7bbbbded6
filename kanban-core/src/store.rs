//! Board state store: the client's single view of one board.
//!
//! All changes go through [`reduce`], a pure `(state, event) -> state`
//! function over a closed set of [`BoardEvent`]s:
//!
//! ```text
//! local intent ──► BoardEvent::MoveTask ──► ordering::move_task ──► provisional board
//!                                      └──► pending Command ──► (controller sends it)
//!
//! inbound frame ──► BoardEvent::Broadcast ──► replace sub-collection by value
//!                                        └──► self-echo? clear pending, close own form
//! ```
//!
//! Connection phases:
//!
//! ```text
//! Disconnected ─► Connecting ─► Syncing ─► Live
//!                                  │         │
//!                                  └────┬────┘
//!                                       ▼
//!                                  Redirecting (terminal)
//! ```

use crate::form::{ActiveForm, FormInput};
use crate::model::{Board, Role};
use crate::ordering;
use crate::protocol::{Broadcast, Command, InboundFrame, MembersSaved};
use crate::trial;

/// Notice shown when this client is no longer a member.
pub const NOT_A_MEMBER: &str = "You may not view this project.";

/// Notice shown for transport failures without a message.
pub const GENERIC_FAILURE: &str = "Oops! Something went wrong.";

/// Where the view navigates once a redirect timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Dashboard,
    Login,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Disconnected,
    Connecting,
    /// Waiting for the first board snapshot.
    Syncing,
    Live,
    /// Local-only board; nothing is ever sent.
    Trial,
    /// Terminal for this view.
    Redirecting(RedirectTarget),
}

/// Everything this client believes about one board view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    pub board: Option<Board>,
    pub phase: SyncPhase,
    pub reading_http: bool,
    /// The one unacknowledged command. While set, mutating intents are
    /// rejected.
    pub pending: Option<Command>,
    pub form: ActiveForm,
    pub options_open: bool,
    /// Free-text notice.
    pub modal: Option<String>,
    pub role: Option<Role>,
    /// Slug of the local user, once the session provider knows it.
    pub identity: Option<String>,
    /// Set when this client's own message was confirmed.
    pub msg_form_will_clear: bool,
}

impl BoardState {
    pub fn is_sending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_trial(&self) -> bool {
        self.phase == SyncPhase::Trial
    }

    pub fn redirect_target(&self) -> Option<RedirectTarget> {
        match self.phase {
            SyncPhase::Redirecting(target) => Some(target),
            _ => None,
        }
    }

    /// Whether the view should show a loading placeholder.
    pub fn is_loading(&self) -> bool {
        match self.phase {
            SyncPhase::Trial | SyncPhase::Redirecting(_) => false,
            SyncPhase::Live => self.identity.is_none(),
            // A stale board stays on screen while the channel resyncs.
            SyncPhase::Connecting | SyncPhase::Syncing => {
                self.board.is_none() || self.identity.is_none()
            }
            SyncPhase::Disconnected => true,
        }
    }

    /// Whether column and task edits are currently allowed.
    pub fn can_edit(&self) -> bool {
        match self.phase {
            SyncPhase::Trial => true,
            SyncPhase::Live => {
                self.pending.is_none() && self.role.is_some_and(Role::can_edit)
            }
            _ => false,
        }
    }

    /// Whether any command may be started right now.
    pub fn can_send(&self) -> bool {
        self.phase == SyncPhase::Live && self.pending.is_none() && self.board.is_some()
    }
}

/// The closed set of store events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The session provider resolved (or lost) the local user.
    SetIdentity(Option<String>),
    ConnectionOpening,
    /// The transport opened; the server is about to send the board.
    StartWsReadBoard,
    StartHttpRead,
    StopHttpRead,
    /// Board detail read over HTTP.
    HttpBoardLoaded(Board),
    /// A decoded inbound frame.
    Broadcast(InboundFrame),
    TransportFailed(Option<String>),
    /// The transport dropped and a reconnection is under way.
    ConnectionLost,
    LoadTrialBoard,

    StartCommand(Command),
    StopCommand,

    MoveColumn {
        column_id: i64,
        old_index: i64,
        new_index: i64,
    },
    DeleteColumn {
        column_id: i64,
    },
    MoveTask {
        task_id: i64,
        old_index: i64,
        new_index: i64,
        old_column: i64,
        new_column: i64,
    },
    DeleteTask {
        task_id: i64,
    },

    OpenForm(ActiveForm),
    FormInput(FormInput),
    SubmitForm,
    CloseForm,
    CloseMemberForms,
    OpenOptions,
    CloseOptions,
    /// Escape key: close the innermost open surface.
    Escape,
    ShowModal(String),
    CloseModal,
    MessageFormCleared,
    Reset,
}

/// Owned store for one board view.
///
/// Created per view and dropped with it; nothing is shared between views.
#[derive(Debug, Default)]
pub struct BoardStore {
    state: BoardState,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            state: BoardState {
                identity: Some(identity.into()),
                ..BoardState::default()
            },
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn dispatch(&mut self, event: BoardEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    /// Tear down the view; returns the final state.
    pub fn dispose(mut self) -> BoardState {
        self.dispatch(BoardEvent::Reset);
        self.state
    }
}

/// Apply one event.
pub fn reduce(mut state: BoardState, event: BoardEvent) -> BoardState {
    if let SyncPhase::Redirecting(_) = state.phase {
        return match event {
            BoardEvent::CloseModal => {
                state.modal = None;
                state
            }
            BoardEvent::SetIdentity(identity) => {
                state.identity = identity;
                state
            }
            BoardEvent::Reset => BoardState::default(),
            _ => state,
        };
    }

    match event {
        BoardEvent::SetIdentity(identity) => {
            let changed = state.identity != identity;
            state.identity = identity;
            if state.phase == SyncPhase::Trial {
                state
            } else if state.identity.is_none() {
                state.role = None;
                state
            } else if changed {
                derive_role(state)
            } else {
                state
            }
        }
        BoardEvent::ConnectionOpening => {
            if state.phase == SyncPhase::Disconnected {
                state.phase = SyncPhase::Connecting;
            }
            state
        }
        BoardEvent::StartWsReadBoard => {
            if state.phase != SyncPhase::Trial {
                state.phase = SyncPhase::Syncing;
            }
            state
        }
        BoardEvent::StartHttpRead => {
            state.reading_http = true;
            state
        }
        BoardEvent::StopHttpRead => {
            state.reading_http = false;
            state
        }
        BoardEvent::HttpBoardLoaded(board) => {
            state.reading_http = false;
            if state.phase == SyncPhase::Trial {
                return state;
            }
            install_board(state, board)
        }
        BoardEvent::Broadcast(frame) => apply_broadcast(state, frame),
        BoardEvent::TransportFailed(message) => {
            log::error!("board transport failed: {message:?}");
            let notice = message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            revoke(state, notice)
        }
        BoardEvent::ConnectionLost => {
            if matches!(state.phase, SyncPhase::Syncing | SyncPhase::Live) {
                if let Some(command) = &state.pending {
                    log::warn!("connection lost with {} unacknowledged", command.name());
                }
                state.phase = SyncPhase::Connecting;
                state.pending = None;
            }
            state
        }
        BoardEvent::LoadTrialBoard => BoardState {
            board: Some(trial::trial_board()),
            phase: SyncPhase::Trial,
            role: Some(Role::Admin),
            identity: state.identity,
            ..BoardState::default()
        },

        BoardEvent::StartCommand(command) => start_command(state, command),
        BoardEvent::StopCommand => {
            state.pending = None;
            state
        }

        BoardEvent::MoveColumn {
            column_id,
            old_index,
            new_index,
        } => {
            if old_index == new_index {
                return state;
            }
            let command = Command::MoveColumn {
                column_id,
                column_index: new_index,
            };
            edit(state, command, |state, board| {
                let columns = std::mem::take(&mut board.columns);
                board.columns = ordering::move_column(column_id, old_index, new_index, columns);
                if matches!(state.form, ActiveForm::ColumnOptions(_)) {
                    state.form = ActiveForm::None;
                }
            })
        }
        BoardEvent::DeleteColumn { column_id } => {
            let Some(column_index) = state
                .board
                .as_ref()
                .and_then(|b| b.column(column_id))
                .map(|c| c.column_index)
            else {
                return state;
            };
            edit(state, Command::DeleteColumn { column_id }, |state, board| {
                let columns = std::mem::take(&mut board.columns);
                board.columns = ordering::delete_column(column_index, columns);
                board.tasks.retain(|t| t.column != column_id);
                if state.form.subject_column() == Some(column_id) {
                    state.form = ActiveForm::None;
                }
                state.modal = None;
            })
        }
        BoardEvent::MoveTask {
            task_id,
            old_index,
            new_index,
            old_column,
            new_column,
        } => {
            if old_column == new_column && old_index == new_index {
                return state;
            }
            let command = Command::MoveTask {
                task_id,
                column_id: new_column,
                task_index: new_index,
            };
            edit(state, command, |state, board| {
                let tasks = std::mem::take(&mut board.tasks);
                board.tasks = ordering::move_task(
                    task_id, old_index, new_index, old_column, new_column, tasks,
                );
                if matches!(state.form, ActiveForm::Task(_)) {
                    state.form = ActiveForm::None;
                }
            })
        }
        BoardEvent::DeleteTask { task_id } => {
            let Some((column_id, task_index)) = state
                .board
                .as_ref()
                .and_then(|b| b.task(task_id))
                .map(|t| (t.column, t.task_index))
            else {
                return state;
            };
            edit(state, Command::DeleteTask { task_id }, |state, board| {
                let tasks = std::mem::take(&mut board.tasks);
                board.tasks = ordering::delete_task(column_id, task_index, tasks);
                if matches!(state.form, ActiveForm::Task(_)) {
                    state.form = ActiveForm::None;
                }
            })
        }

        BoardEvent::OpenForm(form) => open_form(state, form),
        BoardEvent::FormInput(input) => {
            if !state.form.apply_input(input) {
                log::debug!("form input ignored: no matching form open");
            }
            state
        }
        BoardEvent::SubmitForm => submit_form(state),
        BoardEvent::CloseForm => {
            state.form = ActiveForm::None;
            state
        }
        BoardEvent::CloseMemberForms => {
            if state.form.is_member_form() {
                state.form = ActiveForm::None;
            }
            state
        }
        BoardEvent::OpenOptions => {
            if state.board.is_none() {
                return state;
            }
            if !state.form.in_options_panel() {
                state.form = ActiveForm::None;
            }
            state.options_open = true;
            state
        }
        BoardEvent::CloseOptions => {
            state.options_open = false;
            if state.form.in_options_panel() {
                state.form = ActiveForm::None;
            }
            state
        }
        BoardEvent::Escape => {
            if state.modal.is_some() {
                state.modal = None;
            } else if matches!(state.form, ActiveForm::Invite(_)) || state.form.is_member_form() {
                state.form = ActiveForm::None;
            } else {
                state.form = ActiveForm::None;
                state.options_open = false;
            }
            state
        }
        BoardEvent::ShowModal(message) => {
            state.modal = Some(message);
            state
        }
        BoardEvent::CloseModal => {
            state.modal = None;
            state
        }
        BoardEvent::MessageFormCleared => {
            state.msg_form_will_clear = false;
            state
        }
        BoardEvent::Reset => BoardState::default(),
    }
}

/// Install a fresh snapshot and re-derive this client's role.
fn install_board(mut state: BoardState, board: Board) -> BoardState {
    state.board = Some(board);
    derive_role(state)
}

/// Set the role from the own membership, or revoke access when it is gone.
///
/// Deferred while the identity is still unknown.
fn derive_role(mut state: BoardState) -> BoardState {
    let (Some(board), Some(identity)) = (&state.board, &state.identity) else {
        return state;
    };
    match board.membership(identity) {
        Some(membership) => {
            let role = membership.role;
            if state.role.is_some_and(Role::can_edit) && !role.can_edit() {
                // Lost edit rights: forms for columns, tasks and title are stale.
                if !state.form.in_options_panel() {
                    state.form = ActiveForm::None;
                }
            }
            state.role = Some(role);
            state
        }
        None => {
            log::info!("membership of {identity} missing from board, revoking access");
            revoke(state, NOT_A_MEMBER.to_string())
        }
    }
}

/// Clear everything this client knew and arm the dashboard redirect.
fn revoke(state: BoardState, notice: String) -> BoardState {
    BoardState {
        phase: SyncPhase::Redirecting(RedirectTarget::Dashboard),
        modal: Some(notice),
        identity: state.identity,
        ..BoardState::default()
    }
}

fn apply_broadcast(mut state: BoardState, frame: InboundFrame) -> BoardState {
    if state.phase == SyncPhase::Trial {
        log::warn!("broadcast {:?} ignored on a trial board", frame.broadcast.code());
        return state;
    }

    let from_self = frame.is_from(state.identity.as_deref());
    if from_self {
        state.pending = None;
    }

    match frame.broadcast {
        Broadcast::BoardLoaded(board) => {
            state.phase = SyncPhase::Live;
            state.pending = None;
            let mut state = install_board(state, board);
            if from_self && matches!(state.form, ActiveForm::BoardTitle(_)) {
                state.form = ActiveForm::None;
            }
            state
        }
        Broadcast::BoardUpdated(board) => {
            if state.phase == SyncPhase::Syncing {
                state.phase = SyncPhase::Live;
            }
            let mut state = install_board(state, board);
            if from_self && matches!(state.form, ActiveForm::BoardTitle(_)) {
                state.form = ActiveForm::None;
            }
            state
        }
        Broadcast::ColumnsSaved(columns) => {
            let Some(board) = state.board.as_mut() else {
                return state;
            };
            board.tasks.retain(|t| columns.iter().any(|c| c.column_id == t.column));
            board.columns = columns;

            if from_self {
                state.modal = None;
                if state.form.is_column_form() {
                    state.form = ActiveForm::None;
                }
            } else {
                close_if_subject_vanished(&mut state);
            }
            state
        }
        Broadcast::TasksSaved(tasks) => {
            let Some(board) = state.board.as_mut() else {
                return state;
            };
            board.tasks = tasks;

            if from_self {
                state.modal = None;
                if state.form.is_column_form() || matches!(state.form, ActiveForm::Task(_)) {
                    state.form = ActiveForm::None;
                }
            } else {
                close_if_subject_vanished(&mut state);
            }
            state
        }
        Broadcast::MembersSaved(saved) => {
            let Some(board) = state.board.as_mut() else {
                return state;
            };
            let updated_self = match (&saved, &state.identity) {
                (MembersSaved::Targeted { updated_slugs, .. }, Some(identity)) => {
                    updated_slugs.contains(identity)
                }
                _ => false,
            };
            board.memberships = saved.into_members();

            let mut state = derive_role(state);
            if state.redirect_target().is_some() {
                return state;
            }
            if updated_self && (state.form.is_member_form() || state.form.is_column_form()) {
                state.form = ActiveForm::None;
            }
            if from_self {
                state.modal = None;
                if state.form.is_member_form() {
                    state.form = ActiveForm::None;
                }
            }
            state
        }
        Broadcast::MsgCreated(message) => {
            let Some(board) = state.board.as_mut() else {
                return state;
            };
            match board.messages.iter_mut().find(|m| m.msg_id == message.msg_id) {
                Some(existing) => *existing = message,
                None => board.messages.push(message),
            }
            if from_self {
                state.msg_form_will_clear = true;
            }
            state
        }
        Broadcast::InviteSent(notice) => {
            if matches!(state.form, ActiveForm::Invite(_)) {
                state.form = ActiveForm::None;
            }
            state.modal = Some(notice);
            state
        }
        Broadcast::InviteNotSent(notice) => {
            state.modal = Some(notice);
            state
        }
        Broadcast::BoardDeleted(notice) => {
            log::info!("board deleted, redirecting");
            revoke(state, notice)
        }
        Broadcast::AuthFailed { failure, error } => {
            log::warn!("authorization failed ({failure:?}): {}", error.message);
            revoke(state, error.message)
        }
        Broadcast::ServerError(error) => {
            state.modal = Some(error.message);
            state
        }
    }
}

/// Close a form whose column or task was removed by another member.
fn close_if_subject_vanished(state: &mut BoardState) {
    let Some(board) = &state.board else {
        return;
    };
    let column_gone = state
        .form
        .subject_column()
        .is_some_and(|id| board.column(id).is_none());
    let task_gone = state
        .form
        .subject_task()
        .is_some_and(|id| board.task(id).is_none());
    if column_gone || task_gone {
        state.form = ActiveForm::None;
    }
}

fn start_command(mut state: BoardState, command: Command) -> BoardState {
    if !state.can_send() {
        log::warn!(
            "command {} rejected: phase {:?}, pending {:?}",
            command.name(),
            state.phase,
            state.pending.as_ref().map(Command::name)
        );
        return state;
    }
    if requires_edit(&command) && !state.role.is_some_and(Role::can_edit) {
        log::warn!("command {} rejected: role {:?} cannot edit", command.name(), state.role);
        return state;
    }
    state.pending = Some(command);
    state
}

fn requires_edit(command: &Command) -> bool {
    matches!(
        command,
        Command::UpdateBoardTitle { .. }
            | Command::CreateTask { .. }
            | Command::UpdateTask { .. }
            | Command::MoveTask { .. }
            | Command::DeleteTask { .. }
            | Command::CreateColumn { .. }
            | Command::UpdateColumn { .. }
            | Command::MoveColumn { .. }
            | Command::DeleteColumn { .. }
    )
}

/// Apply an optimistic structural edit.
///
/// Live boards also record `command` as pending; an edit that cannot be sent
/// is rejected whole so the provisional board never runs ahead of the
/// protocol.
fn edit<F>(mut state: BoardState, command: Command, apply: F) -> BoardState
where
    F: FnOnce(&mut BoardState, &mut Board),
{
    if !state.can_edit() {
        log::warn!(
            "edit {} rejected: phase {:?}, sending {}, role {:?}",
            command.name(),
            state.phase,
            state.is_sending(),
            state.role
        );
        return state;
    }
    let Some(mut board) = state.board.take() else {
        return state;
    };
    apply(&mut state, &mut board);
    state.board = Some(board);
    if state.phase == SyncPhase::Live {
        state.pending = Some(command);
    }
    state
}

fn open_form(mut state: BoardState, form: ActiveForm) -> BoardState {
    if state.board.is_none() {
        return state;
    }
    if !form.in_options_panel() {
        state.options_open = false;
    }
    state.form = form;
    state
}

fn submit_form(mut state: BoardState) -> BoardState {
    let Some(command) = state.form.to_command() else {
        return state;
    };
    if state.phase == SyncPhase::Trial {
        state.form = ActiveForm::None;
        if let Some(board) = state.board.as_mut() {
            apply_trial_command(board, command);
        }
        return state;
    }
    start_command(state, command)
}

/// Apply a submitted command directly to a local-only board.
fn apply_trial_command(board: &mut Board, command: Command) {
    match command {
        Command::UpdateBoardTitle { board_title } => board.board_title = board_title,
        Command::CreateColumn {
            column_title,
            wip_limit_on,
            wip_limit,
        } => {
            let column = trial::new_column(board, &column_title, wip_limit_on, wip_limit);
            board.columns.push(column);
        }
        Command::UpdateColumn {
            column_id,
            column_title,
            wip_limit_on,
            wip_limit,
        } => {
            let Some(column) = board.columns.iter_mut().find(|c| c.column_id == column_id) else {
                return;
            };
            if let Some(title) = column_title {
                column.column_title = title;
            }
            if let Some(on) = wip_limit_on {
                column.wip_limit_on = on;
            }
            if let Some(limit) = wip_limit {
                column.wip_limit = limit;
            }
        }
        Command::CreateTask { column_id, text } => {
            if board.column(column_id).is_some() {
                let task = trial::new_task(board, column_id, &text);
                board.tasks.push(task);
            }
        }
        Command::UpdateTask { task_id, text } => {
            if let Some(task) = board.tasks.iter_mut().find(|t| t.task_id == task_id) {
                task.text = text;
            }
        }
        // Members, messages and invitations do not exist on a trial board.
        other => log::debug!("{} ignored on a trial board", other.name()),
    }
}
