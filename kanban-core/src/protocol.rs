//! JSON wire protocol of the board channel.
//!
//! Outbound frames are flat objects: the command's parameters plus a
//! `command` field. Inbound frames share one envelope:
//!
//! ```text
//! { "code": "TASKS_SAVED", "data": [...], "error": {...}, "message": "...", "user": "slug" }
//!    │                       │              │               │               │
//!    │                       │              │               │               └─ originating member
//!    │                       │              │               └─ invite notices
//!    │                       │              └─ failures
//!    │                       └─ entities to merge
//!    └─ selects handling
//! ```
//!
//! Decoding checks field presence and primitive types only. A fault names
//! the entity that failed so callers can log it and drop the frame.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ActivityLog, Board, Column, Membership, Message, Role, Task, User};

/// Entity a decode fault is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Frame,
    Board,
    Column,
    Task,
    Membership,
    Message,
    User,
    ActivityLog,
    MembersUpdate,
    WsError,
    Notice,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Frame => "frame",
            Self::Board => "board",
            Self::Column => "column",
            Self::Task => "task",
            Self::Membership => "membership",
            Self::Message => "message",
            Self::User => "user",
            Self::ActivityLog => "activity log",
            Self::MembersUpdate => "members update",
            Self::WsError => "error",
            Self::Notice => "notice",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to decode {entity}: {reason}")]
pub struct DecodeError {
    pub entity: Entity,
    pub reason: String,
}

impl DecodeError {
    fn new(entity: Entity, reason: impl Into<String>) -> Self {
        Self {
            entity,
            reason: reason.into(),
        }
    }
}

/// Protocol errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unrecognized code {0:?}")]
    UnknownCode(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to encode command: {0}")]
    Encode(String),
}

// ───────────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────────

/// A board mutation requested by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    UpdateBoardTitle {
        board_title: String,
    },
    CreateMsg {
        board_msg: String,
    },
    CreateTask {
        column_id: i64,
        text: String,
    },
    UpdateTask {
        task_id: i64,
        text: String,
    },
    MoveTask {
        task_id: i64,
        column_id: i64,
        task_index: i64,
    },
    DeleteTask {
        task_id: i64,
    },
    CreateColumn {
        column_title: String,
        wip_limit_on: bool,
        wip_limit: i64,
    },
    UpdateColumn {
        column_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column_title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wip_limit_on: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wip_limit: Option<i64>,
    },
    MoveColumn {
        column_id: i64,
        column_index: i64,
    },
    DeleteColumn {
        column_id: i64,
    },
    UpdateMemberDisplayName {
        display_name: String,
    },
    UpdateMemberRole {
        user_slug: String,
        role: Role,
    },
    LeaveBoard,
    RemoveMember {
        user_slug: String,
    },
    DeleteBoard,
    InviteMember {
        invite_email: String,
    },
}

impl Command {
    /// Wire identifier carried in the `command` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateBoardTitle { .. } => "update_board_title",
            Self::CreateMsg { .. } => "create_msg",
            Self::CreateTask { .. } => "create_task",
            Self::UpdateTask { .. } => "update_task",
            Self::MoveTask { .. } => "move_task",
            Self::DeleteTask { .. } => "delete_task",
            Self::CreateColumn { .. } => "create_column",
            Self::UpdateColumn { .. } => "update_column",
            Self::MoveColumn { .. } => "move_column",
            Self::DeleteColumn { .. } => "delete_column",
            Self::UpdateMemberDisplayName { .. } => "update_member_display_name",
            Self::UpdateMemberRole { .. } => "update_member_role",
            Self::LeaveBoard => "leave_board",
            Self::RemoveMember { .. } => "remove_member",
            Self::DeleteBoard => "delete_board",
            Self::InviteMember { .. } => "invite_member",
        }
    }

    /// Serialize to the flat wire object.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

// ───────────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────────

/// Inbound `code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelCode {
    BoardLoaded,
    BoardUpdated,
    ColumnsSaved,
    TasksSaved,
    MembersSaved,
    MsgCreated,
    InviteSent,
    InviteNotSent,
    BoardDeleted,
    BoardFailed,
    JoinFailed,
    UserFailed,
    Error,
}

impl ChannelCode {
    pub const ALL: [ChannelCode; 13] = [
        Self::BoardLoaded,
        Self::BoardUpdated,
        Self::ColumnsSaved,
        Self::TasksSaved,
        Self::MembersSaved,
        Self::MsgCreated,
        Self::InviteSent,
        Self::InviteNotSent,
        Self::BoardDeleted,
        Self::BoardFailed,
        Self::JoinFailed,
        Self::UserFailed,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoardLoaded => "BOARD_LOADED",
            Self::BoardUpdated => "BOARD_UPDATED",
            Self::ColumnsSaved => "COLUMNS_SAVED",
            Self::TasksSaved => "TASKS_SAVED",
            Self::MembersSaved => "MEMBERS_SAVED",
            Self::MsgCreated => "MSG_CREATED",
            Self::InviteSent => "INVITE_SENT",
            Self::InviteNotSent => "INVITE_NOT_SENT",
            Self::BoardDeleted => "BOARD_DELETED",
            Self::BoardFailed => "BOARD_FAILED",
            Self::JoinFailed => "JOIN_FAILED",
            Self::UserFailed => "USER_FAILED",
            Self::Error => "WEBSOCKET_ERROR",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

/// Structured failure carried in an inbound `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsError {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub detail: Option<Value>,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Which authorization step the server rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Board,
    Join,
    User,
}

/// A `MEMBERS_SAVED` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembersSaved {
    /// Full membership list.
    All(Vec<Membership>),
    /// Full list plus the members whose role was just changed.
    Targeted {
        updated_slugs: Vec<String>,
        members: Vec<Membership>,
    },
}

impl MembersSaved {
    pub fn into_members(self) -> Vec<Membership> {
        match self {
            Self::All(members) => members,
            Self::Targeted { members, .. } => members,
        }
    }
}

/// Typed inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Broadcast {
    BoardLoaded(Board),
    BoardUpdated(Board),
    ColumnsSaved(Vec<Column>),
    TasksSaved(Vec<Task>),
    MembersSaved(MembersSaved),
    MsgCreated(Message),
    InviteSent(String),
    InviteNotSent(String),
    BoardDeleted(String),
    AuthFailed { failure: AuthFailure, error: WsError },
    ServerError(WsError),
}

impl Broadcast {
    pub fn code(&self) -> ChannelCode {
        match self {
            Self::BoardLoaded(_) => ChannelCode::BoardLoaded,
            Self::BoardUpdated(_) => ChannelCode::BoardUpdated,
            Self::ColumnsSaved(_) => ChannelCode::ColumnsSaved,
            Self::TasksSaved(_) => ChannelCode::TasksSaved,
            Self::MembersSaved(_) => ChannelCode::MembersSaved,
            Self::MsgCreated(_) => ChannelCode::MsgCreated,
            Self::InviteSent(_) => ChannelCode::InviteSent,
            Self::InviteNotSent(_) => ChannelCode::InviteNotSent,
            Self::BoardDeleted(_) => ChannelCode::BoardDeleted,
            Self::AuthFailed { failure: AuthFailure::Board, .. } => ChannelCode::BoardFailed,
            Self::AuthFailed { failure: AuthFailure::Join, .. } => ChannelCode::JoinFailed,
            Self::AuthFailed { failure: AuthFailure::User, .. } => ChannelCode::UserFailed,
            Self::ServerError(_) => ChannelCode::Error,
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub broadcast: Broadcast,
    /// Slug of the member whose command produced this frame.
    pub user: Option<String>,
}

impl InboundFrame {
    /// Whether the frame answers a command sent by `identity`.
    pub fn is_from(&self, identity: Option<&str>) -> bool {
        matches!((self.user.as_deref(), identity), (Some(a), Some(b)) if a == b)
    }
}

/// Decode one inbound text frame.
pub fn decode_frame(text: &str) -> Result<InboundFrame, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(ProtocolError::Malformed("frame is not an object".to_string()));
    };

    let code = match envelope.get("code") {
        Some(Value::String(code)) => code.clone(),
        _ => return Err(DecodeError::new(Entity::Frame, "missing string `code`").into()),
    };
    let user = match envelope.remove("user") {
        Some(Value::String(user)) => Some(user),
        _ => None,
    };
    let Some(code) = ChannelCode::parse(&code) else {
        return Err(ProtocolError::UnknownCode(code));
    };

    let mut take = |field: &str| envelope.remove(field).unwrap_or(Value::Null);

    let broadcast = match code {
        ChannelCode::BoardLoaded => Broadcast::BoardLoaded(decode_board(take("data"))?),
        ChannelCode::BoardUpdated => Broadcast::BoardUpdated(decode_board(take("data"))?),
        ChannelCode::ColumnsSaved => {
            Broadcast::ColumnsSaved(decode_list(Entity::Column, take("data"))?)
        }
        ChannelCode::TasksSaved => Broadcast::TasksSaved(decode_list(Entity::Task, take("data"))?),
        ChannelCode::MembersSaved => Broadcast::MembersSaved(decode_members(take("data"))?),
        ChannelCode::MsgCreated => Broadcast::MsgCreated(decode_message(take("data"))?),
        ChannelCode::InviteSent => Broadcast::InviteSent(decode_notice(take("message"))?),
        ChannelCode::InviteNotSent => Broadcast::InviteNotSent(decode_notice(take("message"))?),
        ChannelCode::BoardDeleted => Broadcast::BoardDeleted(decode_notice(take("data"))?),
        ChannelCode::BoardFailed | ChannelCode::JoinFailed | ChannelCode::UserFailed => {
            let failure = match code {
                ChannelCode::BoardFailed => AuthFailure::Board,
                ChannelCode::JoinFailed => AuthFailure::Join,
                _ => AuthFailure::User,
            };
            Broadcast::AuthFailed {
                failure,
                error: decode_entity(Entity::WsError, take("error"))?,
            }
        }
        ChannelCode::Error => Broadcast::ServerError(decode_entity(Entity::WsError, take("error"))?),
    };

    Ok(InboundFrame { broadcast, user })
}

fn decode_entity<T: DeserializeOwned>(entity: Entity, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::new(entity, e.to_string()))
}

fn decode_list<T: DeserializeOwned>(entity: Entity, value: Value) -> Result<Vec<T>, DecodeError> {
    let Value::Array(entries) = value else {
        return Err(DecodeError::new(entity, "expected a list"));
    };
    entries
        .into_iter()
        .map(|entry| decode_entity(entity, entry))
        .collect()
}

fn decode_notice(value: Value) -> Result<String, DecodeError> {
    match value {
        Value::String(notice) if !notice.is_empty() => Ok(notice),
        _ => Err(DecodeError::new(Entity::Notice, "expected a non-empty string")),
    }
}

fn decode_user(value: Value) -> Result<User, DecodeError> {
    decode_entity(Entity::User, value)
}

/// Nested users are checked on their own so a bad sender is reported as a
/// user fault rather than a message fault.
fn decode_message(mut value: Value) -> Result<Message, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::new(Entity::Message, "expected an object"));
    }
    let sender = value
        .get_mut("sender")
        .map(Value::take)
        .unwrap_or(Value::Null);
    decode_user(sender.clone())?;
    if let Value::Object(map) = &mut value {
        map.insert("sender".to_string(), sender);
    }
    decode_entity(Entity::Message, value)
}

fn decode_membership(mut value: Value) -> Result<Membership, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::new(Entity::Membership, "expected an object"));
    }
    let user = value.get_mut("user").map(Value::take).unwrap_or(Value::Null);
    decode_user(user.clone())?;
    if let Value::Object(map) = &mut value {
        map.insert("user".to_string(), user);
    }
    decode_entity(Entity::Membership, value)
}

fn decode_memberships(value: Value) -> Result<Vec<Membership>, DecodeError> {
    let Value::Array(entries) = value else {
        return Err(DecodeError::new(Entity::Membership, "expected a list"));
    };
    entries.into_iter().map(decode_membership).collect()
}

fn decode_members(value: Value) -> Result<MembersSaved, DecodeError> {
    if value.is_array() {
        return Ok(MembersSaved::All(decode_memberships(value)?));
    }
    match value {
        Value::Object(mut map) => {
            let updated_slugs = decode_entity(
                Entity::MembersUpdate,
                map.remove("updated_slugs").unwrap_or(Value::Null),
            )?;
            let members = decode_memberships(map.remove("members").unwrap_or(Value::Null))?;
            Ok(MembersSaved::Targeted {
                updated_slugs,
                members,
            })
        }
        _ => Err(DecodeError::new(Entity::MembersUpdate, "expected a list or an object")),
    }
}

/// Board shell whose nested collections are decoded entry by entry.
#[derive(Deserialize)]
struct BoardShell {
    board_slug: String,
    board_title: String,
    activity_logs: Vec<Value>,
    columns: Vec<Value>,
    memberships: Vec<Value>,
    messages: Vec<Value>,
    tasks: Vec<Value>,
    created_at: String,
    updated_at: String,
    messages_allowed: bool,
    new_members_allowed: bool,
}

/// Decode a full board snapshot.
///
/// Shared by websocket `BOARD_LOADED`/`BOARD_UPDATED` frames and the HTTP
/// board read.
pub fn decode_board(value: Value) -> Result<Board, DecodeError> {
    let shell: BoardShell = decode_entity(Entity::Board, value)?;
    Ok(Board {
        board_slug: shell.board_slug,
        board_title: shell.board_title,
        activity_logs: shell
            .activity_logs
            .into_iter()
            .map(|v| decode_entity::<ActivityLog>(Entity::ActivityLog, v))
            .collect::<Result<_, _>>()?,
        columns: shell
            .columns
            .into_iter()
            .map(|v| decode_entity::<Column>(Entity::Column, v))
            .collect::<Result<_, _>>()?,
        memberships: shell
            .memberships
            .into_iter()
            .map(decode_membership)
            .collect::<Result<_, _>>()?,
        messages: shell
            .messages
            .into_iter()
            .map(decode_message)
            .collect::<Result<_, _>>()?,
        tasks: shell
            .tasks
            .into_iter()
            .map(|v| decode_entity::<Task>(Entity::Task, v))
            .collect::<Result<_, _>>()?,
        created_at: shell.created_at,
        updated_at: shell.updated_at,
        messages_allowed: shell.messages_allowed,
        new_members_allowed: shell.new_members_allowed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use serde_json::json;

    fn board_json() -> Value {
        serde_json::to_value(fixtures::board(&[("alice12345", Role::Admin)])).unwrap()
    }

    #[test]
    fn test_command_flat_with_tag() {
        let cmd = Command::MoveTask {
            task_id: 7,
            column_id: 3,
            task_index: 1,
        };
        let value: Value = serde_json::from_str(&cmd.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "command": "move_task", "task_id": 7, "column_id": 3, "task_index": 1 })
        );
    }

    #[test]
    fn test_command_without_params() {
        let value: Value = serde_json::from_str(&Command::LeaveBoard.encode().unwrap()).unwrap();
        assert_eq!(value, json!({ "command": "leave_board" }));
    }

    #[test]
    fn test_update_column_skips_absent_fields() {
        let cmd = Command::UpdateColumn {
            column_id: 4,
            column_title: Some("Review".to_string()),
            wip_limit_on: None,
            wip_limit: None,
        };
        let value: Value = serde_json::from_str(&cmd.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "command": "update_column", "column_id": 4, "column_title": "Review" })
        );
    }

    #[test]
    fn test_command_names_match_wire_tag() {
        let commands = vec![
            Command::UpdateBoardTitle { board_title: "t".into() },
            Command::CreateMsg { board_msg: "m".into() },
            Command::DeleteTask { task_id: 1 },
            Command::MoveColumn { column_id: 1, column_index: 0 },
            Command::UpdateMemberDisplayName { display_name: "d".into() },
            Command::UpdateMemberRole { user_slug: "bob1234567".into(), role: Role::Viewer },
            Command::DeleteBoard,
            Command::InviteMember { invite_email: "a@b.c".into() },
        ];
        for cmd in commands {
            let value: Value = serde_json::from_str(&cmd.encode().unwrap()).unwrap();
            assert_eq!(value["command"], json!(cmd.name()));
        }
    }

    #[test]
    fn test_decode_board_loaded() {
        let text = json!({ "code": "BOARD_LOADED", "data": board_json() }).to_string();
        let frame = decode_frame(&text).unwrap();
        assert!(frame.user.is_none());
        match frame.broadcast {
            Broadcast::BoardLoaded(board) => {
                assert_eq!(board.board_slug, "board12345");
                assert_eq!(board.columns.len(), 3);
                assert_eq!(board.memberships[0].role, Role::Admin);
            }
            other => panic!("Expected BoardLoaded, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_tasks_saved_with_user() {
        let tasks = serde_json::to_value(vec![fixtures::task(1, 10, 0)]).unwrap();
        let text = json!({ "code": "TASKS_SAVED", "data": tasks, "user": "alice12345" }).to_string();
        let frame = decode_frame(&text).unwrap();
        assert_eq!(frame.user.as_deref(), Some("alice12345"));
        assert!(frame.is_from(Some("alice12345")));
        assert!(!frame.is_from(Some("bob1234567")));
        assert!(!frame.is_from(None));
        assert_eq!(frame.broadcast.code(), ChannelCode::TasksSaved);
    }

    #[test]
    fn test_non_string_user_is_ignored() {
        let text = json!({ "code": "COLUMNS_SAVED", "data": [], "user": 42 }).to_string();
        let frame = decode_frame(&text).unwrap();
        assert!(frame.user.is_none());
    }

    #[test]
    fn test_bad_column_names_entity() {
        let text = json!({
            "code": "COLUMNS_SAVED",
            "data": [{ "board": "b", "column_id": "not a number" }],
        })
        .to_string();
        match decode_frame(&text) {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::Column),
            other => panic!("Expected column decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_nested_task_in_board() {
        let mut board = board_json();
        board["tasks"][0]["task_index"] = json!("zero");
        let text = json!({ "code": "BOARD_UPDATED", "data": board }).to_string();
        match decode_frame(&text) {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::Task),
            other => panic!("Expected task decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_role_is_membership_fault() {
        let mut board = board_json();
        board["memberships"][0]["role"] = json!(9);
        let text = json!({ "code": "BOARD_LOADED", "data": board }).to_string();
        match decode_frame(&text) {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::Membership),
            other => panic!("Expected membership decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_sender_is_user_fault() {
        let mut msg = serde_json::to_value(fixtures::message(1, "alice12345")).unwrap();
        msg["sender"] = json!({ "user_slug": "alice12345" });
        let text = json!({ "code": "MSG_CREATED", "data": msg }).to_string();
        match decode_frame(&text) {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::User),
            other => panic!("Expected user decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_members_targeted() {
        let members =
            serde_json::to_value(vec![fixtures::membership("alice12345", Role::Admin)]).unwrap();
        let text = json!({
            "code": "MEMBERS_SAVED",
            "data": { "updated_slugs": ["bob1234567"], "members": members },
            "user": "alice12345",
        })
        .to_string();
        match decode_frame(&text).unwrap().broadcast {
            Broadcast::MembersSaved(MembersSaved::Targeted { updated_slugs, members }) => {
                assert_eq!(updated_slugs, vec!["bob1234567".to_string()]);
                assert_eq!(members.len(), 1);
            }
            other => panic!("Expected targeted members, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_failures_and_notices() {
        let text = json!({
            "code": "JOIN_FAILED",
            "error": { "message": "Error joining board", "command": null },
        })
        .to_string();
        match decode_frame(&text).unwrap().broadcast {
            Broadcast::AuthFailed { failure, error } => {
                assert_eq!(failure, AuthFailure::Join);
                assert_eq!(error.message, "Error joining board");
            }
            other => panic!("Expected AuthFailed, got {other:?}"),
        }

        let text = json!({ "code": "BOARD_DELETED", "data": "Project deleted" }).to_string();
        assert_eq!(
            decode_frame(&text).unwrap().broadcast,
            Broadcast::BoardDeleted("Project deleted".to_string())
        );

        let text = json!({ "code": "INVITE_SENT", "message": "Invitation sent" }).to_string();
        assert_eq!(
            decode_frame(&text).unwrap().broadcast,
            Broadcast::InviteSent("Invitation sent".to_string())
        );

        let text = json!({ "code": "INVITE_NOT_SENT" }).to_string();
        match decode_frame(&text) {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::Notice),
            other => panic!("Expected notice decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_error_without_message_rejected() {
        let text = json!({ "code": "WEBSOCKET_ERROR", "error": { "detail": "x" } }).to_string();
        match decode_frame(&text) {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::WsError),
            other => panic!("Expected error decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code() {
        let text = json!({ "code": "THROTTLED" }).to_string();
        assert_eq!(
            decode_frame(&text),
            Err(ProtocolError::UnknownCode("THROTTLED".to_string()))
        );
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(decode_frame("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode_frame("[1, 2]"), Err(ProtocolError::Malformed(_))));
        match decode_frame("{}") {
            Err(ProtocolError::Decode(err)) => assert_eq!(err.entity, Entity::Frame),
            other => panic!("Expected frame decode fault, got {other:?}"),
        }
    }

    #[test]
    fn test_channel_code_strings() {
        for code in ChannelCode::ALL {
            assert_eq!(ChannelCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(ChannelCode::Error.as_str(), "WEBSOCKET_ERROR");
        assert_eq!(ChannelCode::parse("MISSING_COMMAND"), None);
    }
}
