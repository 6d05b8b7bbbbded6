//! Sans-I/O connection controller for one board view.
//!
//! The controller owns the view's [`BoardStore`] and turns transport
//! happenings (frame received, transport failed, timer fired) and local
//! intents into store events. What must happen in the outside world comes
//! back as a list of [`Effect`]s for the driver to carry out:
//!
//! ```text
//!   on_text(frame) ──► decode ──► store.dispatch(Broadcast) ──┐
//!   dispatch(intent) ─────────► store.dispatch(intent) ───────┤
//!                                                             ▼
//!                       sending false → true ?  ──►  Effect::Send(command)
//!                       entered Redirecting ?   ──►  Effect::ArmTimer(Redirect)
//! ```

use std::time::Duration;

use kanban_core::protocol::{decode_frame, ProtocolError};
use kanban_core::store::{BoardEvent, BoardState, BoardStore, RedirectTarget};

use crate::config::{ClientConfig, ConnectionParams};
use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Navigate away after a terminal failure.
    Redirect,
    /// Give up on a session provider that never names the local user.
    IdentityCheck,
}

/// Something the driver must do on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write one text frame.
    Send(String),
    ArmTimer(TimerKind, Duration),
    CancelTimer(TimerKind),
    /// Navigate now.
    Redirect(RedirectTarget),
    /// Detach the reader and close the transport.
    Close,
}

/// Bridges one board channel to one [`BoardStore`].
pub struct ConnectionController {
    config: ClientConfig,
    params: ConnectionParams,
    store: BoardStore,
    redirect_armed: bool,
    closed: bool,
}

impl ConnectionController {
    pub fn new(config: ClientConfig, params: ConnectionParams) -> Self {
        let store = match &params.identity {
            Some(identity) => BoardStore::with_identity(identity.clone()),
            None => BoardStore::new(),
        };
        Self {
            config,
            params,
            store,
            redirect_armed: false,
            closed: false,
        }
    }

    pub fn state(&self) -> &BoardState {
        self.store.state()
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_client_ip(&mut self, client_ip: impl Into<String>) {
        self.params.client_ip = Some(client_ip.into());
    }

    /// URL of the board channel, including the handshake query.
    pub fn handshake_url(&self) -> Result<String, SyncError> {
        if !self.params.is_ready() {
            return Err(SyncError::NotReady);
        }
        let (Some(slug), Some(client_ip)) = (&self.params.slug, &self.params.client_ip) else {
            return Err(SyncError::NotReady);
        };
        Ok(format!(
            "{}/ws/board/{}/?auth_token={}&client_ip={}&invite_token={}",
            self.config.server_url.trim_end_matches('/'),
            slug,
            self.params.auth_token.as_deref().unwrap_or(""),
            client_ip,
            self.params.invite_token.as_deref().unwrap_or(""),
        ))
    }

    /// The view was created.
    pub fn mount(&mut self) -> Vec<Effect> {
        if self.closed || self.state().identity.is_some() {
            return Vec::new();
        }
        vec![Effect::ArmTimer(
            TimerKind::IdentityCheck,
            self.config.identity_grace,
        )]
    }

    pub fn on_connecting(&mut self) -> Vec<Effect> {
        self.apply(BoardEvent::ConnectionOpening)
    }

    /// The transport is open; the server sends the board next.
    pub fn on_open(&mut self) -> Vec<Effect> {
        log::info!(
            "board channel {} open",
            self.params.slug.as_deref().unwrap_or_default()
        );
        self.apply(BoardEvent::StartWsReadBoard)
    }

    /// Handle one inbound text frame. Faulty frames are logged and dropped.
    pub fn on_text(&mut self, text: &str) -> Vec<Effect> {
        match decode_frame(text) {
            Ok(frame) => {
                log::debug!(
                    "received {} (user {:?})",
                    frame.broadcast.code().as_str(),
                    frame.user
                );
                self.apply(BoardEvent::Broadcast(frame))
            }
            Err(ProtocolError::UnknownCode(code)) => {
                log::warn!("dropping frame with unrecognized code {code:?}");
                Vec::new()
            }
            Err(err) => {
                log::warn!("dropping frame: {err}");
                Vec::new()
            }
        }
    }

    /// The transport dropped; edits stay disabled until the board resyncs.
    pub fn on_connection_lost(&mut self) -> Vec<Effect> {
        log::info!(
            "board channel {} dropped",
            self.params.slug.as_deref().unwrap_or_default()
        );
        self.apply(BoardEvent::ConnectionLost)
    }

    /// Reconnection gave up.
    pub fn on_transport_failed(&mut self, reason: Option<String>) -> Vec<Effect> {
        log::error!("board channel lost, no further retries");
        self.apply(BoardEvent::TransportFailed(reason))
    }

    /// The session provider resolved or lost the local user.
    pub fn set_identity(&mut self, identity: Option<String>) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }
        let had_identity = self.state().identity.is_some();
        if identity.is_none() && had_identity {
            log::info!("session ended, redirecting to login");
            self.store.dispatch(BoardEvent::SetIdentity(None));
            return self.leave(RedirectTarget::Login);
        }
        self.params.identity = identity.clone();
        let resolved = identity.is_some();
        let mut effects = self.apply(BoardEvent::SetIdentity(identity));
        if resolved {
            effects.insert(0, Effect::CancelTimer(TimerKind::IdentityCheck));
        }
        effects
    }

    /// Forward a local intent to the store.
    pub fn dispatch(&mut self, event: BoardEvent) -> Vec<Effect> {
        self.apply(event)
    }

    pub fn on_timer(&mut self, kind: TimerKind) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }
        match kind {
            TimerKind::Redirect => match self.state().redirect_target() {
                Some(target) => {
                    log::info!("redirect timer fired, navigating to {target:?}");
                    self.leave(target)
                }
                None => Vec::new(),
            },
            TimerKind::IdentityCheck => {
                if self.state().identity.is_some() {
                    return Vec::new();
                }
                log::info!("no session after {:?}, redirecting to login", self.config.identity_grace);
                self.leave(RedirectTarget::Login)
            }
        }
    }

    /// The view is going away.
    pub fn teardown(&mut self) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;
        self.store.dispatch(BoardEvent::Reset);
        vec![
            Effect::CancelTimer(TimerKind::Redirect),
            Effect::CancelTimer(TimerKind::IdentityCheck),
            Effect::Close,
        ]
    }

    fn leave(&mut self, target: RedirectTarget) -> Vec<Effect> {
        let mut effects = self.teardown();
        effects.push(Effect::Redirect(target));
        effects
    }

    fn apply(&mut self, event: BoardEvent) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }
        let was_sending = self.store.state().is_sending();
        self.store.dispatch(event);

        let mut effects = Vec::new();
        let outbound = if was_sending {
            None
        } else {
            self.store
                .state()
                .pending
                .as_ref()
                .map(|command| (command.name(), command.encode()))
        };
        match outbound {
            Some((name, Ok(text))) => {
                log::debug!("sending {name}");
                effects.push(Effect::Send(text));
            }
            Some((name, Err(err))) => {
                log::error!("could not encode {name}: {err}");
                self.store.dispatch(BoardEvent::StopCommand);
            }
            None => {}
        }

        if let Some(target) = self.store.state().redirect_target() {
            if !self.redirect_armed {
                self.redirect_armed = true;
                log::info!(
                    "redirect to {target:?} armed for {:?}",
                    self.config.redirect_delay
                );
                effects.push(Effect::ArmTimer(TimerKind::Redirect, self.config.redirect_delay));
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::store::{SyncPhase, GENERIC_FAILURE, NOT_A_MEMBER};
    use serde_json::{json, Value};

    const ME: &str = "alice12345";

    fn member(slug: &str, role: u8) -> Value {
        json!({
            "board": "board12345",
            "user": { "user_slug": slug, "name": slug, "email": format!("{slug}@example.com") },
            "role": role,
            "display_name": slug,
            "created_at": "2024-01-01T00:00:00Z",
        })
    }

    fn task(id: i64, column: i64, index: i64) -> Value {
        json!({
            "board": "board12345",
            "column": column,
            "task_id": id,
            "task_index": index,
            "text": format!("Task {id}"),
            "updated_at": "2024-01-01T00:00:00Z",
        })
    }

    fn board(members: Vec<Value>) -> Value {
        let column = |id: i64, index: i64| {
            json!({
                "board": "board12345",
                "column_id": id,
                "column_title": format!("Column {id}"),
                "column_index": index,
                "wip_limit_on": false,
                "wip_limit": 5,
                "updated_at": "2024-01-01T00:00:00Z",
            })
        };
        json!({
            "board_slug": "board12345",
            "board_title": "Roadmap",
            "activity_logs": [],
            "columns": [column(10, 0), column(20, 1)],
            "memberships": members,
            "messages": [],
            "tasks": [task(1, 10, 0), task(2, 10, 1)],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "messages_allowed": true,
            "new_members_allowed": true,
        })
    }

    fn loaded_frame() -> String {
        json!({ "code": "BOARD_LOADED", "data": board(vec![member(ME, 2)]) }).to_string()
    }

    fn params() -> ConnectionParams {
        ConnectionParams::new("board12345", "10.0.0.7").with_identity(ME)
    }

    fn live_controller() -> ConnectionController {
        let mut controller = ConnectionController::new(ClientConfig::default(), params());
        controller.mount();
        controller.on_connecting();
        controller.on_open();
        controller.on_text(&loaded_frame());
        assert_eq!(controller.state().phase, SyncPhase::Live);
        controller
    }

    fn move_task(task_id: i64, old_index: i64, new_index: i64) -> BoardEvent {
        BoardEvent::MoveTask {
            task_id,
            old_index,
            new_index,
            old_column: 10,
            new_column: 10,
        }
    }

    fn sends(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Send(_)))
            .count()
    }

    #[test]
    fn test_handshake_url() {
        let controller = ConnectionController::new(
            ClientConfig {
                server_url: "wss://kanban.example.com/".to_string(),
                ..ClientConfig::default()
            },
            ConnectionParams::new("board12345", "10.0.0.7")
                .with_auth_token("tok")
                .with_invite_token("inv"),
        );
        assert_eq!(
            controller.handshake_url().unwrap(),
            "wss://kanban.example.com/ws/board/board12345/?auth_token=tok&client_ip=10.0.0.7&invite_token=inv"
        );
    }

    #[test]
    fn test_handshake_url_anonymous() {
        let controller = ConnectionController::new(
            ClientConfig::default(),
            ConnectionParams::new("board12345", "10.0.0.7"),
        );
        assert_eq!(
            controller.handshake_url().unwrap(),
            "ws://127.0.0.1:8000/ws/board/board12345/?auth_token=&client_ip=10.0.0.7&invite_token="
        );
    }

    #[test]
    fn test_not_ready_without_client_ip() {
        let mut controller = ConnectionController::new(
            ClientConfig::default(),
            ConnectionParams {
                slug: Some("board12345".to_string()),
                ..ConnectionParams::default()
            },
        );
        assert_eq!(controller.handshake_url(), Err(SyncError::NotReady));
        controller.set_client_ip("10.0.0.7");
        assert!(controller.handshake_url().is_ok());
    }

    #[test]
    fn test_command_sent_exactly_once() {
        let mut controller = live_controller();

        let effects = controller.dispatch(move_task(1, 0, 1));
        assert_eq!(sends(&effects), 1);
        match &effects[0] {
            Effect::Send(text) => {
                let value: Value = serde_json::from_str(text).unwrap();
                assert_eq!(
                    value,
                    json!({ "command": "move_task", "task_id": 1, "column_id": 10, "task_index": 1 })
                );
            }
            other => panic!("Expected Send, got {other:?}"),
        }

        // Second intent while pending: nothing leaves the client.
        assert_eq!(sends(&controller.dispatch(move_task(2, 1, 0))), 0);

        // Observer broadcast does not release the pending command.
        let tasks = json!([task(2, 10, 0), task(1, 10, 1)]);
        let observed = json!({ "code": "TASKS_SAVED", "data": tasks, "user": "bob1234567" });
        assert!(controller.on_text(&observed.to_string()).is_empty());
        assert!(controller.state().is_sending());

        let echo = json!({ "code": "TASKS_SAVED", "data": tasks, "user": ME });
        controller.on_text(&echo.to_string());
        assert!(!controller.state().is_sending());

        assert_eq!(sends(&controller.dispatch(move_task(1, 1, 0))), 1);
    }

    #[test]
    fn test_connection_lost_blocks_commands() {
        let mut controller = live_controller();
        assert_eq!(sends(&controller.dispatch(move_task(1, 0, 1))), 1);

        assert!(controller.on_connection_lost().is_empty());
        assert_eq!(controller.state().phase, SyncPhase::Connecting);
        assert!(!controller.state().is_sending());
        assert!(!controller.state().can_edit());

        // Intents during the outage are rejected, not queued for later.
        assert_eq!(sends(&controller.dispatch(move_task(2, 0, 1))), 0);
        let create = BoardEvent::StartCommand(kanban_core::Command::CreateMsg {
            board_msg: "anyone?".to_string(),
        });
        assert_eq!(sends(&controller.dispatch(create)), 0);
        assert!(!controller.state().is_sending());

        controller.on_open();
        controller.on_text(&loaded_frame());
        assert_eq!(controller.state().phase, SyncPhase::Live);
        assert_eq!(sends(&controller.dispatch(move_task(1, 0, 1))), 1);
    }

    #[test]
    fn test_faulty_frames_dropped() {
        let mut controller = live_controller();
        let before = controller.state().clone();

        assert!(controller.on_text("not json").is_empty());
        assert!(controller.on_text(r#"{"code":"THROTTLED"}"#).is_empty());
        let bad = json!({ "code": "COLUMNS_SAVED", "data": [{ "column_id": "x" }] });
        assert!(controller.on_text(&bad.to_string()).is_empty());

        assert_eq!(controller.state(), &before);
        assert!(!controller.is_closed());
    }

    #[test]
    fn test_board_deleted_arms_redirect_once() {
        let config = ClientConfig::default();
        let mut controller = live_controller();
        let deleted = json!({ "code": "BOARD_DELETED", "data": "Project deleted" });
        let effects = controller.on_text(&deleted.to_string());
        assert_eq!(
            effects,
            vec![Effect::ArmTimer(TimerKind::Redirect, config.redirect_delay)]
        );

        let failed = json!({ "code": "USER_FAILED", "error": { "message": "nope" } });
        assert!(controller.on_text(&failed.to_string()).is_empty());

        let effects = controller.on_timer(TimerKind::Redirect);
        assert!(effects.contains(&Effect::Redirect(RedirectTarget::Dashboard)));
        assert!(effects.contains(&Effect::Close));
        assert!(controller.is_closed());
    }

    #[test]
    fn test_membership_revoked_redirects() {
        let mut controller = live_controller();
        let saved = json!({ "code": "MEMBERS_SAVED", "data": [member("bob1234567", 1)], "user": "bob1234567" });
        let effects = controller.on_text(&saved.to_string());
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::ArmTimer(TimerKind::Redirect, _)));
        assert_eq!(controller.state().modal.as_deref(), Some(NOT_A_MEMBER));
        assert!(controller.state().board.is_none());
    }

    #[test]
    fn test_server_error_keeps_connection() {
        let mut controller = live_controller();
        let error = json!({ "code": "WEBSOCKET_ERROR", "error": { "message": "Slow down" } });
        assert!(controller.on_text(&error.to_string()).is_empty());
        assert_eq!(controller.state().modal.as_deref(), Some("Slow down"));
        assert_eq!(controller.state().phase, SyncPhase::Live);
    }

    #[test]
    fn test_transport_failure() {
        let mut controller = live_controller();
        let effects = controller.on_transport_failed(None);
        assert!(matches!(effects[..], [Effect::ArmTimer(TimerKind::Redirect, _)]));
        assert_eq!(controller.state().modal.as_deref(), Some(GENERIC_FAILURE));
        assert!(controller.state().role.is_none());
    }

    #[test]
    fn test_identity_check() {
        let config = ClientConfig::default();
        let mut controller = ConnectionController::new(
            config.clone(),
            ConnectionParams::new("board12345", "10.0.0.7"),
        );
        assert_eq!(
            controller.mount(),
            vec![Effect::ArmTimer(TimerKind::IdentityCheck, config.identity_grace)]
        );
        let effects = controller.on_timer(TimerKind::IdentityCheck);
        assert_eq!(effects.last(), Some(&Effect::Redirect(RedirectTarget::Login)));
        assert!(controller.is_closed());
    }

    #[test]
    fn test_identity_resolves_in_time() {
        let mut controller = ConnectionController::new(
            ClientConfig::default(),
            ConnectionParams::new("board12345", "10.0.0.7"),
        );
        controller.mount();
        controller.on_open();
        controller.on_text(&loaded_frame());
        assert!(controller.state().role.is_none());

        let effects = controller.set_identity(Some(ME.to_string()));
        assert_eq!(effects, vec![Effect::CancelTimer(TimerKind::IdentityCheck)]);
        assert!(controller.state().role.is_some());
        assert!(controller.on_timer(TimerKind::IdentityCheck).is_empty());
    }

    #[test]
    fn test_losing_identity_redirects_to_login() {
        let mut controller = live_controller();
        assert!(controller.mount().is_empty());
        let effects = controller.set_identity(None);
        assert_eq!(effects.last(), Some(&Effect::Redirect(RedirectTarget::Login)));
        assert!(effects.contains(&Effect::Close));
    }

    #[test]
    fn test_teardown() {
        let mut controller = live_controller();
        let effects = controller.teardown();
        assert_eq!(
            effects,
            vec![
                Effect::CancelTimer(TimerKind::Redirect),
                Effect::CancelTimer(TimerKind::IdentityCheck),
                Effect::Close,
            ]
        );
        assert_eq!(controller.state(), &BoardState::default());

        assert!(controller.on_text(&loaded_frame()).is_empty());
        assert_eq!(controller.state(), &BoardState::default());
        assert!(controller.teardown().is_empty());
    }
}
