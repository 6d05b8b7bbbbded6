//! WebSocket client for one board view.
//!
//! Provides:
//! - Connection lifecycle with bounded, backed-off reconnection; every
//!   attempt is capped by `connect_timeout`
//! - Local intents forwarded to the [`ConnectionController`]
//! - Redirect and identity timers
//! - State snapshots published on an event channel

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::SplitStream;
use futures_util::{FutureExt, SinkExt, StreamExt};
use kanban_core::store::{BoardEvent, BoardState, RedirectTarget};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::{ClientConfig, ConnectionParams};
use crate::controller::{ConnectionController, Effect, TimerKind};
use crate::SyncError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsReader = SplitStream<WsStream>;
type Reconnect = BoxFuture<'static, Result<WsStream, SyncError>>;

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Events emitted by the board client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Transport open
    Connected,
    /// Transport lost or closed
    Disconnected,
    /// The board state changed
    StateChanged(Box<BoardState>),
    /// Navigate away from the board view
    Redirect(RedirectTarget),
}

enum Intent {
    Dispatch(BoardEvent),
    Identity(Option<String>),
    Close,
}

/// Handle to one live board view.
///
/// The connection itself is owned by a background task; this handle only
/// forwards intents to it.
pub struct BoardClient {
    config: ClientConfig,
    params: ConnectionParams,
    state: Arc<RwLock<ConnectionState>>,
    intent_tx: Option<mpsc::Sender<Intent>>,
    event_tx: mpsc::Sender<ClientEvent>,
    event_rx: Option<mpsc::Receiver<ClientEvent>>,
    driver: Option<JoinHandle<()>>,
}

impl BoardClient {
    pub fn new(config: ClientConfig, params: ConnectionParams) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        Self {
            config,
            params,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            intent_tx: None,
            event_tx,
            event_rx: Some(event_rx),
            driver: None,
        }
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<ClientEvent>> {
        self.event_rx.take()
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Open the board channel.
    ///
    /// At most one connection exists per client; calling this again while
    /// the view is mounted does nothing. When every attempt fails the view
    /// still mounts, so the failure notice and redirect reach the event
    /// channel.
    pub async fn connect(&mut self) -> Result<(), SyncError> {
        if self.intent_tx.is_some() {
            return Ok(());
        }
        let controller = ConnectionController::new(self.config.clone(), self.params.clone());
        let url = controller.handshake_url()?;
        let (intent_tx, intent_rx) = mpsc::channel(self.config.event_capacity);

        let mut driver = Driver {
            controller,
            config: self.config.clone(),
            url,
            out_tx: None,
            event_tx: self.event_tx.clone(),
            state: self.state.clone(),
            timers: Timers::default(),
            published: None,
        };
        let effects = driver.controller.mount();
        driver.apply(effects).await;
        let effects = driver.controller.on_connecting();
        driver.apply(effects).await;
        *self.state.write().await = ConnectionState::Connecting;

        let connected = connect_with_retry(&driver.url, &self.config, true).await;
        let (reader, outcome) = match connected {
            Ok(stream) => (Some(driver.attach(stream).await), Ok(())),
            Err(err) => {
                log::error!("could not open board channel: {err}");
                *self.state.write().await = ConnectionState::Disconnected;
                let effects = driver.controller.on_transport_failed(None);
                driver.apply(effects).await;
                (None, Err(err))
            }
        };

        self.intent_tx = Some(intent_tx);
        self.driver = Some(tokio::spawn(driver.run(reader, intent_rx)));
        outcome
    }

    /// Forward a local intent to the board store.
    pub async fn dispatch(&self, event: BoardEvent) -> Result<(), SyncError> {
        self.send_intent(Intent::Dispatch(event)).await
    }

    /// Report the local user resolved (or lost) by the session provider.
    pub async fn set_identity(&self, identity: Option<String>) -> Result<(), SyncError> {
        self.send_intent(Intent::Identity(identity)).await
    }

    /// Tear down the view and wait for the connection to close.
    pub async fn close(&mut self) {
        if let Some(tx) = self.intent_tx.take() {
            let _ = tx.send(Intent::Close).await;
        }
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }

    async fn send_intent(&self, intent: Intent) -> Result<(), SyncError> {
        let tx = self.intent_tx.as_ref().ok_or(SyncError::NotReady)?;
        tx.send(intent).await.map_err(|_| SyncError::Closed)
    }
}

/// Connect, retrying with doubling delays.
///
/// `immediate` makes the first attempt without waiting; reconnection after a
/// dropped connection waits before every attempt.
async fn connect_with_retry(
    url: &str,
    config: &ClientConfig,
    immediate: bool,
) -> Result<WsStream, SyncError> {
    let mut attempts = 0u32;
    loop {
        let retry = if immediate { attempts } else { attempts + 1 };
        if retry > 0 {
            if retry > config.max_retries {
                return Err(SyncError::RetriesExhausted { attempts });
            }
            let delay = config.backoff(retry);
            log::info!("retrying board channel in {delay:?} ({retry}/{})", config.max_retries);
            tokio::time::sleep(delay).await;
        }
        attempts += 1;
        match connect_once(url, config).await {
            Ok(stream) => return Ok(stream),
            Err(err) => log::warn!("connection attempt {attempts} failed: {err}"),
        }
    }
}

/// One connection attempt, handshake included, bounded by `connect_timeout`.
async fn connect_once(url: &str, config: &ClientConfig) -> Result<WsStream, SyncError> {
    match tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(url)).await
    {
        Ok(Ok((stream, _))) => Ok(stream),
        Ok(Err(err)) => Err(SyncError::Transport(err.to_string())),
        Err(_) => Err(SyncError::Transport(format!(
            "no handshake within {:?}",
            config.connect_timeout
        ))),
    }
}

#[derive(Debug, Default)]
struct Timers {
    redirect: Option<Instant>,
    identity: Option<Instant>,
}

impl Timers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<Instant> {
        match kind {
            TimerKind::Redirect => &mut self.redirect,
            TimerKind::IdentityCheck => &mut self.identity,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_reconnect(reconnect: &mut Option<Reconnect>) -> Result<WsStream, SyncError> {
    match reconnect {
        Some(attempt) => attempt.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(
    reader: &mut Option<WsReader>,
) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match reader {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}

/// Background task owning the controller and the transport.
struct Driver {
    controller: ConnectionController,
    config: ClientConfig,
    url: String,
    out_tx: Option<mpsc::Sender<String>>,
    event_tx: mpsc::Sender<ClientEvent>,
    state: Arc<RwLock<ConnectionState>>,
    timers: Timers,
    published: Option<BoardState>,
}

impl Driver {
    async fn run(mut self, mut reader: Option<WsReader>, mut intents: mpsc::Receiver<Intent>) {
        let mut reconnect: Option<Reconnect> = None;
        loop {
            let redirect = self.timers.redirect;
            let identity = self.timers.identity;

            let running = tokio::select! {
                frame = next_frame(&mut reader) => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let effects = self.controller.on_text(text.as_str());
                        self.apply(effects).await
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        reader = None;
                        reconnect = self.lost().await;
                        true
                    }
                    Some(Ok(_)) => true,
                },
                connected = next_reconnect(&mut reconnect) => {
                    reconnect = None;
                    match connected {
                        Ok(stream) => {
                            reader = Some(self.attach(stream).await);
                            true
                        }
                        Err(err) => {
                            log::error!("reconnection failed: {err}");
                            *self.state.write().await = ConnectionState::Disconnected;
                            let effects = self.controller.on_transport_failed(None);
                            self.apply(effects).await
                        }
                    }
                }
                intent = intents.recv() => match intent {
                    Some(Intent::Dispatch(event)) => {
                        let effects = self.controller.dispatch(event);
                        self.apply(effects).await
                    }
                    Some(Intent::Identity(identity)) => {
                        let effects = self.controller.set_identity(identity);
                        self.apply(effects).await
                    }
                    Some(Intent::Close) | None => {
                        let effects = self.controller.teardown();
                        self.apply(effects).await
                    }
                },
                _ = sleep_until(redirect) => {
                    self.timers.redirect = None;
                    let effects = self.controller.on_timer(TimerKind::Redirect);
                    self.apply(effects).await
                }
                _ = sleep_until(identity) => {
                    self.timers.identity = None;
                    let effects = self.controller.on_timer(TimerKind::IdentityCheck);
                    self.apply(effects).await
                }
            };

            if !running {
                break;
            }
        }

        drop(reconnect);
        drop(reader);
        self.out_tx = None;
        *self.state.write().await = ConnectionState::Disconnected;
        let _ = self.event_tx.send(ClientEvent::Disconnected).await;
        log::info!("board channel closed");
    }

    /// Split a fresh stream, start its writer and report the open transport.
    async fn attach(&mut self, stream: WsStream) -> WsReader {
        let (mut sink, reader) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(self.config.event_capacity);

        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        self.out_tx = Some(out_tx);
        *self.state.write().await = ConnectionState::Connected;
        let _ = self.event_tx.send(ClientEvent::Connected).await;
        let effects = self.controller.on_open();
        self.apply(effects).await;
        reader
    }

    /// The transport dropped under us. Returns the reconnection to run
    /// unless the view is already on its way out.
    async fn lost(&mut self) -> Option<Reconnect> {
        self.out_tx = None;
        let _ = self.event_tx.send(ClientEvent::Disconnected).await;
        if self.controller.is_closed() || self.controller.state().redirect_target().is_some() {
            *self.state.write().await = ConnectionState::Disconnected;
            return None;
        }

        *self.state.write().await = ConnectionState::Reconnecting;
        let effects = self.controller.on_connection_lost();
        self.apply(effects).await;

        let url = self.url.clone();
        let config = self.config.clone();
        Some(async move { connect_with_retry(&url, &config, false).await }.boxed())
    }

    /// Carry out controller effects; `false` once the view is closed.
    async fn apply(&mut self, effects: Vec<Effect>) -> bool {
        let mut running = true;
        for effect in effects {
            match effect {
                Effect::Send(text) => {
                    let sent = match &self.out_tx {
                        Some(tx) => tx.send(text).await.is_ok(),
                        None => false,
                    };
                    if !sent {
                        log::warn!("board channel not writable, command dropped");
                        self.controller.dispatch(BoardEvent::StopCommand);
                    }
                }
                Effect::ArmTimer(kind, after) => {
                    *self.timers.slot(kind) = Some(Instant::now() + after);
                }
                Effect::CancelTimer(kind) => {
                    *self.timers.slot(kind) = None;
                }
                Effect::Redirect(target) => {
                    let _ = self.event_tx.send(ClientEvent::Redirect(target)).await;
                }
                Effect::Close => running = false,
            }
        }
        self.publish().await;
        running
    }

    async fn publish(&mut self) {
        let state = self.controller.state();
        if self.published.as_ref() == Some(state) {
            return;
        }
        self.published = Some(state.clone());
        let _ = self
            .event_tx
            .send(ClientEvent::StateChanged(Box::new(state.clone())))
            .await;
    }
}
