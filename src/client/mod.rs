//! Protocol session.
//!
//! One [`Client`] owns the device state, the actuators and the button, and
//! runs the connect → handshake → register → serve loop forever, pausing a
//! fixed delay between attempts.

pub mod dispatch;

use crate::config::Config;
use crate::device::{Actuators, ButtonInput, DeviceState};
use crate::error::{ConnectionError, Error};
use crate::events::{Event, PowerSource};
use crate::socket::{self, Frame, FramedRecv, FramedSend, Opcode};
use crate::transport::Transport;
use crate::weather::{WeatherProvider, ERROR_REPLY};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub use dispatch::{Command, Dispatcher, Outcome};

/// Type alias for event handlers so the client field is not overly complex and is Send + Sync.
type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

type Incoming = crate::Result<Frame>;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of one session attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Handshaking,
    Registered,
    Active,
    Closed,
    /// The attempt failed before reaching `Active`.
    Failed,
}

#[derive(Serialize)]
struct Register<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
}

/// The lamp's connection to its controller.
pub struct Client {
    config: Config,
    device: DeviceState,
    actuators: Box<dyn Actuators>,
    button: Box<dyn ButtonInput>,
    weather: Arc<dyn WeatherProvider>,
    handlers: Vec<EventHandler>,
    state: SessionState,
}

impl Client {
    pub fn new(
        config: Config,
        actuators: impl Actuators + 'static,
        button: impl ButtonInput + 'static,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            config,
            device: DeviceState::new(),
            actuators: Box::new(actuators),
            button: Box::new(button),
            weather,
            handlers: Vec::new(),
            state: SessionState::Disconnected,
        }
    }

    /// Add an event handler (called for every event).
    pub fn add_event_handler<F>(&mut self, f: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(f));
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn device_state(&self) -> DeviceState {
        self.device
    }

    /// Run sessions forever. Every failure or close is followed by the
    /// fixed retry delay and a fresh attempt.
    pub async fn run(&mut self) {
        loop {
            let reason = match self.run_session().await {
                Ok(()) => "closed by peer".to_string(),
                Err(e) => e.to_string(),
            };
            tracing::warn!(
                reason = %reason,
                retry_in_ms = self.config.retry_delay.as_millis() as u64,
                "session ended"
            );
            self.emit(Event::Disconnected { reason });
            self.idle(self.config.retry_delay).await;
            self.transition(SessionState::Disconnected);
        }
    }

    /// One full session attempt. Returns when the session is over: `Ok`
    /// after a peer close, `Err` for everything else.
    pub async fn run_session(&mut self) -> crate::Result<()> {
        let (send, recv) = match self.open().await {
            Ok(halves) => halves,
            Err(e) => {
                self.transition(SessionState::Failed);
                return Err(e);
            }
        };
        self.transition(SessionState::Active);
        let result = self.serve(&send, recv).await;
        self.transition(SessionState::Closed);
        result
    }

    /// Connect, upgrade and register.
    async fn open(
        &mut self,
    ) -> crate::Result<(FramedSend<OwnedWriteHalf>, FramedRecv<OwnedReadHalf>)> {
        self.transition(SessionState::Connecting);
        let host = self.config.host.clone();
        let port = self.config.port;
        tracing::info!(host = %host, port, "connecting");
        let mut stream = socket::dial(&host, port).await?;

        self.transition(SessionState::Handshaking);
        let handshake = tokio::time::timeout(
            self.config.handshake_timeout,
            socket::perform_handshake(&mut stream, &host, port, &self.config.path),
        )
        .await
        .map_err(|_| ConnectionError::Timeout)??;
        let response = String::from_utf8_lossy(&handshake.raw_response).into_owned();
        tracing::debug!(response = %response, "handshake response");
        if !handshake.accepted {
            tracing::warn!("websocket handshake rejected");
            self.emit(Event::HandshakeRejected { response });
            return Err(ConnectionError::HandshakeRejected.into());
        }

        let (send, recv) = socket::split(stream, self.config.max_frame_size);
        let register = serde_json::to_string(&Register {
            kind: "register",
            id: &self.config.device_id,
        })
        .map_err(|e| Error::Other(e.into()))?;
        send.send(&register).await?;
        tracing::info!(id = %self.config.device_id, "registered");
        self.transition(SessionState::Registered);
        self.emit(Event::Registered {
            id: self.config.device_id.clone(),
        });
        Ok((send, recv))
    }

    /// Message loop. The button is read on every iteration; frames come
    /// from a reader task so a slow peer never delays the button.
    async fn serve<W, R>(&mut self, send: &FramedSend<W>, recv: FramedRecv<R>) -> crate::Result<()>
    where
        W: tokio::io::AsyncWrite + Unpin + Send,
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(16);
        let reader = tokio::spawn(Self::recv_loop(recv, tx));
        let mut poll = tokio::time::interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let result = loop {
            self.poll_button();
            tokio::select! {
                _ = poll.tick() => {}
                incoming = rx.recv() => match incoming {
                    Some(Ok(frame)) => match self.handle_frame(frame, send).await {
                        Ok(ControlFlow::Continue(())) => {}
                        Ok(ControlFlow::Break(())) => break Ok(()),
                        Err(e) => break Err(e),
                    },
                    Some(Err(e)) => break Err(e),
                    None => {
                        tracing::info!("connection closed by server");
                        break Ok(());
                    }
                },
            }
        };
        reader.abort();
        result
    }

    /// Wait out `period` while still reading the button.
    async fn idle(&mut self, period: Duration) {
        let deadline = tokio::time::Instant::now() + period;
        let mut poll = tokio::time::interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            self.poll_button();
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return,
                _ = poll.tick() => {}
            }
        }
    }

    async fn recv_loop<R>(mut recv: FramedRecv<R>, tx: mpsc::Sender<Incoming>)
    where
        R: AsyncRead + Unpin,
    {
        loop {
            match recv.next_frame().await {
                Ok(Some(frame)) => {
                    if tx.send(Ok(frame)).await.is_err() {
                        return;
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "frame read failed");
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
    }

    fn poll_button(&mut self) {
        if let Some(powered) = self
            .device
            .poll_button(&mut *self.button, &mut *self.actuators)
        {
            tracing::info!(powered, "button toggled power");
            self.emit(Event::PowerChanged {
                powered,
                source: PowerSource::Button,
            });
        }
    }

    async fn handle_frame<W>(
        &mut self,
        frame: Frame,
        send: &FramedSend<W>,
    ) -> crate::Result<ControlFlow<()>>
    where
        W: tokio::io::AsyncWrite + Unpin + Send,
    {
        match frame.opcode {
            Opcode::Text => {
                let Some(text) = frame.text() else {
                    tracing::warn!(len = frame.payload.len(), "dropping non-UTF-8 text frame");
                    return Ok(ControlFlow::Continue(()));
                };
                tracing::debug!(payload = text, "message received");
                let mut dispatcher = Dispatcher {
                    actuators: &mut *self.actuators,
                    weather: &*self.weather,
                    reply: send,
                };
                let outcome = dispatcher.dispatch(text, &mut self.device).await?;
                self.report(outcome);
            }
            Opcode::Ping => send.send_frame(Opcode::Pong, &frame.payload).await?,
            Opcode::Close => {
                tracing::info!("close frame received");
                if let Err(e) = send.send_frame(Opcode::Close, &frame.payload).await {
                    tracing::debug!(error = %e, "close reply failed");
                }
                return Ok(ControlFlow::Break(()));
            }
            Opcode::Pong | Opcode::Binary | Opcode::Continuation => {
                tracing::debug!(opcode = ?frame.opcode, "ignoring frame");
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn report(&self, outcome: Outcome) {
        match outcome {
            Outcome::Power(powered) => self.emit(Event::PowerChanged {
                powered,
                source: PowerSource::Remote,
            }),
            Outcome::Reported(text) => self.emit(Event::Reply { text }),
            Outcome::LookupFailed => self.emit(Event::Reply {
                text: ERROR_REPLY.to_string(),
            }),
            _ => {}
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = std::mem::replace(&mut self.state, to);
        if from != to {
            tracing::debug!(?from, ?to, "session state");
            self.emit(Event::StateChanged { from, to });
        }
    }

    fn emit(&self, evt: Event) {
        for f in &self.handlers {
            f(evt.clone());
        }
    }
}
