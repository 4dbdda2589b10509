#![cfg(feature = "std")]

//! The two game links: primary (setup and moves) and chat.
//!
//! The host accepts both links on one listener, primary first; the joiner
//! connects them in the same order. Every read and write returns a
//! classified [`NetworkError`], and any failure on a link closes that link
//! best-effort so the task blocked on it wakes up and exits.

use std::sync::Mutex;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::config::{NetworkConfig, Role, PROTOCOL_VERSION};
use crate::protocol::{BoardSetupMessage, ChatMessage, Frame, Message, SinglePositionMessage};
use crate::transport::tcp::TcpTransport;
use crate::transport::{FrameReader, FrameWriter, NetworkError, Transport};

const NO_ERROR: &str = "No error occurred.";

struct Outbound {
    writer: Box<dyn FrameWriter>,
    next_seq: u64,
}

struct Inbound {
    reader: Box<dyn FrameReader>,
    expected_seq: u64,
}

/// One direction-split stream with sequence numbering and a close signal
/// that interrupts a blocked read.
struct Link {
    name: &'static str,
    writer: AsyncMutex<Option<Outbound>>,
    reader: AsyncMutex<Option<Inbound>>,
    closed: watch::Sender<bool>,
    read_timeout: Option<Duration>,
}

impl Link {
    fn new<T: Transport>(name: &'static str, transport: T, read_timeout: Option<Duration>) -> Self {
        let (reader, writer) = transport.split();
        let (closed, _) = watch::channel(false);
        Self {
            name,
            writer: AsyncMutex::new(Some(Outbound {
                writer,
                next_seq: 0,
            })),
            reader: AsyncMutex::new(Some(Inbound {
                reader,
                expected_seq: 0,
            })),
            closed,
            read_timeout,
        }
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    async fn send(&self, message: Message) -> Result<(), NetworkError> {
        if self.is_closed() {
            return Err(NetworkError::Closed);
        }
        let mut guard = self.writer.lock().await;
        let out = guard.as_mut().ok_or(NetworkError::Closed)?;
        let kind = message.kind();
        let frame = Frame {
            seq: out.next_seq,
            message,
        };
        out.writer.send(&frame).await?;
        log::trace!("[{}] sent {} #{}", self.name, kind, frame.seq);
        out.next_seq += 1;
        Ok(())
    }

    async fn recv(&self) -> Result<Message, NetworkError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(NetworkError::Closed);
        }
        let mut guard = self.reader.lock().await;
        let inbound = guard.as_mut().ok_or(NetworkError::Closed)?;
        let timeout = self.read_timeout;
        let frame = tokio::select! {
            res = read_frame(inbound.reader.as_mut(), timeout) => res?,
            _ = closed.wait_for(|closed| *closed) => return Err(NetworkError::Closed),
        };
        if frame.seq != inbound.expected_seq {
            return Err(NetworkError::Protocol(format!(
                "out-of-order frame on {} link: expected seq {}, got {}",
                self.name, inbound.expected_seq, frame.seq
            )));
        }
        inbound.expected_seq += 1;
        log::trace!("[{}] received {} #{}", self.name, frame.message.kind(), frame.seq);
        Ok(frame.message)
    }

    /// Signal readers, shut the writer down and drop the reader.
    async fn close(&self) -> Result<(), NetworkError> {
        if self.closed.send_replace(true) {
            return Err(NetworkError::NotConnected);
        }
        let writer = self.writer.lock().await.take();
        let result = match writer {
            Some(mut out) => out.writer.shutdown().await,
            None => Ok(()),
        };
        self.reader.lock().await.take();
        debug!("[{}] link closed", self.name);
        result
    }
}

async fn read_frame(
    reader: &mut dyn FrameReader,
    timeout: Option<Duration>,
) -> Result<Frame, NetworkError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, reader.recv())
            .await
            .map_err(|_| NetworkError::Timeout(limit))?,
        None => reader.recv().await,
    }
}

/// The primary and chat links of one game.
pub struct Connection {
    game: Link,
    chat: Link,
    last_error: Mutex<String>,
}

impl Connection {
    /// Host or join according to `config`.
    pub async fn establish(config: &NetworkConfig) -> Result<Self, NetworkError> {
        match config.role {
            Role::Host => Self::host(config.port, config.read_timeout).await,
            Role::Joiner => Self::join(&config.host, config.port, config.read_timeout).await,
        }
    }

    /// Listen on `port` on all interfaces and accept both links.
    pub async fn host(port: u16, read_timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| NetworkError::Establish(format!("failed to listen on port {}: {}", port, e)))?;
        info!("Waiting for an opponent on port {}...", port);
        Self::accept(listener, read_timeout).await
    }

    /// Accept the primary link, then the chat link, then stop listening.
    pub async fn accept(listener: TcpListener, read_timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let accept_err = |e: std::io::Error| NetworkError::Establish(format!("accept failed: {}", e));
        let (game, addr) = listener.accept().await.map_err(accept_err)?;
        info!("Opponent connected from {}", addr);
        let (chat, _) = listener.accept().await.map_err(accept_err)?;
        drop(listener);
        Self::from_transports(TcpTransport::new(game), TcpTransport::new(chat), read_timeout).await
    }

    /// Connect the primary link, then the chat link.
    pub async fn join(host: &str, port: u16, read_timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let game = TcpTransport::connect((host, port)).await?;
        let chat = TcpTransport::connect((host, port)).await?;
        info!("Connected to {}:{}", host, port);
        Self::from_transports(game, chat, read_timeout).await
    }

    /// Wrap two already-connected transports and exchange `Hello` on both.
    pub async fn from_transports<G: Transport, C: Transport>(
        game: G,
        chat: C,
        read_timeout: Option<Duration>,
    ) -> Result<Self, NetworkError> {
        let connection = Self {
            game: Link::new("game", game, read_timeout),
            chat: Link::new("chat", chat, read_timeout),
            last_error: Mutex::new(NO_ERROR.to_string()),
        };
        for link in [&connection.game, &connection.chat] {
            handshake(link)
                .await
                .map_err(|e| NetworkError::Establish(format!("handshake on {} link: {}", link.name, e)))?;
        }
        Ok(connection)
    }

    fn record(&self, link: &Link, err: &NetworkError) {
        let text = format!("{} link: {}", link.name, err);
        warn!("{}", text);
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = text;
    }

    /// Record a failure and close the link it happened on.
    async fn fail(&self, link: &Link, err: NetworkError) -> NetworkError {
        self.record(link, &err);
        if !link.is_closed() {
            let _ = link.close().await;
        }
        err
    }

    async fn send_on(&self, link: &Link, message: Message) -> Result<(), NetworkError> {
        match link.send(message).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(link, e).await),
        }
    }

    async fn recv_on(&self, link: &Link) -> Result<Message, NetworkError> {
        match link.recv().await {
            Ok(message) => Ok(message),
            Err(e) => Err(self.fail(link, e).await),
        }
    }

    pub async fn write_setup(&self, msg: &BoardSetupMessage) -> Result<(), NetworkError> {
        self.send_on(&self.game, Message::Setup(msg.clone())).await
    }

    pub async fn read_setup(&self) -> Result<BoardSetupMessage, NetworkError> {
        match self.read_message().await? {
            Message::Setup(msg) => Ok(msg),
            other => Err(self.unexpected(&self.game, "setup", &other).await),
        }
    }

    pub async fn write_position(&self, msg: &SinglePositionMessage) -> Result<(), NetworkError> {
        self.send_on(&self.game, Message::Position(*msg)).await
    }

    pub async fn read_position(&self) -> Result<SinglePositionMessage, NetworkError> {
        match self.read_message().await? {
            Message::Position(msg) => Ok(msg),
            other => Err(self.unexpected(&self.game, "position", &other).await),
        }
    }

    /// Next message of any kind on the primary link.
    pub async fn read_message(&self) -> Result<Message, NetworkError> {
        self.recv_on(&self.game).await
    }

    pub async fn write_chat(&self, msg: &ChatMessage) -> Result<(), NetworkError> {
        self.send_on(&self.chat, Message::Chat(msg.clone())).await
    }

    pub async fn read_chat(&self) -> Result<ChatMessage, NetworkError> {
        match self.recv_on(&self.chat).await? {
            Message::Chat(msg) => Ok(msg),
            other => Err(self.unexpected(&self.chat, "chat", &other).await),
        }
    }

    async fn unexpected(&self, link: &Link, wanted: &str, got: &Message) -> NetworkError {
        let err = NetworkError::Protocol(format!("expected {} message, got {}", wanted, got.kind()));
        self.fail(link, err).await
    }

    /// Close the primary link. Closing it twice is reported, not fatal.
    pub async fn close_connection(&self) -> Result<(), NetworkError> {
        let result = self.game.close().await;
        if let Err(e) = &result {
            self.record(&self.game, e);
        }
        result
    }

    pub async fn close_chat_connection(&self) -> Result<(), NetworkError> {
        let result = self.chat.close().await;
        if let Err(e) = &result {
            self.record(&self.chat, e);
        }
        result
    }

    pub fn is_open(&self) -> bool {
        !self.game.is_closed()
    }

    pub fn is_chat_open(&self) -> bool {
        !self.chat.is_closed()
    }

    /// Human-readable description of the latest failure.
    pub fn last_error(&self) -> String {
        self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Both sides send `Hello` first and then expect the peer's.
async fn handshake(link: &Link) -> Result<(), NetworkError> {
    link.send(Message::Hello {
        version: PROTOCOL_VERSION,
    })
    .await?;
    match link.recv().await? {
        Message::Hello { version } if version == PROTOCOL_VERSION => Ok(()),
        Message::Hello { version } => Err(NetworkError::Protocol(format!(
            "protocol version mismatch: expected {}, got {}",
            PROTOCOL_VERSION, version
        ))),
        other => Err(NetworkError::Protocol(format!(
            "expected hello, got {}",
            other.kind()
        ))),
    }
}
