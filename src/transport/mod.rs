use alloc::boxed::Box;
use alloc::string::String;
use core::time::Duration;

use crate::protocol::Frame;

/// Classified failure of a link. Raw transport errors never escape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Listening, accepting or connecting failed.
    #[error("Failed to establish connection: {0}")]
    Establish(String),
    /// Read or write failed mid-session.
    #[error("I/O error: {0}")]
    Io(String),
    /// The peer closed the stream, or it was closed locally.
    #[error("Connection closed")]
    Closed,
    /// Unexpected message, sequence gap, version mismatch or bad frame.
    #[error("Protocol violation: {0}")]
    Protocol(String),
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),
    #[error("Attempted to close a connection that is not open")]
    NotConnected,
}

/// Sending half of a link.
#[async_trait::async_trait]
pub trait FrameWriter: Send {
    async fn send(&mut self, frame: &Frame) -> Result<(), NetworkError>;
    /// Flush and close the sending direction.
    async fn shutdown(&mut self) -> Result<(), NetworkError>;
}

/// Receiving half of a link.
#[async_trait::async_trait]
pub trait FrameReader: Send {
    async fn recv(&mut self) -> Result<Frame, NetworkError>;
}

/// A bidirectional byte stream carrying frames, split so that a listener
/// task can block on reads while another task writes.
pub trait Transport: Send {
    fn split(self) -> (Box<dyn FrameReader>, Box<dyn FrameWriter>)
    where
        Self: Sized;
}

#[cfg(feature = "std")]
pub mod tcp;
#[cfg(feature = "std")]
pub mod in_memory;
