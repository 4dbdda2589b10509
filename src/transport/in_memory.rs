#![cfg(feature = "std")]

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::protocol::Frame;
use crate::transport::{FrameReader, FrameWriter, NetworkError, Transport};

/// One end of an in-process link. Dropping or shutting down the writer of
/// one end makes the other end's reads fail with `Closed`.
pub struct InMemoryTransport {
    tx: UnboundedSender<Frame>,
    rx: UnboundedReceiver<Frame>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = unbounded_channel();
        let (tx2, rx2) = unbounded_channel();
        (Self { tx: tx1, rx: rx2 }, Self { tx: tx2, rx: rx1 })
    }
}

impl Transport for InMemoryTransport {
    fn split(self) -> (Box<dyn FrameReader>, Box<dyn FrameWriter>) {
        (
            Box::new(InMemoryReader { rx: self.rx }),
            Box::new(InMemoryWriter { tx: Some(self.tx) }),
        )
    }
}

pub struct InMemoryReader {
    rx: UnboundedReceiver<Frame>,
}

#[async_trait::async_trait]
impl FrameReader for InMemoryReader {
    async fn recv(&mut self) -> Result<Frame, NetworkError> {
        self.rx.recv().await.ok_or(NetworkError::Closed)
    }
}

pub struct InMemoryWriter {
    tx: Option<UnboundedSender<Frame>>,
}

#[async_trait::async_trait]
impl FrameWriter for InMemoryWriter {
    async fn send(&mut self, frame: &Frame) -> Result<(), NetworkError> {
        let tx = self.tx.as_ref().ok_or(NetworkError::Closed)?;
        tx.send(frame.clone()).map_err(|_| NetworkError::Closed)
    }

    async fn shutdown(&mut self) -> Result<(), NetworkError> {
        self.tx.take().map(drop).ok_or(NetworkError::NotConnected)
    }
}
