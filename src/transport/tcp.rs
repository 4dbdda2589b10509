#![cfg(feature = "std")]

use std::io::ErrorKind;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::config::MAX_FRAME_SIZE;
use crate::protocol::Frame;
use crate::transport::{FrameReader, FrameWriter, NetworkError, Transport};

/// Length-prefixed bincode frames over a TCP stream.
///
/// Each frame is a 4-byte big-endian length followed by that many bytes of
/// a bincode-encoded [`Frame`].
pub struct TcpTransport {
    stream: TcpStream,
    max_frame_size: u32,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        // frames are tiny and latency matters more than batching
        let _ = stream.set_nodelay(true);
        Self {
            stream,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    pub fn with_max_frame_size(stream: TcpStream, max_frame_size: u32) -> Self {
        let mut transport = Self::new(stream);
        transport.max_frame_size = max_frame_size;
        transport
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, NetworkError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| NetworkError::Establish(format!("connect failed: {}", e)))?;
        Ok(Self::new(stream))
    }
}

impl Transport for TcpTransport {
    fn split(self) -> (Box<dyn FrameReader>, Box<dyn FrameWriter>) {
        let (read, write) = self.stream.into_split();
        (
            Box::new(TcpFrameReader {
                half: read,
                max_frame_size: self.max_frame_size,
            }),
            Box::new(TcpFrameWriter {
                half: Some(write),
                max_frame_size: self.max_frame_size,
            }),
        )
    }
}

/// Encode a frame with its length prefix.
pub fn encode_frame(frame: &Frame, max_frame_size: u32) -> Result<Vec<u8>, NetworkError> {
    let data = bincode::serialize(frame)
        .map_err(|e| NetworkError::Protocol(format!("serialization error: {}", e)))?;
    if data.len() as u64 > max_frame_size as u64 {
        return Err(NetworkError::Protocol(format!(
            "frame too large: {} bytes (max: {})",
            data.len(),
            max_frame_size
        )));
    }
    let mut out = Vec::with_capacity(4 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&data);
    Ok(out)
}

/// Decode a frame body (without the length prefix).
pub fn decode_frame(body: &[u8]) -> Result<Frame, NetworkError> {
    bincode::deserialize(body)
        .map_err(|e| NetworkError::Protocol(format!("deserialization error: {}", e)))
}

fn classify_io(e: std::io::Error, op: &str) -> NetworkError {
    match e.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted => NetworkError::Closed,
        _ => NetworkError::Io(format!("{} error: {}", op, e)),
    }
}

pub struct TcpFrameReader {
    half: OwnedReadHalf,
    max_frame_size: u32,
}

#[async_trait::async_trait]
impl FrameReader for TcpFrameReader {
    async fn recv(&mut self) -> Result<Frame, NetworkError> {
        let mut len_buf = [0u8; 4];
        self.half
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| classify_io(e, "read"))?;

        let len = u32::from_be_bytes(len_buf);
        if len == 0 {
            return Err(NetworkError::Protocol("invalid frame length: 0".into()));
        }
        if len > self.max_frame_size {
            return Err(NetworkError::Protocol(format!(
                "frame too large: {} bytes (max: {})",
                len, self.max_frame_size
            )));
        }

        let mut buf = vec![0u8; len as usize];
        self.half
            .read_exact(&mut buf)
            .await
            .map_err(|e| classify_io(e, "read"))?;
        decode_frame(&buf)
    }
}

pub struct TcpFrameWriter {
    half: Option<OwnedWriteHalf>,
    max_frame_size: u32,
}

#[async_trait::async_trait]
impl FrameWriter for TcpFrameWriter {
    async fn send(&mut self, frame: &Frame) -> Result<(), NetworkError> {
        let bytes = encode_frame(frame, self.max_frame_size)?;
        let half = self.half.as_mut().ok_or(NetworkError::Closed)?;
        half.write_all(&bytes)
            .await
            .map_err(|e| classify_io(e, "write"))?;
        half.flush().await.map_err(|e| classify_io(e, "write"))
    }

    async fn shutdown(&mut self) -> Result<(), NetworkError> {
        let mut half = self.half.take().ok_or(NetworkError::NotConnected)?;
        half.shutdown().await.map_err(|e| classify_io(e, "close"))
    }
}
