//! Frame-level send and receive halves over a byte stream.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::frame::{decode, encode_frame, Frame, Opcode};
use crate::error::ConnectionError;
use crate::Result;

/// Send half: writes masked frames. Implements [`Transport`](crate::Transport).
pub struct FramedSend<W> {
    writer: Mutex<W>,
}

impl<W> FramedSend<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Write one complete frame and flush it.
    pub async fn send_frame(&self, opcode: Opcode, payload: &[u8]) -> Result<()> {
        let frame = encode_frame(opcode, payload);
        let mut w = self.writer.lock().await;
        w.write_all(&frame).await.map_err(ConnectionError::Io)?;
        w.flush().await.map_err(ConnectionError::Io)?;
        Ok(())
    }
}

#[async_trait]
impl<W> crate::transport::Transport for FramedSend<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, text: &str) -> Result<()> {
        self.send_frame(Opcode::Text, text.as_bytes()).await
    }

    async fn close(&self) -> Result<()> {
        self.send_frame(Opcode::Close, &[]).await?;
        let mut w = self.writer.lock().await;
        w.shutdown().await.map_err(ConnectionError::Io)?;
        Ok(())
    }
}

/// Receive half: decodes one frame per call.
pub struct FramedRecv<R> {
    reader: R,
    max_frame_size: usize,
}

impl<R> FramedRecv<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, max_frame_size: usize) -> Self {
        Self {
            reader,
            max_frame_size,
        }
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        decode(&mut self.reader, self.max_frame_size).await
    }
}
