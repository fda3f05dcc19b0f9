//! Transport abstraction for the reply path.
//!
//! The dispatcher only needs to push text back to the controller. The
//! session implements this with [`FramedSend`](crate::socket::FramedSend);
//! tests plug in a recorder.

use crate::Result;
use async_trait::async_trait;

/// Async trait for the outbound side of a connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one text message.
    async fn send(&self, text: &str) -> Result<()>;

    /// Close the transport.
    async fn close(&self) -> Result<()>;
}

/// Transport that records what was sent, for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingTransport {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(crate::error::ConnectionError::Disconnected.into());
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
