//! TCP connection setup for the WebSocket layer.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::framed::{FramedRecv, FramedSend};
use crate::error::ConnectionError;
use crate::Result;

/// Open a TCP connection to `host:port`.
pub async fn dial(host: &str, port: u16) -> Result<TcpStream> {
    let addr = format!("{host}:{port}");
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| ConnectionError::Connect { addr, source })?;
    stream.set_nodelay(true).map_err(ConnectionError::Io)?;
    Ok(stream)
}

/// Split an upgraded stream into framed send/recv halves.
pub fn split(
    stream: TcpStream,
    max_frame_size: usize,
) -> (FramedSend<OwnedWriteHalf>, FramedRecv<OwnedReadHalf>) {
    let (read_half, write_half) = stream.into_split();
    (
        FramedSend::new(write_half),
        FramedRecv::new(read_half, max_frame_size),
    )
}
