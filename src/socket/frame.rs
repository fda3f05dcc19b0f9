//! Frame encoding and decoding.
//!
//! ```text
//!  0               1               2               3
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |            (16/64)            |
//! |N|V|V|V|       |S|             |  (if payload len == 126/127)  |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |            Masking key (if MASK set)  |     Payload data      |
//! +---------------------------------------+-----------------------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::apply_mask;
use crate::error::FrameError;
use crate::Result;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const LEN_MASK: u8 = 0x7F;
const LEN_16: u8 = 126;
const LEN_64: u8 = 127;

/// Frame opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    pub fn from_u8(byte: u8) -> std::result::Result<Self, FrameError> {
        match byte {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            other => Err(FrameError::InvalidOpcode(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }
}

/// A decoded frame. The payload is always stored unmasked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    /// Whether the frame arrived masked on the wire.
    pub masked: bool,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Payload as UTF-8 text. `None` for non-text frames or invalid UTF-8.
    pub fn text(&self) -> Option<&str> {
        if self.opcode != Opcode::Text {
            return None;
        }
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Encode `payload` as one masked, final text frame.
pub fn encode(payload: &[u8]) -> Bytes {
    encode_frame(Opcode::Text, payload)
}

/// Encode one masked, final frame with a fresh random mask.
///
/// The mask only has to avoid confusing intermediaries, so a
/// non-cryptographic generator is enough.
pub fn encode_frame(opcode: Opcode, payload: &[u8]) -> Bytes {
    encode_frame_with_mask(opcode, payload, rand::random())
}

/// Encode one masked, final frame with the given mask.
///
/// Lengths of 65536 and above use the 64-bit form with the high four bytes
/// written as zero, so payloads must stay below 4 GiB.
pub fn encode_frame_with_mask(opcode: Opcode, payload: &[u8], mask: [u8; 4]) -> Bytes {
    let len = payload.len();
    debug_assert!(len <= u32::MAX as usize);

    let mut buf = BytesMut::with_capacity(14 + len);
    buf.put_u8(FIN_BIT | opcode.as_u8());
    if len < LEN_16 as usize {
        buf.put_u8(MASK_BIT | len as u8);
    } else if len < 65536 {
        buf.put_u8(MASK_BIT | LEN_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(MASK_BIT | LEN_64);
        buf.put_u32(0);
        buf.put_u32(len as u32);
    }
    buf.put_slice(&mask);

    let start = buf.len();
    buf.put_slice(payload);
    apply_mask(&mut buf[start..], mask);
    buf.freeze()
}

/// Read exactly one frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends before a full two-byte header is
/// available, which is how a peer close shows up. Declared payloads longer
/// than `max_payload` are rejected before anything is allocated.
pub async fn decode<R>(reader: &mut R, max_payload: usize) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(FrameError::Io(e).into()),
    }

    let fin = header[0] & FIN_BIT != 0;
    let opcode = Opcode::from_u8(header[0] & OPCODE_MASK)?;
    let masked = header[1] & MASK_BIT != 0;

    let len = match header[1] & LEN_MASK {
        LEN_16 => reader.read_u16().await.map_err(FrameError::Io)? as u64,
        LEN_64 => reader.read_u64().await.map_err(FrameError::Io)?,
        n => n as u64,
    };
    if len > max_payload as u64 {
        return Err(FrameError::TooLarge {
            len,
            max: max_payload,
        }
        .into());
    }

    let mask = if masked {
        let mut key = [0u8; 4];
        reader.read_exact(&mut key).await.map_err(FrameError::Io)?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(FrameError::Io)?;
    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    Ok(Some(Frame {
        fin,
        opcode,
        masked,
        payload,
    }))
}
