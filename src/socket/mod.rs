//! Minimal WebSocket client layer.
//!
//! Frames are encoded and decoded by hand (RFC 6455 subset): client frames
//! are always masked, a single frame carries a whole message, and there is
//! no extension or TLS support.

mod framed;
pub mod frame;
pub mod handshake;
mod ws;

pub use frame::{decode, encode, encode_frame, Frame, Opcode};
pub use framed::{FramedRecv, FramedSend};
pub use handshake::{perform as perform_handshake, HandshakeResult};
pub use ws::{dial, split};

/// Default limit on a declared inbound payload length (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20;

/// XOR `data` in place with the 4-byte masking key.
///
/// Masking is an involution: applying the same key twice restores the input.
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}
