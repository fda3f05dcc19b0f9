//! Event types emitted by the client.

use crate::client::SessionState;

/// Where a power change came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerSource {
    /// The physical button.
    Button,
    /// An `on`/`off` command from the controller.
    Remote,
}

/// Events emitted by [Client](crate::Client) to registered handlers.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Session moved between lifecycle states.
    StateChanged {
        from: SessionState,
        to: SessionState,
    },

    /// Server answered the upgrade with something other than 101.
    HandshakeRejected { response: String },

    /// Registration frame sent.
    Registered { id: String },

    /// Power toggled by the button or by a command.
    PowerChanged { powered: bool, source: PowerSource },

    /// Text reply sent back to the controller.
    Reply { text: String },

    /// Session ended; a retry follows after the fixed delay.
    Disconnected { reason: String },
}
