//! Peer role produced by negotiation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The side of the TCP connection this instance ended up on.
///
/// Roles are not configured.  Each instance first tries to dial its peer; if
/// that succeeds it is the [`Role::Dialer`], otherwise it listens and becomes
/// the [`Role::Listener`].  The role is fixed for the lifetime of one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Opened the connection to the peer.
    Dialer,
    /// Accepted the connection from the peer.
    Listener,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Dialer => f.write_str("dialer"),
            Role::Listener => f.write_str("listener"),
        }
    }
}
