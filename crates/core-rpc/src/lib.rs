//! Wire protocol: JSON-RPC 2.0 over loopback TCP.
//!
//! Framing is one newline-terminated UTF-8 request and one newline-terminated
//! response per connection; both the daemon and the client in this crate
//! agree on that. Error kinds map onto the fixed numeric code set shared
//! with every consumer of the protocol.

pub mod client;
pub mod error;
pub mod proto;
pub mod session;

pub use client::{rpc_call, RpcClientError};
pub use error::{ErrorKind, RpcError};
pub use proto::{Request, Response, WireError};
pub use session::SessionFile;

use rand::Rng;

/// Random 16-hex-char session token.
pub fn generate_token() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

/// Random 12-hex-char id distinguishing a diff session pair in logs.
pub fn generate_session_id() -> String {
    format!("{:012x}", rand::thread_rng().gen::<u64>() & 0xffff_ffff_ffff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_shape() {
        let t = generate_token();
        assert_eq!(t.len(), 16);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_id_shape() {
        let s = generate_session_id();
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
