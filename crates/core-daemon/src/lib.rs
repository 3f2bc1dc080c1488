//! The replay session daemon.
//!
//! One session owns one replay; the cursor over the captured frame is
//! shared mutable state, so the daemon processes requests strictly serially
//! — an accept thread feeds connections into a channel drained by a single
//! consumer loop. That loop owning [`DaemonState`] *is* the session lock.
//!
//! Handlers are organized by domain under [`handlers`]; [`dispatch`] routes
//! an exhaustive method enum to them and owns the token gate.

pub mod dispatch;
pub mod handlers;
pub mod method;
pub mod params;
pub mod server;
pub mod state;

pub use dispatch::handle_request;
pub use method::Method;
pub use server::{spawn_server, ServerConfig, ServerHandle};
pub use state::DaemonState;
