//! Reverse proxy core.
//!
//! One [`session::Session`] task drives each accepted client connection:
//! it parses the request stream, resolves a destination, establishes the
//! origin connection through the [`connect::ConnectGate`], and relays
//! bytes in both directions until the pair closes.

pub mod connect;
pub mod router;
pub mod session;

pub use connect::ConnectGate;
pub use router::{Resolve, RouteTable, Target};
pub use session::Session;
