//! HTTP/1.x framing.
//!
//! This module implements the incremental message parser the proxy runs on
//! every connection. It never buffers message bodies; bodies are sliced out
//! of the read buffer and relayed to the peer as they arrive.
//!
//! # Submodules
//!
//! - **`headers`**: ordered, multi-valued header block with normalized names
//! - **`frame`**: parsed start line + header block for one message
//! - **`fault`**: protocol faults and their pre-rendered canned responses
//! - **`chunked`**: decoder for `Transfer-Encoding: chunked` bodies
//! - **`reader`**: the per-channel frame-reader state machine
//!
//! # Reader State Machine
//!
//! Each channel carries one `FrameReader` that advances through these states
//! as bytes arrive:
//!
//! ```text
//!        ┌──────────┐
//!        │   Head   │ ← Accumulate bytes until the blank-line terminator
//!        └────┬─────┘
//!             │ head parsed, framing selected from the headers
//!             ├─ no body ──────────────────────────────┐
//!             ▼                                        │
//!   ┌───────────────────┐   ┌──────────────────┐       │
//!   │ FixedBody { n }   │   │ Chunked(decoder) │       │
//!   └────────┬──────────┘   └────────┬─────────┘       │
//!            │ n bytes relayed       │ final chunk     │
//!            └──────────┬───────────┘                  │
//!                       ▼                              │
//!                message complete ── back to Head ◄────┘
//!
//!   A 101 response with `Upgrade: websocket` moves BOTH paired readers
//!   into Raw, which relays every byte verbatim and never leaves.
//! ```

pub mod chunked;
pub mod fault;
pub mod frame;
pub mod headers;
pub mod reader;
