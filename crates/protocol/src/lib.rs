//! Wire types for the lnb wallet bridge.
//!
//! This crate contains the serde-serializable types used for communication
//! between the client context and the service context, and the normalized
//! record shapes every connector produces. These types represent the
//! "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **Backend-neutral**: Every connector normalizes into these shapes
//! - **Stable**: Changes only when the wire contract changes
//!
//! Higher-level behavior (session state, orchestration, caching) is built
//! on top of these types in `lnb`.

pub mod account;
pub mod envelope;
pub mod types;

pub use account::*;
pub use envelope::*;
pub use types::*;
