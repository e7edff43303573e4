//! lnb Runtime - Transport and RPC bus for the wallet bridge
//!
//! This crate provides the low-level infrastructure that lets a caller in
//! one execution context invoke wallet operations living in another:
//!
//! - **Transport**: Bidirectional message framing over byte pipes
//! - **Bus**: Request/response correlation on the client side
//! - **Server**: Operation dispatch to a handler on the service side
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │     lnb     │  Session, connectors, orchestrator, cache
//! └──────┬──────┘
//!        │ implements RpcHandler
//! ┌──────▼──────┐
//! │ lnb-runtime │  This crate
//! │  ┌────────┐ │
//! │  │ Bus    │ │  Request/response correlation
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Server │ │  Handler dispatch
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  Length-prefixed JSON framing
//! │  └────────┘ │
//! └─────────────┘
//! ```
//!
//! # Decoupling via RpcHandler
//!
//! The server dispatches operations through the `RpcHandler` trait without
//! knowing about sessions or connectors, keeping this crate independent of
//! the core crate.

pub mod bus;
pub mod error;
pub mod transport;

// Re-export key types at crate root
pub use bus::{RpcBus, RpcHandler, RpcServer};
pub use error::{Error, Result};
pub use transport::{
    PipeTransport, PipeTransportReceiver, PipeTransportSender, Transport, TransportParts,
    TransportReceiver,
};
