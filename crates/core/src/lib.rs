//! lnb - Lightning wallet bridge core
//!
//! This crate holds the service-side brains of the bridge: the uniform
//! [`Connector`] protocol every Lightning backend adapts to, the
//! [`Session`] that owns accounts and the active connector binding, the
//! account-info orchestrator, the stale-while-revalidate snapshot cache,
//! and the [`Router`] that exposes all of it as RPC operations over an
//! [`RpcBus`](lnb_runtime::RpcBus).
//!
//! # Layers
//!
//! ```text
//! client context                     service context
//! ┌──────────────────┐              ┌──────────────────┐
//! │ AccountInfoCache │── RpcBus ───▶│ Router           │
//! └──────────────────┘   (runtime)  │   │              │
//!                                   │   ▼              │
//!                                   │ Session          │
//!                                   │   │              │
//!                                   │   ▼              │
//!                                   │ dyn Connector    │
//!                                   └──────────────────┘
//! ```
//!
//! Business failures never cross the bus as rejections; they travel in the
//! response envelope's `error` field. The bus itself only fails on
//! transport problems.

pub mod account_info;
pub mod cache;
pub mod connector;
pub mod handlers;
pub mod session;
pub mod testing;

pub use account_info::{FETCH_FAILED, NO_CURRENT_ACCOUNT, account_info};
pub use cache::{AccountInfoCache, CacheStore, MemoryCacheStore};
pub use connector::{Connector, ConnectorFactory, ConnectorRegistry};
pub use handlers::Router;
pub use session::{AccountEdit, Session, SessionStatus};

// The error types live in the runtime crate; re-export them so downstream
// users need only one import path.
pub use lnb_runtime::{Error, Result};
