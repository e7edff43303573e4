//! Connector - the uniform backend protocol.
//!
//! One polymorphic interface, many backend variants. A connector instance
//! moves through three lifecycle states: *Uninitialized* (constructed) →
//! *Initialized* (after [`Connector::init`]) → *Unloaded* (after
//! [`Connector::unload`], terminal). An unloaded connector is never
//! resurrected; the session builds a new instance instead.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use lnb_protocol::{
    Account, BalanceInfo, CheckPaymentArgs, CheckPaymentResponse, ConnectPeerArgs, ConnectorKind,
    Invoice, KeysendArgs, MakeInvoiceArgs, MakeInvoiceResponse, NodeInfo, OAuthToken,
    SendPaymentArgs, SendPaymentResponse, SignMessageArgs, SignMessageResponse, Transaction,
};
use lnb_runtime::{Error, Result};
use serde_json::Value;

/// The uniform operation contract every backend adapter must satisfy.
///
/// The fixed surface covers operations common to all backends. Backend
/// specific extensions go through [`Connector::capabilities`] and
/// [`Connector::call`] instead of widening this trait.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes the backend connection or session.
    ///
    /// Called at most once per instance. Fails with [`Error::Connection`]
    /// on network or auth failure.
    async fn init(&self) -> Result<()>;

    /// Releases backend resources. Terminal: no further calls are valid
    /// on this instance afterwards.
    async fn unload(&self) -> Result<()>;

    /// Returns the identity of the node behind this connector.
    async fn get_info(&self) -> Result<NodeInfo>;

    /// Returns the wallet balance. A connector reporting no currency
    /// leaves it unspecified; resolution to BTC happens in callers.
    async fn get_balance(&self) -> Result<BalanceInfo>;

    /// Returns received invoices, normalized.
    async fn get_invoices(&self) -> Result<Vec<Invoice>>;

    /// Returns sent payments, normalized, newest first.
    async fn get_transactions(&self, limit: Option<u32>) -> Result<Vec<Transaction>>;

    /// Creates an invoice. Fails with [`Error::Validation`] if amount or
    /// memo violate backend limits.
    async fn make_invoice(&self, args: MakeInvoiceArgs) -> Result<MakeInvoiceResponse>;

    /// Pays a BOLT-11 invoice. Fails with [`Error::Payment`] on
    /// insufficient balance or routing failure.
    async fn send_payment(&self, args: SendPaymentArgs) -> Result<SendPaymentResponse>;

    /// Sends a spontaneous payment carrying custom records.
    async fn keysend(&self, args: KeysendArgs) -> Result<SendPaymentResponse>;

    /// Checks whether a payment has settled.
    async fn check_payment(&self, args: CheckPaymentArgs) -> Result<CheckPaymentResponse>;

    /// Signs a message with the node key.
    async fn sign_message(&self, args: SignMessageArgs) -> Result<SignMessageResponse>;

    /// Connects to a peer node. Returns true on success.
    async fn connect_peer(&self, args: ConnectPeerArgs) -> Result<bool>;

    /// Backend-specific operations this connector supports beyond the
    /// uniform surface. Callers must consult this before [`Connector::call`]
    /// - capability negotiation, not dynamic reflection.
    fn capabilities(&self) -> HashSet<String> {
        HashSet::new()
    }

    /// Dispatches a backend-specific operation advertised in
    /// [`Connector::capabilities`]. Fails with [`Error::UnsupportedMethod`]
    /// for anything not advertised.
    async fn call(&self, method: &str, _args: Value) -> Result<Value> {
        Err(Error::UnsupportedMethod(method.to_string()))
    }

    /// Delegated-auth token, for backends that use one.
    fn oauth_token(&self) -> Option<OAuthToken> {
        None
    }
}

/// Builds connector instances for one backend family.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// Constructs an uninitialized connector for the account. The session
    /// calls [`Connector::init`] on the result.
    async fn create(&self, account: &Account) -> Result<Arc<dyn Connector>>;
}

/// Variant table of connector factories keyed by connector-type tag.
#[derive(Default)]
pub struct ConnectorRegistry {
    factories: std::collections::HashMap<ConnectorKind, Arc<dyn ConnectorFactory>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for a connector kind, replacing any previous one.
    pub fn register(&mut self, kind: ConnectorKind, factory: Arc<dyn ConnectorFactory>) {
        self.factories.insert(kind, factory);
    }

    /// Constructs an uninitialized connector for the account's kind.
    pub async fn create(&self, account: &Account) -> Result<Arc<dyn Connector>> {
        let factory = self.factories.get(&account.connector).ok_or_else(|| {
            Error::Connection(format!(
                "no connector registered for kind {:?}",
                account.connector
            ))
        })?;
        factory.create(account).await
    }
}
