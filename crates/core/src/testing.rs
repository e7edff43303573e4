//! Testing infrastructure for the wallet bridge.
//!
//! Provides mock implementations for exercising the session, orchestrator,
//! and cache without a real Lightning backend, plus a helper that wires a
//! client bus to a service router over in-memory pipes.
//!
//! # Example
//!
//! ```ignore
//! use lnb::testing::{MockConnector, QueueFactory};
//!
//! #[tokio::test]
//! async fn test_account_info() {
//!     let connector = MockConnector::new("alice");
//!     connector.set_balance(1000, None);
//!     // ... build a session around it and assert on the composed snapshot
//! }
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use lnb_protocol::{
    Account, BalanceInfo, CheckPaymentArgs, CheckPaymentResponse, ConnectPeerArgs, ConnectorKind,
    CurrencyCode, Invoice, KeysendArgs, MakeInvoiceArgs, MakeInvoiceResponse, NodeInfo, Route,
    SendPaymentArgs, SendPaymentResponse, SignMessageArgs, SignMessageResponse, Transaction,
};
use lnb_runtime::{Error, PipeTransport, Result, RpcBus, RpcHandler, RpcServer};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::connector::{Connector, ConnectorFactory};
use crate::session::Session;

/// Per-method invocation counters for asserting on connector usage.
#[derive(Default)]
pub struct CallCounts {
    pub init: AtomicUsize,
    pub unload: AtomicUsize,
    pub get_info: AtomicUsize,
    pub get_balance: AtomicUsize,
    pub call: AtomicUsize,
}

impl CallCounts {
    /// Total calls across the info-fetch surface.
    pub fn info_fetches(&self) -> usize {
        self.get_info.load(Ordering::SeqCst) + self.get_balance.load(Ordering::SeqCst)
    }
}

/// Configurable in-memory connector.
///
/// Responses are canned and adjustable; failure injection flips individual
/// operations to errors. An optional shared event log records lifecycle
/// calls in order, for asserting unload-before-init on account switches.
pub struct MockConnector {
    name: String,
    info: Mutex<NodeInfo>,
    balance: Mutex<BalanceInfo>,
    fail_init: AtomicBool,
    fail_get_info: AtomicBool,
    fail_get_balance: AtomicBool,
    capabilities: Mutex<HashSet<String>>,
    events: Mutex<Option<Arc<Mutex<Vec<String>>>>>,
    pub counts: CallCounts,
}

impl MockConnector {
    pub fn new(alias: &str) -> Arc<Self> {
        Arc::new(Self {
            name: alias.to_string(),
            info: Mutex::new(NodeInfo {
                alias: alias.to_string(),
                pubkey: None,
                color: None,
            }),
            balance: Mutex::new(BalanceInfo {
                balance: 0,
                currency: None,
            }),
            fail_init: AtomicBool::new(false),
            fail_get_info: AtomicBool::new(false),
            fail_get_balance: AtomicBool::new(false),
            capabilities: Mutex::new(HashSet::new()),
            events: Mutex::new(None),
            counts: CallCounts::default(),
        })
    }

    pub fn set_balance(&self, balance: u64, currency: Option<CurrencyCode>) {
        *self.balance.lock() = BalanceInfo { balance, currency };
    }

    pub fn set_info(&self, info: NodeInfo) {
        *self.info.lock() = info;
    }

    pub fn fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get_info(&self, fail: bool) {
        self.fail_get_info.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get_balance(&self, fail: bool) {
        self.fail_get_balance.store(fail, Ordering::SeqCst);
    }

    pub fn advertise(&self, methods: &[&str]) {
        *self.capabilities.lock() = methods.iter().map(|m| m.to_string()).collect();
    }

    /// Attaches a shared log recording `init:<alias>` / `unload:<alias>`
    /// events in call order.
    pub fn log_events_to(&self, log: Arc<Mutex<Vec<String>>>) {
        *self.events.lock() = Some(log);
    }

    fn record(&self, event: &str) {
        if let Some(log) = self.events.lock().as_ref() {
            log.lock().push(format!("{event}:{}", self.name));
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn init(&self) -> Result<()> {
        self.counts.init.fetch_add(1, Ordering::SeqCst);
        self.record("init");
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(Error::Connection("mock init failure".to_string()));
        }
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        self.counts.unload.fetch_add(1, Ordering::SeqCst);
        self.record("unload");
        Ok(())
    }

    async fn get_info(&self) -> Result<NodeInfo> {
        self.counts.get_info.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_info.load(Ordering::SeqCst) {
            return Err(Error::Connection("mock get_info failure".to_string()));
        }
        Ok(self.info.lock().clone())
    }

    async fn get_balance(&self) -> Result<BalanceInfo> {
        self.counts.get_balance.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_balance.load(Ordering::SeqCst) {
            return Err(Error::Connection("mock get_balance failure".to_string()));
        }
        Ok(self.balance.lock().clone())
    }

    async fn get_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(Vec::new())
    }

    async fn get_transactions(&self, _limit: Option<u32>) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    async fn make_invoice(&self, args: MakeInvoiceArgs) -> Result<MakeInvoiceResponse> {
        if args.amount == 0 {
            return Err(Error::Validation("amount must be positive".to_string()));
        }
        Ok(MakeInvoiceResponse {
            payment_request: format!("lnbc{}n1mock", args.amount),
            r_hash: "00".repeat(32),
        })
    }

    async fn send_payment(&self, _args: SendPaymentArgs) -> Result<SendPaymentResponse> {
        Ok(SendPaymentResponse {
            preimage: "11".repeat(32),
            payment_hash: "22".repeat(32),
            route: Route {
                total_amt: 21,
                total_fees: 1,
            },
        })
    }

    async fn keysend(&self, args: KeysendArgs) -> Result<SendPaymentResponse> {
        Ok(SendPaymentResponse {
            preimage: "33".repeat(32),
            payment_hash: "44".repeat(32),
            route: Route {
                total_amt: args.amount,
                total_fees: 0,
            },
        })
    }

    async fn check_payment(&self, _args: CheckPaymentArgs) -> Result<CheckPaymentResponse> {
        Ok(CheckPaymentResponse {
            paid: true,
            preimage: Some("11".repeat(32)),
        })
    }

    async fn sign_message(&self, args: SignMessageArgs) -> Result<SignMessageResponse> {
        Ok(SignMessageResponse {
            signature: format!("sig:{}", args.message),
            message: args.message,
        })
    }

    async fn connect_peer(&self, _args: ConnectPeerArgs) -> Result<bool> {
        Ok(true)
    }

    fn capabilities(&self) -> HashSet<String> {
        self.capabilities.lock().clone()
    }

    async fn call(&self, method: &str, args: Value) -> Result<Value> {
        self.counts.call.fetch_add(1, Ordering::SeqCst);
        if !self.capabilities.lock().contains(method) {
            return Err(Error::UnsupportedMethod(method.to_string()));
        }
        Ok(json!({ "method": method, "args": args }))
    }
}

/// Factory handing out a queue of pre-built connectors.
///
/// Each `create` pops the next queued connector, so tests can keep handles
/// to the instances the session will bind across switches. An empty queue
/// produces a fresh default mock.
#[derive(Default)]
pub struct QueueFactory {
    queue: Mutex<VecDeque<Arc<MockConnector>>>,
}

impl QueueFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, connector: Arc<MockConnector>) {
        self.queue.lock().push_back(connector);
    }
}

#[async_trait]
impl ConnectorFactory for QueueFactory {
    async fn create(&self, account: &Account) -> Result<Arc<dyn Connector>> {
        let connector = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| MockConnector::new(&account.name));
        Ok(connector)
    }
}

/// A minimal test account.
pub fn test_account(id: &str, name: &str) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        connector: ConnectorKind::Lnd,
        avatar_url: None,
        has_mnemonic: false,
        has_imported_signing_key: false,
    }
}

/// Wires a client [`RpcBus`] to an [`RpcServer`] over in-memory duplex
/// pipes and starts both loops.
pub fn paired_bus(handler: Arc<dyn RpcHandler>) -> Arc<RpcBus> {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    let (client_read, client_write) = tokio::io::split(client_io);
    let (client_transport, client_rx) = PipeTransport::new(client_write, client_read);
    let bus = Arc::new(RpcBus::new(client_transport.into_transport_parts(client_rx)));

    let (server_read, server_write) = tokio::io::split(server_io);
    let (server_transport, server_rx) = PipeTransport::new(server_write, server_read);
    let server = RpcServer::new(server_transport.into_transport_parts(server_rx), handler);

    let bus_clone = Arc::clone(&bus);
    tokio::spawn(async move { bus_clone.run().await });
    tokio::spawn(async move { server.run().await });

    bus
}

/// Builds a session with one registered [`QueueFactory`] for LND-kind
/// accounts, the given connectors queued in order.
pub fn session_with_connectors(connectors: Vec<Arc<MockConnector>>) -> Arc<Session> {
    let factory = QueueFactory::new();
    for connector in connectors {
        factory.push(connector);
    }
    let mut registry = crate::connector::ConnectorRegistry::new();
    registry.register(ConnectorKind::Lnd, Arc::new(factory));
    Arc::new(Session::new(registry))
}
