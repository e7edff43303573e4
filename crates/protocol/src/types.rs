//! Normalized connector types used across the wire.
//!
//! Every backend adapter translates its native responses into these shapes,
//! so nothing above the connector layer ever sees backend-specific data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity of the Lightning node behind the active connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Human-readable node alias.
    pub alias: String,
    /// Node public key (hex), if the backend exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// Node color (hex), if the backend exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Currency a balance is denominated in.
///
/// The wire format is the uppercase code string (e.g. `"BTC"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    /// Bitcoin (the resolution default for connectors that leave the
    /// currency unspecified).
    #[default]
    Btc,
    Eur,
    Usd,
    Gbp,
}

/// Balance as reported by a connector.
///
/// An absent `currency` means "unspecified"; it is resolved to
/// [`CurrencyCode::Btc`] by callers, never by the connector itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Balance in satoshis (or the smallest unit of `currency`).
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

/// Balance with the currency already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub balance: u64,
    /// Defaults to BTC when the payload omits it.
    #[serde(default)]
    pub currency: CurrencyCode,
}

/// Payment route summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Total amount sent, in satoshis.
    pub total_amt: u64,
    /// Total routing fees paid, in satoshis.
    pub total_fees: u64,
}

/// Custom key-value records attached to an invoice or payment, keyed by
/// protocol-specific numeric tags (e.g. `"696969"` for a keysend wallet id).
pub type CustomRecords = BTreeMap<String, String>;

/// A received, normalized invoice record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub total_amount: u64,
    pub memo: String,
    pub preimage: String,
    pub settled: bool,
    /// Settlement time as a unix timestamp in milliseconds.
    pub settle_date: i64,
    #[serde(rename = "custom_records", skip_serializing_if = "Option::is_none")]
    pub custom_records: Option<CustomRecords>,
}

/// A sent, normalized payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub total_amount: u64,
    pub total_fee: u64,
    pub memo: String,
    pub preimage: String,
    pub settled: bool,
    /// Settlement time as a unix timestamp in milliseconds.
    pub settle_date: i64,
    /// True if this payment was sent without an invoice.
    pub keysend: bool,
    pub timestamp: i64,
    #[serde(rename = "custom_records", skip_serializing_if = "Option::is_none")]
    pub custom_records: Option<CustomRecords>,
}

/// Arguments for creating an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeInvoiceArgs {
    /// Invoice amount in satoshis.
    pub amount: u64,
    pub memo: String,
}

/// Result of creating an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeInvoiceResponse {
    /// BOLT-11 payment request.
    pub payment_request: String,
    /// Payment hash (hex).
    pub r_hash: String,
}

/// Arguments for fetching sent payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetTransactionsArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Arguments for paying an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentArgs {
    /// BOLT-11 payment request to pay.
    pub payment_request: String,
}

/// Arguments for a spontaneous (invoice-less) payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysendArgs {
    /// Destination node public key (hex).
    pub pubkey: String,
    /// Amount in satoshis.
    pub amount: u64,
    pub custom_records: CustomRecords,
}

/// Result of a payment or keysend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentResponse {
    /// Settlement preimage (hex) proving the payment completed.
    pub preimage: String,
    /// Payment hash (hex).
    pub payment_hash: String,
    pub route: Route,
}

/// Arguments for checking payment settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentArgs {
    pub payment_hash: String,
}

/// Result of a settlement check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPaymentResponse {
    pub paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preimage: Option<String>,
}

/// Key locator for message signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLocator {
    pub key_family: i32,
    pub key_index: i32,
}

/// Arguments for signing a message with the node key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageArgs {
    pub message: String,
    pub key_loc: KeyLocator,
}

/// Result of signing a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageResponse {
    /// The message that was signed.
    pub message: String,
    /// Signature (zbase32 or hex, backend-dependent).
    pub signature: String,
}

/// Arguments for connecting to a peer node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectPeerArgs {
    /// Peer public key (hex).
    pub pubkey: String,
    /// Peer network address, `host:port`.
    pub host: String,
}

/// Delegated-auth token for hosted-wallet backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as a unix timestamp in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}
