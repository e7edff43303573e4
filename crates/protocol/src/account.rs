//! Account identity and the client-visible account snapshot shapes.

use serde::{Deserialize, Serialize};

use crate::types::{AccountBalance, CurrencyCode, NodeInfo};

/// Tag identifying which connector family serves an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Lnd,
    /// Core Lightning.
    Cln,
    Eclair,
    LnBits,
    LndHub,
    /// Forward-compatible catch-all for kinds this build does not know.
    #[serde(other)]
    Unknown,
}

/// A configured wallet connection.
///
/// Owned by the session's account registry; authoritative wallet data lives
/// behind the connector, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Connector family serving this account.
    pub connector: ConnectorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// True if a recovery mnemonic is configured for this account.
    #[serde(default)]
    pub has_mnemonic: bool,
    /// True if a signing key was imported rather than derived.
    #[serde(default)]
    pub has_imported_signing_key: bool,
}

/// Consolidated account snapshot produced by the orchestrator.
///
/// Derived, not authoritative: a denormalized projection of account
/// identity, node identity, and balance, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfoRes {
    pub current_account_id: String,
    pub name: String,
    pub connector_type: ConnectorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub info: NodeInfo,
    /// Balance with the currency already resolved (BTC when the connector
    /// left it unspecified).
    pub balance: AccountBalance,
}

/// Client-visible, cacheable account snapshot.
///
/// Either the success fields or `error` is populated, never a meaningless
/// mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<ConnectorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccountSnapshot {
    /// Builds the success-tagged snapshot from an orchestrator payload.
    pub fn from_info(id: impl Into<String>, info: &AccountInfoRes) -> Self {
        Self {
            id: id.into(),
            name: info.name.clone(),
            connector_type: Some(info.connector_type),
            alias: Some(info.info.alias.clone()),
            balance: Some(info.balance.balance),
            currency: Some(info.balance.currency),
            avatar_url: info.avatar_url.clone(),
            error: None,
        }
    }

    /// Builds the error-tagged snapshot.
    pub fn from_error(id: impl Into<String>, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            connector_type: None,
            alias: None,
            balance: None,
            currency: None,
            avatar_url: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if this snapshot carries an error instead of data.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_kind_unknown_is_forward_compatible() {
        let kind: ConnectorKind = serde_json::from_str("\"somefuturebackend\"").unwrap();
        assert_eq!(kind, ConnectorKind::Unknown);
    }

    #[test]
    fn snapshot_success_and_error_are_disjoint() {
        let info = AccountInfoRes {
            current_account_id: "acc1".into(),
            name: "Alice".into(),
            connector_type: ConnectorKind::Lnd,
            avatar_url: None,
            info: NodeInfo {
                alias: "alice".into(),
                pubkey: None,
                color: None,
            },
            balance: AccountBalance {
                balance: 1000,
                currency: CurrencyCode::Btc,
            },
        };

        let ok = AccountSnapshot::from_info("acc1", &info);
        assert!(!ok.is_error());
        assert_eq!(ok.balance, Some(1000));

        let err = AccountSnapshot::from_error("acc1", "Alice", "backend unreachable");
        assert!(err.is_error());
        assert!(err.balance.is_none());
        assert!(err.alias.is_none());
    }
}
