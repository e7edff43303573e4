//! Session state - account registry, current selection, live connector.
//!
//! An explicit session object rather than ambient global state: the service
//! context constructs one at startup, handlers receive it, and `shutdown()`
//! tears it down on unload.
//!
//! Invariant: at most one live connector per session. Account switches are
//! serialized by the write lock on the current selection (single-flight),
//! and the old connector is unloaded before the new one is constructed.
//! Operations obtain the live connector under the read lock, so none can be
//! issued while an unload is in progress.

use std::collections::HashMap;
use std::sync::Arc;

use lnb_protocol::Account;
use lnb_runtime::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock as AsyncRwLock;

use crate::connector::{Connector, ConnectorRegistry};

/// The current selection: which account, and the connector serving it.
///
/// `connector` is `None` while the session is locked; `account_id` survives
/// a lock so `unlock()` can rebuild the connector for the same selection.
#[derive(Default)]
struct Selection {
    account_id: Option<String>,
    connector: Option<Arc<dyn Connector>>,
}

/// Fields editable through the account edit operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEdit {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Session status as reported to the client context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub configured: bool,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_account_id: Option<String>,
}

/// Process-wide session state for the service context.
pub struct Session {
    registry: ConnectorRegistry,
    accounts: RwLock<HashMap<String, Account>>,
    selection: AsyncRwLock<Selection>,
}

impl Session {
    pub fn new(registry: ConnectorRegistry) -> Self {
        Self {
            registry,
            accounts: RwLock::new(HashMap::new()),
            selection: AsyncRwLock::new(Selection::default()),
        }
    }

    /// Adds (or replaces) a configured account.
    pub fn add_account(&self, account: Account) {
        self.accounts.write().insert(account.id.clone(), account);
    }

    /// Returns a configured account by id.
    pub fn account(&self, id: &str) -> Option<Account> {
        self.accounts.read().get(id).cloned()
    }

    /// Returns all configured accounts.
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<_> = self.accounts.read().values().cloned().collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
    }

    /// Applies an edit to a configured account.
    pub fn edit_account(&self, id: &str, edit: AccountEdit) -> Result<Account> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| Error::Validation(format!("no account with id {id}")))?;
        if let Some(name) = edit.name {
            account.name = name;
        }
        if let Some(avatar_url) = edit.avatar_url {
            account.avatar_url = Some(avatar_url);
        }
        Ok(account.clone())
    }

    /// Returns the currently selected account id, if any.
    pub async fn current_account_id(&self) -> Option<String> {
        self.selection.read().await.account_id.clone()
    }

    /// Returns the live connector, if one is bound.
    pub async fn connector(&self) -> Option<Arc<dyn Connector>> {
        self.selection.read().await.connector.clone()
    }

    /// Returns the current account together with its live connector, or
    /// `None` if either is absent.
    pub async fn current(&self) -> Option<(Account, Arc<dyn Connector>)> {
        let selection = self.selection.read().await;
        let id = selection.account_id.as_deref()?;
        let connector = selection.connector.clone()?;
        let account = self.account(id)?;
        Some((account, connector))
    }

    /// Switches to the given account.
    ///
    /// Holds the selection write lock for the whole switch: the old
    /// connector is unloaded first, then the new one is constructed and
    /// initialized. If construction or init fails the session is left with
    /// the account selected but no live connector.
    pub async fn select_account(&self, id: &str) -> Result<()> {
        let account = self
            .account(id)
            .ok_or_else(|| Error::Validation(format!("no account with id {id}")))?;

        let mut selection = self.selection.write().await;
        Self::unload_current(&mut selection).await;
        selection.account_id = Some(account.id.clone());

        let connector = self.registry.create(&account).await?;
        connector.init().await?;
        selection.connector = Some(connector);

        tracing::debug!(account = %account.id, "account selected");
        Ok(())
    }

    /// Tears down the live connector but keeps the selection, so
    /// [`Session::unlock`] can restore it.
    pub async fn lock(&self) {
        let mut selection = self.selection.write().await;
        Self::unload_current(&mut selection).await;
    }

    /// Re-establishes the connector for the current selection.
    ///
    /// Credential verification belongs to the settings collaborator and is
    /// not handled here.
    pub async fn unlock(&self) -> Result<String> {
        let id = self
            .current_account_id()
            .await
            .ok_or(Error::NoCurrentAccount)?;
        self.select_account(&id).await?;
        Ok(id)
    }

    /// Removes a configured account. If it was the current one, the live
    /// connector is unloaded and the selection cleared. Returns whether the
    /// removed account was the current one; the caller is responsible for
    /// purging its cache entry.
    pub async fn remove_account(&self, id: &str) -> Result<bool> {
        self.accounts
            .write()
            .remove(id)
            .ok_or_else(|| Error::Validation(format!("no account with id {id}")))?;

        let mut selection = self.selection.write().await;
        let was_current = selection.account_id.as_deref() == Some(id);
        if was_current {
            Self::unload_current(&mut selection).await;
            selection.account_id = None;
        }
        Ok(was_current)
    }

    /// Session status for the client context.
    pub async fn status(&self) -> SessionStatus {
        let selection = self.selection.read().await;
        SessionStatus {
            configured: !self.accounts.read().is_empty(),
            unlocked: selection.connector.is_some(),
            current_account_id: selection.account_id.clone(),
        }
    }

    /// Terminal teardown on process exit.
    pub async fn shutdown(&self) {
        let mut selection = self.selection.write().await;
        Self::unload_current(&mut selection).await;
        selection.account_id = None;
    }

    async fn unload_current(selection: &mut Selection) {
        if let Some(connector) = selection.connector.take() {
            if let Err(e) = connector.unload().await {
                tracing::warn!("connector unload failed: {e}");
            }
        }
    }
}
