//! Service-side operation router.
//!
//! Maps RPC operation names onto session and connector calls as thin
//! pass-throughs. Every branch resolves with an envelope: malformed
//! arguments, missing selection, and connector failures all become envelope
//! error strings, never rejections across the boundary.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use lnb_protocol::{
    CheckPaymentArgs, ConnectPeerArgs, Envelope, GetTransactionsArgs, KeysendArgs,
    MakeInvoiceArgs, SendPaymentArgs, SignMessageArgs,
};
use lnb_runtime::{Error, Result, RpcHandler};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::account_info::account_info;
use crate::connector::Connector;
use crate::session::{AccountEdit, Session};

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
struct OptionalIdArgs {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct EditAccountArgs {
    id: String,
    #[serde(flatten)]
    edit: AccountEdit,
}

#[derive(Deserialize)]
struct RequestMethodArgs {
    method: String,
    #[serde(default)]
    args: Value,
}

/// Routes client operations to the session held by the service context.
pub struct Router {
    session: Arc<Session>,
}

impl Router {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn dispatch(&self, op: &str, args: Value) -> Envelope<Value> {
        match op {
            "accountInfo" => {
                let envelope = account_info(&self.session).await;
                match envelope.data {
                    Some(info) => ok_value(info),
                    None => Envelope {
                        data: None,
                        error: envelope.error,
                    },
                }
            }
            "getAccounts" => ok_value(self.session.accounts()),
            "getAccount" => result_envelope(self.get_account(args).await),
            "selectAccount" => result_envelope(self.select_account(args).await),
            "editAccount" => result_envelope(self.edit_account(args)),
            "removeAccount" => result_envelope(self.remove_account(args).await),
            "status" => ok_value(self.session.status().await),
            "lock" => {
                self.session.lock().await;
                Envelope::ok(json!(true))
            }
            "unlock" => result_envelope(
                self.session
                    .unlock()
                    .await
                    .map(|id| json!({ "currentAccountId": id })),
            ),
            "getInfo" => result_envelope(self.get_info().await),
            "getBalance" => result_envelope(self.get_balance().await),
            "getInvoices" => result_envelope(self.get_invoices().await),
            "getTransactions" => result_envelope(self.get_transactions(args).await),
            "makeInvoice" => result_envelope(self.make_invoice(args).await),
            "sendPayment" => result_envelope(self.send_payment(args).await),
            "keysend" => result_envelope(self.keysend(args).await),
            "checkPayment" => result_envelope(self.check_payment(args).await),
            "signMessage" => result_envelope(self.sign_message(args).await),
            "connectPeer" => result_envelope(self.connect_peer(args).await),
            "requestMethod" => result_envelope(self.request_method(args).await),
            _ => Envelope::error(format!("Unknown operation: {op}")),
        }
    }

    async fn connector(&self) -> Result<Arc<dyn Connector>> {
        self.session.connector().await.ok_or(Error::NoCurrentAccount)
    }

    async fn get_account(&self, args: Value) -> Result<Value> {
        let OptionalIdArgs { id } = parse_args(args)?;
        let id = match id {
            Some(id) => id,
            None => self
                .session
                .current_account_id()
                .await
                .ok_or(Error::NoCurrentAccount)?,
        };
        let account = self
            .session
            .account(&id)
            .ok_or_else(|| Error::Validation(format!("no account with id {id}")))?;
        to_value(account)
    }

    async fn select_account(&self, args: Value) -> Result<Value> {
        let IdArgs { id } = parse_args(args)?;
        self.session.select_account(&id).await?;
        Ok(json!(true))
    }

    fn edit_account(&self, args: Value) -> Result<Value> {
        let EditAccountArgs { id, edit } = parse_args(args)?;
        let account = self.session.edit_account(&id, edit)?;
        to_value(account)
    }

    async fn remove_account(&self, args: Value) -> Result<Value> {
        let IdArgs { id } = parse_args(args)?;
        let was_current = self.session.remove_account(&id).await?;
        Ok(json!({ "removed": id, "wasCurrent": was_current }))
    }

    async fn get_info(&self) -> Result<Value> {
        let connector = self.connector().await?;
        to_value(connector.get_info().await?)
    }

    async fn get_balance(&self) -> Result<Value> {
        let connector = self.connector().await?;
        to_value(connector.get_balance().await?)
    }

    async fn get_invoices(&self) -> Result<Value> {
        let connector = self.connector().await?;
        let invoices = connector.get_invoices().await?;
        Ok(json!({ "invoices": invoices }))
    }

    async fn get_transactions(&self, args: Value) -> Result<Value> {
        let parsed: GetTransactionsArgs = parse_args(args)?;
        let connector = self.connector().await?;
        let transactions = connector.get_transactions(parsed.limit).await?;
        Ok(json!({ "transactions": transactions }))
    }

    async fn make_invoice(&self, args: Value) -> Result<Value> {
        let parsed: MakeInvoiceArgs = parse_args(args)?;
        let connector = self.connector().await?;
        to_value(connector.make_invoice(parsed).await?)
    }

    async fn send_payment(&self, args: Value) -> Result<Value> {
        let parsed: SendPaymentArgs = parse_args(args)?;
        let connector = self.connector().await?;
        to_value(connector.send_payment(parsed).await?)
    }

    async fn keysend(&self, args: Value) -> Result<Value> {
        let parsed: KeysendArgs = parse_args(args)?;
        let connector = self.connector().await?;
        to_value(connector.keysend(parsed).await?)
    }

    async fn check_payment(&self, args: Value) -> Result<Value> {
        let parsed: CheckPaymentArgs = parse_args(args)?;
        let connector = self.connector().await?;
        to_value(connector.check_payment(parsed).await?)
    }

    async fn sign_message(&self, args: Value) -> Result<Value> {
        let parsed: SignMessageArgs = parse_args(args)?;
        let connector = self.connector().await?;
        to_value(connector.sign_message(parsed).await?)
    }

    async fn connect_peer(&self, args: Value) -> Result<Value> {
        let parsed: ConnectPeerArgs = parse_args(args)?;
        let connector = self.connector().await?;
        to_value(connector.connect_peer(parsed).await?)
    }

    /// Capability negotiation: only advertised methods are dispatched.
    async fn request_method(&self, args: Value) -> Result<Value> {
        let RequestMethodArgs { method, args } = parse_args(args)?;
        let connector = self.connector().await?;
        if !connector.capabilities().contains(&method) {
            return Err(Error::UnsupportedMethod(method));
        }
        connector.call(&method, args).await
    }
}

impl RpcHandler for Router {
    fn handle(
        &self,
        op: &str,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = Envelope<Value>> + Send + '_>> {
        let op = op.to_string();
        Box::pin(async move { self.dispatch(&op, args).await })
    }
}

/// Deserializes operation arguments, mapping failures to validation errors.
/// Absent arguments (`null`) parse as an empty object so that operations
/// with all-optional arguments accept a bare request.
fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| Error::Validation(e.to_string()))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn ok_value<T: serde::Serialize>(value: T) -> Envelope<Value> {
    match serde_json::to_value(value) {
        Ok(value) => Envelope::ok(value),
        Err(e) => Envelope::error(format!("failed to serialize response: {e}")),
    }
}

fn result_envelope(result: Result<Value>) -> Envelope<Value> {
    match result {
        Ok(value) => Envelope::ok(value),
        Err(e) => Envelope::error(e.to_string()),
    }
}
