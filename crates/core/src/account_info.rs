//! Account-info orchestrator.
//!
//! Fans out to the active connector for node identity and balance, joins
//! both, and composes the consolidated snapshot. Every connector-layer
//! failure is recovered here and surfaced as an envelope error string: the
//! bus's caller-facing contract is "always resolves with an envelope",
//! never "may reject for business reasons".

use lnb_protocol::{AccountBalance, AccountInfoRes, Envelope};

use crate::session::Session;

/// Error string for a missing selection. Part of the client contract.
pub const NO_CURRENT_ACCOUNT: &str = "No current account set";

/// Error string covering every connector-layer failure in the fetch path.
pub const FETCH_FAILED: &str = "fetching account info failed";

/// Assembles the consolidated account snapshot for the current account.
///
/// Without a selected account and a bound connector this returns the
/// [`NO_CURRENT_ACCOUNT`] envelope without touching any connector. The two
/// sub-queries run concurrently; if either fails, the whole operation
/// fails - no partial snapshot is returned.
pub async fn account_info(session: &Session) -> Envelope<AccountInfoRes> {
    let Some((account, connector)) = session.current().await else {
        return Envelope::error(NO_CURRENT_ACCOUNT);
    };

    match tokio::try_join!(connector.get_info(), connector.get_balance()) {
        Ok((info, balance)) => Envelope::ok(AccountInfoRes {
            current_account_id: account.id,
            name: account.name,
            connector_type: account.connector,
            avatar_url: account.avatar_url,
            info,
            balance: AccountBalance {
                balance: balance.balance,
                // Unspecified currency resolves to BTC here, not in the
                // connector.
                currency: balance.currency.unwrap_or_default(),
            },
        }),
        Err(e) => {
            tracing::error!(account = %account.id, "{FETCH_FAILED}: {e}");
            Envelope::error(FETCH_FAILED)
        }
    }
}
