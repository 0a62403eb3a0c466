//! Request dispatcher
//!
//! RPC-shaped requests from the embedding page, dispatched over a closed
//! method table. Method names and response shapes are the compatibility
//! contract; unknown methods yield `Ok(None)` ("unsupported"), never an
//! error.

use serde_json::{json, Value};

use crate::error::SessionError;
use crate::session::SessionController;

pub mod methods {
    pub const TOPUP: &str = "topup";
    pub const WALLET_INSTANCE_ID: &str = "wallet_instance_id";
    pub const GET_PROVIDER_STATE: &str = "get_provider_state";
    pub const WALLET_GET_PROVIDER_STATE: &str = "wallet_get_provider_state";
    pub const USER_INFO: &str = "user_info";
    pub const GET_GASLESS_PUBLIC_KEY: &str = "get_gasless_public_key";
    pub const GET_ACCOUNTS: &str = "get_accounts";
    pub const SOLANA_REQUEST_ACCOUNTS: &str = "solana_request_accounts";
    pub const NFT_LIST: &str = "nft_list";
}

/// Handle one request. `Ok(None)` means the method is unsupported, which
/// callers must not treat as a failure. Handlers either read derived state,
/// await an engine operation, or complete via side effects only.
pub async fn handle_request(
    session: &SessionController,
    method: &str,
    params: Value,
) -> Result<Option<Value>, SessionError> {
    let store = session.store();
    match method {
        methods::TOPUP => {
            let provider = params
                .get("provider")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let topup_params = match params.get("params") {
                Some(p) => p.clone(),
                None => json!({ "selectedAddress": store.selected_address() }),
            };
            session.engine().handle_topup(&provider, topup_params).await?;
            Ok(None)
        }
        methods::WALLET_INSTANCE_ID => Ok(Some(json!({ "wallet_instance_id": "" }))),
        methods::GET_PROVIDER_STATE => Ok(Some(json!({
            "currentLoginProvider": store.selected_account_preferences().user_info.type_of_login,
            "isLoggedIn": !store.selected_address().is_empty(),
        }))),
        methods::WALLET_GET_PROVIDER_STATE => Ok(Some(json!({
            "accounts": store.all_addresses(),
            "chainId": store.chain_id(),
            "isUnlocked": !store.selected_address().is_empty(),
        }))),
        methods::USER_INFO => Ok(Some(serde_json::to_value(session.engine().user_info())
            .map_err(|e| SessionError::Engine(e.to_string()))?)),
        methods::GET_GASLESS_PUBLIC_KEY => {
            let pubkey = session.engine().get_gasless_public_key().await?;
            Ok(Some(json!({ "pubkey": pubkey })))
        }
        methods::GET_ACCOUNTS | methods::SOLANA_REQUEST_ACCOUNTS => {
            Ok(Some(json!([store.selected_address()])))
        }
        methods::NFT_LIST => {
            // Pace the response so metadata loading can settle before the
            // embedding page renders; the wait is configurable.
            tokio::time::sleep(session.config().nft_list_delay).await;
            let nfts: Vec<Value> = store
                .non_fungible_tokens()
                .into_iter()
                .map(|token| {
                    json!({
                        "balance": token.balance,
                        "mint": token.mint_address,
                        "name": token.metaplex_data.name,
                        "uri": token.metaplex_data.uri,
                    })
                })
                .collect();
            Ok(Some(json!(nfts)))
        }
        _ => Ok(None),
    }
}
