//! Wallet Engine collaborator contract
//!
//! The engine owns account keys, network RPC connections, and balance
//! tracking; this crate treats it as a black box reached through the traits
//! below. A real implementation lives outside this crate; tests inject
//! mocks.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::comm::MessageStream;
use crate::config::ProviderConfig;
use crate::error::SessionError;
use crate::state::models::{
    BillboardEvent, ContactPayload, DiscoverDapp, LoginRequest, NftMeta, UserInfo, WalletState,
};

/// Engine endpoints. Passed whole on every (re)initialization so a logout
/// can reset the engine without consulting ambient configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub api_host: String,
    pub metadata_host: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_host: "https://api.wallet.example".to_string(),
            metadata_host: "https://metadata.wallet.example".to_string(),
        }
    }
}

/// Events the engine pushes to its owning controller.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    /// Full state snapshot; the controller replaces its replica wholesale.
    StateUpdate(WalletState),
    Logout,
    TransactionUnapproved { tx_id: String, request: Value },
}

#[async_trait]
pub trait WalletEngine: Send + Sync {
    // --- lifecycle ---------------------------------------------------------

    /// Reinitialize in place with the given config and state. Event
    /// subscriptions survive reinitialization.
    async fn reinit(&self, config: EngineConfig, state: WalletState);
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
    fn state(&self) -> WalletState;
    fn origin(&self) -> String;
    fn set_origin(&self, origin: &str);
    fn set_instance_id(&self, instance_id: &str);

    // --- mutations ---------------------------------------------------------

    async fn set_network(&self, provider: &ProviderConfig) -> Result<(), SessionError>;
    async fn set_selected_account(&self, address: &str) -> Result<(), SessionError>;
    async fn set_theme(&self, theme: crate::state::models::Theme) -> Result<(), SessionError>;
    /// Returns false when the engine rejected the change (surfaced as a
    /// failure toast, not an error).
    async fn set_default_currency(&self, currency: &str) -> Result<bool, SessionError>;
    async fn set_locale(&self, locale: &str) -> Result<bool, SessionError>;
    async fn set_crash_report(&self, enabled: bool) -> Result<bool, SessionError>;
    async fn add_contact(&self, contact: ContactPayload) -> Result<bool, SessionError>;
    async fn delete_contact(&self, contact_id: u64) -> Result<bool, SessionError>;
    /// Imports the key and returns the derived address.
    async fn import_external_account(
        &self,
        priv_key: &str,
        user_info: &UserInfo,
    ) -> Result<String, SessionError>;
    async fn trigger_login(&self, request: LoginRequest) -> Result<(), SessionError>;

    // --- reads and fetchers ------------------------------------------------

    fn user_info(&self) -> UserInfo;
    async fn get_gasless_public_key(&self) -> Result<String, SessionError>;
    async fn fetch_nft_metadata(
        &self,
        mints: &[String],
    ) -> Result<HashMap<String, NftMeta>, SessionError>;
    async fn refresh_user_tokens(&self) -> Result<(), SessionError>;
    async fn get_billboard_data(&self) -> Result<Vec<BillboardEvent>, SessionError>;
    async fn get_dapp_list(&self) -> Result<Vec<DiscoverDapp>, SessionError>;

    // --- flows and transport -----------------------------------------------

    async fn handle_topup(&self, provider: &str, params: Value) -> Result<(), SessionError>;
    async fn approve_sign_transaction(&self, tx_id: &str) -> Result<(), SessionError>;
    async fn handle_transaction_popup(
        &self,
        tx_id: &str,
        request: &Value,
    ) -> Result<(), SessionError>;
    fn show_wallet_popup(&self, path: &str, instance_id: &str);
    fn setup_untrusted_communication(&self, stream: MessageStream, origin: &str);
    fn setup_communication_channel(&self, stream: MessageStream, origin: &str);
    fn toggle_iframe_fullscreen(&self);
    fn close_iframe_fullscreen(&self);
}

/// Creates the engine instance a controller owns. Injected so the controller
/// carries no ambient engine construction.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        config: EngineConfig,
        state: WalletState,
    ) -> std::sync::Arc<dyn WalletEngine>;
}

/// Upstream identity provider; only its sign-out matters to this layer.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn logout(&self) -> Result<(), SessionError>;
}
