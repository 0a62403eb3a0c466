//! Session configuration
//!
//! Controls which browser context this controller runs in, the table of
//! supported networks, and the pacing delay applied to `nft_list` responses.
//! Defaults target testnet.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A supported network entry. Exact shape travels over the NETWORK_CHANGE
/// broadcast channel, so field names are part of the compatibility contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub chain_id: String,
    pub display_name: String,
    pub rpc_target: String,
    pub ticker: String,
}

/// White-label overrides used before any account has preferences.
#[derive(Clone, Debug, Default)]
pub struct WhiteLabel {
    pub dark: bool,
}

/// Which browser context this controller lives in.
///
/// Popup and iframe contexts carry the session instance id in their URL
/// query; the main window does not, and broadcasting from it is a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextKind {
    Main,
    Popup { instance_id: String },
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub context: ContextKind,
    pub supported_networks: Vec<ProviderConfig>,
    /// Wait before answering `nft_list`, so metadata loading can settle.
    pub nft_list_delay: Duration,
    /// Durable storage key holding the module-keyed persisted object.
    pub storage_key: String,
    /// Module name this controller's state is filed under in storage.
    pub module_key: String,
    /// Storage key for ephemeral login key material, cleared on logout.
    pub ephemeral_key: String,
    pub white_label: Option<WhiteLabel>,
}

impl SessionConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SESSION_CONTEXT`: "main" (default) or "popup"
    /// - `SESSION_INSTANCE_ID`: required when context is "popup"
    /// - `NFT_LIST_DELAY_MS`: pacing delay for `nft_list` (default 15000)
    pub fn from_env() -> Self {
        let context = match env::var("SESSION_CONTEXT")
            .unwrap_or_else(|_| "main".to_string())
            .to_lowercase()
            .as_str()
        {
            "popup" => {
                let instance_id = env::var("SESSION_INSTANCE_ID").unwrap_or_default();
                if instance_id.is_empty() {
                    log::warn!("SESSION_CONTEXT=popup but SESSION_INSTANCE_ID is empty");
                }
                log::info!("Running as popup context, instance {}", instance_id);
                ContextKind::Popup { instance_id }
            }
            _ => {
                log::info!("Running as main context");
                ContextKind::Main
            }
        };

        let nft_list_delay = env::var("NFT_LIST_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_NFT_LIST_DELAY);

        Self {
            context,
            nft_list_delay,
            ..Self::default()
        }
    }

    /// Instance id used to scope broadcast channels, `None` in the main
    /// context (broadcasting becomes a no-op there).
    pub fn broadcast_instance_id(&self) -> Option<&str> {
        match &self.context {
            ContextKind::Main => None,
            ContextKind::Popup { instance_id } => Some(instance_id.as_str()),
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self.context, ContextKind::Main)
    }

    /// Look up a supported network by chain id.
    pub fn find_network(&self, chain_id: &str) -> Option<&ProviderConfig> {
        self.supported_networks
            .iter()
            .find(|p| p.chain_id == chain_id)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context: ContextKind::Main,
            supported_networks: supported_networks(),
            nft_list_delay: DEFAULT_NFT_LIST_DELAY,
            storage_key: STORAGE_KEY.to_string(),
            module_key: CONTROLLER_MODULE_KEY.to_string(),
            ephemeral_key: EPHEMERAL_KEY.to_string(),
            white_label: None,
        }
    }
}

pub const STORAGE_KEY: &str = "wallet-app-db";
pub const CONTROLLER_MODULE_KEY: &str = "controllerModule";
pub const EPHEMERAL_KEY: &str = "wallet-ephemeral-key";

const DEFAULT_NFT_LIST_DELAY: Duration = Duration::from_millis(15_000);

/// Networks the wallet can switch to. `set_network` rejects any chain id
/// missing from this table before touching the engine.
pub fn supported_networks() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            chain_id: "0x65".to_string(),
            display_name: "mainnet".to_string(),
            rpc_target: "https://api.mainnet-beta.solana.com".to_string(),
            ticker: "SOL".to_string(),
        },
        ProviderConfig {
            chain_id: "0x66".to_string(),
            display_name: "testnet".to_string(),
            rpc_target: "https://api.testnet.solana.com".to_string(),
            ticker: "SOL".to_string(),
        },
        ProviderConfig {
            chain_id: "0x67".to_string(),
            display_name: "devnet".to_string(),
            rpc_target: "https://api.devnet.solana.com".to_string(),
            ticker: "SOL".to_string(),
        },
    ]
}
