//! Data models for wallet session state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mint address of wrapped SOL; its token info symbol is rewritten to WSOL
/// in the fungible token view.
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    Loading,
    #[default]
    Loaded,
    Failed,
}

/// Identity of the logged-in user as reported by the upstream login provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub email: String,
    pub name: String,
    pub profile_image: String,
    /// Login provider kind, e.g. "google"; dispatched as currentLoginProvider.
    pub type_of_login: String,
    pub verifier_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: u64,
    pub contact_address: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for contact creation; the engine assigns the id.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub contact_address: String,
    pub display_name: String,
}

/// A cached display activity (transaction) for the activity feed. Joined
/// with token metadata on read, never enriched in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionActivity {
    pub signature: String,
    pub status: String,
    #[serde(default)]
    pub mint_address: Option<String>,
    #[serde(default)]
    pub decimal: u8,
    #[serde(default)]
    pub crypto_currency: String,
    #[serde(default)]
    pub logo_uri: Option<String>,
}

/// Per-address preferences. Created lazily with defaults on first access
/// and never implicitly deleted (absence means defaults).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPreferences {
    pub theme: Theme,
    pub locale: String,
    pub selected_currency: String,
    pub network_selected: String,
    pub crash_report: bool,
    pub contacts: Vec<Contact>,
    pub user_info: UserInfo,
    #[serde(default)]
    pub display_activities: HashMap<String, TransactionActivity>,
}

impl Default for AccountPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            locale: "en".to_string(),
            selected_currency: "usd".to_string(),
            network_selected: "testnet".to_string(),
            crash_report: false,
            contacts: Vec::new(),
            user_info: UserInfo::default(),
            display_activities: HashMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub network: String,
    pub chain_id: String,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            network: "testnet".to_string(),
            chain_id: "0x66".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringAccount {
    pub public_key: String,
}

/// Account keys known to the engine. Never written to durable storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringState {
    pub wallets: Vec<KeyringAccount>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesState {
    pub selected_address: String,
    pub identities: HashMap<String, AccountPreferences>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// Native balance in lamports.
    pub balance: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrackerState {
    pub accounts: HashMap<String, AccountBalance>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: f64,
}

/// Raw token holding for one account, as tracked by the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    pub token_address: String,
    pub mint_address: String,
    pub balance: TokenAmount,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensState {
    /// Holdings keyed by owner address.
    pub tokens: HashMap<String, Vec<TokenHolding>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMeta {
    pub address: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub logo_uri: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffChainMeta {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMeta {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub off_chain_meta_data: Option<OffChainMeta>,
}

/// Metadata caches for tokens and NFTs, replaced wholesale by the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfoState {
    pub token_info_map: HashMap<String, TokenMeta>,
    pub metaplex_meta_map: HashMap<String, NftMeta>,
    pub token_info_loading_state: LoadingState,
    pub metaplex_loading_state: LoadingState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyState {
    pub current_currency: String,
    /// Price of one native unit in the current currency.
    pub conversion_rate: f64,
    /// Per-mint price map keyed by currency code (lowercase).
    pub token_price_map: HashMap<String, HashMap<String, f64>>,
    pub load_state: LoadingState,
}

impl Default for CurrencyState {
    fn default() -> Self {
        Self {
            current_currency: "usd".to_string(),
            conversion_rate: 0.0,
            token_price_map: HashMap::new(),
            load_state: LoadingState::Loaded,
        }
    }
}

/// The composite wallet snapshot. Sub-states are replaced wholesale on
/// engine events, never merged field-by-field, so fields that must stay
/// consistent (network + chain id) cannot tear.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub network: NetworkState,
    pub keyring: KeyringState,
    pub preferences: PreferencesState,
    pub account_tracker: AccountTrackerState,
    pub tokens: TokensState,
    pub token_info: TokenInfoState,
    pub currency: CurrencyState,
    #[serde(default)]
    pub last_token_refresh: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Derived view models (computed on read, never stored)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FungibleToken {
    pub token_address: String,
    pub mint_address: String,
    pub balance: TokenAmount,
    pub data: TokenMeta,
    pub price: HashMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonFungibleToken {
    pub token_address: String,
    pub mint_address: String,
    pub balance: TokenAmount,
    pub metaplex_data: NftMeta,
}

// ---------------------------------------------------------------------------
// External collaborator payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillboardEvent {
    pub event_name: String,
    pub image_url: String,
    pub call_to_action_link: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverDapp {
    pub title: String,
    pub url: String,
    pub category: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_provider: String,
    #[serde(default)]
    pub login_hint: Option<String>,
    #[serde(default)]
    pub wait_saving: bool,
}

/// Opaque request that accompanied an unapproved transaction event.
pub type TransactionRequest = Value;

/// Shorten an address for display: first five and last five characters.
pub fn address_slicer(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..5], &address[address.len() - 5..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_slicer() {
        assert_eq!(address_slicer("abcde12345fghij"), "abcde...fghij");
        assert_eq!(address_slicer("short"), "short");
    }

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(serde_json::to_string(&Theme::Light).unwrap(), "\"light\"");
    }

    #[test]
    fn test_default_preferences() {
        let prefs = AccountPreferences::default();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.locale, "en");
        assert_eq!(prefs.network_selected, "testnet");
        assert!(!prefs.crash_report);
        assert!(prefs.contacts.is_empty());
    }

    #[test]
    fn test_wallet_state_roundtrip_defaults_missing_fields() {
        // Older snapshots without lastTokenRefresh must still deserialize.
        let json = serde_json::to_value(WalletState::default()).unwrap();
        let mut map = json.as_object().unwrap().clone();
        map.remove("lastTokenRefresh");
        let state: WalletState =
            serde_json::from_value(Value::Object(map)).unwrap();
        assert!(state.last_token_refresh.is_none());
    }
}
