//! Replica state store
//!
//! Holds this context's copy of the wallet snapshot. `update_state` is the
//! only mutation path: it replaces the snapshot wholesale (single
//! assignment, no field-level merge) and schedules a persistence write.
//! Everything else is a pure read of the current snapshot.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::config::WhiteLabel;
use crate::state::models::{
    address_slicer, AccountBalance, AccountPreferences, Contact, FungibleToken, LoadingState,
    NonFungibleToken, Theme, TokenHolding, TransactionActivity, WalletState, LAMPORTS_PER_SOL,
    WRAPPED_SOL_MINT,
};
use crate::storage::SnapshotPersister;

pub struct StateStore {
    state: RwLock<WalletState>,
    white_label: Option<WhiteLabel>,
    persister: Option<Arc<SnapshotPersister>>,
}

impl StateStore {
    pub fn new(initial: WalletState, white_label: Option<WhiteLabel>) -> Self {
        Self {
            state: RwLock::new(initial),
            white_label,
            persister: None,
        }
    }

    pub fn with_persistence(mut self, persister: Arc<SnapshotPersister>) -> Self {
        self.persister = Some(persister);
        self
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, WalletState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    // ========================================================================
    // Mutation (the only one)
    // ========================================================================

    /// Replace the snapshot atomically and schedule a persistence write.
    /// Storage failures are logged by the persister, never propagated.
    pub fn update_state(&self, new_state: WalletState) {
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            *guard = new_state;
        }
        if let Some(persister) = &self.persister {
            persister.save(&self.read());
        }
    }

    // ========================================================================
    // Derived getters (pure reads)
    // ========================================================================

    pub fn snapshot(&self) -> WalletState {
        self.read().clone()
    }

    pub fn selected_address(&self) -> String {
        self.read().preferences.selected_address.clone()
    }

    pub fn all_addresses(&self) -> Vec<String> {
        self.read()
            .keyring
            .wallets
            .iter()
            .map(|w| w.public_key.clone())
            .collect()
    }

    pub fn all_balances(&self) -> HashMap<String, AccountBalance> {
        self.read().account_tracker.accounts.clone()
    }

    pub fn chain_id(&self) -> String {
        self.read().network.chain_id.clone()
    }

    pub fn selected_network_display_name(&self) -> String {
        self.read().network.network.clone()
    }

    /// Preferences for the selected account, defaulted lazily when the
    /// account has none yet.
    pub fn selected_account_preferences(&self) -> AccountPreferences {
        let state = self.read();
        state
            .preferences
            .identities
            .get(&state.preferences.selected_address)
            .cloned()
            .unwrap_or_default()
    }

    fn has_selected_preferences(&self) -> bool {
        let state = self.read();
        state
            .preferences
            .identities
            .contains_key(&state.preferences.selected_address)
    }

    pub fn crash_report(&self) -> bool {
        self.selected_account_preferences().crash_report
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.selected_account_preferences().contacts
    }

    pub fn is_dark_mode(&self) -> bool {
        if let Some(white_label) = &self.white_label {
            if !self.has_selected_preferences() {
                return white_label.dark;
            }
        }
        self.selected_account_preferences().theme == Theme::Dark
    }

    /// Native balance of the selected account, in SOL.
    pub fn sol_balance(&self) -> f64 {
        let state = self.read();
        let lamports = state
            .account_tracker
            .accounts
            .get(&state.preferences.selected_address)
            .map(|a| a.balance)
            .unwrap_or(0);
        lamports as f64 / LAMPORTS_PER_SOL as f64
    }

    pub fn conversion_rate(&self) -> f64 {
        self.read().currency.conversion_rate
    }

    pub fn current_currency(&self) -> String {
        self.read().currency.current_currency.clone()
    }

    pub fn last_token_refresh(&self) -> Option<DateTime<Utc>> {
        self.read().last_token_refresh
    }

    pub fn is_nft_loading(&self) -> LoadingState {
        self.read().token_info.metaplex_loading_state
    }

    pub fn is_spl_token_loading(&self) -> LoadingState {
        self.read().token_info.token_info_loading_state
    }

    pub fn is_currency_rate_updating(&self) -> LoadingState {
        self.read().currency.load_state
    }

    pub fn user_tokens(&self) -> Vec<TokenHolding> {
        let state = self.read();
        state
            .tokens
            .tokens
            .get(&state.preferences.selected_address)
            .cloned()
            .unwrap_or_default()
    }

    /// Fungible holdings joined with the token info cache. Holdings with
    /// zero balance, zero decimals, or no known metadata are dropped.
    pub fn fungible_tokens(&self) -> Vec<FungibleToken> {
        let state = self.read();
        let mut tokens: Vec<FungibleToken> = state
            .tokens
            .tokens
            .get(&state.preferences.selected_address)
            .map(|holdings| {
                holdings
                    .iter()
                    .filter(|h| h.balance.decimals != 0 && h.balance.ui_amount > 0.0)
                    .filter_map(|h| {
                        let mut data =
                            state.token_info.token_info_map.get(&h.mint_address)?.clone();
                        if data.address == WRAPPED_SOL_MINT {
                            data.symbol = "WSOL".to_string();
                        }
                        Some(FungibleToken {
                            token_address: h.token_address.clone(),
                            mint_address: h.mint_address.clone(),
                            balance: h.balance.clone(),
                            price: state
                                .currency
                                .token_price_map
                                .get(&h.mint_address)
                                .cloned()
                                .unwrap_or_default(),
                            data,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        tokens.sort_by(|a, b| a.token_address.cmp(&b.token_address));
        tokens
    }

    /// Zero-decimal holdings that carry metaplex metadata with a uri.
    pub fn non_fungible_tokens(&self) -> Vec<NonFungibleToken> {
        let state = self.read();
        let mut tokens: Vec<NonFungibleToken> = state
            .tokens
            .tokens
            .get(&state.preferences.selected_address)
            .map(|holdings| {
                holdings
                    .iter()
                    .filter(|h| h.balance.decimals == 0 && h.balance.ui_amount > 0.0)
                    .filter_map(|h| {
                        let meta = state.token_info.metaplex_meta_map.get(&h.mint_address)?;
                        meta.uri.as_deref().filter(|uri| !uri.is_empty())?;
                        Some(NonFungibleToken {
                            token_address: h.token_address.clone(),
                            mint_address: h.mint_address.clone(),
                            balance: h.balance.clone(),
                            metaplex_data: meta.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        tokens.sort_by(|a, b| a.token_address.cmp(&b.token_address));
        tokens
    }

    /// Total account value in the selected currency: fungible token value
    /// plus native balance. SOL amounts format to 4 decimal places, fiat to 2.
    pub fn total_balance(&self) -> String {
        let currency = self.current_currency().to_lowercase();
        let token_value: f64 = self
            .fungible_tokens()
            .iter()
            .map(|t| t.balance.ui_amount * t.price.get(&currency).copied().unwrap_or(0.0))
            .sum();
        let value = token_value + self.sol_balance() * self.conversion_rate();
        format_currency(value, &currency)
    }

    /// Native balance converted to the selected currency.
    pub fn converted_sol_balance(&self) -> String {
        let currency = self.current_currency().to_lowercase();
        let value = self.sol_balance() * self.conversion_rate();
        format_currency(value, &currency)
    }

    /// Display activities of the selected account, joined with token and NFT
    /// metadata for logos and ticker symbols.
    pub fn selected_network_transactions(&self) -> Vec<TransactionActivity> {
        let state = self.read();
        let prefs = self.selected_account_preferences();
        prefs
            .display_activities
            .values()
            .map(|activity| {
                let mut item = activity.clone();
                let Some(mint) = &activity.mint_address else {
                    return item;
                };
                if activity.decimal == 0 {
                    if let Some(nft) = state.token_info.metaplex_meta_map.get(mint) {
                        item.logo_uri = nft
                            .off_chain_meta_data
                            .as_ref()
                            .and_then(|m| m.image.clone());
                        item.crypto_currency = nft.symbol.clone();
                        return item;
                    }
                } else if let Some(info) = state.token_info.token_info_map.get(mint) {
                    item.logo_uri = info.logo_uri.clone();
                    item.crypto_currency = info.symbol.clone();
                    return item;
                }
                item.crypto_currency = address_slicer(mint);
                item
            })
            .collect()
    }
}

fn format_currency(value: f64, currency: &str) -> String {
    if currency == "sol" {
        format!("{value:.4}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::models::{
        AccountBalance, KeyringAccount, NftMeta, TokenAmount, TokenMeta,
    };

    fn state_with_account(address: &str) -> WalletState {
        let mut state = WalletState::default();
        state.preferences.selected_address = address.to_string();
        state.keyring.wallets.push(KeyringAccount {
            public_key: address.to_string(),
        });
        state
            .account_tracker
            .accounts
            .insert(address.to_string(), AccountBalance { balance: 2 * LAMPORTS_PER_SOL });
        state
    }

    fn holding(token: &str, mint: &str, decimals: u8, ui_amount: f64) -> TokenHolding {
        TokenHolding {
            token_address: token.to_string(),
            mint_address: mint.to_string(),
            balance: TokenAmount {
                amount: "1".to_string(),
                decimals,
                ui_amount,
            },
        }
    }

    #[test]
    fn test_update_state_is_idempotent() {
        let store = StateStore::new(WalletState::default(), None);
        let snapshot = state_with_account("addr1");
        store.update_state(snapshot.clone());
        let first = (store.selected_address(), store.sol_balance(), store.total_balance());
        store.update_state(snapshot);
        let second = (store.selected_address(), store.sol_balance(), store.total_balance());
        assert_eq!(first, second);
    }

    #[test]
    fn test_preferences_default_lazily() {
        let store = StateStore::new(state_with_account("addr1"), None);
        let prefs = store.selected_account_preferences();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.network_selected, "testnet");
        assert!(store.is_dark_mode());
    }

    #[test]
    fn test_white_label_applies_only_without_preferences() {
        let mut state = state_with_account("addr1");
        let store = StateStore::new(
            state.clone(),
            Some(WhiteLabel { dark: false }),
        );
        assert!(!store.is_dark_mode());

        state
            .preferences
            .identities
            .insert("addr1".to_string(), AccountPreferences::default());
        let store = StateStore::new(state, Some(WhiteLabel { dark: false }));
        assert!(store.is_dark_mode());
    }

    #[test]
    fn test_token_classification() {
        let mut state = state_with_account("addr1");
        state.tokens.tokens.insert(
            "addr1".to_string(),
            vec![
                holding("tokB", "mintF", 6, 10.0),
                holding("tokA", "mintN", 0, 1.0),
                // Zero balance, dropped from both views.
                holding("tokC", "mintF", 6, 0.0),
                // No metadata, dropped.
                holding("tokD", "mintX", 6, 3.0),
            ],
        );
        state.token_info.token_info_map.insert(
            "mintF".to_string(),
            TokenMeta {
                address: "mintF".to_string(),
                name: "Fungible".to_string(),
                symbol: "FUN".to_string(),
                logo_uri: None,
            },
        );
        state.token_info.metaplex_meta_map.insert(
            "mintN".to_string(),
            NftMeta {
                name: "Art".to_string(),
                symbol: "ART".to_string(),
                uri: Some("https://meta.example/art".to_string()),
                off_chain_meta_data: None,
            },
        );
        state
            .currency
            .token_price_map
            .insert("mintF".to_string(), HashMap::from([("usd".to_string(), 2.0)]));
        state.currency.conversion_rate = 20.0;

        let store = StateStore::new(state, None);
        let fungible = store.fungible_tokens();
        assert_eq!(fungible.len(), 1);
        assert_eq!(fungible[0].data.symbol, "FUN");

        let nfts = store.non_fungible_tokens();
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].metaplex_data.name, "Art");

        // 10 FUN * 2 usd + 2 SOL * 20 usd = 60.00
        assert_eq!(store.total_balance(), "60.00");
        assert_eq!(store.converted_sol_balance(), "40.00");
    }

    #[test]
    fn test_wrapped_sol_symbol_rewrite() {
        let mut state = state_with_account("addr1");
        state
            .tokens
            .tokens
            .insert("addr1".to_string(), vec![holding("tok1", WRAPPED_SOL_MINT, 9, 1.0)]);
        state.token_info.token_info_map.insert(
            WRAPPED_SOL_MINT.to_string(),
            TokenMeta {
                address: WRAPPED_SOL_MINT.to_string(),
                name: "Wrapped SOL".to_string(),
                symbol: "SOL".to_string(),
                logo_uri: None,
            },
        );
        let store = StateStore::new(state, None);
        assert_eq!(store.fungible_tokens()[0].data.symbol, "WSOL");
    }

    #[test]
    fn test_sol_formatting_uses_four_decimals() {
        let mut state = state_with_account("addr1");
        state.currency.current_currency = "sol".to_string();
        state.currency.conversion_rate = 1.0;
        let store = StateStore::new(state, None);
        assert_eq!(store.converted_sol_balance(), "2.0000");
    }
}
