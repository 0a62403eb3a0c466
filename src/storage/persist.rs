//! Selective persistence
//!
//! Writes a redacted projection of the wallet snapshot to durable storage
//! after every store replacement and restores it at startup. The keyring
//! sub-state, the engine instance, and the transient logout flag never reach
//! storage; on restore they are reconstructed from defaults.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::state::models::{
    AccountTrackerState, CurrencyState, NetworkState, PreferencesState, TokenInfoState,
    TokensState, WalletState,
};
use crate::storage::backend::StorageBackend;

/// Redacted, JSON-serializable projection of the wallet snapshot. Every
/// field is optional so snapshots written by older versions restore with
/// defaults for whatever they lack.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_tracker: Option<AccountTrackerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokensState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenInfoState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_token_refresh: Option<DateTime<Utc>>,
}

impl PersistedSnapshot {
    /// Project a full snapshot down to its persistable subset. The keyring
    /// is deliberately absent: there is no field to carry it.
    pub fn from_state(state: &WalletState) -> Self {
        Self {
            network: Some(state.network.clone()),
            preferences: Some(state.preferences.clone()),
            account_tracker: Some(state.account_tracker.clone()),
            tokens: Some(state.tokens.clone()),
            token_info: Some(state.token_info.clone()),
            currency: Some(state.currency.clone()),
            last_token_refresh: state.last_token_refresh,
        }
    }

    /// Shallow-merge persisted sub-states over defaults. Fields absent from
    /// the snapshot (including, always, the keyring) come out as defaults.
    pub fn into_state(self) -> WalletState {
        let mut state = WalletState::default();
        if let Some(network) = self.network {
            state.network = network;
        }
        if let Some(preferences) = self.preferences {
            state.preferences = preferences;
        }
        if let Some(account_tracker) = self.account_tracker {
            state.account_tracker = account_tracker;
        }
        if let Some(tokens) = self.tokens {
            state.tokens = tokens;
        }
        if let Some(token_info) = self.token_info {
            state.token_info = token_info;
        }
        if let Some(currency) = self.currency {
            state.currency = currency;
        }
        state.last_token_refresh = self.last_token_refresh;
        state
    }
}

/// Saves and restores the controller's snapshot under one fixed storage key,
/// filed under the controller's module name inside a shared JSON object.
pub struct SnapshotPersister {
    storage: Arc<dyn StorageBackend>,
    storage_key: String,
    module_key: String,
}

impl SnapshotPersister {
    pub fn new(storage: Arc<dyn StorageBackend>, storage_key: &str, module_key: &str) -> Self {
        Self {
            storage,
            storage_key: storage_key.to_string(),
            module_key: module_key.to_string(),
        }
    }

    /// Persist the redacted projection. Failures are logged and swallowed;
    /// persistence must never interfere with the mutation that triggered it.
    pub fn save(&self, state: &WalletState) {
        if let Err(e) = self.try_save(state) {
            log::warn!("failed to persist session state: {}", e);
        }
    }

    fn try_save(&self, state: &WalletState) -> Result<(), StorageError> {
        let snapshot = PersistedSnapshot::from_state(state);
        let mut root = self.read_root();
        root.insert(self.module_key.clone(), serde_json::to_value(&snapshot)?);
        self.storage
            .set(&self.storage_key, &serde_json::to_string(&Value::Object(root))?)
    }

    /// Restore this module's snapshot. An absent or malformed entry degrades
    /// to an empty snapshot; restoration never blocks startup.
    pub fn restore(&self) -> PersistedSnapshot {
        let root = self.read_root();
        match root.get(&self.module_key) {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    log::warn!("malformed persisted snapshot, using defaults: {}", e);
                    PersistedSnapshot::default()
                }
            },
            None => PersistedSnapshot::default(),
        }
    }

    fn read_root(&self) -> Map<String, Value> {
        let raw = match self.storage.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(e) => {
                log::warn!("failed to read persisted state: {}", e);
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                log::warn!("persisted state is not a JSON object, ignoring");
                Map::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::models::KeyringAccount;
    use crate::storage::backend::MemoryStorage;

    fn persister(storage: Arc<dyn StorageBackend>) -> SnapshotPersister {
        SnapshotPersister::new(storage, "test-db", "controllerModule")
    }

    #[test]
    fn test_redaction_excludes_keyring() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let p = persister(storage.clone());

        let mut state = WalletState::default();
        state.keyring.wallets.push(KeyringAccount {
            public_key: "pub1".to_string(),
        });
        state.preferences.selected_address = "pub1".to_string();
        p.save(&state);

        let raw = storage.get("test-db").unwrap().unwrap();
        assert!(!raw.contains("keyring"));
        assert!(!raw.contains("wallets"));

        let restored = p.restore().into_state();
        assert!(restored.keyring.wallets.is_empty());
        assert_eq!(restored.preferences.selected_address, "pub1");
    }

    #[test]
    fn test_malformed_entry_restores_empty() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        storage.set("test-db", "{not json").unwrap();
        let p = persister(storage);
        let restored = p.restore().into_state();
        assert_eq!(restored, WalletState::default());
    }

    #[test]
    fn test_partial_snapshot_merges_over_defaults() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        storage
            .set(
                "test-db",
                r#"{"controllerModule":{"network":{"network":"mainnet","chainId":"0x65"}}}"#,
            )
            .unwrap();
        let p = persister(storage);
        let restored = p.restore().into_state();
        assert_eq!(restored.network.chain_id, "0x65");
        // Everything else falls back to defaults.
        assert_eq!(restored.currency.current_currency, "usd");
        assert!(restored.preferences.identities.is_empty());
    }

    #[test]
    fn test_save_preserves_other_modules() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        storage
            .set("test-db", r#"{"appModule":{"toastCount":3}}"#)
            .unwrap();
        let p = persister(storage.clone());
        p.save(&WalletState::default());

        let raw = storage.get("test-db").unwrap().unwrap();
        let root: Value = serde_json::from_str(&raw).unwrap();
        assert!(root.get("appModule").is_some());
        assert!(root.get("controllerModule").is_some());
    }
}
