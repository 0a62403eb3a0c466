//! Session controller - Orchestration Layer
//!
//! Owns the per-context session: instance identity, the engine instance, the
//! replica state store, broadcast fan-out, and the init/logout transitions.
//! Constructed with injected dependencies (engine factory, storage backend,
//! broadcast bus, stream factory, toast sink); there are no ambient
//! singletons.
//!
//! Method groups follow a structural rule: pure getters delegate to the
//! store, synchronous mutators never await, and asynchronous operations are
//! the only places engine calls and broadcasts happen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::broadcast::{
    channel_name, BusHandle, ChannelEnvelope, ChannelMessage, PopupStoreChannel,
    PopupStoreHandler,
};
use crate::comm::{
    StreamFactory, COMMUNICATION_STREAM, COMMUNICATION_STREAM_TARGET, WALLET_STREAM,
    WALLET_STREAM_TARGET,
};
use crate::config::{ProviderConfig, SessionConfig};
use crate::engine::{EngineConfig, EngineEvent, EngineFactory, IdentityProvider, WalletEngine};
use crate::error::SessionError;
use crate::notify::{messages, ToastSink};
use crate::state::models::{
    BillboardEvent, ContactPayload, DiscoverDapp, LoginRequest, NftMeta, Theme, WalletState,
};
use crate::state::StateStore;
use crate::storage::{SnapshotPersister, StorageBackend};

/// Storage key mirroring the crash-report opt-in for early startup reads.
const CRASH_REPORT_STORAGE_KEY: &str = "wallet-enable-crash-reporter";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Uninitialized,
    Initializing,
    Ready,
    /// Terminal per login cycle; re-entrant to Initializing on next login.
    LoggedOut,
}

pub struct SessionController {
    config: SessionConfig,
    store: Arc<StateStore>,
    storage: Arc<dyn StorageBackend>,
    identity: Arc<dyn IdentityProvider>,
    stream_factory: Arc<dyn StreamFactory>,
    bus: BusHandle,
    toasts: ToastSink,
    engine: Arc<dyn WalletEngine>,
    instance_id: RwLock<String>,
    logout_required: AtomicBool,
    phase: RwLock<LifecyclePhase>,
    event_pump: Mutex<Option<JoinHandle<()>>>,
    popup_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionController {
    /// Restore persisted state into a fresh controller. The engine starts as
    /// a default instance regardless of what storage held; only `init`
    /// merges restored state into it.
    pub fn new(
        config: SessionConfig,
        engine_factory: Arc<dyn EngineFactory>,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn StorageBackend>,
        bus: BusHandle,
        stream_factory: Arc<dyn StreamFactory>,
        toasts: ToastSink,
    ) -> Arc<Self> {
        let persister = Arc::new(SnapshotPersister::new(
            Arc::clone(&storage),
            &config.storage_key,
            &config.module_key,
        ));
        let restored = persister.restore().into_state();
        let store = Arc::new(
            StateStore::new(restored, config.white_label.clone()).with_persistence(persister),
        );
        let engine = engine_factory.create(EngineConfig::default(), WalletState::default());

        Arc::new(Self {
            config,
            store,
            storage,
            identity,
            stream_factory,
            bus,
            toasts,
            engine,
            instance_id: RwLock::new(String::new()),
            logout_required: AtomicBool::new(false),
            phase: RwLock::new(LifecyclePhase::Uninitialized),
            event_pump: Mutex::new(None),
            popup_tasks: Mutex::new(Vec::new()),
        })
    }

    // ========================================================================
    // Getters (pure reads)
    // ========================================================================

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> Arc<dyn WalletEngine> {
        Arc::clone(&self.engine)
    }

    pub fn instance_id(&self) -> String {
        self.instance_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn logout_required(&self) -> bool {
        self.logout_required.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn selected_address(&self) -> String {
        self.store.selected_address()
    }

    // ========================================================================
    // Synchronous mutators (never await)
    // ========================================================================

    pub fn set_logout_required(&self, required: bool) {
        self.logout_required.store(required, Ordering::SeqCst);
    }

    fn set_phase(&self, phase: LifecyclePhase) {
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Call once per page load. Mints the instance id, reinitializes the
    /// engine with restored state (or the caller's override), binds the
    /// engine event stream, and in non-main contexts stands up the popup
    /// store channel.
    pub async fn init(self: &Arc<Self>, state: Option<WalletState>, origin: &str) {
        self.set_phase(LifecyclePhase::Initializing);
        let instance_id = Uuid::new_v4().to_string();

        let merged = state.unwrap_or_else(|| self.store.snapshot());
        self.engine.reinit(EngineConfig::default(), merged).await;
        self.engine.set_origin(origin);
        self.engine.set_instance_id(&instance_id);
        *self
            .instance_id
            .write()
            .unwrap_or_else(|e| e.into_inner()) = instance_id;

        self.spawn_engine_event_pump();

        if let Some(id) = self.config.broadcast_instance_id() {
            let channel = PopupStoreChannel::new(id, self.bus.clone());
            let handler = Arc::downgrade(self) as Weak<dyn PopupStoreHandler>;
            let tasks = channel.setup_store_channels(handler);
            let mut slot = self.popup_tasks.lock().unwrap_or_else(|e| e.into_inner());
            for old in std::mem::replace(&mut *slot, tasks) {
                old.abort();
            }
        }

        self.set_phase(LifecyclePhase::Ready);
    }

    /// Sign out and announce it to sibling contexts. In the main context this
    /// also logs out of the upstream identity provider; non-main contexts
    /// keep their chosen network so a credential reset does not discard it.
    /// Storage and provider failures are logged, never propagated.
    pub async fn logout(&self) {
        self.logout_inner(true).await;
    }

    async fn logout_inner(&self, publish: bool) {
        if self.config.is_main() && !self.store.selected_address().is_empty() {
            if let Err(e) = self.identity.logout().await {
                log::warn!("unable to log out of identity provider: {}", e);
            }
        }

        let origin = self.engine.origin();
        let mut state = WalletState::default();
        if !self.config.is_main() {
            state.network = self.store.snapshot().network;
        }
        self.engine.reinit(EngineConfig::default(), state).await;
        self.engine.set_origin(&origin);

        if publish {
            self.broadcast(ChannelMessage::Logout);
        }

        if let Err(e) = self.storage.remove(&self.config.ephemeral_key) {
            log::error!("failed to clear ephemeral key material: {}", e);
        }
        self.set_phase(LifecyclePhase::LoggedOut);
    }

    /// Open the two message streams to the embedding page and hand them to
    /// the engine for origin-bound handling.
    pub fn setup_communication(&self, origin: &str) {
        log::info!("setting up communication with {}", origin);
        let wallet_stream = self
            .stream_factory
            .connect(WALLET_STREAM, WALLET_STREAM_TARGET);
        let communication_stream = self
            .stream_factory
            .connect(COMMUNICATION_STREAM, COMMUNICATION_STREAM_TARGET);
        self.engine.setup_untrusted_communication(wallet_stream, origin);
        self.engine
            .setup_communication_channel(communication_stream, origin);
    }

    pub async fn trigger_login(&self, request: LoginRequest) -> Result<(), SessionError> {
        self.set_logout_required(false);
        self.engine.trigger_login(request).await
    }

    fn spawn_engine_event_pump(self: &Arc<Self>) {
        let mut rx = self.engine.subscribe();
        let controller = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let Some(controller) = controller.upgrade() else {
                            break;
                        };
                        controller.handle_engine_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("engine event stream lagged, skipped {}", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        let mut pump = self.event_pump.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = pump.replace(handle) {
            old.abort();
        }
    }

    async fn handle_engine_event(self: Arc<Self>, event: EngineEvent) {
        match event {
            EngineEvent::StateUpdate(state) => self.store.update_state(state),
            EngineEvent::Logout => self.logout_inner(true).await,
            EngineEvent::TransactionUnapproved { tx_id, request } => {
                let result = if self.config.is_main() {
                    self.engine.approve_sign_transaction(&tx_id).await
                } else {
                    self.engine.handle_transaction_popup(&tx_id, &request).await
                };
                if let Err(e) = result {
                    log::error!("failed to route unapproved transaction {}: {}", tx_id, e);
                }
            }
        }
    }

    // ========================================================================
    // Asynchronous operations
    // ========================================================================

    /// Switch networks. An unsupported chain id fails before any engine call
    /// or broadcast, leaving the network sub-state untouched.
    pub async fn set_network(&self, chain_id: &str) -> Result<(), SessionError> {
        self.set_network_inner(chain_id, true).await
    }

    async fn set_network_inner(&self, chain_id: &str, publish: bool) -> Result<(), SessionError> {
        let provider = self
            .config
            .find_network(chain_id)
            .cloned()
            .ok_or_else(|| SessionError::UnsupportedNetwork(chain_id.to_string()))?;
        self.engine.set_network(&provider).await?;
        if publish {
            self.broadcast(ChannelMessage::NetworkChange { network: provider });
        }
        Ok(())
    }

    pub async fn change_theme(&self, theme: Theme) -> Result<(), SessionError> {
        self.change_theme_inner(theme, true).await
    }

    async fn change_theme_inner(&self, theme: Theme, publish: bool) -> Result<(), SessionError> {
        if publish {
            self.broadcast(ChannelMessage::SetTheme { theme });
        }
        self.engine.set_theme(theme).await
    }

    pub async fn set_selected_account(&self, address: &str) -> Result<(), SessionError> {
        self.set_selected_account_inner(address, true).await
    }

    async fn set_selected_account_inner(
        &self,
        address: &str,
        publish: bool,
    ) -> Result<(), SessionError> {
        self.engine.set_selected_account(address).await?;
        if publish {
            self.broadcast(ChannelMessage::SelectedAddressChange {
                selected_address: address.to_string(),
            });
        }
        Ok(())
    }

    /// Import a raw private key, select the resulting account, and announce
    /// the import to sibling contexts. Keys are left-padded to 64 chars.
    pub async fn import_external_account(&self, priv_key: &str) -> Result<String, SessionError> {
        self.import_external_account_inner(priv_key, true).await
    }

    async fn import_external_account_inner(
        &self,
        priv_key: &str,
        publish: bool,
    ) -> Result<String, SessionError> {
        let padded = format!("{:0>64}", priv_key);
        let user_info = self.engine.user_info();
        let address = self
            .engine
            .import_external_account(&padded, &user_info)
            .await?;
        self.engine.set_selected_account(&address).await?;
        if publish {
            self.broadcast(ChannelMessage::AccountImported { priv_key: padded });
        }
        Ok(address)
    }

    /// Map an import strategy to the key material it yields.
    pub async fn resolve_key(&self, key: &str, strategy: &str) -> Result<String, SessionError> {
        match strategy {
            "PrivateKey" => {
                if key.is_empty() {
                    return Err(SessionError::EmptyPrivateKey);
                }
                Ok(key.to_string())
            }
            other => Err(SessionError::InvalidImportStrategy(other.to_string())),
        }
    }

    pub async fn set_crash_report(&self, enabled: bool) {
        let outcome = self.engine.set_crash_report(enabled).await;
        if matches!(outcome, Ok(true)) {
            if let Err(e) = self
                .storage
                .set(CRASH_REPORT_STORAGE_KEY, &enabled.to_string())
            {
                log::warn!("failed to mirror crash report setting: {}", e);
            }
        }
        self.report(
            outcome,
            messages::CRASH_REPORT_SUCCESS,
            messages::CRASH_REPORT_FAILED,
        );
    }

    pub async fn set_currency(&self, currency: &str) {
        let outcome = self.engine.set_default_currency(currency).await;
        self.report(
            outcome,
            messages::SET_CURRENCY_SUCCESS,
            messages::SET_CURRENCY_FAILED,
        );
    }

    pub async fn set_locale(&self, locale: &str) {
        let outcome = self.engine.set_locale(locale).await;
        self.report(
            outcome,
            messages::SET_LOCALE_SUCCESS,
            messages::SET_LOCALE_FAILED,
        );
    }

    pub async fn add_contact(&self, contact: ContactPayload) {
        let outcome = self.engine.add_contact(contact).await;
        self.report(
            outcome,
            messages::ADD_CONTACT_SUCCESS,
            messages::ADD_CONTACT_FAILED,
        );
    }

    pub async fn delete_contact(&self, contact_id: u64) {
        let outcome = self.engine.delete_contact(contact_id).await;
        self.report(
            outcome,
            messages::DELETE_CONTACT_SUCCESS,
            messages::DELETE_CONTACT_FAILED,
        );
    }

    /// Surface an engine mutation outcome as a toast. Errors never cross
    /// this boundary.
    fn report(&self, outcome: Result<bool, SessionError>, ok: &str, failed: &str) {
        match outcome {
            Ok(true) => self.toasts.success(ok),
            Ok(false) => self.toasts.error(failed),
            Err(e) => {
                log::error!("engine mutation failed: {}", e);
                self.toasts.error(failed);
            }
        }
    }

    pub fn handle_success(&self, message: &str) {
        self.toasts.success(message);
    }

    pub fn handle_error(&self, message: &str) {
        self.toasts.error(message);
    }

    /// Metadata lookup failures degrade to `None`; callers render a
    /// placeholder instead of an error.
    pub async fn get_nft_metadata(&self, mint_address: &str) -> Option<NftMeta> {
        let mut map = self
            .engine
            .fetch_nft_metadata(&[mint_address.to_string()])
            .await
            .ok()?;
        map.remove(mint_address)
    }

    pub async fn refresh_user_tokens(&self) -> Result<(), SessionError> {
        self.engine.refresh_user_tokens().await
    }

    pub async fn get_billboard_data(&self) -> Result<Vec<BillboardEvent>, SessionError> {
        self.engine.get_billboard_data().await
    }

    pub async fn get_dapp_list(&self) -> Result<Vec<DiscoverDapp>, SessionError> {
        self.engine.get_dapp_list().await
    }

    pub fn open_wallet_popup(&self, path: &str) {
        self.engine.show_wallet_popup(path, &self.instance_id());
    }

    pub fn toggle_iframe_fullscreen(&self) {
        self.engine.toggle_iframe_fullscreen();
    }

    pub fn close_iframe_fullscreen(&self) {
        self.engine.close_iframe_fullscreen();
    }

    // ========================================================================
    // Broadcast
    // ========================================================================

    /// Publish to this session's channel for the message kind. Without an
    /// instance id (main context) this is a silent no-op, not an error.
    fn broadcast(&self, message: ChannelMessage) {
        let Some(id) = self.config.broadcast_instance_id() else {
            return;
        };
        let channel = channel_name(message.channel_prefix(), id);
        self.bus.publish(&channel, ChannelEnvelope::new(message));
    }
}

/// Replays of sibling-context events. Each applies the same logic that
/// originated the event without republishing it, so storms cannot form; the
/// effects are idempotent and safe under reordering.
#[async_trait]
impl PopupStoreHandler for SessionController {
    async fn handle_logout(&self) {
        self.logout_inner(false).await;
    }

    async fn handle_account_import(&self, priv_key: String) {
        if let Err(e) = self.import_external_account_inner(&priv_key, false).await {
            log::error!("replaying account import failed: {}", e);
        }
    }

    async fn handle_network_change(&self, network: ProviderConfig) {
        if let Err(e) = self.set_network_inner(&network.chain_id, false).await {
            log::error!("replaying network change failed: {}", e);
        }
    }

    async fn handle_selected_address_change(&self, address: String) {
        if let Err(e) = self.set_selected_account_inner(&address, false).await {
            log::error!("replaying address change failed: {}", e);
        }
    }

    async fn handle_theme_change(&self, theme: Theme) {
        if let Err(e) = self.change_theme_inner(theme, false).await {
            log::error!("replaying theme change failed: {}", e);
        }
    }
}
