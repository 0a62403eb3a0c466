//! Popup-side store channel
//!
//! Non-main contexts stand this up at init: it subscribes to all five event
//! channels of the session instance and routes incoming messages to the
//! controller's handlers. Handlers must be idempotent; the protocol carries
//! no sequence numbers and events of different kinds may arrive reordered.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::broadcast::{channel_name, channels, BusHandle, ChannelMessage};
use crate::config::ProviderConfig;
use crate::state::models::Theme;

#[async_trait]
pub trait PopupStoreHandler: Send + Sync {
    async fn handle_logout(&self);
    async fn handle_account_import(&self, priv_key: String);
    async fn handle_network_change(&self, network: ProviderConfig);
    async fn handle_selected_address_change(&self, address: String);
    async fn handle_theme_change(&self, theme: Theme);
}

pub struct PopupStoreChannel {
    instance_id: String,
    bus: BusHandle,
}

impl PopupStoreChannel {
    pub fn new(instance_id: &str, bus: BusHandle) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            bus,
        }
    }

    /// Subscribe to the five event channels and dispatch into `handler`
    /// until the channels close or the handler is dropped. Holding the
    /// handler weakly keeps these tasks from pinning their controller alive.
    pub fn setup_store_channels(
        self,
        handler: Weak<dyn PopupStoreHandler>,
    ) -> Vec<JoinHandle<()>> {
        [
            channels::THEME_CHANGE,
            channels::LOGOUT,
            channels::NETWORK_CHANGE,
            channels::SELECTED_ADDRESS_CHANGE,
            channels::ACCOUNT_IMPORTED,
        ]
        .into_iter()
        .map(|prefix| {
            let mut sub = self.bus.subscribe(&channel_name(prefix, &self.instance_id));
            let handler = handler.clone();
            tokio::spawn(async move {
                while let Some(envelope) = sub.recv().await {
                    let Some(handler) = handler.upgrade() else {
                        break;
                    };
                    dispatch(&*handler, envelope.data).await;
                }
            })
        })
        .collect()
    }
}

async fn dispatch(handler: &dyn PopupStoreHandler, message: ChannelMessage) {
    match message {
        ChannelMessage::SetTheme { theme } => handler.handle_theme_change(theme).await,
        ChannelMessage::Logout => handler.handle_logout().await,
        ChannelMessage::NetworkChange { network } => handler.handle_network_change(network).await,
        ChannelMessage::SelectedAddressChange { selected_address } => {
            handler.handle_selected_address_change(selected_address).await
        }
        ChannelMessage::AccountImported { priv_key } => {
            handler.handle_account_import(priv_key).await
        }
    }
}
