//! Cross-context broadcast protocol
//!
//! Fire-and-forget, instance-scoped event delivery between sibling contexts
//! of one wallet session. Each event kind owns a channel-name prefix; the
//! concrete channel is `{PREFIX}_{instance_id}`. Channels are opened for a
//! single send and closed again, never held across the controller lifetime.
//!
//! Knowledge of the instance id is the only access control: any code holding
//! the bus and the id can subscribe. This is a trust boundary, not a
//! cryptographic guarantee.

mod bus;
mod popup;

pub use bus::{BroadcastBus, BusHandle, BusSubscription};
pub use popup::{PopupStoreChannel, PopupStoreHandler};

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::state::models::Theme;

/// Channel-name prefixes, one per event kind.
pub mod channels {
    pub const THEME_CHANGE: &str = "THEME_CHANGE";
    pub const LOGOUT: &str = "LOGOUT";
    pub const NETWORK_CHANGE: &str = "NETWORK_CHANGE";
    pub const SELECTED_ADDRESS_CHANGE: &str = "SELECTED_ADDRESS_CHANGE";
    pub const ACCOUNT_IMPORTED: &str = "ACCOUNT_IMPORTED";
}

pub fn channel_name(prefix: &str, instance_id: &str) -> String {
    format!("{}_{}", prefix, instance_id)
}

/// Wire envelope: `{ "data": { "type": ..., ...fields } }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelEnvelope {
    pub data: ChannelMessage,
}

impl ChannelEnvelope {
    pub fn new(data: ChannelMessage) -> Self {
        Self { data }
    }
}

/// Tagged union of broadcast messages. Receivers switch on `type` and apply
/// an idempotent local effect; ordering across different kinds is not
/// guaranteed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    #[serde(rename = "SET_THEME")]
    SetTheme { theme: Theme },
    #[serde(rename = "LOGOUT")]
    Logout,
    #[serde(rename = "NETWORK_CHANGE")]
    NetworkChange { network: ProviderConfig },
    #[serde(rename = "SELECTED_ADDRESS_CHANGE")]
    #[serde(rename_all = "camelCase")]
    SelectedAddressChange { selected_address: String },
    #[serde(rename = "ACCOUNT_IMPORTED")]
    #[serde(rename_all = "camelCase")]
    AccountImported { priv_key: String },
}

impl ChannelMessage {
    /// The channel-name prefix this message kind travels on.
    pub fn channel_prefix(&self) -> &'static str {
        match self {
            ChannelMessage::SetTheme { .. } => channels::THEME_CHANGE,
            ChannelMessage::Logout => channels::LOGOUT,
            ChannelMessage::NetworkChange { .. } => channels::NETWORK_CHANGE,
            ChannelMessage::SelectedAddressChange { .. } => channels::SELECTED_ADDRESS_CHANGE,
            ChannelMessage::AccountImported { .. } => channels::ACCOUNT_IMPORTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_format() {
        assert_eq!(
            channel_name(channels::SELECTED_ADDRESS_CHANGE, "XYZ"),
            "SELECTED_ADDRESS_CHANGE_XYZ"
        );
    }

    #[test]
    fn test_message_wire_shape() {
        let envelope = ChannelEnvelope::new(ChannelMessage::SelectedAddressChange {
            selected_address: "addrA".to_string(),
        });
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"]["type"], "SELECTED_ADDRESS_CHANGE");
        assert_eq!(json["data"]["selectedAddress"], "addrA");
    }

    #[test]
    fn test_theme_message_tag() {
        let envelope = ChannelEnvelope::new(ChannelMessage::SetTheme { theme: Theme::Light });
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"]["type"], "SET_THEME");
        assert_eq!(json["data"]["theme"], "light");
    }
}
