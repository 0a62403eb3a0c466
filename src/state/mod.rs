//! Session state
//!
//! - `models.rs` - wallet snapshot sub-states and derived view models
//! - `store.rs` - the replica store and its pure getters

pub mod models;
pub mod store;

pub use models::{
    AccountBalance, AccountPreferences, BillboardEvent, Contact, ContactPayload, DiscoverDapp,
    FungibleToken, KeyringAccount, KeyringState, LoadingState, LoginRequest, NetworkState,
    NftMeta, NonFungibleToken, PreferencesState, Theme, TokenAmount, TokenHolding, TokenMeta,
    TransactionActivity, UserInfo, WalletState,
};
pub use store::StateStore;
