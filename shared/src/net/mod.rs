//! Replication over a shared hierarchical store.
//!
//! Everything here is transport-agnostic: the store is a [`SharedStore`] trait
//! object and voice goes through [`PeerAudio`]. [`MemoryStore`] is the
//! in-process implementation used for local play and tests.

pub mod manager;
pub mod outbox;
pub mod records;
pub mod remote;
pub mod store;
pub mod synced;
pub mod voice;

pub use manager::{ChatMessage, LocalPlayerState, NetworkManager, PlayerListEntry};
pub use outbox::Outbox;
pub use records::{ChatRecord, ObjectRecord, ObjectTransform, OwnershipUpdate, PlayerRecord};
pub use remote::RemotePlayer;
pub use store::{Collection, EventKind, MemoryStore, SharedStore, StoreEvent, StorePath};
pub use synced::SyncedObject;
pub use voice::{NullAudio, PeerAudio, VoiceManager};
