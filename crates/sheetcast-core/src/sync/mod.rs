//! Version histories, the sync service and its client sessions.

mod client;
mod directory;
mod history;
mod notify;
mod protocol;
mod service;
mod store;

pub use client::{PublisherSession, Subscription};
pub use directory::{MemoryDirectory, User, UserDirectory};
pub use history::{History, Version};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use protocol::{SyncEndpoint, SyncRequest, SyncResponse, VersionEntry};
pub use service::{
    PUBLISHER_REGISTERED, PUBLISHERS_RETRIEVED, SHEET_CREATED, SHEET_DELETED, SHEET_UPDATED,
    SHEETS_RETRIEVED, SyncService, UPDATES_RECEIVED,
};
pub use store::{Channel, SheetRecord, SheetState, VersionStore};
