//! sheetcast-core - UI-agnostic sheet model, payload codec and version sync.

pub mod document;
pub mod error;
pub mod storage;
pub mod sync;

pub use document::{Clipboard, Selection, Sheet, Snapshot};
pub use error::{Result, SheetcastError};
pub use storage::{CellStore, CellTriple, GrdFile, MemoryStore, decode_payload, encode_cells};
pub use sync::{
    Notifier, PublisherSession, Subscription, SyncEndpoint, SyncRequest, SyncResponse,
    SyncService, VersionStore,
};

pub use sheetcast_engine::engine::{CellRef, GridSize};
