//! Sheet state and logic (UI-agnostic).

mod clipboard;
mod io;
mod ops;
mod selection;
mod snapshot;
mod state;

pub use clipboard::Clipboard;
pub use selection::Selection;
pub use snapshot::Snapshot;
pub use state::Sheet;
