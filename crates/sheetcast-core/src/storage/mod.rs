//! Storage: the transport payload codec and the .grd file format

mod parser;
mod payload;
mod store;
mod writer;

pub use parser::{parse_grd, parse_grd_content};
pub use payload::{CellTriple, ENTRY_SEPARATOR, decode_payload, encode_cells, encode_triples};
pub use store::{CellStore, GrdFile, MemoryStore};
pub use writer::{write_grd, write_grd_content};
