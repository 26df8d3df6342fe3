#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level files, the level catalog and share strings.
//!
//! [`LevelFile`] mirrors the JSON documents levels are authored in and
//! converts them into engine [`Level`](prismatic_core::Level)s. A
//! [`LevelCatalog`] loads a directory of such documents in play order, and
//! [`encode_share`] / [`parse_share`] move a single level through a compact
//! checksummed string.

mod catalog;
mod format;
mod share;

pub use catalog::{CatalogError, CatalogLevel, LevelCatalog, SOLUTIONS_FILE};
pub use format::{
    parse_placements, placements_from_records, FormatError, GridRecord, InventoryRecord,
    LevelFile, PieceRecord, RulesRecord, SequenceRecord, GRID_MODE,
};
pub use share::{
    encode_share, parse_share, validate_and_normalize, ShareError, GRID_RANGE, MAX_FIXED,
    MAX_SHARE_LENGTH, MAX_WALLS, SHARE_PREFIX, SHARE_VERSION,
};
