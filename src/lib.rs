//! Forensic parser for Windows thumbnail caches.
//!
//! Recovers embedded thumbnail images and their metadata from the two
//! on-disk container families Windows has used:
//!
//! - `Thumbs.db` — the OLE compound file written by Windows 98 through
//!   Server 2003, holding proprietary Type 1 ("YMCA") and standard JFIF
//!   Type 2 streams plus a `Catalog` of original file names
//! - `Thumbcache_*.db` / `Thumbcache_idx.db` — the Vista and later
//!   per-user CMMM entry caches and IMMM index, keyed by 64-bit Thumb
//!   Cache ID
//!
//! An optional read-only view over the Windows Search ESE database
//! (`Windows.edb`) joins original paths, names, and timestamps onto
//! recovered thumbnails by cache id.
//!
//! ```no_run
//! use thumbex::{extract_file, CancelToken, ExtractOptions, MemorySink};
//!
//! let mut sink = MemorySink::new();
//! let summary = extract_file(
//!     "Thumbs.db",
//!     &mut sink,
//!     None,
//!     &ExtractOptions::default(),
//!     &CancelToken::new(),
//! )
//! .unwrap();
//! println!("recovered {} thumbnails", summary.emitted);
//! ```

pub(crate) mod artifacts;
pub mod error;
pub(crate) mod extractor;
pub(crate) mod filesystem;
pub(crate) mod output;
pub(crate) mod structs;
pub(crate) mod utils;

pub use crate::artifacts::ole::error::OleError;
pub use crate::artifacts::search::error::SearchError;
pub use crate::artifacts::search::esedb::{EseRow, EsedbView};
pub use crate::artifacts::thumbcache::error::ThumbcacheError;
pub use crate::artifacts::thumbsdb::error::ThumbsDbError;
pub use crate::error::ExtractError;
pub use crate::extractor::{
    default_esedb_path, discover_thumbcache, extract_file, identify_file, ContainerKind,
};
pub use crate::filesystem::metadata::GlobInfo;
pub use crate::output::{
    directory::DirectorySink, error::SinkError, memory::MemorySink, sink::ThumbnailSink,
};
pub use crate::structs::thumbnail::{
    CancelToken, ExtractOptions, ExtractionSummary, Thumbnail,
};
