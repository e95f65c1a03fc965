use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// One recovered thumbnail with whatever metadata the container carried.
/// Catalog and ESEDB are independent sources; fields stay at their first
/// non-empty value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    /**Input file the thumbnail was recovered from */
    pub source: String,
    /**Thumbs.db stream id, when the stream uses the old numeric name convention */
    pub stream_id: Option<u32>,
    /**64-bit Thumb Cache ID for thumbcache entries and newer Thumbs.db streams */
    pub cache_id: Option<u64>,
    pub original_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /**Original file modification time in unixepoch seconds */
    pub mtime: Option<i64>,
    pub mime: Option<String>,
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
}

impl Thumbnail {
    pub(crate) fn new(source: &str) -> Thumbnail {
        Thumbnail {
            source: source.to_string(),
            stream_id: None,
            cache_id: None,
            original_name: None,
            width: None,
            height: None,
            mtime: None,
            mime: None,
            data: Vec::new(),
        }
    }
}

/// Options that change core extraction behavior
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /**MD5 the input file into the summary */
    pub md5: bool,
    /**Inputs above this size skip MD5 */
    pub md5_max_size: u64,
    /**Verify thumbcache entry checksums */
    pub verify_checksums: bool,
}

impl Default for ExtractOptions {
    fn default() -> ExtractOptions {
        let md5_max_size = 536870912; // 512 MiB
        ExtractOptions {
            md5: true,
            md5_max_size,
            verify_checksums: true,
        }
    }
}

/// Per-input accounting surfaced to the caller after extraction
#[derive(Debug, Default, Serialize)]
pub struct ExtractionSummary {
    pub source: String,
    pub md5: Option<String>,
    pub emitted: u32,
    pub dormant: u32,
    pub skipped_streams: u32,
    pub checksum_mismatches: u32,
    pub catalog_entries: u32,
    pub index_entries: u32,
    /**Catalog count matched extracted stream count (old Thumbs.db only) */
    pub catalog_agrees: Option<bool>,
}

/// Cooperative abort flag checked at stream and entry boundaries
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, ExtractOptions, Thumbnail};

    #[test]
    fn test_thumbnail_new() {
        let result = Thumbnail::new("Thumbs.db");
        assert_eq!(result.source, "Thumbs.db");
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_extract_options_default() {
        let result = ExtractOptions::default();
        assert_eq!(result.md5, true);
        assert_eq!(result.md5_max_size, 536870912);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert_eq!(token.is_cancelled(), false);
        token.cancel();
        assert_eq!(token.is_cancelled(), true);
    }
}
