use super::{cache::FormatVersion, error::ThumbcacheError};
use crate::filesystem::reader::ByteReader;
use crate::structs::thumbnail::CancelToken;
use crate::utils::{
    nom_helper::{nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes, Endian},
    time::filetime_to_unixepoch,
};
use log::{error, warn};
use std::collections::HashMap;

pub(crate) const IMMM_SIGNATURE: [u8; 4] = *b"IMMM";

/**Offset value marking "no entry in this bucket" */
pub(crate) const NO_OFFSET: u32 = 0xffffffff;

#[derive(Debug)]
pub(crate) struct IndexHeader {
    pub(crate) format: FormatVersion,
    pub(crate) used_entries: u32,
    pub(crate) entry_count: u32,
    pub(crate) total_entries: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    pub(crate) cache_id: u64,
    /**Windows Vista index records carry a FILETIME */
    pub(crate) mtime: Option<i64>,
    pub(crate) flags: u32,
    /**Per-bucket offsets into the matching thumbcache_*.db files */
    pub(crate) offsets: Vec<BucketOffset>,
}

#[derive(Debug, Clone)]
pub(crate) struct BucketOffset {
    pub(crate) bucket: &'static str,
    pub(crate) offset: u32,
}

impl IndexEntry {
    /**An index slot with no hash and no flags was never used */
    pub(crate) fn is_empty(&self) -> bool {
        self.cache_id == 0 && self.flags == 0
    }

    /// Buckets this cache id currently has a thumbnail in
    pub(crate) fn present_buckets(&self) -> Vec<&'static str> {
        let mut buckets = Vec::new();
        for entry in &self.offsets {
            if entry.offset == NO_OFFSET {
                continue;
            }
            buckets.push(entry.bucket);
        }
        buckets
    }
}

/// Resolution buckets recorded per index entry, by format version.
/// Strides are observed, not documented; new Windows versions need
/// calibration here
fn bucket_names(format: &FormatVersion) -> Vec<&'static str> {
    match format {
        FormatVersion::WindowsVista | FormatVersion::Windows7 => {
            vec!["32", "96", "256", "1024", "sr"]
        }
        FormatVersion::Windows8 | FormatVersion::Windows8v2 | FormatVersion::Windows8v3 => vec![
            "16", "32", "48", "96", "256", "1024", "sr", "wide", "exif",
        ],
        FormatVersion::Windows81 => vec![
            "16", "32", "48", "96", "256", "1024", "1600", "sr", "wide", "exif",
            "wide_alternate",
        ],
        FormatVersion::Windows10 | FormatVersion::Unknown(_) => vec![
            "16", "32", "48", "96", "256", "768", "1024", "1280", "1920", "2560", "sr", "wide",
            "exif", "wide_alternate", "custom_stream",
        ],
    }
}

/// Parse a Thumbcache_idx.db index file into its records, in file order
pub(crate) fn parse_index(
    reader: &mut ByteReader,
    cancel: &CancelToken,
) -> Result<(IndexHeader, Vec<IndexEntry>), ThumbcacheError> {
    let header_size = 24;
    if reader.size() < header_size {
        warn!("[thumbcache] {} too small to hold an IMMM header", reader.path());
        return Err(ThumbcacheError::BadHeader);
    }

    let header_result = reader.read_at(0, header_size as usize);
    let header_data = match header_result {
        Ok(result) => result,
        Err(err) => {
            error!(
                "[thumbcache] Could not read IMMM header from {}: {err:?}",
                reader.path()
            );
            return Err(ThumbcacheError::ReadError);
        }
    };

    let parse_result = index_header(&header_data);
    let (_, header) = match parse_result {
        Ok(result) => result,
        Err(_err) => {
            error!("[thumbcache] Could not parse IMMM header");
            return Err(ThumbcacheError::BadHeader);
        }
    };

    // Windows 10 pads the header with 29 extra dwords
    let mut offset = header_size;
    if header.format == FormatVersion::Windows10 {
        let windows10_padding = 116;
        offset += windows10_padding;
    }

    let buckets = bucket_names(&header.format);
    let has_filetime = header.format == FormatVersion::WindowsVista;
    let hash_and_flags = 12;
    let filetime_size = if has_filetime { 8 } else { 0 };
    let stride = hash_and_flags + filetime_size + buckets.len() as u64 * 4;

    let mut entries = Vec::new();
    while offset + stride <= reader.size() {
        if cancel.is_cancelled() {
            return Err(ThumbcacheError::Cancelled);
        }

        let record_result = reader.read_at(offset, stride as usize);
        let record_data = match record_result {
            Ok(result) => result,
            Err(err) => {
                error!("[thumbcache] Could not read index record at {offset}: {err:?}");
                return Err(ThumbcacheError::ReadError);
            }
        };

        let entry_result = index_entry(&record_data, &buckets, has_filetime);
        let (_, entry) = match entry_result {
            Ok(result) => result,
            Err(_err) => {
                warn!("[thumbcache] Could not parse index record at {offset}");
                break;
            }
        };
        entries.push(entry);
        offset += stride;
    }

    Ok((header, entries))
}

/// Index records keyed by Thumb Cache ID, empty slots dropped
pub(crate) fn cache_ids(entries: &[IndexEntry]) -> HashMap<u64, IndexEntry> {
    let mut ids = HashMap::new();
    for entry in entries {
        if entry.is_empty() {
            continue;
        }
        ids.insert(entry.cache_id, entry.clone());
    }
    ids
}

fn index_header(data: &[u8]) -> nom::IResult<&[u8], IndexHeader> {
    let signature_size: u64 = 4;
    let (input, signature) = nom_data(data, signature_size)?;
    if signature != IMMM_SIGNATURE {
        return Err(nom::Err::Failure(nom::error::Error::new(
            data,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (input, format_value) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _reserved) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, used_entries) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, entry_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, total_entries) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let header = IndexHeader {
        format: FormatVersion::from_value(format_value),
        used_entries,
        entry_count,
        total_entries,
    };
    Ok((input, header))
}

fn index_entry<'a>(
    data: &'a [u8],
    buckets: &[&'static str],
    has_filetime: bool,
) -> nom::IResult<&'a [u8], IndexEntry> {
    let (mut input, cache_id) = nom_unsigned_eight_bytes(data, Endian::Le)?;

    let mut mtime = None;
    if has_filetime {
        let (remaining, filetime) = nom_unsigned_eight_bytes(input, Endian::Le)?;
        input = remaining;
        let unset = 0;
        if filetime != unset {
            mtime = Some(filetime_to_unixepoch(&filetime));
        }
    }

    let (mut input, flags) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let mut offsets = Vec::new();
    for bucket in buckets {
        let (remaining, offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
        input = remaining;
        offsets.push(BucketOffset {
            bucket,
            offset,
        });
    }

    let entry = IndexEntry {
        cache_id,
        mtime,
        flags,
        offsets,
    };
    Ok((input, entry))
}
