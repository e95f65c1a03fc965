use super::error::ThumbcacheError;
use crate::filesystem::reader::ByteReader;
use crate::structs::thumbnail::CancelToken;
use crate::utils::{
    checksums::crc64_thumbcache,
    nom_helper::{
        nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes, Endian,
    },
    strings::extract_utf16_string,
};
use log::{error, info, warn};

/// CMMM format versions track the Windows release that wrote the cache
#[derive(Debug, PartialEq, Clone)]
pub(crate) enum FormatVersion {
    WindowsVista,
    Windows7,
    Windows8,
    Windows8v2,
    Windows8v3,
    Windows81,
    Windows10,
    Unknown(u32),
}

impl FormatVersion {
    pub(crate) fn from_value(value: u32) -> FormatVersion {
        match value {
            0x14 => FormatVersion::WindowsVista,
            0x15 => FormatVersion::Windows7,
            0x1a => FormatVersion::Windows8,
            0x1c => FormatVersion::Windows8v2,
            0x1e => FormatVersion::Windows8v3,
            0x1f => FormatVersion::Windows81,
            0x20 => FormatVersion::Windows10,
            _ => FormatVersion::Unknown(value),
        }
    }

    /**Windows 8 and later carry entry dimensions and an extra header dword */
    fn is_windows8_or_later(&self) -> bool {
        !matches!(
            self,
            FormatVersion::WindowsVista | FormatVersion::Windows7
        )
    }

    /**Windows 8 v3 dropped the entry count from the file header */
    fn has_entry_count(&self) -> bool {
        matches!(
            self,
            FormatVersion::WindowsVista
                | FormatVersion::Windows7
                | FormatVersion::Windows8
                | FormatVersion::Windows8v2
        )
    }
}

pub(crate) const CMMM_SIGNATURE: [u8; 4] = *b"CMMM";

#[derive(Debug)]
pub(crate) struct CacheHeader {
    pub(crate) format: FormatVersion,
    /**Resolution bucket (32, 96, 256, 1024, ...) the file holds */
    pub(crate) cache_type: u32,
    pub(crate) first_entry_offset: u32,
    pub(crate) first_available_offset: u32,
    pub(crate) entry_count: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct CacheEntry {
    pub(crate) entry_size: u32,
    pub(crate) cache_id: u64,
    /**Windows Vista wrote the source extension into the entry */
    pub(crate) extension: Option<String>,
    /**Cache id rendered as UTF-16 hex digits inside the entry */
    pub(crate) identifier: String,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) data_checksum: u64,
    pub(crate) header_checksum: u64,
    pub(crate) mime: Option<String>,
    pub(crate) data: Vec<u8>,
}

/// Identify an image payload by magic bytes
pub(crate) fn sniff_image(data: &[u8]) -> Option<&'static str> {
    let jpeg = [0xff, 0xd8, 0xff];
    let png = [0x89, 0x50, 0x4e, 0x47];
    let bmp = [0x42, 0x4d];

    if data.starts_with(&jpeg) {
        return Some("image/jpeg");
    }
    if data.starts_with(&png) {
        return Some("image/png");
    }
    if data.starts_with(&bmp) {
        return Some("image/bmp");
    }
    None
}

/// Parse the 24-byte CMMM file header
pub(crate) fn parse_cache_header(data: &[u8]) -> Result<CacheHeader, ThumbcacheError> {
    let result = cache_header(data);
    match result {
        Ok((_, header)) => Ok(header),
        Err(_err) => {
            error!("[thumbcache] Could not parse CMMM header");
            Err(ThumbcacheError::BadHeader)
        }
    }
}

fn cache_header(data: &[u8]) -> nom::IResult<&[u8], CacheHeader> {
    let signature_size: u64 = 4;
    let (input, signature) = nom_data(data, signature_size)?;
    if signature != CMMM_SIGNATURE {
        return Err(nom::Err::Failure(nom::error::Error::new(
            data,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (input, format_value) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (mut input, cache_type) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let format = FormatVersion::from_value(format_value);

    // Windows 8 v2 added a dword before the offsets
    if format.is_windows8_or_later() && format != FormatVersion::Windows8 {
        let (remaining, _unknown) = nom_unsigned_four_bytes(input, Endian::Le)?;
        input = remaining;
    }

    let (input, first_entry_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (mut input, first_available_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let mut entry_count = None;
    if format.has_entry_count() {
        let (remaining, count) = nom_unsigned_four_bytes(input, Endian::Le)?;
        input = remaining;
        entry_count = Some(count);
    }

    let header = CacheHeader {
        format,
        cache_type,
        first_entry_offset,
        first_available_offset,
        entry_count,
    };
    Ok((input, header))
}

/// Walk every CMMM entry from the first entry offset. Corrupt framing ends
/// the walk with a warning; a forensic input is allowed to be truncated.
/// Returns the entries in file order plus the checksum mismatch count
pub(crate) fn parse_cache(
    reader: &mut ByteReader,
    cancel: &CancelToken,
    verify_checksums: bool,
) -> Result<(CacheHeader, Vec<CacheEntry>, u32), ThumbcacheError> {
    let minimum_header = 24;
    if reader.size() < minimum_header {
        warn!("[thumbcache] {} too small to hold a CMMM header", reader.path());
        return Err(ThumbcacheError::BadHeader);
    }

    // Windows 8 v2 headers are 28 bytes; everything else fits in 24
    let largest_header = 28;
    let header_size = std::cmp::min(largest_header, reader.size()) as usize;
    let header_result = reader.read_at(0, header_size);
    let header_data = match header_result {
        Ok(result) => result,
        Err(err) => {
            error!(
                "[thumbcache] Could not read CMMM header from {}: {err:?}",
                reader.path()
            );
            return Err(ThumbcacheError::ReadError);
        }
    };
    let header = parse_cache_header(&header_data)?;

    let mut entries = Vec::new();
    let mut mismatches = 0;
    let mut offset = header.first_entry_offset as u64;
    let mut counter = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(ThumbcacheError::Cancelled);
        }
        if offset >= reader.size() {
            break;
        }

        let entry_result = read_entry(reader, offset, &header.format, verify_checksums);
        let (entry, mismatch) = match entry_result {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    "[thumbcache] Stopping at cache entry {counter} (offset {offset}): {err:?}"
                );
                break;
            }
        };
        counter += 1;

        let next_offset = offset + entry.entry_size as u64;
        if entry.entry_size == 0 {
            warn!("[thumbcache] Cache entry {counter} declares zero size");
            break;
        }

        if mismatch {
            mismatches += 1;
        }

        // Entries without an identifier are unused slack at the end of the file
        if !entry.identifier.is_empty() {
            entries.push(entry);
        }

        // The declared size must land exactly on the next signature or EOF
        if next_offset < reader.size() {
            let signature_size = 4;
            let peek_result = reader.read_at(next_offset, signature_size);
            match peek_result {
                Ok(peek) if peek == CMMM_SIGNATURE => {}
                Ok(_) => {
                    warn!(
                        "[thumbcache] Entry {counter} size does not land on a CMMM signature"
                    );
                    break;
                }
                Err(_err) => break,
            }
        }
        offset = next_offset;
    }

    info!(
        "[thumbcache] Parsed {} cache entries from {}",
        entries.len(),
        reader.path()
    );
    Ok((header, entries, mismatches))
}

/// Read one entry at the provided offset
fn read_entry(
    reader: &mut ByteReader,
    offset: u64,
    format: &FormatVersion,
    verify_checksums: bool,
) -> Result<(CacheEntry, bool), ThumbcacheError> {
    // Largest fixed entry header (Vista and Windows 8+)
    let vista_header: usize = 56;
    let seven_header: usize = 48;
    let header_size = if *format == FormatVersion::Windows7 {
        seven_header
    } else {
        vista_header
    };

    let available = reader.size().saturating_sub(offset);
    if (available as usize) < header_size {
        warn!("[thumbcache] Remaining bytes too small for a cache entry header");
        return Err(ThumbcacheError::BadHeader);
    }

    let header_result = reader.read_at(offset, header_size);
    let header_data = match header_result {
        Ok(result) => result,
        Err(err) => {
            error!("[thumbcache] Could not read cache entry header: {err:?}");
            return Err(ThumbcacheError::ReadError);
        }
    };

    let parse_result = entry_header(&header_data, format);
    let (_, partial) = match parse_result {
        Ok(result) => result,
        Err(_err) => {
            warn!("[thumbcache] Could not parse cache entry header");
            return Err(ThumbcacheError::BadSignature);
        }
    };

    let entry = partial;
    let id_offset = offset + header_size as u64;
    let sizes_sane = (entry.id_size as u64)
        .checked_add(entry.pad_size as u64)
        .and_then(|value| value.checked_add(entry.data_size as u64))
        .and_then(|value| value.checked_add(id_offset))
        .map(|end| end <= reader.size())
        .unwrap_or(false);
    if !sizes_sane {
        warn!("[thumbcache] Cache entry content sizes run past end of file");
        return Err(ThumbcacheError::BadHeader);
    }

    let mut identifier = String::new();
    if entry.id_size > 0 {
        let id_result = reader.read_at(id_offset, entry.id_size as usize);
        match id_result {
            Ok(id_data) => identifier = extract_utf16_string(&id_data),
            Err(err) => {
                error!("[thumbcache] Could not read cache entry identifier: {err:?}");
                return Err(ThumbcacheError::ReadError);
            }
        }
    }

    let data_offset = id_offset + entry.id_size as u64 + entry.pad_size as u64;
    let mut data = Vec::new();
    if entry.data_size > 0 {
        let data_result = reader.read_at(data_offset, entry.data_size as usize);
        match data_result {
            Ok(result) => data = result,
            Err(err) => {
                error!("[thumbcache] Could not read cache entry data: {err:?}");
                return Err(ThumbcacheError::ReadError);
            }
        }
    }

    let mut mismatch = false;
    if verify_checksums {
        // Header checksum covers the fixed header up to its own field
        let checksum_fields = 16;
        let covered = &header_data[..header_size - checksum_fields];
        let header_checksum = crc64_thumbcache(covered);
        if header_checksum != entry.header_checksum {
            warn!(
                "[thumbcache] Entry {identifier} header checksum mismatch: computed {header_checksum:#x}, stored {:#x}",
                entry.header_checksum
            );
            mismatch = true;
        }

        if !data.is_empty() {
            let checksum = crc64_thumbcache(&data);
            if checksum != entry.data_checksum {
                warn!(
                    "[thumbcache] Entry {identifier} data checksum mismatch: computed {checksum:#x}, stored {:#x}",
                    entry.data_checksum
                );
                mismatch = true;
            }
        }
    }

    let mime = sniff_image(&data).map(String::from);
    let cache_entry = CacheEntry {
        entry_size: entry.entry_size,
        cache_id: entry.cache_id,
        extension: entry.extension,
        identifier,
        width: entry.width,
        height: entry.height,
        data_checksum: entry.data_checksum,
        header_checksum: entry.header_checksum,
        mime,
        data,
    };
    Ok((cache_entry, mismatch))
}

struct EntryHeader {
    entry_size: u32,
    cache_id: u64,
    extension: Option<String>,
    id_size: u32,
    pad_size: u32,
    data_size: u32,
    width: Option<u32>,
    height: Option<u32>,
    data_checksum: u64,
    header_checksum: u64,
}

fn entry_header<'a>(
    data: &'a [u8],
    format: &FormatVersion,
) -> nom::IResult<&'a [u8], EntryHeader> {
    let signature_size: u64 = 4;
    let (input, signature) = nom_data(data, signature_size)?;
    if signature != CMMM_SIGNATURE {
        return Err(nom::Err::Failure(nom::error::Error::new(
            data,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (input, entry_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (mut input, cache_id) = nom_unsigned_eight_bytes(input, Endian::Le)?;

    let mut extension = None;
    if *format == FormatVersion::WindowsVista {
        let extension_size: u64 = 8;
        let (remaining, extension_data) = nom_data(input, extension_size)?;
        input = remaining;
        extension = Some(extract_utf16_string(extension_data));
    }

    let (input, id_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, pad_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (mut input, data_size) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let mut width = None;
    let mut height = None;
    if format.is_windows8_or_later() {
        let (remaining, width_value) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (remaining, height_value) = nom_unsigned_four_bytes(remaining, Endian::Le)?;
        input = remaining;
        width = Some(width_value);
        height = Some(height_value);
    }

    let (input, _unknown) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, data_checksum) = nom_unsigned_eight_bytes(input, Endian::Le)?;
    let (input, header_checksum) = nom_unsigned_eight_bytes(input, Endian::Le)?;

    let header = EntryHeader {
        entry_size,
        cache_id,
        extension,
        id_size,
        pad_size,
        data_size,
        width,
        height,
        data_checksum,
        header_checksum,
    };
    Ok((input, header))
}

#[cfg(test)]
mod tests {
    use super::{parse_cache_header, sniff_image, FormatVersion};
    use crate::artifacts::thumbcache::error::ThumbcacheError;

    fn build_header(format: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"CMMM");
        data.extend_from_slice(&format.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes()); // cache type 256
        if format > 0x1a {
            data.extend_from_slice(&0u32.to_le_bytes());
        }
        data.extend_from_slice(&24u32.to_le_bytes()); // first entry
        data.extend_from_slice(&4096u32.to_le_bytes()); // first available
        if format < 0x1e {
            data.extend_from_slice(&3u32.to_le_bytes());
        }
        while data.len() < 28 {
            data.push(0);
        }
        data
    }

    #[test]
    fn test_parse_cache_header_windows7() {
        let data = build_header(0x15);
        let result = parse_cache_header(&data).unwrap();
        assert_eq!(result.format, FormatVersion::Windows7);
        assert_eq!(result.cache_type, 4);
        assert_eq!(result.first_entry_offset, 24);
        assert_eq!(result.entry_count, Some(3));
    }

    #[test]
    fn test_parse_cache_header_windows10() {
        let data = build_header(0x20);
        let result = parse_cache_header(&data).unwrap();
        assert_eq!(result.format, FormatVersion::Windows10);
        assert_eq!(result.entry_count, None);
    }

    #[test]
    fn test_parse_cache_header_bad_signature() {
        let mut data = build_header(0x20);
        data[0] = b'X';
        let result = parse_cache_header(&data);
        assert_eq!(result.unwrap_err(), ThumbcacheError::BadHeader);
    }

    #[test]
    fn test_sniff_image() {
        assert_eq!(sniff_image(&[0xff, 0xd8, 0xff, 0xe0]), Some("image/jpeg"));
        assert_eq!(
            sniff_image(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a]),
            Some("image/png")
        );
        assert_eq!(sniff_image(&[0x42, 0x4d, 0x00]), Some("image/bmp"));
        assert_eq!(sniff_image(&[0x00, 0x01]), None);
        assert_eq!(sniff_image(&[]), None);
    }

    #[test]
    fn test_format_version_from_value() {
        assert_eq!(FormatVersion::from_value(0x14), FormatVersion::WindowsVista);
        assert_eq!(FormatVersion::from_value(0x1f), FormatVersion::Windows81);
        assert_eq!(FormatVersion::from_value(0x99), FormatVersion::Unknown(0x99));
    }
}
