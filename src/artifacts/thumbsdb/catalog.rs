use super::error::ThumbsDbError;
use crate::utils::{
    nom_helper::{
        nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes, nom_unsigned_two_bytes,
        Endian,
    },
    strings::extract_utf16_string,
    time::filetime_to_unixepoch,
};
use log::{error, warn};

/// The `Catalog` stream binds old-convention stream ids to original file
/// names and modification times
#[derive(Debug)]
pub(crate) struct Catalog {
    pub(crate) version: u16,
    pub(crate) entry_count: u32,
    pub(crate) largest_width: u32,
    pub(crate) largest_height: u32,
    pub(crate) entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub(crate) struct CatalogEntry {
    pub(crate) stream_id: u32,
    /**Original file modification time in unixepoch seconds */
    pub(crate) mtime: i64,
    pub(crate) name: String,
}

impl Catalog {
    /// Parse the Catalog stream into its records, in file order
    pub(crate) fn parse_catalog(data: &[u8]) -> Result<Catalog, ThumbsDbError> {
        let catalog_result = Catalog::catalog(data);
        match catalog_result {
            Ok((_, result)) => Ok(result),
            Err(_err) => {
                error!("[thumbsdb] Could not parse Catalog stream");
                Err(ThumbsDbError::ParseCatalog)
            }
        }
    }

    fn catalog(data: &[u8]) -> nom::IResult<&[u8], Catalog> {
        let (input, first_record_offset) = nom_unsigned_two_bytes(data, Endian::Le)?;
        let (input, version) = nom_unsigned_two_bytes(input, Endian::Le)?;
        let (input, entry_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, largest_width) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (_, largest_height) = nom_unsigned_four_bytes(input, Endian::Le)?;

        let mut catalog = Catalog {
            version,
            entry_count,
            largest_width,
            largest_height,
            entries: Vec::new(),
        };

        let mut offset = first_record_offset as usize;
        // Record preamble: length, stream id, FILETIME
        let preamble_size = 16;
        // Name is NUL terminated and padded with four zero bytes
        let trailer_size = 4;
        while offset + preamble_size <= data.len() {
            let (input, record_length) = nom_unsigned_four_bytes(&data[offset..], Endian::Le)?;
            let end = 0;
            if record_length == end {
                break;
            }
            if record_length as usize > data.len() - offset
                || (record_length as usize) < preamble_size + trailer_size
            {
                warn!("[thumbsdb] Catalog record at {offset} has bad length {record_length}");
                break;
            }

            let (input, stream_id) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, filetime) = nom_unsigned_eight_bytes(input, Endian::Le)?;
            let name_size = record_length as usize - preamble_size - trailer_size;
            let (_, name_data) = nom_data(input, name_size as u64)?;

            let entry = CatalogEntry {
                stream_id,
                mtime: filetime_to_unixepoch(&filetime),
                name: extract_utf16_string(name_data),
            };
            catalog.entries.push(entry);

            offset += record_length as usize;
        }

        Ok((data, catalog))
    }

    /// Find a catalog record for a stream id
    pub(crate) fn entry_for_id(&self, stream_id: u32) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.stream_id == stream_id)
    }
}

/// Old Thumbs.db stream names are the decimal stream id reversed
/// (catalog id 42 is stored in stream "24")
pub(crate) fn reverse_stream_name(name: &str) -> String {
    name.chars().rev().collect()
}

/// Stream names under the old convention are short reversed decimal ids
pub(crate) fn stream_id_from_name(name: &str) -> Option<u32> {
    let max_name_size = 4;
    if name.is_empty() || name.len() >= max_name_size {
        return None;
    }
    reverse_stream_name(name).parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::{reverse_stream_name, stream_id_from_name, Catalog};

    pub(crate) fn build_catalog_record(stream_id: u32, filetime: u64, name: &str) -> Vec<u8> {
        let mut name_data: Vec<u8> = Vec::new();
        for unit in name.encode_utf16() {
            name_data.extend_from_slice(&unit.to_le_bytes());
        }
        name_data.extend_from_slice(&[0, 0]); // terminator
        name_data.extend_from_slice(&[0, 0]); // trailer pad

        let preamble = 16;
        let mut record = Vec::new();
        record.extend_from_slice(&((preamble + name_data.len()) as u32).to_le_bytes());
        record.extend_from_slice(&stream_id.to_le_bytes());
        record.extend_from_slice(&filetime.to_le_bytes());
        record.append(&mut name_data);
        record
    }

    pub(crate) fn build_catalog(records: &[(u32, u64, &str)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(&7u16.to_le_bytes());
        data.extend_from_slice(&(records.len() as u32).to_le_bytes());
        data.extend_from_slice(&96u32.to_le_bytes());
        data.extend_from_slice(&96u32.to_le_bytes());
        for (stream_id, filetime, name) in records {
            data.append(&mut build_catalog_record(*stream_id, *filetime, name));
        }
        data
    }

    #[test]
    fn test_parse_catalog() {
        let data = build_catalog(&[
            (1, 132038640000000000, "photo.jpg"),
            (2, 132038640000000000, "beach.bmp"),
        ]);

        let result = Catalog::parse_catalog(&data).unwrap();
        assert_eq!(result.version, 7);
        assert_eq!(result.entry_count, 2);
        assert_eq!(result.largest_width, 96);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].stream_id, 1);
        assert_eq!(result.entries[0].name, "photo.jpg");
        assert_eq!(result.entries[0].mtime, 1559390400);
        assert_eq!(result.entries[1].name, "beach.bmp");
    }

    #[test]
    fn test_parse_catalog_empty() {
        let data = build_catalog(&[]);
        let result = Catalog::parse_catalog(&data).unwrap();
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_entry_for_id() {
        let data = build_catalog(&[(7, 132038640000000000, "photo.jpg")]);
        let result = Catalog::parse_catalog(&data).unwrap();
        assert_eq!(result.entry_for_id(7).unwrap().name, "photo.jpg");
        assert!(result.entry_for_id(8).is_none());
    }

    #[test]
    fn test_reverse_stream_name() {
        assert_eq!(reverse_stream_name("24"), "42");
        assert_eq!(reverse_stream_name("1"), "1");
    }

    #[test]
    fn test_stream_id_from_name() {
        assert_eq!(stream_id_from_name("42"), Some(24));
        assert_eq!(stream_id_from_name("1"), Some(1));
        assert_eq!(stream_id_from_name("Catalog"), None);
        assert_eq!(stream_id_from_name("256_1a2b3c4d5e6f7080"), None);
    }
}
