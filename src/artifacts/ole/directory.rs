use super::error::OleError;
use crate::utils::{
    nom_helper::{
        nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes, nom_unsigned_one_byte,
        nom_unsigned_two_bytes, Endian,
    },
    strings::extract_utf16_string,
    time::filetime_to_unixepoch,
    uuid::format_guid_le_bytes,
};
use log::error;

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum DirectoryType {
    Empty,
    Storage,
    Stream,
    LockBytes,
    Property,
    Root,
    Unknown(u8),
}

impl DirectoryType {
    fn from_value(value: u8) -> DirectoryType {
        match value {
            0 => DirectoryType::Empty,
            1 => DirectoryType::Storage,
            2 => DirectoryType::Stream,
            3 => DirectoryType::LockBytes,
            4 => DirectoryType::Property,
            5 => DirectoryType::Root,
            _ => DirectoryType::Unknown(value),
        }
    }
}

/**Sibling/child value meaning "no entry" */
pub(crate) const NO_ENTRY: u32 = 0xffffffff;

#[derive(Debug)]
pub(crate) struct DirectoryEntry {
    pub(crate) name: String,
    pub(crate) entry_type: DirectoryType,
    /**Red (0) or black (1) in the sibling tree */
    pub(crate) color: u8,
    pub(crate) left: u32,
    pub(crate) right: u32,
    pub(crate) child: u32,
    pub(crate) class_id: String,
    pub(crate) state_bits: u32,
    pub(crate) created: i64,
    pub(crate) modified: i64,
    pub(crate) start_sector: u32,
    pub(crate) size: u64,
}

/// Parse directory sectors into 128-byte entries. Entry 0 must be the Root
pub(crate) fn parse_directory(
    data: &[u8],
    major_version: u16,
) -> Result<Vec<DirectoryEntry>, OleError> {
    let result = directory_entries(data, major_version);
    match result {
        Ok((_, entries)) => Ok(entries),
        Err(_err) => {
            error!("[ole] Could not parse OLE directory entries");
            Err(OleError::BadDirectory)
        }
    }
}

fn directory_entries(
    data: &[u8],
    major_version: u16,
) -> nom::IResult<&[u8], Vec<DirectoryEntry>> {
    let entry_size = 128;
    let mut input = data;
    let mut entries = Vec::new();

    while input.len() >= entry_size {
        let (remaining, entry) = directory_entry(input, major_version)?;
        input = remaining;
        entries.push(entry);
    }

    Ok((input, entries))
}

fn directory_entry(data: &[u8], major_version: u16) -> nom::IResult<&[u8], DirectoryEntry> {
    let name_size: u64 = 64;
    let (input, name_data) = nom_data(data, name_size)?;
    let (input, name_length) = nom_unsigned_two_bytes(input, Endian::Le)?;
    let (input, entry_type_value) = nom_unsigned_one_byte(input, Endian::Le)?;
    let (input, color) = nom_unsigned_one_byte(input, Endian::Le)?;
    let (input, left) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, right) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, child) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let class_id_size: u64 = 16;
    let (input, class_id_data) = nom_data(input, class_id_size)?;
    let (input, state_bits) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, created_filetime) = nom_unsigned_eight_bytes(input, Endian::Le)?;
    let (input, modified_filetime) = nom_unsigned_eight_bytes(input, Endian::Le)?;
    let (input, start_sector) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, size_raw) = nom_unsigned_eight_bytes(input, Endian::Le)?;

    let entry_type = DirectoryType::from_value(entry_type_value);

    // Name length counts bytes including the NUL terminator
    let min_name_length = 2;
    let max_name_length = 64;
    if entry_type != DirectoryType::Empty
        && (name_length < min_name_length
            || name_length > max_name_length
            || name_length % 2 != 0)
    {
        error!("[ole] Directory entry name length {name_length} out of range");
        return Err(nom::Err::Failure(nom::error::Error::new(
            data,
            nom::error::ErrorKind::Verify,
        )));
    }

    let name = if entry_type == DirectoryType::Empty {
        String::new()
    } else {
        let terminator = 2;
        extract_utf16_string(&name_data[..(name_length - terminator) as usize])
    };

    // Version 3 stream sizes are 32-bit. The upper half is leftover junk
    let version_three = 3;
    let size = if major_version == version_three {
        size_raw & 0xffffffff
    } else {
        size_raw
    };

    let unset = 0;
    let entry = DirectoryEntry {
        name,
        entry_type,
        color,
        left,
        right,
        child,
        class_id: format_guid_le_bytes(class_id_data),
        state_bits,
        created: if created_filetime == unset {
            0
        } else {
            filetime_to_unixepoch(&created_filetime)
        },
        modified: if modified_filetime == unset {
            0
        } else {
            filetime_to_unixepoch(&modified_filetime)
        },
        start_sector,
        size,
    };

    Ok((input, entry))
}

/// Order stream names the way the directory tree stores them: shorter
/// UTF-16 names first, same-length names by code unit
pub(crate) fn compare_names(lookup: &str, entry: &str) -> std::cmp::Ordering {
    let lookup_units: Vec<u16> = lookup.encode_utf16().collect();
    let entry_units: Vec<u16> = entry.encode_utf16().collect();

    match lookup_units.len().cmp(&entry_units.len()) {
        std::cmp::Ordering::Equal => lookup_units.cmp(&entry_units),
        order => order,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_names, parse_directory, DirectoryType, NO_ENTRY};
    use std::cmp::Ordering;

    pub(crate) fn build_entry(
        name: &str,
        entry_type: u8,
        left: u32,
        right: u32,
        child: u32,
        start_sector: u32,
        size: u32,
    ) -> Vec<u8> {
        let mut entry = Vec::new();
        let mut name_data = [0u8; 64];
        let mut name_length = 0u16;
        for (index, unit) in name.encode_utf16().enumerate() {
            name_data[index * 2..index * 2 + 2].copy_from_slice(&unit.to_le_bytes());
            name_length += 2;
        }
        if !name.is_empty() {
            name_length += 2; // NUL terminator
        }
        entry.extend_from_slice(&name_data);
        entry.extend_from_slice(&name_length.to_le_bytes());
        entry.push(entry_type);
        entry.push(1); // black
        entry.extend_from_slice(&left.to_le_bytes());
        entry.extend_from_slice(&right.to_le_bytes());
        entry.extend_from_slice(&child.to_le_bytes());
        entry.extend_from_slice(&[0; 16]);
        entry.extend_from_slice(&0u32.to_le_bytes());
        entry.extend_from_slice(&0u64.to_le_bytes());
        entry.extend_from_slice(&132038640000000000u64.to_le_bytes());
        entry.extend_from_slice(&start_sector.to_le_bytes());
        entry.extend_from_slice(&(size as u64).to_le_bytes());
        entry
    }

    #[test]
    fn test_parse_directory() {
        let mut data = build_entry("Root Entry", 5, NO_ENTRY, NO_ENTRY, 1, 3, 192);
        data.extend(build_entry("Catalog", 2, NO_ENTRY, NO_ENTRY, NO_ENTRY, 0, 98));

        let result = parse_directory(&data, 3).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "Root Entry");
        assert_eq!(result[0].entry_type, DirectoryType::Root);
        assert_eq!(result[0].child, 1);
        assert_eq!(result[1].name, "Catalog");
        assert_eq!(result[1].entry_type, DirectoryType::Stream);
        assert_eq!(result[1].size, 98);
        assert_eq!(result[1].modified, 1559390400);
    }

    #[test]
    fn test_parse_directory_bad_name_length() {
        let mut data = build_entry("Root Entry", 5, NO_ENTRY, NO_ENTRY, 1, 3, 192);
        data[64] = 65; // odd name length
        assert!(parse_directory(&data, 3).is_err());
    }

    #[test]
    fn test_compare_names() {
        assert_eq!(compare_names("1", "Catalog"), Ordering::Less);
        assert_eq!(compare_names("Catalog", "Catalog"), Ordering::Equal);
        assert_eq!(compare_names("21", "12"), Ordering::Greater);
    }
}
