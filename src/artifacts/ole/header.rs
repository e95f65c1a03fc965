use super::error::OleError;
use crate::utils::{
    nom_helper::{nom_data, nom_unsigned_four_bytes, nom_unsigned_two_bytes, Endian},
    uuid::format_guid_le_bytes,
};
use log::{error, warn};

/// Sector number sentinels. Everything else is a real sector index
pub(crate) const SECTOR_FREE: u32 = 0xffffffff;
pub(crate) const SECTOR_END_OF_CHAIN: u32 = 0xfffffffe;
pub(crate) const SECTOR_FAT: u32 = 0xfffffffd;
pub(crate) const SECTOR_DIFAT: u32 = 0xfffffffc;

pub(crate) const OLE_SIGNATURE: [u8; 8] = [0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];
/**Signature written by pre-release Windows builds. Bytes after it are stored XOR 0xFF */
pub(crate) const OLE_SIGNATURE_BETA: [u8; 8] = [0x0e, 0x11, 0xfc, 0x0d, 0xd0, 0xcf, 0x11, 0xe0];

/**Header record size. Sector 0 starts immediately after it */
pub(crate) const HEADER_SIZE: usize = 512;

#[derive(Debug)]
pub(crate) struct OleHeader {
    pub(crate) minor_version: u16,
    pub(crate) major_version: u16,
    pub(crate) sector_size: u32,
    pub(crate) mini_sector_size: u32,
    pub(crate) fat_sector_count: u32,
    pub(crate) first_directory_sector: u32,
    /**Streams below this size live in the ministream */
    pub(crate) mini_cutoff: u32,
    pub(crate) first_minifat_sector: u32,
    pub(crate) minifat_sector_count: u32,
    pub(crate) first_difat_sector: u32,
    pub(crate) difat_sector_count: u32,
    /**First 109 DIFAT entries carried inline in the header */
    pub(crate) difat: Vec<u32>,
}

impl OleHeader {
    /// Parse and validate the 512-byte OLE header record
    pub(crate) fn parse_header(data: &[u8]) -> Result<OleHeader, OleError> {
        let header_result = OleHeader::header(data);
        let (_, header) = match header_result {
            Ok(result) => result,
            Err(_err) => {
                error!("[ole] Could not parse OLE header");
                return Err(OleError::BadHeader);
            }
        };
        Ok(header)
    }

    fn header(data: &[u8]) -> nom::IResult<&[u8], OleHeader> {
        let signature_size: u64 = 8;
        let (input, signature) = nom_data(data, signature_size)?;
        if signature != OLE_SIGNATURE && signature != OLE_SIGNATURE_BETA {
            error!("[ole] Unknown OLE signature: {signature:?}");
            return Err(nom::Err::Failure(nom::error::Error::new(
                data,
                nom::error::ErrorKind::Verify,
            )));
        }

        let class_id_size: u64 = 16;
        let (input, class_id_data) = nom_data(input, class_id_size)?;
        let zero_class = [0; 16];
        if class_id_data != zero_class {
            warn!(
                "[ole] Header CLSID should be zero, got: {}",
                format_guid_le_bytes(class_id_data)
            );
        }

        let (input, minor_version) = nom_unsigned_two_bytes(input, Endian::Le)?;
        let (input, major_version) = nom_unsigned_two_bytes(input, Endian::Le)?;
        let (input, _byte_order) = nom_unsigned_two_bytes(input, Endian::Le)?;
        let (input, sector_shift) = nom_unsigned_two_bytes(input, Endian::Le)?;
        let (input, mini_sector_shift) = nom_unsigned_two_bytes(input, Endian::Le)?;

        let reserved_size: u64 = 6;
        let (input, _reserved) = nom_data(input, reserved_size)?;

        let (input, _directory_sector_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, fat_sector_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, first_directory_sector) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, _transaction_signature) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, mini_cutoff) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, first_minifat_sector) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, minifat_sector_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, first_difat_sector) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (mut input, difat_sector_count) = nom_unsigned_four_bytes(input, Endian::Le)?;

        let version_three = 3;
        let version_four = 4;
        let shift_v3 = 9;
        let shift_v4 = 12;
        let mini_shift = 6;
        let bad_shift = (major_version == version_three && sector_shift != shift_v3)
            || (major_version == version_four && sector_shift != shift_v4)
            || (major_version != version_three && major_version != version_four);
        if bad_shift || mini_sector_shift != mini_shift {
            error!(
                "[ole] Unsupported OLE version {major_version} with sector shift {sector_shift} and mini shift {mini_sector_shift}"
            );
            return Err(nom::Err::Failure(nom::error::Error::new(
                data,
                nom::error::ErrorKind::Verify,
            )));
        }

        let inline_difat_entries = 109;
        let mut difat = Vec::new();
        for _ in 0..inline_difat_entries {
            let (remaining, entry) = nom_unsigned_four_bytes(input, Endian::Le)?;
            input = remaining;
            if entry == SECTOR_FREE {
                continue;
            }
            difat.push(entry);
        }

        let base: u32 = 2;
        let header = OleHeader {
            minor_version,
            major_version,
            sector_size: base.pow(sector_shift as u32),
            mini_sector_size: base.pow(mini_sector_shift as u32),
            fat_sector_count,
            first_directory_sector,
            mini_cutoff,
            first_minifat_sector,
            minifat_sector_count,
            first_difat_sector,
            difat_sector_count,
            difat,
        };
        Ok((input, header))
    }
}

/// Absolute file offset of a sector
pub(crate) fn sector_offset(sector: u32, sector_size: u32) -> u64 {
    HEADER_SIZE as u64 + sector as u64 * sector_size as u64
}

#[cfg(test)]
mod tests {
    use super::{sector_offset, OleHeader};
    use crate::artifacts::ole::error::OleError;

    fn minimal_header() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1]);
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(&62u16.to_le_bytes()); // minor version
        data.extend_from_slice(&3u16.to_le_bytes()); // major version
        data.extend_from_slice(&[0xfe, 0xff]); // byte order
        data.extend_from_slice(&9u16.to_le_bytes()); // sector shift
        data.extend_from_slice(&6u16.to_le_bytes()); // mini sector shift
        data.extend_from_slice(&[0; 6]);
        data.extend_from_slice(&0u32.to_le_bytes()); // directory sectors
        data.extend_from_slice(&1u32.to_le_bytes()); // FAT sectors
        data.extend_from_slice(&1u32.to_le_bytes()); // first directory sector
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&4096u32.to_le_bytes()); // mini cutoff
        data.extend_from_slice(&0xfffffffeu32.to_le_bytes()); // first miniFAT sector
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0xfffffffeu32.to_le_bytes()); // first DIFAT sector
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // DIFAT[0] = FAT sector 0
        while data.len() < 512 {
            data.push(0xff);
        }
        data
    }

    #[test]
    fn test_parse_header() {
        let data = minimal_header();
        let result = OleHeader::parse_header(&data).unwrap();

        assert_eq!(result.major_version, 3);
        assert_eq!(result.sector_size, 512);
        assert_eq!(result.mini_sector_size, 64);
        assert_eq!(result.mini_cutoff, 4096);
        assert_eq!(result.first_directory_sector, 1);
        assert_eq!(result.difat, [0]);
    }

    #[test]
    fn test_parse_header_bad_shift() {
        let mut data = minimal_header();
        data[30] = 10; // sector shift
        let result = OleHeader::parse_header(&data);
        assert_eq!(result.unwrap_err(), OleError::BadHeader);
    }

    #[test]
    fn test_sector_offset() {
        assert_eq!(sector_offset(0, 512), 512);
        assert_eq!(sector_offset(3, 512), 2048);
    }
}
