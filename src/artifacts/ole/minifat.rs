use super::{
    error::OleError,
    fat::{follow_chain, read_sector},
    header::OleHeader,
};
use crate::filesystem::reader::ByteReader;
use crate::utils::nom_helper::{nom_unsigned_four_bytes, Endian};
use log::error;

/// Assemble the miniFAT by walking its sector chain through the main FAT.
/// Mini-sector chains for small streams are followed through this table.
pub(crate) fn read_minifat(
    reader: &mut ByteReader,
    fat: &[u32],
    header: &OleHeader,
) -> Result<Vec<u32>, OleError> {
    let chain = follow_chain(fat, header.first_minifat_sector)?;

    let mut minifat = Vec::new();
    for sector in chain {
        let sector_result = read_sector(reader, sector, header.sector_size);
        let data = match sector_result {
            Ok(result) => result,
            Err(err) => {
                error!("[ole] Could not read miniFAT sector {sector}: {err:?}");
                return Err(OleError::ReadError);
            }
        };

        let entries_result = minifat_entries(&data);
        let (_, mut entries) = match entries_result {
            Ok(result) => result,
            Err(_err) => {
                error!("[ole] Could not parse miniFAT sector {sector}");
                return Err(OleError::CorruptChain);
            }
        };
        minifat.append(&mut entries);
    }

    Ok(minifat)
}

fn minifat_entries(data: &[u8]) -> nom::IResult<&[u8], Vec<u32>> {
    let mut input = data;
    let mut entries = Vec::new();
    while !input.is_empty() {
        let (remaining, entry) = nom_unsigned_four_bytes(input, Endian::Le)?;
        entries.push(entry);
        input = remaining;
    }
    Ok((input, entries))
}

#[cfg(test)]
mod tests {
    use super::minifat_entries;
    use crate::artifacts::ole::header::{SECTOR_END_OF_CHAIN, SECTOR_FREE};

    #[test]
    fn test_minifat_entries() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&SECTOR_END_OF_CHAIN.to_le_bytes());
        data.extend_from_slice(&SECTOR_FREE.to_le_bytes());
        let (_, result) = minifat_entries(&data).unwrap();
        assert_eq!(result, [1, SECTOR_END_OF_CHAIN, SECTOR_FREE]);
    }
}
