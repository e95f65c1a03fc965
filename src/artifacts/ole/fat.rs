use super::{
    error::OleError,
    header::{sector_offset, OleHeader, SECTOR_END_OF_CHAIN, SECTOR_FAT, SECTOR_DIFAT, SECTOR_FREE},
};
use crate::filesystem::reader::ByteReader;
use crate::utils::nom_helper::{nom_unsigned_four_bytes, Endian};
use log::error;
use std::collections::HashSet;

/// Collect the complete DIFAT: 109 inline header entries plus any chained
/// DIFAT sectors. Each overflow sector holds FAT sector numbers with its
/// last dword linking the next DIFAT sector.
pub(crate) fn collect_difat(
    reader: &mut ByteReader,
    header: &OleHeader,
) -> Result<Vec<u32>, OleError> {
    let mut difat = header.difat.clone();

    let mut current = header.first_difat_sector;
    let mut seen: HashSet<u32> = HashSet::new();
    while current != SECTOR_END_OF_CHAIN && current != SECTOR_FREE {
        if !seen.insert(current) {
            error!("[ole] DIFAT chain revisited sector {current}");
            return Err(OleError::CorruptChain);
        }

        let sector_result = read_sector(reader, current, header.sector_size);
        let sector = match sector_result {
            Ok(result) => result,
            Err(err) => {
                error!("[ole] Could not read DIFAT sector {current}: {err:?}");
                return Err(OleError::ReadError);
            }
        };

        let entries_result = sector_entries(&sector);
        let (_, mut entries) = match entries_result {
            Ok(result) => result,
            Err(_err) => {
                error!("[ole] Could not parse DIFAT sector {current}");
                return Err(OleError::CorruptChain);
            }
        };

        // Last entry links the next DIFAT sector
        current = entries.pop().unwrap_or(SECTOR_END_OF_CHAIN);
        for entry in entries {
            if entry == SECTOR_FREE {
                continue;
            }
            difat.push(entry);
        }
    }

    Ok(difat)
}

/// Read every FAT sector named by the DIFAT into one chain table. Free
/// entries are kept so the table indexes by sector number.
pub(crate) fn read_fat(
    reader: &mut ByteReader,
    difat: &[u32],
    sector_size: u32,
) -> Result<Vec<u32>, OleError> {
    let mut fat = Vec::new();
    for fat_sector in difat {
        let sector_result = read_sector(reader, *fat_sector, sector_size);
        let sector = match sector_result {
            Ok(result) => result,
            Err(err) => {
                error!("[ole] Could not read FAT sector {fat_sector}: {err:?}");
                return Err(OleError::ReadError);
            }
        };

        let entries_result = sector_entries(&sector);
        let (_, entries) = match entries_result {
            Ok(result) => result,
            Err(_err) => {
                error!("[ole] Could not parse FAT sector {fat_sector}");
                return Err(OleError::CorruptChain);
            }
        };
        fat.extend(entries);
    }

    Ok(fat)
}

/// Follow a chain from `start` through the FAT (or miniFAT) until
/// `ENDOFCHAIN`. Any revisited or out-of-range sector is corruption.
pub(crate) fn follow_chain(table: &[u32], start: u32) -> Result<Vec<u32>, OleError> {
    let mut sectors = Vec::new();
    if start == SECTOR_END_OF_CHAIN || start == SECTOR_FREE {
        return Ok(sectors);
    }

    let mut seen: HashSet<u32> = HashSet::new();
    let mut current = start;
    while current != SECTOR_END_OF_CHAIN {
        if current == SECTOR_FREE || current == SECTOR_FAT || current == SECTOR_DIFAT {
            error!("[ole] Chain from {start} ran into sentinel sector {current:#x}");
            return Err(OleError::CorruptChain);
        }
        if current as usize >= table.len() {
            error!(
                "[ole] Chain from {start} points past the allocation table: {current} >= {}",
                table.len()
            );
            return Err(OleError::CorruptChain);
        }
        if !seen.insert(current) {
            error!("[ole] Chain from {start} revisited sector {current}");
            return Err(OleError::CorruptChain);
        }

        sectors.push(current);
        current = table[current as usize];
    }

    Ok(sectors)
}

/// Read one whole sector
pub(crate) fn read_sector(
    reader: &mut ByteReader,
    sector: u32,
    sector_size: u32,
) -> Result<Vec<u8>, crate::filesystem::error::FileSystemError> {
    reader.read_at(sector_offset(sector, sector_size), sector_size as usize)
}

/// Split a sector into its dword chain entries
fn sector_entries(data: &[u8]) -> nom::IResult<&[u8], Vec<u32>> {
    let mut input = data;
    let mut entries = Vec::new();
    while !input.is_empty() {
        let (remaining, entry) = nom_unsigned_four_bytes(input, Endian::Le)?;
        entries.push(entry);
        input = remaining;
    }
    Ok((input, entries))
}
