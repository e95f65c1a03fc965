use super::{
    directory::{compare_names, parse_directory, DirectoryEntry, DirectoryType, NO_ENTRY},
    error::OleError,
    fat::{collect_difat, follow_chain, read_fat, read_sector},
    header::{sector_offset, OleHeader},
    minifat::read_minifat,
};
use crate::filesystem::reader::ByteReader;
use log::error;

/// A parsed OLE compound file. Owns the allocation tables and directory;
/// stream payloads are fetched on demand with positioned reads.
#[derive(Debug)]
pub(crate) struct OleFile {
    pub(crate) header: OleHeader,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    pub(crate) directory: Vec<DirectoryEntry>,
    /**Sector chain of the ministream, anchored at the Root entry */
    ministream: Vec<u32>,
}

impl OleFile {
    /// Parse header, allocation tables, and directory of an OLE compound file
    pub(crate) fn parse(reader: &mut ByteReader) -> Result<OleFile, OleError> {
        let header_size = 512;
        let header_result = reader.read_at(0, header_size);
        let header_data = match header_result {
            Ok(result) => result,
            Err(err) => {
                error!("[ole] Could not read OLE header from {}: {err:?}", reader.path());
                return Err(OleError::ReadError);
            }
        };
        let header = OleHeader::parse_header(&header_data)?;

        let difat = collect_difat(reader, &header)?;
        let fat = read_fat(reader, &difat, header.sector_size)?;
        let minifat = read_minifat(reader, &fat, &header)?;

        let directory_chain = follow_chain(&fat, header.first_directory_sector)?;
        let mut directory_data = Vec::new();
        for sector in directory_chain {
            let sector_result = read_sector(reader, sector, header.sector_size);
            let mut sector_data = match sector_result {
                Ok(result) => result,
                Err(err) => {
                    error!("[ole] Could not read directory sector {sector}: {err:?}");
                    return Err(OleError::ReadError);
                }
            };
            directory_data.append(&mut sector_data);
        }

        let directory = parse_directory(&directory_data, header.major_version)?;
        let root = match directory.first() {
            Some(entry) if entry.entry_type == DirectoryType::Root => entry,
            _ => {
                error!("[ole] First directory entry is not the Root");
                return Err(OleError::BadDirectory);
            }
        };

        let ministream = follow_chain(&fat, root.start_sector)?;

        Ok(OleFile {
            header,
            fat,
            minifat,
            directory,
            ministream,
        })
    }

    /// Assemble the stream behind a directory entry, truncated to its
    /// declared size. Small streams come out of the ministream
    pub(crate) fn stream(
        &self,
        reader: &mut ByteReader,
        index: usize,
    ) -> Result<Vec<u8>, OleError> {
        let entry = match self.directory.get(index) {
            Some(result) => result,
            None => {
                error!("[ole] No directory entry at {index}");
                return Err(OleError::BadDirectory);
            }
        };

        let empty = 0;
        if entry.size == empty {
            return Ok(Vec::new());
        }

        let mut data = Vec::new();
        if entry.size >= self.header.mini_cutoff as u64 || entry.entry_type == DirectoryType::Root
        {
            let chain = follow_chain(&self.fat, entry.start_sector)?;
            for sector in chain {
                let sector_result = read_sector(reader, sector, self.header.sector_size);
                let mut sector_data = match sector_result {
                    Ok(result) => result,
                    Err(err) => {
                        error!(
                            "[ole] Could not read sector {sector} of stream {}: {err:?}",
                            entry.name
                        );
                        return Err(OleError::ReadError);
                    }
                };
                data.append(&mut sector_data);
            }
        } else {
            let chain = follow_chain(&self.minifat, entry.start_sector)?;
            for mini_sector in chain {
                let mut mini_data = self.read_mini_sector(reader, mini_sector)?;
                data.append(&mut mini_data);
            }
        }

        if data.len() < entry.size as usize {
            error!(
                "[ole] Stream {} assembled {} bytes but declares {}",
                entry.name,
                data.len(),
                entry.size
            );
            return Err(OleError::CorruptChain);
        }

        data.truncate(entry.size as usize);
        Ok(data)
    }

    /// Locate a mini sector inside the ministream and read it
    fn read_mini_sector(
        &self,
        reader: &mut ByteReader,
        mini_sector: u32,
    ) -> Result<Vec<u8>, OleError> {
        let mini_size = self.header.mini_sector_size;
        let position = mini_sector as u64 * mini_size as u64;
        let host_index = (position / self.header.sector_size as u64) as usize;
        let host_offset = position % self.header.sector_size as u64;

        let host_sector = match self.ministream.get(host_index) {
            Some(result) => *result,
            None => {
                error!("[ole] Mini sector {mini_sector} points past the ministream");
                return Err(OleError::CorruptChain);
            }
        };

        let offset = sector_offset(host_sector, self.header.sector_size) + host_offset;
        let read_result = reader.read_at(offset, mini_size as usize);
        match read_result {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("[ole] Could not read mini sector {mini_sector}: {err:?}");
                Err(OleError::ReadError)
            }
        }
    }

    /// Find a stream by name by descending the red-black sibling tree
    /// under the Root entry
    pub(crate) fn stream_by_name(&self, name: &str) -> Option<usize> {
        let root = self.directory.first()?;
        let mut current = root.child;

        // A well-formed tree is at most directory-sized deep
        let mut remaining = self.directory.len();
        while current != NO_ENTRY && remaining > 0 {
            let entry = self.directory.get(current as usize)?;
            match compare_names(name, &entry.name) {
                std::cmp::Ordering::Equal => return Some(current as usize),
                std::cmp::Ordering::Less => current = entry.left,
                std::cmp::Ordering::Greater => current = entry.right,
            }
            remaining -= 1;
        }

        None
    }

    /// Directory indexes of all Stream entries, in directory order
    pub(crate) fn stream_entries(&self) -> Vec<usize> {
        let mut streams = Vec::new();
        for (index, entry) in self.directory.iter().enumerate() {
            if entry.entry_type != DirectoryType::Stream {
                continue;
            }
            streams.push(index);
        }
        streams
    }
}
