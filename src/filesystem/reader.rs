use super::{
    error::FileSystemError,
    files::{file_reader, get_file_size},
};
use log::error;
use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
};

/// Positioned-read view over a single input file. Owns the handle for the
/// lifetime of one parse; nothing reads the whole file into memory.
pub(crate) struct ByteReader {
    file: File,
    path: String,
    size: u64,
    /**Beta OLE signature seen. Every byte after the 8-byte signature is stored XOR 0xFF */
    inverted: bool,
}

impl ByteReader {
    /// Open a file for positioned reads
    pub(crate) fn open(path: &str) -> Result<ByteReader, FileSystemError> {
        let file = file_reader(path)?;
        Ok(ByteReader {
            file,
            path: path.to_string(),
            size: get_file_size(path),
            inverted: false,
        })
    }

    /// Read exactly `len` bytes starting at `offset`
    pub(crate) fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, FileSystemError> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.size => {}
            _ => return Err(FileSystemError::OutOfBounds),
        }

        if let Err(err) = self.file.seek(SeekFrom::Start(offset)) {
            error!("[reader] Failed to seek {} to {offset}: {err:?}", self.path);
            return Err(FileSystemError::ReadFile);
        }

        let mut buffer = vec![0u8; len];
        if let Err(err) = self.file.read_exact(&mut buffer) {
            error!(
                "[reader] Failed to read {len} bytes at {offset} from {}: {err:?}",
                self.path
            );
            return Err(FileSystemError::ReadFile);
        }

        if self.inverted {
            let signature_size = 8;
            for (index, value) in buffer.iter_mut().enumerate() {
                if offset + index as u64 >= signature_size {
                    *value ^= 0xff;
                }
            }
        }

        Ok(buffer)
    }

    /// Flip byte inversion for beta OLE containers
    pub(crate) fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::ByteReader;
    use crate::filesystem::error::FileSystemError;
    use std::path::PathBuf;

    #[test]
    fn test_read_at() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        let mut reader = ByteReader::open(&test_location.display().to_string()).unwrap();

        let result = reader.read_at(1, 7).unwrap();
        assert_eq!(result, b"package");
    }

    #[test]
    fn test_read_at_out_of_bounds() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        let mut reader = ByteReader::open(&test_location.display().to_string()).unwrap();

        let result = reader.read_at(reader.size(), 1);
        assert_eq!(result, Err(FileSystemError::OutOfBounds));
    }

    #[test]
    fn test_inverted() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        let mut reader = ByteReader::open(&test_location.display().to_string()).unwrap();
        reader.set_inverted(true);

        let plain = b"package";
        let result = reader.read_at(1, 7).unwrap();
        for (index, value) in result.iter().enumerate() {
            if index as u64 + 1 >= 8 {
                assert_eq!(*value, plain[index] ^ 0xff);
            } else {
                assert_eq!(*value, plain[index]);
            }
        }
    }
}
