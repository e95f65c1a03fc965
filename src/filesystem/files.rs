use super::error::FileSystemError;
use log::error;
use md5::{Digest, Md5};
use std::{
    fs::File,
    io::Read,
    path::Path,
};

/// Check if path is a file
pub(crate) fn is_file(path: &str) -> bool {
    let file = Path::new(path);
    if file.is_file() {
        return true;
    }
    false
}

/// Create a `File` object that can be used to read a file
pub(crate) fn file_reader(path: &str) -> Result<File, FileSystemError> {
    if !is_file(path) {
        return Err(FileSystemError::NotFile);
    }

    let read_result = File::open(path);
    let reader = match read_result {
        Ok(result) => result,
        Err(err) => {
            error!("[files] Failed to open file {path}: {err:?}");
            return Err(FileSystemError::OpenFile);
        }
    };

    Ok(reader)
}

/// Get the file size
pub(crate) fn get_file_size(path: &str) -> u64 {
    if !is_file(path) {
        return 0;
    }

    let meta = std::fs::metadata(path);
    match meta {
        Ok(result) => result.len(),
        Err(err) => {
            error!("[files] Failed to get file size: {err:?}");
            0
        }
    }
}

/// Get last component of provided path. Will be filename or empty string if final component cannot be determined
pub(crate) fn get_filename(path: &str) -> String {
    if !path.contains(['/', '\\']) {
        return path.to_string();
    }

    let entry_opt = if path.contains('/') {
        path.rsplit_once('/')
    } else {
        path.rsplit_once('\\')
    };

    let (_, name) = entry_opt.unwrap_or_default();
    name.to_string()
}

/// Get the extension of a file if any
pub(crate) fn file_extension(path: &str) -> String {
    let file = Path::new(path);
    let extension_osstr = file.extension();

    let extension = match extension_osstr {
        Some(result) => result.to_str().unwrap_or(""),
        _ => "",
    };
    extension.to_string()
}

/// MD5 a file in chunks, skipping files larger than `max_size` bytes
pub(crate) fn md5_file(path: &str, max_size: u64) -> Option<String> {
    if !is_file(path) || get_file_size(path) > max_size {
        return None;
    }

    let reader_result = file_reader(path);
    let mut reader = match reader_result {
        Ok(result) => result,
        Err(err) => {
            error!("[files] Failed to open file {path} for hashing: {err:?}");
            return None;
        }
    };

    let mut md5 = Md5::new();
    loop {
        let temp_buff_size = 65536;
        let mut temp_buff: Vec<u8> = vec![0u8; temp_buff_size];
        let bytes_result = reader.read(&mut temp_buff);
        let bytes = match bytes_result {
            Ok(result) => result,
            Err(err) => {
                error!("[files] Failed to read file {path} for hashing: {err:?}");
                return None;
            }
        };
        let finished = 0;
        if bytes == finished {
            break;
        }

        md5.update(&temp_buff[0..bytes]);
    }

    let hash = md5.finalize();
    Some(format!("{hash:x}"))
}

#[cfg(test)]
mod tests {
    use super::{file_extension, file_reader, get_file_size, get_filename, is_file, md5_file};
    use std::path::PathBuf;

    #[test]
    fn test_is_file() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        assert_eq!(is_file(&test_location.display().to_string()), true);
    }

    #[test]
    fn test_file_reader() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        let _reader = file_reader(&test_location.display().to_string()).unwrap();
    }

    #[test]
    fn test_get_file_size() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        assert!(get_file_size(&test_location.display().to_string()) > 10);
    }

    #[test]
    fn test_get_filename() {
        assert_eq!(get_filename("/tmp/thumbcache_256.db"), "thumbcache_256.db");
        assert_eq!(
            get_filename("C:\\Users\\x\\Thumbs.db"),
            "Thumbs.db"
        );
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("/tmp/thumbcache_256.db"), "db");
    }

    #[test]
    fn test_md5_file() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        let result = md5_file(&test_location.display().to_string(), 2147483648).unwrap();
        assert_eq!(result.len(), 32);
    }

    #[test]
    fn test_md5_file_too_large() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("Cargo.toml");
        assert!(md5_file(&test_location.display().to_string(), 1).is_none());
    }
}
