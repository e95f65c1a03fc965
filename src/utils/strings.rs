use crate::utils::encoding::base64_encode_standard;
use log::warn;

/// Get a UTF16 string from provided bytes data
pub(crate) fn extract_utf16_string(data: &[u8]) -> String {
    let mut utf16_data: Vec<u16> = Vec::new();
    let min_byte_size = 2;
    for wide_char in data.chunks(min_byte_size) {
        if wide_char == [0, 0] || wide_char.len() < min_byte_size {
            break;
        }

        utf16_data.push(u16::from_le_bytes([wide_char[0], wide_char[1]]));
    }

    let utf16_result = String::from_utf16(&utf16_data);
    match utf16_result {
        Ok(results) => results.trim_end_matches('\0').to_string(),
        Err(err) => {
            warn!("[strings] Failed to get UTF16 string: {err:?}");
            format!("Failed to get UTF16: {}", base64_encode_standard(data))
        }
    }
}

/// Get a UTF8 string from provided bytes data
pub(crate) fn extract_utf8_string(data: &[u8]) -> String {
    let utf8_result = String::from_utf8(data.to_vec());
    match utf8_result {
        Ok(result) => result.trim_end_matches('\0').to_string(),
        Err(err) => {
            warn!("[strings] Failed to get UTF8 string: {err:?}");
            format!("Failed to get UTF8 string: {}", base64_encode_standard(data))
        }
    }
}

/// Replace characters Windows and Unix filesystems reject in file names
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.replace(['\\', '/', ':', '*', '?', '"', '<', '>', '|'], "_")
}

#[cfg(test)]
mod tests {
    use super::{extract_utf16_string, extract_utf8_string, sanitize_filename};

    #[test]
    fn test_extract_utf16_string() {
        let test_data = vec![
            112, 0, 104, 0, 111, 0, 116, 0, 111, 0, 46, 0, 106, 0, 112, 0, 103, 0, 0, 0,
        ];
        assert_eq!(extract_utf16_string(&test_data), "photo.jpg")
    }

    #[test]
    fn test_extract_utf16_string_no_terminator() {
        let test_data = vec![50, 0, 53, 0, 54, 0];
        assert_eq!(extract_utf16_string(&test_data), "256")
    }

    #[test]
    fn test_extract_utf8_string() {
        let test_data = vec![67, 77, 77, 77, 0];
        assert_eq!(extract_utf8_string(&test_data), "CMMM")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("C:\\Users\\x\\a.png"), "C__Users_x_a.png");
        assert_eq!(sanitize_filename("what?.jpg"), "what_.jpg");
    }
}
