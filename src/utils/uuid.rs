use log::warn;
use uuid::Uuid;

/// Convert little endian bytes to a UUID/GUID string
pub(crate) fn format_guid_le_bytes(data: &[u8]) -> String {
    let guid_size = 16;
    if data.len() != guid_size {
        warn!(
            "[uuid] Provided little endian data does not meet GUID size of 16 bytes, got: {}",
            data.len()
        );
        return format!("Not a GUID/UUID: {data:?}");
    }

    let guid_data = data.try_into();
    match guid_data {
        Ok(result) => Uuid::from_bytes_le(result).hyphenated().to_string(),
        Err(_err) => {
            warn!("[uuid] Could not convert little endian bytes to a GUID/UUID format: {data:?}");
            format!("Could not convert data: {data:?}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format_guid_le_bytes;

    #[test]
    fn test_format_guid_le_bytes() {
        let test_data = [
            17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17,
        ];
        let guid = format_guid_le_bytes(&test_data);
        assert_eq!(guid, "11111111-1111-1111-1111-111111111111");
    }

    #[test]
    fn test_format_guid_le_bytes_zero() {
        let test_data = [0; 16];
        let guid = format_guid_le_bytes(&test_data);
        assert_eq!(guid, "00000000-0000-0000-0000-000000000000");
    }
}
