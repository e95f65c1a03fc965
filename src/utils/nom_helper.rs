use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32, be_u64, be_u8, le_u16, le_u32, le_u64, le_u8};

pub(crate) enum Endian {
    /**Little Endian */
    Le,
    /**Big Endian */
    Be,
}

/// Nom one (1) unsigned byte
pub(crate) fn nom_unsigned_one_byte(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u8> {
    match endian {
        Endian::Le => le_u8(data),
        Endian::Be => be_u8(data),
    }
}

/// Nom two (2) unsigned bytes
pub(crate) fn nom_unsigned_two_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u16> {
    match endian {
        Endian::Le => le_u16(data),
        Endian::Be => be_u16(data),
    }
}

/// Nom four (4) unsigned bytes
pub(crate) fn nom_unsigned_four_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u32> {
    match endian {
        Endian::Le => le_u32(data),
        Endian::Be => be_u32(data),
    }
}

/// Nom eight (8) unsigned bytes
pub(crate) fn nom_unsigned_eight_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u64> {
    match endian {
        Endian::Le => le_u64(data),
        Endian::Be => be_u64(data),
    }
}

/// Nom bytes based on provided size
pub(crate) fn nom_data(data: &[u8], size: u64) -> nom::IResult<&[u8], &[u8]> {
    take(size)(data)
}

#[cfg(test)]
mod tests {
    use super::{
        nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes, nom_unsigned_one_byte,
        nom_unsigned_two_bytes, Endian,
    };

    #[test]
    fn test_nom_unsigned_one_byte() {
        let test = [1];
        let (_, result) = nom_unsigned_one_byte(&test, Endian::Le).unwrap();
        assert_eq!(result, 1);
    }

    #[test]
    fn test_nom_unsigned_two_bytes() {
        let test = [1, 0];
        let (_, result) = nom_unsigned_two_bytes(&test, Endian::Le).unwrap();
        assert_eq!(result, 1);
    }

    #[test]
    fn test_nom_unsigned_four_bytes() {
        let test = [0, 16, 0, 0];
        let (_, result) = nom_unsigned_four_bytes(&test, Endian::Le).unwrap();
        assert_eq!(result, 4096);
    }

    #[test]
    fn test_nom_unsigned_eight_bytes() {
        let test = [128, 112, 111, 94, 77, 60, 43, 26];
        let (_, result) = nom_unsigned_eight_bytes(&test, Endian::Le).unwrap();
        assert_eq!(result, 0x1a2b3c4d5e6f7080);
    }

    #[test]
    fn test_nom_unsigned_two_bytes_be() {
        let test = [0, 96];
        let (_, result) = nom_unsigned_two_bytes(&test, Endian::Be).unwrap();
        assert_eq!(result, 96);
    }

    #[test]
    fn test_nom_data() {
        let test = [1, 2, 3, 4];
        let (remaining, result) = nom_data(&test, 2).unwrap();
        assert_eq!(result, [1, 2]);
        assert_eq!(remaining, [3, 4]);
    }
}
