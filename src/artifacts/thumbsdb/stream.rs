use super::{error::ThumbsDbError, jfif::reconstruct_type1};
use crate::utils::nom_helper::{nom_unsigned_four_bytes, Endian};
use log::warn;

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum ThumbKind {
    /**Raw "YMCA" scan data rebuilt into a CMYK JPEG */
    Type1,
    /**Complete JFIF payload */
    Type2,
}

#[derive(Debug)]
pub(crate) struct DecodedStream {
    pub(crate) kind: ThumbKind,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

/**First header length used by Windows 98 through XP betas */
const HEADER_GEN_A: u32 = 0x0c;
/**First header length used by XP and Server 2003 */
const HEADER_GEN_B: u32 = 0x18;

const SOI: [u8; 2] = [0xff, 0xd8];
const EOI: [u8; 2] = [0xff, 0xd9];

/// Decode one non-Catalog Thumbs.db stream into image bytes
pub(crate) fn decode_stream(data: &[u8]) -> Result<DecodedStream, ThumbsDbError> {
    let result = stream_header(data);
    match result {
        Ok((_, decoded)) => decoded,
        Err(_err) => {
            warn!("[thumbsdb] Stream too short for its header");
            Err(ThumbsDbError::UnknownHeader)
        }
    }
}

type StreamResult = Result<DecodedStream, ThumbsDbError>;

fn stream_header(data: &[u8]) -> nom::IResult<&[u8], StreamResult> {
    let (input, header_length) = nom_unsigned_four_bytes(data, Endian::Le)?;

    match header_length {
        HEADER_GEN_A => {
            let (input, _header2_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, _revision) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, image_type) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, width) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, height) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (payload, payload_length) = nom_unsigned_four_bytes(input, Endian::Le)?;

            if payload_length as usize != payload.len() {
                warn!(
                    "[thumbsdb] Stream declares {payload_length} payload bytes but has {}",
                    payload.len()
                );
                return Ok((payload, Err(ThumbsDbError::EntryLengthMismatch)));
            }

            let type_one = 1;
            let type_two = 2;
            if image_type == type_one {
                let image = reconstruct_type1(payload, width, height);
                let decoded = DecodedStream {
                    kind: ThumbKind::Type1,
                    width,
                    height,
                    data: image,
                };
                return Ok((payload, Ok(decoded)));
            } else if image_type == type_two {
                return Ok((payload, finish_type2(payload, width, height)));
            }

            warn!("[thumbsdb] Unknown stream image type {image_type}");
            Ok((payload, Err(ThumbsDbError::UnknownType)))
        }
        HEADER_GEN_B => {
            let (input, _header2_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, width) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, height) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (input, payload_length) = nom_unsigned_four_bytes(input, Endian::Le)?;
            let (payload, _checksum) = nom_unsigned_four_bytes(input, Endian::Le)?;

            if payload_length as usize != payload.len() {
                warn!(
                    "[thumbsdb] Stream declares {payload_length} payload bytes but has {}",
                    payload.len()
                );
                return Ok((payload, Err(ThumbsDbError::EntryLengthMismatch)));
            }

            Ok((payload, finish_type2(payload, width, height)))
        }
        _ => {
            warn!("[thumbsdb] Unknown stream header length {header_length:#x}");
            Ok((input, Err(ThumbsDbError::UnknownHeader)))
        }
    }
}

/// Type 2 payloads are complete JFIF images. Verify framing and pass through
fn finish_type2(payload: &[u8], width: u32, height: u32) -> StreamResult {
    if !payload.starts_with(&SOI) || !payload.ends_with(&EOI) {
        warn!("[thumbsdb] Type 2 payload missing JFIF framing");
        return Err(ThumbsDbError::MissingEoi);
    }

    Ok(DecodedStream {
        kind: ThumbKind::Type2,
        width,
        height,
        data: payload.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_stream, ThumbKind};
    use crate::artifacts::thumbsdb::error::ThumbsDbError;

    pub(crate) fn build_jfif(filler: usize) -> Vec<u8> {
        let mut image = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
        image.extend_from_slice(b"JFIF\0");
        image.extend_from_slice(&[1, 1, 1, 0, 96, 0, 96, 0, 0]);
        // COM segment soaks up the requested filler
        image.extend_from_slice(&[0xff, 0xfe]);
        image.extend_from_slice(&((filler + 2) as u16).to_be_bytes());
        image.extend(std::iter::repeat(0x20).take(filler));
        image.extend_from_slice(&[0xff, 0xd9]);
        image
    }

    pub(crate) fn build_gen_a(image_type: u32, width: u32, height: u32, payload: &[u8]) -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(&0x0cu32.to_le_bytes());
        stream.extend_from_slice(&0x10u32.to_le_bytes());
        stream.extend_from_slice(&1u32.to_le_bytes());
        stream.extend_from_slice(&image_type.to_le_bytes());
        stream.extend_from_slice(&width.to_le_bytes());
        stream.extend_from_slice(&height.to_le_bytes());
        stream.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        stream.extend_from_slice(payload);
        stream
    }

    pub(crate) fn build_gen_b(width: u32, height: u32, payload: &[u8]) -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(&0x18u32.to_le_bytes());
        stream.extend_from_slice(&0x18u32.to_le_bytes());
        stream.extend_from_slice(&width.to_le_bytes());
        stream.extend_from_slice(&height.to_le_bytes());
        stream.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        stream.extend_from_slice(&0u32.to_le_bytes());
        stream.extend_from_slice(payload);
        stream
    }

    #[test]
    fn test_decode_stream_type2() {
        let payload = build_jfif(64);
        let stream = build_gen_a(2, 96, 64, &payload);

        let result = decode_stream(&stream).unwrap();
        assert_eq!(result.kind, ThumbKind::Type2);
        assert_eq!(result.width, 96);
        assert_eq!(result.height, 64);
        assert_eq!(result.data, payload);
    }

    #[test]
    fn test_decode_stream_type1() {
        let payload = [0x42; 256];
        let stream = build_gen_a(1, 96, 96, &payload);

        let result = decode_stream(&stream).unwrap();
        assert_eq!(result.kind, ThumbKind::Type1);
        assert!(result.data.starts_with(&[0xff, 0xd8]));
        assert!(result.data.ends_with(&[0xff, 0xd9]));
    }

    #[test]
    fn test_decode_stream_gen_b() {
        let payload = build_jfif(32);
        let stream = build_gen_b(96, 96, &payload);

        let result = decode_stream(&stream).unwrap();
        assert_eq!(result.kind, ThumbKind::Type2);
        assert_eq!(result.data, payload);
    }

    #[test]
    fn test_decode_stream_length_mismatch() {
        let payload = build_jfif(32);
        let mut stream = build_gen_b(96, 96, &payload);
        stream.push(0); // extra byte the header does not declare

        let result = decode_stream(&stream);
        assert_eq!(result.unwrap_err(), ThumbsDbError::EntryLengthMismatch);
    }

    #[test]
    fn test_decode_stream_missing_eoi() {
        let mut payload = build_jfif(32);
        let last = payload.len() - 1;
        payload[last] = 0;
        let stream = build_gen_b(96, 96, &payload);

        let result = decode_stream(&stream);
        assert_eq!(result.unwrap_err(), ThumbsDbError::MissingEoi);
    }

    #[test]
    fn test_decode_stream_unknown_header() {
        let stream = [0x99u32.to_le_bytes(), [0; 4]].concat();
        let result = decode_stream(&stream);
        assert_eq!(result.unwrap_err(), ThumbsDbError::UnknownHeader);
    }
}
