/// Type 1 streams carry JPEG entropy-coded sample planes with no JFIF
/// framing. The planes are inverted CMY plus alpha, stored Y-M-C (the
/// "YMCA" layout). Wrapping the scan in standard markers with synthesized
/// quantization and Huffman tables is enough for a conformant decoder to
/// consume it as a four-channel CMYK image; the alpha plane is declared as
/// K so the original visual intent survives.

const MARKER_SOI: [u8; 2] = [0xff, 0xd8];
const MARKER_EOI: [u8; 2] = [0xff, 0xd9];
const MARKER_APP0: u8 = 0xe0;
const MARKER_APP14: u8 = 0xee;
const MARKER_DQT: u8 = 0xdb;
const MARKER_DHT: u8 = 0xc4;
const MARKER_SOF0: u8 = 0xc0;
const MARKER_SOS: u8 = 0xda;

/// Annex K luminance quantization table, zig-zag order
const QUANT_LUMINANCE: [u8; 64] = [
    16, 11, 12, 14, 12, 10, 16, 14, 13, 14, 18, 17, 16, 19, 24, 40, 26, 24, 22, 22, 24, 49, 35,
    37, 29, 40, 58, 51, 61, 60, 57, 51, 56, 55, 64, 72, 92, 78, 64, 68, 87, 69, 55, 56, 80, 109,
    81, 87, 95, 98, 103, 104, 103, 62, 77, 113, 121, 112, 100, 120, 92, 101, 103, 99,
];

/// Annex K chrominance quantization table, zig-zag order
const QUANT_CHROMINANCE: [u8; 64] = [
    17, 18, 18, 24, 21, 24, 47, 26, 26, 47, 99, 66, 56, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Annex K DC luminance Huffman table: code counts then symbol values
const HUFFMAN_DC_LUMINANCE: ([u8; 16], &[u8]) = (
    [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
    &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
);

const HUFFMAN_DC_CHROMINANCE: ([u8; 16], &[u8]) = (
    [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
    &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
);

const HUFFMAN_AC_LUMINANCE: ([u8; 16], &[u8]) = (
    [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d],
    &[
        0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61,
        0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52,
        0xd1, 0xf0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25,
        0x26, 0x27, 0x28, 0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45,
        0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64,
        0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83,
        0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99,
        0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6,
        0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3,
        0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8,
        0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
    ],
);

const HUFFMAN_AC_CHROMINANCE: ([u8; 16], &[u8]) = (
    [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77],
    &[
        0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61,
        0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33,
        0x52, 0xf0, 0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18,
        0x19, 0x1a, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44,
        0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63,
        0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a,
        0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97,
        0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4,
        0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca,
        0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7,
        0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
    ],
);

/// Wrap a Type 1 scan body in a complete four-component CMYK JPEG
pub(crate) fn reconstruct_type1(scan: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut image = Vec::new();
    image.extend_from_slice(&MARKER_SOI);

    // APP0/JFIF version 1.01, 96x96 dots per inch
    let jfif = [
        b'J', b'F', b'I', b'F', 0, 1, 1, 1, 0, 96, 0, 96, 0, 0,
    ];
    push_segment(&mut image, MARKER_APP0, &jfif);

    // APP14/Adobe with color transform 0: components are plain CMYK
    let adobe = [b'A', b'd', b'o', b'b', b'e', 0, 100, 0, 0, 0, 0, 0];
    push_segment(&mut image, MARKER_APP14, &adobe);

    push_quantization(&mut image, 0, &QUANT_LUMINANCE);
    push_quantization(&mut image, 1, &QUANT_CHROMINANCE);

    let dc_class = 0;
    let ac_class = 1;
    push_huffman(&mut image, dc_class, 0, &HUFFMAN_DC_LUMINANCE);
    push_huffman(&mut image, ac_class, 0, &HUFFMAN_AC_LUMINANCE);
    push_huffman(&mut image, dc_class, 1, &HUFFMAN_DC_CHROMINANCE);
    push_huffman(&mut image, ac_class, 1, &HUFFMAN_AC_CHROMINANCE);

    // SOF0: four components at 1x1 sampling, quantization selectors 0,1,1,0.
    // Source plane order Y-M-C-A maps onto component ids 1..4 as C,M,Y,K
    let mut frame = Vec::new();
    let precision = 8;
    frame.push(precision);
    frame.extend_from_slice(&(height as u16).to_be_bytes());
    frame.extend_from_slice(&(width as u16).to_be_bytes());
    let components: [(u8, u8); 4] = [(1, 0), (2, 1), (3, 1), (4, 0)];
    frame.push(components.len() as u8);
    for (id, quant_table) in components {
        let sampling = 0x11;
        frame.push(id);
        frame.push(sampling);
        frame.push(quant_table);
    }
    push_segment(&mut image, MARKER_SOF0, &frame);

    // SOS over all four components, Huffman selectors matching SOF order
    let mut start_of_scan = Vec::new();
    let tables: [(u8, u8); 4] = [(1, 0x00), (2, 0x11), (3, 0x11), (4, 0x00)];
    start_of_scan.push(tables.len() as u8);
    for (id, selector) in tables {
        start_of_scan.push(id);
        start_of_scan.push(selector);
    }
    let spectral_start = 0;
    let spectral_end = 63;
    let approximation = 0;
    start_of_scan.push(spectral_start);
    start_of_scan.push(spectral_end);
    start_of_scan.push(approximation);
    push_segment(&mut image, MARKER_SOS, &start_of_scan);

    image.extend_from_slice(scan);
    image.extend_from_slice(&MARKER_EOI);
    image
}

/// Append a marker segment with its two-byte length
fn push_segment(image: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    image.push(0xff);
    image.push(marker);
    let length_field = 2;
    image.extend_from_slice(&((payload.len() + length_field) as u16).to_be_bytes());
    image.extend_from_slice(payload);
}

fn push_quantization(image: &mut Vec<u8>, table_id: u8, table: &[u8; 64]) {
    let mut payload = Vec::new();
    payload.push(table_id);
    payload.extend_from_slice(table);
    push_segment(image, MARKER_DQT, &payload);
}

fn push_huffman(image: &mut Vec<u8>, class: u8, table_id: u8, table: &([u8; 16], &[u8])) {
    let mut payload = Vec::new();
    payload.push((class << 4) | table_id);
    payload.extend_from_slice(&table.0);
    payload.extend_from_slice(table.1);
    push_segment(image, MARKER_DHT, &payload);
}
