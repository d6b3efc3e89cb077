//! Builders for synthetic container streams shared by the integration tests
#![allow(dead_code)]

pub fn syncsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

// ---------------------------------------------------------------- ID3v2

pub fn id3_tag(version: u8, body: &[u8]) -> Vec<u8> {
    let mut tag = b"ID3".to_vec();
    tag.extend_from_slice(&[version, 0, 0]);
    tag.extend_from_slice(&syncsafe(body.len() as u32));
    tag.extend_from_slice(body);
    tag
}

/// v2.3 frame (plain 32-bit size)
pub fn v3_frame(id: &str, payload: &[u8]) -> Vec<u8> {
    let mut frame = id.as_bytes().to_vec();
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(payload);
    frame
}

/// v2.4 frame (syncsafe size)
pub fn v4_frame(id: &str, payload: &[u8]) -> Vec<u8> {
    let mut frame = id.as_bytes().to_vec();
    frame.extend_from_slice(&syncsafe(payload.len() as u32));
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(payload);
    frame
}

/// v2.2 frame (3-byte id and size)
pub fn v2_frame(id: &str, payload: &[u8]) -> Vec<u8> {
    let mut frame = id.as_bytes().to_vec();
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
    frame.extend_from_slice(payload);
    frame
}

/// Latin-1 text frame payload
pub fn latin1(text: &str) -> Vec<u8> {
    let mut payload = vec![0];
    payload.extend(text.chars().map(|c| c as u8));
    payload
}

// ---------------------------------------------------------------- FLAC

pub fn vorbis_comments(vendor: &str, entries: &[&str]) -> Vec<u8> {
    let mut block = (vendor.len() as u32).to_le_bytes().to_vec();
    block.extend_from_slice(vendor.as_bytes());
    block.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        block.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        block.extend_from_slice(entry.as_bytes());
    }
    block
}

pub fn flac_stream_info(sample_rate: u32, channels: u8, bits: u8, samples: u64) -> Vec<u8> {
    let mut block = vec![0x10, 0x00, 0x10, 0x00, 0, 0, 0x0E, 0, 0x20, 0];
    let packed = (u64::from(sample_rate) << 44)
        | (u64::from(channels - 1) << 41)
        | (u64::from(bits - 1) << 36)
        | samples;
    block.extend_from_slice(&packed.to_be_bytes());
    block.extend_from_slice(&[0u8; 16]);
    block
}

pub fn flac_picture(mime: &str, data: &[u8]) -> Vec<u8> {
    let mut block = 3u32.to_be_bytes().to_vec();
    block.extend_from_slice(&(mime.len() as u32).to_be_bytes());
    block.extend_from_slice(mime.as_bytes());
    block.extend_from_slice(&5u32.to_be_bytes());
    block.extend_from_slice(b"front");
    block.extend_from_slice(&[0u8; 16]);
    block.extend_from_slice(&(data.len() as u32).to_be_bytes());
    block.extend_from_slice(data);
    block
}

/// `fLaC` followed by the blocks; the last one carries the is-last bit
pub fn flac(blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    for (i, (block_type, payload)) in blocks.iter().enumerate() {
        let last = if i + 1 == blocks.len() { 0x80 } else { 0 };
        data.push(last | block_type);
        data.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        data.extend_from_slice(payload);
    }
    data
}

// ---------------------------------------------------------------- Ogg

pub const CONTINUED: u8 = 0x01;
pub const BOS: u8 = 0x02;
pub const EOS: u8 = 0x04;

/// Lacing values for one complete packet
pub fn lacing(len: usize) -> Vec<u8> {
    let mut segments = vec![255u8; len / 255];
    segments.push((len % 255) as u8);
    segments
}

pub fn ogg_page(header_type: u8, granule: u64, serial: u32, sequence: u32, segments: &[u8], data: &[u8]) -> Vec<u8> {
    let mut page = b"OggS".to_vec();
    page.push(0);
    page.push(header_type);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&serial.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&[0u8; 4]);
    page.push(segments.len() as u8);
    page.extend_from_slice(segments);
    page.extend_from_slice(data);
    page
}

/// Page holding exactly one complete packet
pub fn ogg_packet_page(header_type: u8, granule: u64, serial: u32, sequence: u32, packet: &[u8]) -> Vec<u8> {
    ogg_page(header_type, granule, serial, sequence, &lacing(packet.len()), packet)
}

/// Identification packet; bitrates are nominal, minimum, maximum in header order
pub fn vorbis_identification(channels: u8, rate: u32, bitrates: [i32; 3]) -> Vec<u8> {
    let mut packet = b"\x01vorbis".to_vec();
    packet.extend_from_slice(&0u32.to_le_bytes());
    packet.push(channels);
    packet.extend_from_slice(&rate.to_le_bytes());
    for bitrate in bitrates {
        packet.extend_from_slice(&bitrate.to_le_bytes());
    }
    packet.push(0xB8);
    packet.push(1);
    packet
}

pub fn vorbis_comment_packet(entries: &[&str]) -> Vec<u8> {
    let mut packet = b"\x03vorbis".to_vec();
    packet.extend(vorbis_comments("Xiph.Org libVorbis", entries));
    packet.push(1);
    packet
}

// ---------------------------------------------------------------- MP4

pub fn atom(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut atom = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    atom.extend_from_slice(name);
    atom.extend_from_slice(payload);
    atom
}

pub fn data_atom(data_type: u32, value: &[u8]) -> Vec<u8> {
    let mut payload = data_type.to_be_bytes().to_vec();
    payload.extend_from_slice(&0u32.to_be_bytes());
    payload.extend_from_slice(value);
    atom(b"data", &payload)
}

/// ftyp, then moov holding an mvhd and the given ilst items
pub fn mp4(items: &[Vec<u8>], timescale: u32, length: u32) -> Vec<u8> {
    let mut mvhd = vec![0u8; 12];
    mvhd.extend_from_slice(&timescale.to_be_bytes());
    mvhd.extend_from_slice(&length.to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 80]);

    let mut meta = vec![0u8; 4];
    meta.extend(atom(b"hdlr", &[0u8; 25]));
    meta.extend(atom(b"ilst", &items.concat()));
    let udta = atom(b"udta", &atom(b"meta", &meta));

    let mut data = atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");
    data.extend(atom(b"moov", &[atom(b"mvhd", &mvhd), udta].concat()));
    data.extend(atom(b"mdat", &[0u8; 16]));
    data
}
