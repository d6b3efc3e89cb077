// Byte-slice helpers: integer folding, delimiter search and splitting, bit tests

/// Fold big-endian bytes into an integer, keeping the low `bits_per_byte` bits
/// of each byte. `bits_per_byte = 7` decodes ID3v2 syncsafe integers.
pub fn decode_uint(bytes: &[u8], bits_per_byte: u32) -> u64 {
    let mask = ((1u16 << bits_per_byte) - 1) as u8;
    bytes
        .iter()
        .fold(0u64, |value, &b| (value << bits_per_byte) | u64::from(b & mask))
}

/// Position of the first occurrence of `delimiter` at or after `start`
pub fn index_of(data: &[u8], delimiter: &[u8], start: usize) -> Option<usize> {
    if delimiter.is_empty() || start > data.len() {
        return None;
    }
    data[start..]
        .windows(delimiter.len())
        .position(|window| window == delimiter)
        .map(|i| i + start)
}

/// Split on `delimiter`, producing at most `limit` parts when given.
/// The final part keeps the remainder, delimiters included.
pub fn split<'a>(data: &'a [u8], delimiter: &[u8], limit: Option<usize>) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut start = 0;
    loop {
        if limit.is_some_and(|limit| parts.len() + 1 >= limit) {
            parts.push(&data[start..]);
            break;
        }
        match index_of(data, delimiter, start) {
            Some(end) => {
                parts.push(&data[start..end]);
                start = end + delimiter.len();
            }
            None => {
                parts.push(&data[start..]);
                break;
            }
        }
    }
    parts
}

/// Whether bit `n` (0 = least significant) is set
pub fn bit_set(byte: u8, n: u8) -> bool {
    (byte >> n) & 1 == 1
}
