/// ASCII-lowercase `bytes` in place; other bytes are left untouched.
pub fn to_lowercase_bytes(bytes: &mut [u8]) {
    bytes.make_ascii_lowercase()
}

pub fn to_lowercase(value: &mut String) {
    value.make_ascii_lowercase()
}

/// One char per byte. Bytes at or above 0x80 become two-byte UTF-8 chars, so
/// only the char count matches the input length.
pub fn bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

pub fn string_to_bytes(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}
