//! Table-driven CRC-32 as used by PKZIP.
//!
//! This is the reflected CRC-32 with polynomial `0xEDB88320` (the one
//! `unzip -t` checks). The 256-entry lookup table is built on first use and
//! shared read-only for the rest of the process.

use std::sync::OnceLock;

/// Reflected form of the CRC-32 polynomial `0x04C11DB7`.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

static TABLE: OnceLock<[u32; 256]> = OnceLock::new();

/// Get the lookup table, building it on first access.
pub fn table() -> &'static [u32; 256] {
    TABLE.get_or_init(build_table)
}

fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (byte, slot) in table.iter_mut().enumerate() {
        let mut value = byte as u32;
        for _ in 0..8 {
            value = if value & 1 != 0 {
                (value >> 1) ^ POLYNOMIAL
            } else {
                value >> 1
            };
        }
        *slot = value;
    }
    table
}

/// Compute the CRC-32 of `data`.
///
/// # Examples
///
/// ```
/// use iconzip::zip::crc32::checksum;
///
/// assert_eq!(checksum(b""), 0);
/// assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
/// ```
pub fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// Incremental CRC-32 for data that arrives in pieces.
///
/// Feeding the same bytes through any number of [`update`](Crc32::update)
/// calls gives the same result as [`checksum`].
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    pub fn update(&mut self, data: &[u8]) {
        let table = table();
        let mut crc = self.state;
        for &byte in data {
            crc = table[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
        }
        self.state = crc;
    }

    pub fn finalize(self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn check_value() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn known_strings() {
        assert_eq!(checksum(b"a"), 0xE8B7_BE43);
        assert_eq!(
            checksum(b"The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn table_matches_reference_entries() {
        let table = table();
        assert_eq!(table[0], 0x0000_0000);
        assert_eq!(table[1], 0x7707_3096);
        assert_eq!(table[128], 0xEDB8_8320);
        assert_eq!(table[255], 0x2D02_EF8D);
    }

    #[test]
    fn table_is_built_once() {
        assert!(std::ptr::eq(table(), table()));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let expected = checksum(&data);

        for split in [0, 1, 7, 500, 999, 1000] {
            let mut hasher = Crc32::new();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            assert_eq!(hasher.finalize(), expected, "split at {split}");
        }
    }
}
