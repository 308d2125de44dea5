//! Binary layout of the native sign function's output buffer
//!
//! The module writes three length-prefixed fields into a single caller-owned
//! buffer. Each field lives in its own fixed-size region and the last byte of
//! the region holds the number of payload bytes at the start of that region.
//!
//! ```text
//! 0x000 ┌──────────── token ────────────┬─len─┐ 0x0FF
//! 0x100 ├──────────── extra ────────────┼─len─┤ 0x1FF
//! 0x200 ├──────────── sign ─────────────┼─len─┤ 0x2FF
//!       └───────────────────────────────┴─────┘
//! ```
//!
//! This is a pinned protocol version. A different build of the module is not
//! guaranteed to keep it.

/// Version tag for the layout below
pub const OUTPUT_LAYOUT_VERSION: u32 = 1;

/// Size of one field region
pub const REGION_SIZE: usize = 0x100;

/// Total output buffer size handed to the native call
pub const OUTPUT_SIZE: usize = REGION_SIZE * 3;

/// Position of the length byte within each region
pub const LENGTH_BYTE: usize = REGION_SIZE - 1;

/// Region start offsets
pub mod region {
    use super::REGION_SIZE;

    pub const TOKEN: usize = 0;
    pub const EXTRA: usize = REGION_SIZE;
    pub const SIGN: usize = REGION_SIZE * 2;
}

/// Fixed shape of the test-mode stand-in output
pub mod test_mode {
    pub const TOKEN_LEN: usize = 32;
    pub const EXTRA_LEN: usize = 64;
    pub const SIGN_LEN: usize = 64;
}

/// The three byte fields produced by one signing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOutput {
    pub token: Vec<u8>,
    pub extra: Vec<u8>,
    pub sign: Vec<u8>,
}

impl SignOutput {
    /// Split a raw output buffer into its three fields.
    ///
    /// The length byte can never exceed `LENGTH_BYTE`, so every field slice
    /// stays inside its own region.
    pub fn parse(buffer: &[u8; OUTPUT_SIZE]) -> Self {
        Self {
            token: read_region(buffer, region::TOKEN),
            extra: read_region(buffer, region::EXTRA),
            sign: read_region(buffer, region::SIGN),
        }
    }
}

fn read_region(buffer: &[u8; OUTPUT_SIZE], start: usize) -> Vec<u8> {
    let region = &buffer[start..start + REGION_SIZE];
    let len = region[LENGTH_BYTE] as usize;
    region[..len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_constants() {
        assert_eq!(OUTPUT_SIZE, 0x300);
        assert_eq!(region::TOKEN + LENGTH_BYTE, 0x0FF);
        assert_eq!(region::EXTRA + LENGTH_BYTE, 0x1FF);
        assert_eq!(region::SIGN + LENGTH_BYTE, 0x2FF);
    }

    #[test]
    fn test_parse_uses_length_bytes() {
        let mut buffer = [0xEEu8; OUTPUT_SIZE];
        for (i, b) in buffer[..0x10].iter_mut().enumerate() {
            *b = i as u8;
        }
        for (i, b) in buffer[0x100..0x120].iter_mut().enumerate() {
            *b = 0x80 + i as u8;
        }
        buffer[0x200..0x205].copy_from_slice(&[1, 2, 3, 4, 5]);
        buffer[0x0FF] = 0x10;
        buffer[0x1FF] = 0x20;
        buffer[0x2FF] = 0x05;

        let out = SignOutput::parse(&buffer);
        assert_eq!(out.token, (0..0x10).collect::<Vec<u8>>());
        assert_eq!(out.extra, (0x80..0xA0).collect::<Vec<u8>>());
        assert_eq!(out.sign, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_ignores_unused_bytes() {
        let mut a = [0u8; OUTPUT_SIZE];
        let mut b = [0xFFu8; OUTPUT_SIZE];
        for buffer in [&mut a, &mut b] {
            buffer[0..3].copy_from_slice(&[9, 8, 7]);
            buffer[0x0FF] = 3;
            buffer[0x1FF] = 0;
            buffer[0x2FF] = 0;
        }
        assert_eq!(SignOutput::parse(&a), SignOutput::parse(&b));
        assert!(SignOutput::parse(&a).extra.is_empty());
    }

    #[test]
    fn test_parse_max_length_stays_in_region() {
        let mut buffer = [0x11u8; OUTPUT_SIZE];
        buffer[0x0FF] = 0xFF;
        buffer[0x1FF] = 0xFF;
        buffer[0x2FF] = 0xFF;

        let out = SignOutput::parse(&buffer);
        assert_eq!(out.token.len(), 255);
        assert_eq!(out.extra.len(), 255);
        assert_eq!(out.sign.len(), 255);
        assert!(out.sign.iter().all(|&b| b == 0x11));
    }
}
