//! Entry-point resolution from a module base address and a configured offset.

use std::fmt;

use crate::error::{Error, Result};

/// Lowest address accepted as a call target (the first page is never mapped)
pub const MIN_ENTRY_ADDRESS: u64 = 0x1000;

/// Highest address accepted as a call target (top of the user half)
pub const MAX_ENTRY_ADDRESS: u64 = 0x7FFF_FFFF_FFFF_FFFF;

/// A validated call target inside a loaded module.
///
/// Only constructible through [`compute_entry_point`], so holding one means
/// `address == base + offset` and the address is inside the plausible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    base: u64,
    offset: u64,
    address: u64,
}

impl EntryPoint {
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn address(&self) -> u64 {
        self.address
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:X} (base 0x{:X} + 0x{:X})",
            self.address, self.base, self.offset
        )
    }
}

/// Parse an offset literal.
///
/// Accepts `0x`/`0X`-prefixed hex or plain decimal.
///
/// # Examples
///
/// ```
/// use sign_core::native::parse_offset;
///
/// assert_eq!(parse_offset("0x1A2B").unwrap(), 0x1A2B);
/// assert_eq!(parse_offset("4096").unwrap(), 4096);
/// ```
pub fn parse_offset(text: &str) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidOffset("offset is empty".to_string()));
    }

    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => text.parse::<u64>(),
    };

    parsed.map_err(|e| Error::InvalidOffset(format!("'{}': {}", text, e)))
}

/// Compute `base + offset` as a call target, rejecting overflow and
/// addresses outside user space.
pub fn compute_entry_point(base: u64, offset: u64) -> Result<EntryPoint> {
    let address = base
        .checked_add(offset)
        .ok_or(Error::ArithmeticOverflow { base, offset })?;

    if !(MIN_ENTRY_ADDRESS..=MAX_ENTRY_ADDRESS).contains(&address) {
        return Err(Error::OutOfRange { address });
    }

    Ok(EntryPoint {
        base,
        offset,
        address,
    })
}
