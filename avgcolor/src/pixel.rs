//! Packed pixel layout.
//!
//! A pixel is a `u32` holding four 8-bit channels, least significant byte
//! first: red in bits 0..8, green in 8..16, blue in 16..24, alpha in 24..32.
//! On little-endian targets this is exactly the in-memory order of an RGBA8
//! byte buffer.

use strum_macros::{Display, EnumIter};

/// Number of 8-bit channels in a packed pixel.
pub const CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Alpha = 3,
}

impl Channel {
    /// Bit offset of this channel inside a packed pixel.
    #[inline]
    pub const fn shift(self) -> u32 {
        self as u32 * 8
    }
}

/// Extract one channel from a packed pixel.
#[inline]
pub const fn channel(pixel: u32, channel: Channel) -> u8 {
    (pixel >> channel.shift()) as u8
}

#[inline]
pub const fn unpack(pixel: u32) -> [u8; CHANNELS] {
    pixel.to_le_bytes()
}

#[inline]
pub const fn pack(channels: [u8; CHANNELS]) -> u32 {
    u32::from_le_bytes(channels)
}
