//! Per-channel average of packed pixel buffers with SIMD acceleration.
//!
//! Vector tiers are cascaded: a tier consumes whole chunks of its width, folds
//! its lanes into the shared 64-bit totals and hands the remainder to the next
//! narrower tier, ending in the scalar loop. Every tier produces exactly the
//! same totals as [`scalar::accumulate`].

pub mod scalar;

pub(crate) mod dispatch;

#[cfg(target_arch = "aarch64")]
mod neon;

#[cfg(target_arch = "x86_64")]
mod avx2;

#[cfg(target_arch = "x86_64")]
mod avx512;

#[cfg(target_arch = "x86_64")]
mod sse;

#[cfg(feature = "bench")]
pub mod bench;

pub use dispatch::{Tier, active_tier};

use crate::error::{Error, Result};
use crate::pixel::CHANNELS;
use crate::sums::ChannelSums;

/// Pixels per 128-bit hardware lane.
const LANE_PIXELS: usize = 16 / CHANNELS;

/// In-lane byte shuffle grouping each 128-bit lane of four pixels by channel:
/// `| AAAA | BBBB | GGGG | RRRR |`, red in the lowest dword.
const fn lane_deinterleave() -> [i8; 16] {
    let mut table = [0i8; 16];
    let mut c = 0;
    while c < CHANNELS {
        let mut p = 0;
        while p < LANE_PIXELS {
            table[c * LANE_PIXELS + p] = (p * CHANNELS + c) as i8;
            p += 1;
        }
        c += 1;
    }
    table
}

/// Byte shuffle placing channel `lo` of four pixels in bytes 0..4 and channel
/// `hi` in bytes 8..12. Negative indices zero the byte, so one `psadbw`
/// yields both channel sums in its two 64-bit lanes.
const fn pair_deinterleave(lo: usize, hi: usize) -> [i8; 16] {
    let mut table = [-1i8; 16];
    let mut p = 0;
    while p < LANE_PIXELS {
        table[p] = (p * CHANNELS + lo) as i8;
        table[8 + p] = (p * CHANNELS + hi) as i8;
        p += 1;
    }
    table
}

/// Cross-lane dword permutation applied after [`LANE_DEINTERLEAVE`]. Output
/// 64-bit lane `q` holds channel `q % 4` from a pair of adjacent 128-bit
/// lanes, so a 256-bit vector comes out as `| A | B | G | R |` per 64 bits.
const fn lane_pair_gather<const N: usize>() -> [i32; N] {
    let mut table = [0i32; N];
    let mut q = 0;
    while q < N / 2 {
        let pair = q / CHANNELS;
        let c = q % CHANNELS;
        table[2 * q] = (2 * pair * CHANNELS + c) as i32;
        table[2 * q + 1] = ((2 * pair + 1) * CHANNELS + c) as i32;
        q += 1;
    }
    table
}

pub(crate) const LANE_DEINTERLEAVE: [i8; 16] = lane_deinterleave();
pub(crate) const RED_GREEN_DEINTERLEAVE: [i8; 16] = pair_deinterleave(0, 1);
pub(crate) const BLUE_ALPHA_DEINTERLEAVE: [i8; 16] = pair_deinterleave(2, 3);
pub(crate) const AVX2_GATHER: [i32; 8] = lane_pair_gather::<8>();
pub(crate) const AVX512_GATHER: [i32; 16] = lane_pair_gather::<16>();

/// Longest run of byte dot-product accumulations into a 32-bit lane before it
/// must be widened: every accumulation adds at most four saturated bytes.
pub(crate) const MAX_DOT_BATCH: usize = (u32::MAX / (255 * CHANNELS as u32)) as usize;

/// Average colour of `pixels` using the fastest kernel this CPU supports.
///
/// Returns [`Error::EmptyBuffer`] for an empty slice.
pub fn average_color(pixels: &[u32]) -> Result<u32> {
    if pixels.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    ChannelSums::from_pixels(pixels).average()
}

/// Average colour of `pixels` computed by a specific tier.
pub fn average_color_with(tier: Tier, pixels: &[u32]) -> Result<u32> {
    if pixels.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    let mut sums = ChannelSums::new();
    sums.add_pixels_with(tier, pixels)?;
    sums.average()
}

/// Average colour of an RGBA8 byte buffer.
///
/// The buffer is borrowed as packed pixels when it is suitably aligned,
/// otherwise it is repacked first.
pub fn average_color_bytes(bytes: &[u8]) -> Result<u32> {
    let (quads, rest) = bytes.as_chunks::<CHANNELS>();
    if !rest.is_empty() {
        return Err(Error::ByteLength(bytes.len()));
    }

    if cfg!(target_endian = "little")
        && let Ok(pixels) = bytemuck::try_cast_slice::<u8, u32>(bytes)
    {
        return average_color(pixels);
    }

    let pixels: Vec<u32> = quads.iter().map(|quad| u32::from_le_bytes(*quad)).collect();
    average_color(&pixels)
}

#[cfg(test)]
mod tests;
