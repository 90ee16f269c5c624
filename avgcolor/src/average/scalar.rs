//! Scalar reference implementation of the channel reduction.

use crate::error::Result;
use crate::pixel::CHANNELS;
use crate::sums::finalize;

/// Add the four channels of every pixel into `totals`.
#[inline]
pub fn accumulate(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    for &pixel in pixels {
        totals[0] += (pixel & 0xFF) as u64;
        totals[1] += ((pixel >> 8) & 0xFF) as u64;
        totals[2] += ((pixel >> 16) & 0xFF) as u64;
        totals[3] += (pixel >> 24) as u64;
    }
}

/// Average colour computed one pixel at a time.
pub fn average_color(pixels: &[u32]) -> Result<u32> {
    let mut totals = [0u64; CHANNELS];
    accumulate(pixels, &mut totals);
    finalize(&totals, pixels.len() as u64)
}
