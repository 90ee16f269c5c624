//! NEON tier (aarch64).
//!
//! `vld4q_u8` deinterleaves sixteen pixels into one register per channel in
//! hardware. Each channel is reduced with widening pairwise adds into 16-bit
//! lanes, which are widened into the 64-bit totals before they can overflow.

use std::arch::aarch64::*;

use super::scalar;
use crate::pixel::CHANNELS;

pub(super) const WIDTH: usize = 16;
const HALF_WIDTH: usize = 8;

/// `vpadalq_u8` adds at most two saturated bytes to a 16-bit lane per iteration.
pub(super) const MAX_PAIRWISE_BATCH: usize = u16::MAX as usize / (2 * 255);

/// Sum the channels of `pixels` into `totals`: sixteen pixels per iteration,
/// then eight, then the scalar loop.
///
/// # Safety
/// Caller must ensure NEON is available (always true on aarch64).
#[target_feature(enable = "neon")]
pub unsafe fn accumulate(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { accumulate_batched(pixels, totals, MAX_PAIRWISE_BATCH) }
}

/// # Safety
/// Caller must ensure NEON is available.
#[target_feature(enable = "neon")]
pub(super) unsafe fn accumulate_batched(
    pixels: &[u32],
    totals: &mut [u64; CHANNELS],
    batch: usize,
) {
    debug_assert!((1..=MAX_PAIRWISE_BATCH).contains(&batch));

    unsafe {
        let whole = pixels.len() - pixels.len() % WIDTH;
        let (body, remainder) = pixels.split_at(whole);

        for run in body.chunks(batch * WIDTH) {
            let mut red = vdupq_n_u16(0);
            let mut green = vdupq_n_u16(0);
            let mut blue = vdupq_n_u16(0);
            let mut alpha = vdupq_n_u16(0);

            for chunk in run.chunks_exact(WIDTH) {
                let planes = vld4q_u8(chunk.as_ptr().cast());
                red = vpadalq_u8(red, planes.0);
                green = vpadalq_u8(green, planes.1);
                blue = vpadalq_u8(blue, planes.2);
                alpha = vpadalq_u8(alpha, planes.3);
            }

            totals[0] += vaddlvq_u16(red) as u64;
            totals[1] += vaddlvq_u16(green) as u64;
            totals[2] += vaddlvq_u16(blue) as u64;
            totals[3] += vaddlvq_u16(alpha) as u64;
        }

        let chunks = remainder.chunks_exact(HALF_WIDTH);
        let tail = chunks.remainder();

        for chunk in chunks {
            let planes = vld4_u8(chunk.as_ptr().cast());
            totals[0] += vaddlv_u8(planes.0) as u64;
            totals[1] += vaddlv_u8(planes.1) as u64;
            totals[2] += vaddlv_u8(planes.2) as u64;
            totals[3] += vaddlv_u8(planes.3) as u64;
        }

        scalar::accumulate(tail, totals);
    }
}
