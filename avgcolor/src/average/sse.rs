//! SSSE3 tier: four pixels per iteration (x86_64).

use std::arch::x86_64::*;

use super::{BLUE_ALPHA_DEINTERLEAVE, RED_GREEN_DEINTERLEAVE, scalar};
use crate::pixel::CHANNELS;

pub(super) const WIDTH: usize = 4;

/// Sum the channels of `pixels` into `totals` four pixels at a time,
/// finishing with the scalar loop.
///
/// # Safety
/// Caller must ensure SSSE3 is available.
#[target_feature(enable = "ssse3")]
pub unsafe fn accumulate(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe {
        let red_green = _mm_loadu_si128(RED_GREEN_DEINTERLEAVE.as_ptr().cast());
        let blue_alpha = _mm_loadu_si128(BLUE_ALPHA_DEINTERLEAVE.as_ptr().cast());
        let zero = _mm_setzero_si128();

        // | GSum64 | RSum64 |
        let mut rg_sum = _mm_setzero_si128();
        // | ASum64 | BSum64 |
        let mut ba_sum = _mm_setzero_si128();

        let chunks = pixels.chunks_exact(WIDTH);
        let remainder = chunks.remainder();

        for chunk in chunks {
            let quad = _mm_loadu_si128(chunk.as_ptr().cast());
            rg_sum = _mm_add_epi64(
                rg_sum,
                _mm_sad_epu8(_mm_shuffle_epi8(quad, red_green), zero),
            );
            ba_sum = _mm_add_epi64(
                ba_sum,
                _mm_sad_epu8(_mm_shuffle_epi8(quad, blue_alpha), zero),
            );
        }

        fold_128(rg_sum, ba_sum, totals);
        scalar::accumulate(remainder, totals);
    }
}

/// Add `| G | R |` and `| A | B |` 64-bit lanes into `totals`.
#[inline]
#[target_feature(enable = "sse2")]
pub(super) unsafe fn fold_128(rg: __m128i, ba: __m128i, totals: &mut [u64; CHANNELS]) {
    let mut lanes = [0u64; CHANNELS];
    unsafe {
        _mm_storeu_si128(lanes.as_mut_ptr().cast(), rg);
        _mm_storeu_si128(lanes.as_mut_ptr().add(2).cast(), ba);
    }
    for (total, lane) in totals.iter_mut().zip(lanes) {
        *total += lane;
    }
}
