//! AVX2 tier: eight pixels per iteration (x86_64).

use std::arch::x86_64::*;

use super::{AVX2_GATHER, LANE_DEINTERLEAVE, sse};
use crate::pixel::CHANNELS;

pub(super) const WIDTH: usize = 8;

/// Sum the channels of `pixels` into `totals` eight pixels at a time, handing
/// the remainder to the SSSE3 tier.
///
/// # Safety
/// Caller must ensure AVX2 and SSSE3 are available.
#[target_feature(enable = "avx2")]
pub unsafe fn accumulate(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe {
        let shuffle =
            _mm256_broadcastsi128_si256(_mm_loadu_si128(LANE_DEINTERLEAVE.as_ptr().cast()));
        let gather = _mm256_loadu_si256(AVX2_GATHER.as_ptr().cast());
        let zero = _mm256_setzero_si256();

        // | ASum64 | BSum64 | GSum64 | RSum64 |
        let mut rgba_sum = _mm256_setzero_si256();

        let chunks = pixels.chunks_exact(WIDTH);
        let remainder = chunks.remainder();

        for chunk in chunks {
            let octa = _mm256_loadu_si256(chunk.as_ptr().cast());
            // | AAAABBBBGGGGRRRR | AAAABBBBGGGGRRRR |
            let grouped = _mm256_shuffle_epi8(octa, shuffle);
            // | AAAAAAAA | BBBBBBBB | GGGGGGGG | RRRRRRRR |
            let deinterleaved = _mm256_permutevar8x32_epi32(grouped, gather);
            rgba_sum = _mm256_add_epi64(rgba_sum, _mm256_sad_epu8(deinterleaved, zero));
        }

        fold_256(rgba_sum, totals);
        sse::accumulate(remainder, totals);
    }
}

/// Add `| A | B | G | R |` 64-bit lanes into `totals`.
#[inline]
#[target_feature(enable = "avx2")]
pub(super) unsafe fn fold_256(rgba: __m256i, totals: &mut [u64; CHANNELS]) {
    unsafe {
        sse::fold_128(
            _mm256_castsi256_si128(rgba),
            _mm256_extracti128_si256::<1>(rgba),
            totals,
        );
    }
}
