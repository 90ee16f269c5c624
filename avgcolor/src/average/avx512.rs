//! AVX-512 tiers: sixteen pixels per iteration (x86_64).
//!
//! Two variants share the deinterleave. [`accumulate`] sums bytes with
//! `vpsadbw` straight into 64-bit lanes. [`accumulate_dot`] uses the VNNI
//! byte dot product into 32-bit lanes, which needs no cross-lane permute but
//! must widen its lanes to 64 bits before they can overflow.

use std::arch::x86_64::*;

use super::{AVX512_GATHER, LANE_DEINTERLEAVE, MAX_DOT_BATCH, avx2, sse};
use crate::pixel::CHANNELS;

pub(super) const WIDTH: usize = 16;

/// Sum the channels of `pixels` into `totals` sixteen pixels at a time,
/// handing the remainder to the AVX2 tier.
///
/// # Safety
/// Caller must ensure AVX-512F, AVX-512BW, AVX2 and SSSE3 are available.
#[target_feature(enable = "avx512f,avx512bw,avx2")]
pub unsafe fn accumulate(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe {
        let shuffle = _mm512_broadcast_i32x4(_mm_loadu_si128(LANE_DEINTERLEAVE.as_ptr().cast()));
        let gather = _mm512_loadu_epi32(AVX512_GATHER.as_ptr());
        let zero = _mm512_setzero_si512();

        // | ASum64 | BSum64 | GSum64 | RSum64 | x2
        let mut rgba_sum_x2 = _mm512_setzero_si512();

        let chunks = pixels.chunks_exact(WIDTH);
        let remainder = chunks.remainder();

        for chunk in chunks {
            let hexadeca = _mm512_loadu_epi32(chunk.as_ptr().cast());
            // | AAAABBBBGGGGRRRR | x4
            let grouped = _mm512_shuffle_epi8(hexadeca, shuffle);
            // | AAAAAAAA | BBBBBBBB | GGGGGGGG | RRRRRRRR | x2
            let deinterleaved = _mm512_permutexvar_epi32(gather, grouped);
            rgba_sum_x2 = _mm512_add_epi64(rgba_sum_x2, _mm512_sad_epu8(deinterleaved, zero));
        }

        avx2::fold_256(fold_512_to_256(rgba_sum_x2), totals);
        avx2::accumulate(remainder, totals);
    }
}

/// Same contract as [`accumulate`], using `vpdpbusd`.
///
/// # Safety
/// Caller must ensure AVX-512F, AVX-512BW, AVX-512 VNNI, AVX2 and SSSE3 are
/// available.
#[target_feature(enable = "avx512f,avx512bw,avx512vnni,avx2")]
pub unsafe fn accumulate_dot(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { accumulate_dot_batched(pixels, totals, MAX_DOT_BATCH) }
}

/// Dot-product reduction widening the 32-bit lanes every `batch` iterations.
///
/// # Safety
/// Same as [`accumulate_dot`].
#[target_feature(enable = "avx512f,avx512bw,avx512vnni,avx2")]
pub(super) unsafe fn accumulate_dot_batched(
    pixels: &[u32],
    totals: &mut [u64; CHANNELS],
    batch: usize,
) {
    debug_assert!((1..=MAX_DOT_BATCH).contains(&batch));

    unsafe {
        let shuffle = _mm512_broadcast_i32x4(_mm_loadu_si128(LANE_DEINTERLEAVE.as_ptr().cast()));
        let ones = _mm512_set1_epi8(1);
        let low_half = _mm512_set1_epi64(0xFFFF_FFFF);

        // | BSum64 | RSum64 | x4
        let mut rb_sum = _mm512_setzero_si512();
        // | ASum64 | GSum64 | x4
        let mut ga_sum = _mm512_setzero_si512();

        let whole = pixels.len() - pixels.len() % WIDTH;
        let (body, remainder) = pixels.split_at(whole);

        for run in body.chunks(batch * WIDTH) {
            // | ASum32 | BSum32 | GSum32 | RSum32 | x4
            let mut rgba_sum32 = _mm512_setzero_si512();
            for chunk in run.chunks_exact(WIDTH) {
                let hexadeca = _mm512_loadu_epi32(chunk.as_ptr().cast());
                let grouped = _mm512_shuffle_epi8(hexadeca, shuffle);
                rgba_sum32 = _mm512_dpbusd_epi32(rgba_sum32, grouped, ones);
            }
            // Even dwords (R, B) sit in the low half of each 64-bit lane,
            // odd ones (G, A) in the high half.
            rb_sum = _mm512_add_epi64(rb_sum, _mm512_and_si512(rgba_sum32, low_half));
            ga_sum = _mm512_add_epi64(ga_sum, _mm512_srli_epi64::<32>(rgba_sum32));
        }

        // | GSum64 | RSum64 | x4 and | ASum64 | BSum64 | x4
        let rg = _mm512_unpacklo_epi64(rb_sum, ga_sum);
        let ba = _mm512_unpackhi_epi64(rb_sum, ga_sum);
        sse::fold_128(fold_512_to_128(rg), fold_512_to_128(ba), totals);

        avx2::accumulate(remainder, totals);
    }
}

#[inline]
#[target_feature(enable = "avx512f,avx2")]
unsafe fn fold_512_to_256(v: __m512i) -> __m256i {
    _mm256_add_epi64(_mm512_castsi512_si256(v), _mm512_extracti64x4_epi64::<1>(v))
}

#[inline]
#[target_feature(enable = "avx512f,avx2")]
unsafe fn fold_512_to_128(v: __m512i) -> __m128i {
    let half = unsafe { fold_512_to_256(v) };
    _mm_add_epi64(
        _mm256_castsi256_si128(half),
        _mm256_extracti128_si256::<1>(half),
    )
}
