//! Tests for the average colour kernels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;

use super::*;

fn random_pixels(count: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random()).collect()
}

fn supported_tiers() -> Vec<Tier> {
    Tier::iter().filter(|tier| tier.is_supported()).collect()
}

fn scalar_totals(pixels: &[u32]) -> [u64; CHANNELS] {
    let mut totals = [0u64; CHANNELS];
    scalar::accumulate(pixels, &mut totals);
    totals
}

/// Per-channel floor of the mean, computed independently of the kernels.
fn expected_average(pixels: &[u32]) -> u32 {
    let mut channels = [0u8; CHANNELS];
    for (c, out) in channels.iter_mut().enumerate() {
        let sum: u64 = pixels.iter().map(|p| ((p >> (c * 8)) & 0xFF) as u64).sum();
        *out = (sum / pixels.len() as u64) as u8;
    }
    u32::from_le_bytes(channels)
}

// ---------------------------------------------------------------------------
// Shuffle tables
// ---------------------------------------------------------------------------

#[test]
fn test_lane_deinterleave_table() {
    assert_eq!(
        LANE_DEINTERLEAVE,
        [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15]
    );
}

#[test]
fn test_pair_deinterleave_tables() {
    assert_eq!(
        RED_GREEN_DEINTERLEAVE,
        [0, 4, 8, 12, -1, -1, -1, -1, 1, 5, 9, 13, -1, -1, -1, -1]
    );
    assert_eq!(
        BLUE_ALPHA_DEINTERLEAVE,
        [2, 6, 10, 14, -1, -1, -1, -1, 3, 7, 11, 15, -1, -1, -1, -1]
    );
}

#[test]
fn test_gather_tables() {
    assert_eq!(AVX2_GATHER, [0, 4, 1, 5, 2, 6, 3, 7]);
    assert_eq!(
        AVX512_GATHER,
        [0, 4, 1, 5, 2, 6, 3, 7, 8, 12, 9, 13, 10, 14, 11, 15]
    );
}

#[test]
fn test_max_dot_batch() {
    assert_eq!(MAX_DOT_BATCH, 4_210_752);
    assert!(MAX_DOT_BATCH as u64 * 255 * 4 <= u32::MAX as u64);
    assert!((MAX_DOT_BATCH as u64 + 1) * 255 * 4 > u32::MAX as u64);
}

// ---------------------------------------------------------------------------
// Scalar reference
// ---------------------------------------------------------------------------

#[test]
fn test_scalar_three_pixels() {
    let pixels = [0x0102_0304, 0x0506_0708, 0x090A_0B0C];
    assert_eq!(scalar::average_color(&pixels), Ok(0x0506_0708));
    assert_eq!(
        scalar::average_color(&pixels),
        Ok(expected_average(&pixels))
    );
}

#[test]
fn test_scalar_truncates() {
    // Red sums to 3 over 2 pixels, alpha to 255.
    let pixels = [0x0000_0001, 0xFF00_0002];
    assert_eq!(scalar::average_color(&pixels), Ok(0x7F00_0001));
}

#[test]
fn test_scalar_single_pixel() {
    assert_eq!(scalar::average_color(&[0xDEAD_BEEF]), Ok(0xDEAD_BEEF));
}

#[test]
fn test_scalar_empty() {
    assert_eq!(scalar::average_color(&[]), Err(Error::EmptyBuffer));
}

// ---------------------------------------------------------------------------
// Tier equivalence
// ---------------------------------------------------------------------------

#[test]
fn test_scalar_always_supported() {
    assert!(Tier::Scalar.is_supported());
    assert!(supported_tiers().contains(&Tier::Scalar));
}

#[test]
fn test_tiers_match_scalar_at_boundaries() {
    let counts = [
        1, 2, 3, 4, 5, 7, 8, 9, 12, 15, 16, 17, 23, 24, 28, 31, 32, 33, 63, 64, 65, 100, 1000,
        4097,
    ];
    for tier in supported_tiers() {
        for (seed, &count) in counts.iter().enumerate() {
            let pixels = random_pixels(count, seed as u64);
            let accumulate = tier.accumulate_fn().unwrap();
            let mut totals = [0u64; CHANNELS];
            accumulate(&pixels, &mut totals);

            assert_eq!(
                totals,
                scalar_totals(&pixels),
                "tier={tier}, count={count}"
            );
            assert_eq!(
                average_color_with(tier, &pixels),
                Ok(expected_average(&pixels)),
                "tier={tier}, count={count}"
            );
        }
    }
}

#[test]
fn test_tiers_uniform_identity() {
    let values = [
        0x0000_0000,
        0xFFFF_FFFF,
        0xBEEF_FEEB,
        0x8040_2010,
        0x00FF_00FF,
    ];
    for tier in supported_tiers() {
        for value in values {
            for count in [1, 3, 4, 8, 16, 17, 255, 1031] {
                let pixels = vec![value; count];
                assert_eq!(
                    average_color_with(tier, &pixels),
                    Ok(value),
                    "tier={tier}, value={value:#010X}, count={count}"
                );
            }
        }
    }
}

#[test]
fn test_tiers_channel_independence() {
    let pixels = random_pixels(777, 7);
    for tier in supported_tiers() {
        let base = average_color_with(tier, &pixels).unwrap();
        for rotation in [8, 16, 24] {
            let rotated: Vec<u32> = pixels.iter().map(|p| p.rotate_left(rotation)).collect();
            assert_eq!(
                average_color_with(tier, &rotated),
                Ok(base.rotate_left(rotation)),
                "tier={tier}, rotation={rotation}"
            );
        }
    }
}

#[test]
fn test_tiers_single_hot_channel() {
    // Only one channel carries data; the others must stay exactly zero.
    for shift in [0, 8, 16, 24] {
        let pixels: Vec<u32> = (0..531u32).map(|i| (i % 256) << shift).collect();
        let expected = expected_average(&pixels);
        assert_eq!(expected & !(0xFF << shift), 0);
        for tier in supported_tiers() {
            assert_eq!(
                average_color_with(tier, &pixels),
                Ok(expected),
                "tier={tier}, shift={shift}"
            );
        }
    }
}

#[test]
fn test_tiers_unaligned_start() {
    let pixels = random_pixels(1027, 11);
    for tier in supported_tiers() {
        for offset in 1..4 {
            let slice = &pixels[offset..];
            assert_eq!(
                average_color_with(tier, slice),
                Ok(expected_average(slice)),
                "tier={tier}, offset={offset}"
            );
        }
    }
}

#[test]
fn test_tiers_are_pure() {
    let pixels = random_pixels(10_001, 3);
    for tier in supported_tiers() {
        let first = average_color_with(tier, &pixels);
        let second = average_color_with(tier, &pixels);
        assert_eq!(first, second, "tier={tier}");
    }
}

#[test]
fn test_unsupported_tier_is_rejected() {
    for tier in Tier::iter().filter(|tier| !tier.is_supported()) {
        assert_eq!(
            average_color_with(tier, &[0x0102_0304]),
            Err(Error::UnsupportedTier(tier))
        );
    }
}

#[test]
fn test_empty_with_every_tier() {
    for tier in Tier::iter() {
        assert_eq!(average_color_with(tier, &[]), Err(Error::EmptyBuffer));
    }
}

// ---------------------------------------------------------------------------
// Batched widening
// ---------------------------------------------------------------------------

#[cfg(target_arch = "x86_64")]
#[test]
fn test_dot_product_widening_matches_scalar() {
    if !Tier::Avx512Vnni.is_supported() {
        eprintln!("skipping dot-product widening: no avx512vnni");
        return;
    }
    let saturated = vec![u32::MAX; 16 * 9 + 5];
    let random = random_pixels(16 * 13 + 11, 5);
    for pixels in [saturated, random] {
        for batch in [1, 2, 3, 7, MAX_DOT_BATCH] {
            let mut totals = [0u64; CHANNELS];
            unsafe { avx512::accumulate_dot_batched(&pixels, &mut totals, batch) };
            assert_eq!(totals, scalar_totals(&pixels), "batch={batch}");
            assert_eq!(totals, dot_product_lanes(&pixels, batch), "batch={batch}");
        }
    }
}

/// Lane-by-lane model of the 512-bit dot-product kernel: sixteen 32-bit
/// lanes (`| A | B | G | R |` per 128-bit lane) widened every `batch`
/// iterations by splitting each 64-bit lane, then regrouped like
/// `unpacklo/hi_epi64`.
fn dot_product_lanes(pixels: &[u32], batch: usize) -> [u64; CHANNELS] {
    const WIDTH: usize = 16;

    let whole = pixels.len() - pixels.len() % WIDTH;
    let (body, remainder) = pixels.split_at(whole);

    // | BSum64 | RSum64 | x4 and | ASum64 | GSum64 | x4
    let mut rb_sum = [0u64; 8];
    let mut ga_sum = [0u64; 8];

    for run in body.chunks(batch * WIDTH) {
        let mut rgba_sum32 = [0u32; WIDTH];
        for chunk in run.chunks_exact(WIDTH) {
            for (lane, quad) in chunk.chunks_exact(4).enumerate() {
                let dwords = &mut rgba_sum32[lane * CHANNELS..(lane + 1) * CHANNELS];
                for (c, dword) in dwords.iter_mut().enumerate() {
                    let bytes: u32 = quad.iter().map(|p| (p >> (c * 8)) & 0xFF).sum();
                    *dword = dword.checked_add(bytes).expect("32-bit lane overflow");
                }
            }
        }
        for (q, pair) in rgba_sum32.chunks_exact(2).enumerate() {
            let qword = u64::from(pair[0]) | u64::from(pair[1]) << 32;
            rb_sum[q] += qword & 0xFFFF_FFFF;
            ga_sum[q] += qword >> 32;
        }
    }

    let mut totals = [0u64; CHANNELS];
    for lane in 0..4 {
        totals[0] += rb_sum[2 * lane];
        totals[1] += ga_sum[2 * lane];
        totals[2] += rb_sum[2 * lane + 1];
        totals[3] += ga_sum[2 * lane + 1];
    }
    scalar::accumulate(remainder, &mut totals);
    totals
}

#[test]
fn test_dot_product_lanes_match_scalar() {
    let saturated = vec![u32::MAX; 16 * 9 + 5];
    let random = random_pixels(16 * 13 + 11, 5);
    let hot_alpha: Vec<u32> = (0..16 * 7 + 3).map(|i| (i % 256) << 24).collect();
    for pixels in [saturated, random, hot_alpha] {
        for batch in [1, 2, 3, 7, MAX_DOT_BATCH] {
            assert_eq!(
                dot_product_lanes(&pixels, batch),
                scalar_totals(&pixels),
                "batch={batch}"
            );
        }
    }
}

#[test]
fn test_dot_product_lane_bound_holds_for_saturated_batch() {
    // Every 32-bit lane gains 4 * 255 per iteration on saturated input.
    let per_iteration = 4 * 255u32;
    let add = |lane: u32, _: usize| lane.checked_add(per_iteration);
    let full = (0..MAX_DOT_BATCH).try_fold(0u32, add);
    assert_eq!(full, Some(MAX_DOT_BATCH as u32 * per_iteration));
    assert_eq!(full.and_then(|lane| lane.checked_add(per_iteration)), None);
}

#[cfg(target_arch = "aarch64")]
#[test]
fn test_pairwise_widening_matches_scalar() {
    let saturated = vec![u32::MAX; 16 * 300 + 13];
    let random = random_pixels(16 * 131 + 9, 5);
    for pixels in [saturated, random] {
        for batch in [1, 2, 5, neon::MAX_PAIRWISE_BATCH] {
            let mut totals = [0u64; CHANNELS];
            unsafe { neon::accumulate_batched(&pixels, &mut totals, batch) };
            assert_eq!(totals, scalar_totals(&pixels), "batch={batch}");
        }
    }
}

#[cfg(target_arch = "aarch64")]
#[test]
fn test_pairwise_batch_bound() {
    assert_eq!(neon::MAX_PAIRWISE_BATCH, 128);
    assert!(neon::MAX_PAIRWISE_BATCH * 2 * 255 <= u16::MAX as usize);
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_active_tier_is_supported_and_stable() {
    let tier = active_tier();
    assert!(tier.is_supported());
    assert_eq!(tier, Tier::detect());
    assert_eq!(active_tier(), tier);
}

#[test]
fn test_detect_prefers_widest() {
    let tier = Tier::detect();
    for other in supported_tiers() {
        if other != Tier::Scalar {
            assert!(
                tier.width() >= other.width(),
                "{tier} narrower than {other}"
            );
        }
    }
}

#[test]
fn test_tier_names_round_trip() {
    for tier in Tier::iter() {
        assert_eq!(tier.to_string().parse::<Tier>(), Ok(tier));
    }
    assert_eq!("AVX2".parse::<Tier>(), Ok(Tier::Avx2));
    assert!("mmx".parse::<Tier>().is_err());
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

#[test]
fn test_average_color_matches_scalar() {
    for count in [1, 5, 16, 999, 65_537] {
        let pixels = random_pixels(count, count as u64);
        assert_eq!(average_color(&pixels), scalar::average_color(&pixels));
    }
}

#[test]
fn test_average_color_empty() {
    assert_eq!(average_color(&[]), Err(Error::EmptyBuffer));
}

#[test]
fn test_large_uniform_buffer() {
    const PIXEL_COUNT: usize = 10_000_000;
    const TEST_VALUE: u32 = 0xBEEF_FEEB;
    let pixels = vec![TEST_VALUE; PIXEL_COUNT];
    assert_eq!(average_color(&pixels), Ok(TEST_VALUE));
    for tier in supported_tiers() {
        assert_eq!(
            average_color_with(tier, &pixels),
            Ok(TEST_VALUE),
            "tier={tier}"
        );
    }
}

#[test]
fn test_large_random_buffer() {
    let pixels = random_pixels(3_000_017, 42);
    let expected = scalar_totals(&pixels);
    for tier in supported_tiers() {
        let mut sums = ChannelSums::new();
        sums.add_pixels_with(tier, &pixels).unwrap();
        assert_eq!(sums.totals(), expected, "tier={tier}");
    }
}

#[test]
fn test_average_color_bytes() {
    let bytes = [4, 3, 2, 1, 8, 7, 6, 5, 12, 11, 10, 9];
    assert_eq!(average_color_bytes(&bytes), Ok(0x0506_0708));
}

#[test]
fn test_average_color_bytes_unaligned() {
    let pixels = random_pixels(333, 9);
    let mut bytes = vec![0u8];
    for pixel in &pixels {
        bytes.extend_from_slice(&pixel.to_le_bytes());
    }
    assert_eq!(
        average_color_bytes(&bytes[1..]),
        Ok(expected_average(&pixels))
    );
}

#[test]
fn test_average_color_bytes_bad_length() {
    assert_eq!(
        average_color_bytes(&[1, 2, 3, 4, 5]),
        Err(Error::ByteLength(5))
    );
    assert_eq!(average_color_bytes(&[]), Err(Error::EmptyBuffer));
}

// ---------------------------------------------------------------------------
// ChannelSums
// ---------------------------------------------------------------------------

#[test]
fn test_channel_sums_merge_equals_whole() {
    let pixels = random_pixels(50_000, 13);
    let whole = ChannelSums::from_pixels(&pixels);

    let mut merged = ChannelSums::new();
    for part in pixels.chunks(4_099) {
        merged.merge(&ChannelSums::from_pixels(part));
    }

    assert_eq!(merged, whole);
    assert_eq!(merged.count(), 50_000);
    assert_eq!(merged.average(), average_color(&pixels));
}

#[test]
fn test_channel_sums_add() {
    let (left, right) = ([0x0000_0010, 0x0000_0020], [0x0000_0030]);
    let sums = ChannelSums::from_pixels(&left) + ChannelSums::from_pixels(&right);
    assert_eq!(sums.totals(), [0x60, 0, 0, 0]);
    assert_eq!(sums.average(), Ok(0x0000_0020));
}

#[test]
fn test_channel_sums_empty() {
    let sums = ChannelSums::new();
    assert_eq!(sums.count(), 0);
    assert_eq!(sums.average(), Err(Error::EmptyBuffer));
    assert_eq!(ChannelSums::from_pixels(&[]), sums);
}
