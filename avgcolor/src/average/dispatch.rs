//! Runtime selection of the reduction kernel.
//!
//! CPU features are probed once; the widest supported tier is chosen the
//! first time a pixel buffer is summed and its function pointer is reused for
//! the rest of the process.

use std::sync::OnceLock;

use common::cpu_features;
use strum_macros::{Display, EnumIter, EnumString};

use super::scalar;
use crate::pixel::CHANNELS;

/// Adds every channel of a pixel slice into four 64-bit totals.
pub(crate) type AccumulateFn = fn(pixels: &[u32], totals: &mut [u64; CHANNELS]);

/// One implementation of the channel reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Tier {
    #[strum(to_string = "scalar")]
    Scalar,
    #[strum(to_string = "ssse3")]
    Ssse3,
    #[strum(to_string = "avx2")]
    Avx2,
    #[strum(to_string = "avx512bw")]
    Avx512Bw,
    #[strum(to_string = "avx512vnni")]
    Avx512Vnni,
    #[strum(to_string = "neon")]
    Neon,
}

/// Most preferred first.
const PREFERENCE: [Tier; 6] = [
    Tier::Avx512Vnni,
    Tier::Avx512Bw,
    Tier::Avx2,
    Tier::Ssse3,
    Tier::Neon,
    Tier::Scalar,
];

impl Tier {
    /// Pixels consumed per iteration of the tier's widest loop.
    pub const fn width(self) -> usize {
        match self {
            Tier::Scalar => 1,
            Tier::Ssse3 => 4,
            Tier::Avx2 => 8,
            Tier::Avx512Bw | Tier::Avx512Vnni | Tier::Neon => 16,
        }
    }

    /// Whether this CPU can run the tier, including every narrower tier it
    /// hands its remainder to.
    pub fn is_supported(self) -> bool {
        match self {
            Tier::Scalar => true,
            Tier::Ssse3 => cpu_features::has_ssse3(),
            Tier::Avx2 => cpu_features::has_avx2() && cpu_features::has_ssse3(),
            Tier::Avx512Bw => cpu_features::has_avx512bw() && Tier::Avx2.is_supported(),
            Tier::Avx512Vnni => cpu_features::has_avx512vnni() && Tier::Avx2.is_supported(),
            Tier::Neon => cpu_features::has_neon() && cfg!(target_endian = "little"),
        }
    }

    /// Widest tier supported by this CPU.
    pub fn detect() -> Tier {
        PREFERENCE
            .into_iter()
            .find(|tier| tier.is_supported())
            .unwrap_or(Tier::Scalar)
    }

    /// Safe entry point for the tier, or `None` if this CPU cannot run it.
    pub(crate) fn accumulate_fn(self) -> Option<AccumulateFn> {
        if !self.is_supported() {
            return None;
        }
        match self {
            Tier::Scalar => Some(scalar::accumulate),
            #[cfg(target_arch = "x86_64")]
            Tier::Ssse3 => Some(accumulate_ssse3),
            #[cfg(target_arch = "x86_64")]
            Tier::Avx2 => Some(accumulate_avx2),
            #[cfg(target_arch = "x86_64")]
            Tier::Avx512Bw => Some(accumulate_avx512bw),
            #[cfg(target_arch = "x86_64")]
            Tier::Avx512Vnni => Some(accumulate_avx512vnni),
            #[cfg(target_arch = "aarch64")]
            Tier::Neon => Some(accumulate_neon),
            _ => None,
        }
    }
}

// The wrappers below are only handed out by `accumulate_fn` after
// `is_supported` confirmed every feature their tier cascade uses.

#[cfg(target_arch = "x86_64")]
fn accumulate_ssse3(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { super::sse::accumulate(pixels, totals) }
}

#[cfg(target_arch = "x86_64")]
fn accumulate_avx2(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { super::avx2::accumulate(pixels, totals) }
}

#[cfg(target_arch = "x86_64")]
fn accumulate_avx512bw(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { super::avx512::accumulate(pixels, totals) }
}

#[cfg(target_arch = "x86_64")]
fn accumulate_avx512vnni(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { super::avx512::accumulate_dot(pixels, totals) }
}

#[cfg(target_arch = "aarch64")]
fn accumulate_neon(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    unsafe { super::neon::accumulate(pixels, totals) }
}

struct Kernel {
    tier: Tier,
    accumulate: AccumulateFn,
}

static KERNEL: OnceLock<Kernel> = OnceLock::new();

fn kernel() -> &'static Kernel {
    KERNEL.get_or_init(|| {
        let tier = Tier::detect();
        log::debug!(
            "Average color kernel: {} ({} pixels per iteration)",
            tier,
            tier.width()
        );
        Kernel {
            tier,
            accumulate: tier.accumulate_fn().unwrap_or(scalar::accumulate),
        }
    })
}

/// Tier used by [`average_color`](super::average_color) in this process.
pub fn active_tier() -> Tier {
    kernel().tier
}

pub(crate) fn accumulate(pixels: &[u32], totals: &mut [u64; CHANNELS]) {
    (kernel().accumulate)(pixels, totals)
}
