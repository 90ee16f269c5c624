//! CPU feature detection for runtime SIMD dispatch.
//!
//! Detection runs once, on first use, and the result is cached for the rest of
//! the process. Use these functions instead of `is_x86_feature_detected!`
//! directly to avoid repeated CPUID calls.

use std::fmt;
use std::sync::OnceLock;

/// CPU feature flags detected once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct X86Features {
    pub ssse3: bool,
    pub avx2: bool,
    pub avx512f: bool,
    pub avx512bw: bool,
    pub avx512vnni: bool,
}

impl X86Features {
    fn names(&self) -> impl Iterator<Item = &'static str> {
        [
            ("ssse3", self.ssse3),
            ("avx2", self.avx2),
            ("avx512f", self.avx512f),
            ("avx512bw", self.avx512bw),
            ("avx512vnni", self.avx512vnni),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
    }
}

/// Space-separated names of the detected features, or `none`.
impl fmt::Display for X86Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(" "))
        }
    }
}

static FEATURES: OnceLock<X86Features> = OnceLock::new();

fn log_detected(features: X86Features) -> X86Features {
    log::debug!("Detected x86 CPU features: {features}");
    features
}

/// Get cached CPU features (detected once on first call).
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn get() -> X86Features {
    *FEATURES.get_or_init(|| {
        log_detected(X86Features {
            ssse3: is_x86_feature_detected!("ssse3"),
            avx2: is_x86_feature_detected!("avx2"),
            avx512f: is_x86_feature_detected!("avx512f"),
            avx512bw: is_x86_feature_detected!("avx512bw"),
            avx512vnni: is_x86_feature_detected!("avx512vnni"),
        })
    })
}

/// Get cached CPU features - stub for non-x86 platforms.
#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub fn get() -> X86Features {
    *FEATURES.get_or_init(|| log_detected(X86Features::default()))
}

/// Check if SSSE3 (`pshufb`) is available.
#[inline]
pub fn has_ssse3() -> bool {
    get().ssse3
}

/// Check if AVX2 is available.
#[inline]
pub fn has_avx2() -> bool {
    get().avx2
}

/// Check if AVX-512 with byte/word instructions is available.
#[inline]
pub fn has_avx512bw() -> bool {
    let f = get();
    f.avx512f && f.avx512bw
}

/// Check if AVX-512 VNNI (`vpdpbusd`) is available on top of AVX-512BW.
#[inline]
pub fn has_avx512vnni() -> bool {
    has_avx512bw() && get().avx512vnni
}

/// NEON is part of the aarch64 baseline.
#[inline]
pub fn has_neon() -> bool {
    cfg!(target_arch = "aarch64")
}
