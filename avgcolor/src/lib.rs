//! avgcolor - average colour of packed RGBA8 pixel buffers.
//!
//! Sums the four 8-bit channels of every pixel with the widest SIMD kernel the
//! CPU supports (AVX-512 VNNI, AVX-512BW, AVX2, SSSE3 or NEON, with a scalar
//! fallback) and returns one packed pixel of truncated per-channel means. All
//! kernels produce bit-identical results.
//!
//! # Quick Start
//!
//! ```rust
//! let pixels = [0x0102_0304, 0x0506_0708, 0x090A_0B0C];
//! assert_eq!(avgcolor::average_color(&pixels), Ok(0x0506_0708));
//! ```
//!
//! Splitting a buffer across threads is left to the caller; combine the
//! partial [`ChannelSums`] and average once:
//!
//! ```rust
//! use avgcolor::ChannelSums;
//!
//! let pixels = vec![0xFF00_80FFu32; 10_000];
//! let (left, right) = pixels.split_at(3_333);
//! let sums = ChannelSums::from_pixels(left) + ChannelSums::from_pixels(right);
//! assert_eq!(sums.average(), Ok(0xFF00_80FF));
//! ```

mod average;
mod error;
pub mod pixel;
mod sums;

#[cfg(feature = "bench")]
pub use average::bench;

pub use average::scalar;
pub use average::{
    Tier, active_tier, average_color, average_color_bytes, average_color_with,
};
pub use error::{Error, Result};
pub use sums::ChannelSums;
