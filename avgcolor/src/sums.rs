use std::ops::{Add, AddAssign};

use crate::average::{Tier, dispatch};
use crate::error::{Error, Result};
use crate::pixel::{CHANNELS, pack};

/// Running per-channel totals over some number of pixels.
///
/// Partial sums over disjoint ranges of a buffer can be merged and averaged
/// once, which is how a caller splits a large buffer across threads without
/// averaging averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSums {
    totals: [u64; CHANNELS],
    count: u64,
}

impl ChannelSums {
    pub const fn new() -> Self {
        Self {
            totals: [0; CHANNELS],
            count: 0,
        }
    }

    /// Sum `pixels` with the fastest kernel this CPU supports.
    pub fn from_pixels(pixels: &[u32]) -> Self {
        let mut sums = Self::new();
        sums.add_pixels(pixels);
        sums
    }

    pub fn add_pixels(&mut self, pixels: &[u32]) {
        dispatch::accumulate(pixels, &mut self.totals);
        self.count += pixels.len() as u64;
    }

    /// Sum `pixels` with a specific kernel tier.
    pub fn add_pixels_with(&mut self, tier: Tier, pixels: &[u32]) -> Result<()> {
        let accumulate = tier.accumulate_fn().ok_or(Error::UnsupportedTier(tier))?;
        accumulate(pixels, &mut self.totals);
        self.count += pixels.len() as u64;
        Ok(())
    }

    pub fn merge(&mut self, other: &ChannelSums) {
        for (total, other) in self.totals.iter_mut().zip(other.totals) {
            *total += other;
        }
        self.count += other.count;
    }

    /// Number of pixels summed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn totals(&self) -> [u64; CHANNELS] {
        self.totals
    }

    /// Packed pixel of the truncated per-channel means.
    pub fn average(&self) -> Result<u32> {
        finalize(&self.totals, self.count)
    }
}

impl AddAssign for ChannelSums {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

impl Add for ChannelSums {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.merge(&rhs);
        self
    }
}

/// Divide each total by `count` and repack. The quotient of a sum of bytes
/// by their count always fits in a byte.
pub(crate) fn finalize(totals: &[u64; CHANNELS], count: u64) -> Result<u32> {
    if count == 0 {
        return Err(Error::EmptyBuffer);
    }
    Ok(pack(totals.map(|total| (total / count) as u8)))
}
