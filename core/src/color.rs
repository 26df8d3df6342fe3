use std::ops::{BitAnd, BitOr};

use serde::{Deserialize, Serialize};

/// Three-bit color mask over the red, green and blue channels.
///
/// Values read from outside are reduced to their low three bits, so every
/// `ColorMask` is one of the eight colors between [`ColorMask::NONE`] and
/// [`ColorMask::WHITE`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct ColorMask(u8);

impl ColorMask {
    /// Empty mask. A beam of this color carries nothing and is never created.
    pub const NONE: Self = Self(0);
    /// Red channel only.
    pub const RED: Self = Self(1);
    /// Green channel only.
    pub const GREEN: Self = Self(2);
    /// Blue channel only.
    pub const BLUE: Self = Self(4);
    /// All three channels.
    pub const WHITE: Self = Self(7);

    /// Builds a mask from raw bits, discarding anything above the blue bit.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::WHITE.0)
    }

    /// Raw bit pattern of the mask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Reports whether no channel is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Channels present in either mask.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Channels present in both masks.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Reports whether the masks share at least one channel.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Channels missing from the mask, within white.
    #[must_use]
    pub const fn complement(self) -> Self {
        Self(Self::WHITE.0 ^ self.0)
    }

    /// Reports whether the channel is part of the mask.
    #[must_use]
    pub const fn contains(self, channel: Channel) -> bool {
        self.intersects(channel.mask())
    }

    /// Number of active channels.
    #[must_use]
    pub const fn channel_count(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `fallback` when the mask is empty.
    #[must_use]
    pub const fn or_if_empty(self, fallback: Self) -> Self {
        if self.is_empty() {
            fallback
        } else {
            self
        }
    }

    /// Active channels in canonical red, green, blue order.
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL
            .into_iter()
            .filter(move |channel| self.contains(*channel))
    }
}

impl From<u8> for ColorMask {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl From<ColorMask> for u8 {
    fn from(mask: ColorMask) -> Self {
        mask.bits()
    }
}

impl From<Channel> for ColorMask {
    fn from(channel: Channel) -> Self {
        channel.mask()
    }
}

impl BitOr for ColorMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitAnd for ColorMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

/// Single color channel. Receivers and filters each key on one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    /// Red channel, bit `1`.
    #[serde(rename = "R")]
    Red,
    /// Green channel, bit `2`.
    #[serde(rename = "G")]
    Green,
    /// Blue channel, bit `4`.
    #[serde(rename = "B")]
    Blue,
}

impl Channel {
    /// Channels in the fixed order used for remainder distribution.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Single-channel mask for the channel.
    #[must_use]
    pub const fn mask(self) -> ColorMask {
        match self {
            Self::Red => ColorMask::RED,
            Self::Green => ColorMask::GREEN,
            Self::Blue => ColorMask::BLUE,
        }
    }

    /// One-letter label used by level files and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Red => "R",
            Self::Green => "G",
            Self::Blue => "B",
        }
    }
}

/// Per-channel split of a beam's intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelShares {
    /// Energy carried on the red channel.
    pub red: u32,
    /// Energy carried on the green channel.
    pub green: u32,
    /// Energy carried on the blue channel.
    pub blue: u32,
}

impl ChannelShares {
    /// Share carried on the provided channel.
    #[must_use]
    pub const fn get(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    /// Energy carried on every channel except the provided one.
    #[must_use]
    pub fn off_channel(&self, channel: Channel) -> u64 {
        Channel::ALL
            .into_iter()
            .filter(|other| *other != channel)
            .map(|other| u64::from(self.get(other)))
            .sum()
    }

    /// Sum of all shares.
    #[must_use]
    pub fn total(&self) -> u64 {
        u64::from(self.red) + u64::from(self.green) + u64::from(self.blue)
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut u32 {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }
}

/// Splits `intensity` across the channels active in `mask`.
///
/// Every active channel receives the floor share; the remainder is handed out
/// one unit at a time in red, green, blue order. The shares always add up to
/// `intensity`, and an empty mask or zero intensity yields all zeros.
#[must_use]
pub fn decompose(mask: ColorMask, intensity: u32) -> ChannelShares {
    let mut shares = ChannelShares::default();
    let active = mask.channel_count();
    if active == 0 || intensity == 0 {
        return shares;
    }

    let base = intensity / active;
    let mut remainder = intensity % active;
    for channel in mask.channels() {
        let bonus = u32::from(remainder > 0);
        remainder -= bonus;
        *shares.slot_mut(channel) = base + bonus;
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::{decompose, Channel, ColorMask};
    use proptest::prelude::*;

    #[test]
    fn white_remainder_goes_to_red_then_green() {
        let shares = decompose(ColorMask::WHITE, 101);
        assert_eq!((shares.red, shares.green, shares.blue), (34, 34, 33));

        let shares = decompose(ColorMask::WHITE, 100);
        assert_eq!((shares.red, shares.green, shares.blue), (34, 33, 33));
    }

    #[test]
    fn two_channel_split_skips_inactive_channel() {
        let shares = decompose(ColorMask::GREEN | ColorMask::BLUE, 5);
        assert_eq!((shares.red, shares.green, shares.blue), (0, 3, 2));
        assert_eq!(shares.off_channel(Channel::Green), 2);
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert_eq!(decompose(ColorMask::NONE, 300).total(), 0);
        assert_eq!(decompose(ColorMask::WHITE, 0).total(), 0);
    }

    #[test]
    fn complement_stays_within_white() {
        assert_eq!(ColorMask::GREEN.complement(), ColorMask::RED | ColorMask::BLUE);
        assert_eq!(ColorMask::WHITE.complement(), ColorMask::NONE);
        assert_eq!(ColorMask::from_bits(0xff), ColorMask::WHITE);
    }

    #[test]
    fn masks_deserialize_with_high_bits_discarded() {
        let mask: ColorMask = serde_json::from_str("12").unwrap_or(ColorMask::NONE);
        assert_eq!(mask, ColorMask::BLUE);
    }

    proptest! {
        #[test]
        fn decomposition_conserves_energy(bits in 1u8..8, intensity in 0u32..100_000) {
            let mask = ColorMask::from_bits(bits);
            let shares = decompose(mask, intensity);
            prop_assert_eq!(shares.total(), u64::from(intensity));
            for channel in Channel::ALL {
                if !mask.contains(channel) {
                    prop_assert_eq!(shares.get(channel), 0);
                }
            }
        }
    }
}
