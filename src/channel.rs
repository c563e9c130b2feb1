//! Channel identity: frequency-keyed bandwidth aggregates and the complex
//! (80+80 / 160 MHz) operating-channel shapes used for exclusion accounting.
//!
//! The core canonicalizes on frequency in MHz; an IEEE channel number is
//! only derived for operator-facing printing, never used internally.

use std::fmt;

/// Width of a single preCAC aggregate tracked by a band tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bandwidth {
    Mhz20,
    Mhz40,
    Mhz80,
}

impl Bandwidth {
    /// Number of 20 MHz sub-channels spanned by this bandwidth.
    pub fn n_subchannels(self) -> u8 {
        match self {
            Bandwidth::Mhz20 => 1,
            Bandwidth::Mhz40 => 2,
            Bandwidth::Mhz80 => 4,
        }
    }

    pub fn as_mhz(self) -> u16 {
        match self {
            Bandwidth::Mhz20 => 20,
            Bandwidth::Mhz40 => 40,
            Bandwidth::Mhz80 => 80,
        }
    }

    pub fn from_mhz(mhz: u16) -> Option<Self> {
        match mhz {
            20 => Some(Bandwidth::Mhz20),
            40 => Some(Bandwidth::Mhz40),
            80 => Some(Bandwidth::Mhz80),
            _ => None,
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}MHz", self.as_mhz())
    }
}

/// The width (and, for wide aggregates, the segment layout) of the channel
/// the radio is actually serving clients on. Used only for exclusion
/// accounting; preCAC candidates themselves are always 20/40/80 MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingWidth {
    Mhz20,
    Mhz40,
    Mhz80,
    /// Two independently tuned 80 MHz segments.
    Mhz80Plus80,
    /// A single contiguous 160 MHz channel, expressed as two 80 MHz halves.
    Mhz160,
}

impl OperatingWidth {
    /// Sub-channel count occupied per exclusion center: for 80+80 and
    /// 160 MHz, each 80 MHz half occupies a full 4 sub-channels of its own
    /// band tree.
    pub fn subchannels_per_segment(self) -> u8 {
        match self {
            OperatingWidth::Mhz20 => 1,
            OperatingWidth::Mhz40 => 2,
            OperatingWidth::Mhz80 => 4,
            OperatingWidth::Mhz80Plus80 => 4,
            OperatingWidth::Mhz160 => 4,
        }
    }
}

/// The channel the radio currently serves clients on, in the shape needed to
/// compute exclusion centers for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingChannel {
    pub width: OperatingWidth,
    /// Primary center frequency (MHz). For 20/40/80 this is the only center;
    /// for 160 MHz it is `seg1`, the center of the *entire* 160 MHz span.
    pub center_freq: u16,
    /// Second 80 MHz segment center, only meaningful for 80+80 MHz.
    pub center_freq2: Option<u16>,
}

/// 160 MHz secondary-segment offset from the primary 80 MHz half.
pub const SECSEG_80_OFFSET_MHZ: u16 = 40;

impl OperatingChannel {
    pub fn new_simple(width: OperatingWidth, center_freq: u16) -> Self {
        OperatingChannel {
            width,
            center_freq,
            center_freq2: None,
        }
    }

    pub fn new_80_plus_80(center_freq: u16, center_freq2: u16) -> Self {
        OperatingChannel {
            width: OperatingWidth::Mhz80Plus80,
            center_freq,
            center_freq2: Some(center_freq2),
        }
    }

    /// `seg1` is the 160 MHz channel's 80 MHz center already occupied by
    /// `center_freq`'s low or high half, whichever the tuner landed on; the
    /// second segment sits `SECSEG_80_OFFSET_MHZ` away in the direction away
    /// from the primary 20 MHz.
    pub fn new_160(seg1_80mhz_center: u16, primary_is_low_half: bool) -> Self {
        let seg2 = if primary_is_low_half {
            seg1_80mhz_center + SECSEG_80_OFFSET_MHZ
        } else {
            seg1_80mhz_center - SECSEG_80_OFFSET_MHZ
        };
        OperatingChannel {
            width: OperatingWidth::Mhz160,
            center_freq: seg1_80mhz_center,
            center_freq2: Some(seg2),
        }
    }

    /// The set of 80 MHz centers this operating channel occupies, used to
    /// locate band trees for exclusion accounting and for
    /// `is_done_for_complex_channel`.
    pub fn exclusion_centers(&self) -> Vec<u16> {
        match self.width {
            OperatingWidth::Mhz20 | OperatingWidth::Mhz40 | OperatingWidth::Mhz80 => {
                vec![self.center_freq]
            }
            OperatingWidth::Mhz80Plus80 | OperatingWidth::Mhz160 => {
                let mut v = vec![self.center_freq];
                if let Some(c2) = self.center_freq2 {
                    v.push(c2);
                }
                v
            }
        }
    }
}

/// The 20 MHz sub-channel centers covered by an aggregate at `center` with
/// the given `bandwidth`, derived from the fixed depth-3 band tree shape
/// (root ± 20 for the 40 MHz halves, halves ± 10 for the 20 MHz leaves).
pub fn subchannel_centers(center: u16, bandwidth: Bandwidth) -> Vec<u16> {
    match bandwidth {
        Bandwidth::Mhz20 => vec![center],
        Bandwidth::Mhz40 => vec![center - 10, center + 10],
        Bandwidth::Mhz80 => vec![center - 30, center - 10, center + 10, center + 30],
    }
}

/// Derives the legacy IEEE channel number from a 5 GHz center frequency,
/// for operator-facing printing only.
pub fn freq_to_ieee_channel(freq_mhz: u16) -> u16 {
    (freq_mhz - 5000) / 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subchannels_match_worked_example() {
        // 80 MHz {5260,5280,5300,5320} -> 5290; 40 MHz halves at 5270/5310.
        assert_eq!(
            subchannel_centers(5290, Bandwidth::Mhz80),
            vec![5260, 5280, 5300, 5320]
        );
        assert_eq!(subchannel_centers(5270, Bandwidth::Mhz40), vec![5260, 5280]);
        assert_eq!(subchannel_centers(5310, Bandwidth::Mhz40), vec![5300, 5320]);
    }

    #[test]
    fn ieee_channel_round_trip() {
        assert_eq!(freq_to_ieee_channel(5290), 58);
        assert_eq!(freq_to_ieee_channel(5530), 106);
    }

    #[test]
    fn exclusion_centers_160mhz() {
        let chan = OperatingChannel::new_160(5250, true);
        assert_eq!(chan.exclusion_centers(), vec![5250, 5290]);
        let chan = OperatingChannel::new_160(5530, false);
        assert_eq!(chan.exclusion_centers(), vec![5530, 5490]);
    }
}
