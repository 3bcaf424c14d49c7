//! Threshold classification of a single swim against a single standard.

use serde::{Deserialize, Serialize};

/// Ratio window above a cut that counts as a near miss.
///
/// A swim is in the band when `min <= time / cut <= max`, or
/// `min < time / cut <= max` when `min_inclusive` is off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearBand {
    pub min: f64,
    pub max: f64,
    #[serde(default = "inclusive")]
    pub min_inclusive: bool,
}

fn inclusive() -> bool {
    true
}

impl NearBand {
    pub const NEAR_MIN: f64 = 1.0001;

    /// 100.01% to 100.3% of the cut, both ends included.
    pub const TIGHT: NearBand = NearBand {
        min: Self::NEAR_MIN,
        max: 1.003,
        min_inclusive: true,
    };

    /// Just over 100.01% up to 103% of the cut.
    pub const BUBBLE: NearBand = NearBand {
        min: Self::NEAR_MIN,
        max: 1.03,
        min_inclusive: false,
    };

    pub fn contains(&self, ratio: f64) -> bool {
        let above_min = if self.min_inclusive {
            ratio >= self.min
        } else {
            ratio > self.min
        };
        above_min && ratio <= self.max
    }
}

impl Default for NearBand {
    fn default() -> Self {
        NearBand::TIGHT
    }
}

/// How far a swim missed a standard by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Miss {
    /// `time / standard`, always above 1.
    pub ratio: f64,
    /// `time - standard`, positive. Used for closest-miss ranking.
    pub diff_sec: f64,
    /// `standard - time`, negative. How much faster the swimmer must go.
    pub delta_sec: f64,
    /// Whether the ratio fell inside the configured band.
    pub near: bool,
}

/// Outcome of comparing one swim against one banded standard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Achieved,
    Missed(Miss),
}

/// A standard only takes part in classification when it parsed to a
/// positive number of seconds.
pub fn usable(standard_sec: Option<f64>) -> Option<f64> {
    standard_sec.filter(|s| *s > 0.0)
}

/// Classifies `time_sec` against a banded standard (the cut).
///
/// Returns `None` when the standard is missing or non-positive. A miss is
/// always reported; [`Miss::near`] says whether it also falls in `band`.
pub fn classify(time_sec: f64, standard_sec: Option<f64>, band: &NearBand) -> Option<Verdict> {
    let standard = usable(standard_sec)?;

    if time_sec <= standard {
        return Some(Verdict::Achieved);
    }

    let ratio = time_sec / standard;
    Some(Verdict::Missed(Miss {
        ratio,
        diff_sec: time_sec - standard,
        delta_sec: standard - time_sec,
        near: band.contains(ratio),
    }))
}

/// Graded standards only have the achieved rule.
pub fn meets(time_sec: f64, standard_sec: Option<f64>) -> bool {
    usable(standard_sec).is_some_and(|s| time_sec <= s)
}

/// Near-miss test for an already known best time, anchored to `cut_sec`.
pub fn in_band(time_sec: f64, cut_sec: Option<f64>, band: &NearBand) -> bool {
    usable(cut_sec).is_some_and(|cut| time_sec > cut && band.contains(time_sec / cut))
}
