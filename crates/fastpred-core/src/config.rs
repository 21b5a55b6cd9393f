// crates/fastpred-core/src/config.rs

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScreenError};

/// Size in bytes of the big-endian bit-length field of a query record.
pub const FP_LENGTH_SIZE: usize = 4;

/// Longest molecule id a record may carry.
pub const MAX_ID_LEN: usize = 254;

/// Default cut-off on the finalized mean z-score (normalized mode).
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 0.8;

/// Default number of targets reported per query molecule.
pub const DEFAULT_MAX_TARGETS: usize = 100;

/// Fingerprint families the reference collections are built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FingerprintKind {
    Ecfp4,
    Ecfp6,
    Maccs,
    PathLength,
}

impl FingerprintKind {
    pub const ALL: [FingerprintKind; 4] = [
        FingerprintKind::Ecfp4,
        FingerprintKind::Ecfp6,
        FingerprintKind::Maccs,
        FingerprintKind::PathLength,
    ];

    pub fn bits(self) -> u32 {
        match self {
            FingerprintKind::Ecfp4 | FingerprintKind::Ecfp6 | FingerprintKind::PathLength => 1024,
            FingerprintKind::Maccs => 328,
        }
    }

    pub fn byte_len(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Raw Tanimoto cut-off applied when the caller gives none.
    pub fn default_threshold(self) -> f64 {
        match self {
            FingerprintKind::Ecfp4 | FingerprintKind::Ecfp6 => 0.6,
            FingerprintKind::Maccs => 0.8,
            FingerprintKind::PathLength => 0.7,
        }
    }

    /// Name used in collection file names (`<prefix>_<NAME>.bfp`).
    pub fn name(self) -> &'static str {
        match self {
            FingerprintKind::Ecfp4 => "ECFP4",
            FingerprintKind::Ecfp6 => "ECFP6",
            FingerprintKind::Maccs => "MACCS",
            FingerprintKind::PathLength => "PL",
        }
    }
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FingerprintKind {
    type Err = ScreenError;

    fn from_str(s: &str) -> Result<Self> {
        FingerprintKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScreenError::Argument(format!("unknown fingerprint kind: {s}")))
    }
}

/// How a raw score is matched to the threshold it is compared against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThresholdPolicy {
    /// Compare each score with the threshold of the iteration that produced it.
    #[default]
    PerIteration,
    /// Compare every score with the threshold of the first iteration.
    FirstOnly,
}

/// Per-call screening options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenConfig {
    /// Mean z-score cut-off; 0 disables the rule.
    pub zscore_threshold: f64,
    pub normalize: bool,
    pub threshold_policy: ThresholdPolicy,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: 0.0,
            normalize: false,
            threshold_policy: ThresholdPolicy::default(),
        }
    }
}

impl ScreenConfig {
    pub fn normalized(zscore_threshold: f64) -> Self {
        Self { zscore_threshold, normalize: true, ..Self::default() }
    }

    pub fn zscore_rule_active(&self) -> bool {
        self.normalize && self.zscore_threshold != 0.0
    }
}
