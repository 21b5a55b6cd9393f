pub mod error;
pub mod config;

pub mod record;
pub mod reader;
pub mod scanner;
pub mod similarity;
pub mod stats;
pub mod aggregate;
pub mod filter;
pub mod screen;

pub mod digest;
pub mod fpf;
pub mod targets;
pub mod transport;

pub use crate::aggregate::{ResultMapping, ScoreRow};
pub use crate::config::{FingerprintKind, ScreenConfig, ThresholdPolicy};
pub use crate::error::{Result, ScreenError};
pub use crate::record::{Fingerprint, MoleculeRecord};
pub use crate::screen::{screen_path, screen_reader, QueryTask, Screening};
