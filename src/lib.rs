//! A Zero-CAC pre-CAC engine for 5 GHz DFS radios in the ETSI regulatory
//! domain: tracks channel-availability-check and non-occupancy state across
//! a radio's DFS bands and decides, ahead of time, which channel it should
//! switch to next.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use etsi_precac::{HardwareCapability, PrecacConfig, PrecacEngine};
//! use etsi_precac::regulatory::StaticRegulatoryDomain;
//! use etsi_precac::collaborators::testing::{
//!     RecordingFirmware, RecordingManagement, RecordingTimer,
//! };
//!
//! let engine = PrecacEngine::new(
//!     Box::new(StaticRegulatoryDomain::etsi_reference()),
//!     Box::new(RecordingManagement::default()),
//!     Box::new(RecordingFirmware::default()),
//!     Box::new(RecordingTimer::default()),
//!     PrecacConfig::default(),
//!     HardwareCapability::Legacy,
//! );
//! engine.set_precac_enable(true);
//! ```

pub mod channel;
pub mod collaborators;
pub mod config;
mod engine;
pub mod error;
mod forest;
mod node;
mod operator;
mod radar;
pub mod regulatory;
mod selection;
pub mod timer;
mod tree;

pub use channel::{Bandwidth, OperatingChannel, OperatingWidth};
pub use config::PrecacConfig;
pub use engine::{HardwareCapability, PrecacEngine};
pub use error::{PrecacError, Result};
pub use operator::PrecacChanState;
pub use selection::Exclusion;
pub use timer::{Mode, OcacStatus};
