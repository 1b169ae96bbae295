//! Pipeline module - loading, cleaning, joining and analysis stages

pub mod binning;
pub mod config;
pub mod correlation;
pub mod customers;
pub mod describe;
pub mod diagnostics;
pub mod events;
pub mod indicator;
pub mod join;
pub mod loader;
pub mod offers;
pub mod quality;
pub mod run;
pub mod writer;

pub use binning::*;
pub use config::*;
pub use correlation::*;
pub use customers::*;
pub use describe::*;
pub use diagnostics::*;
pub use events::*;
pub use indicator::{Category, IndicatorEncoding, IndicatorSet, CHANNELS, EVENT_KINDS};
pub use join::*;
pub use loader::*;
pub use offers::*;
pub use quality::*;
pub use run::*;
pub use writer::*;
