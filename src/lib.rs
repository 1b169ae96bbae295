//! Offerlens: promotional offer response analysis
//!
//! Cleans and joins an offer portfolio, customer profiles and an event
//! transcript, then characterises which demographic segments complete
//! which offers.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
