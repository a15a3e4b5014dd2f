//! Analysis Configuration Module
//!
//! Provides the detector, consolidator and LLM-provider tunables loaded from
//! TOML, with built-in defaults matching the documented constants.
//!
//! ## Loading Order
//!
//! 1. `WELLSCAN_CONFIG` environment variable (path to TOML file)
//! 2. `wellscan.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The configuration is an ordinary value: load it once and pass references
//! into the analysis. Nothing in the crate reads configuration from global
//! state, so concurrent analyses with different configs never interfere.
//!
//! ```ignore
//! let config = WellscanConfig::load();
//! let output = wellscan::analysis::analyze(&request, &config);
//! ```

mod wellscan_config;
pub mod defaults;
pub mod validation;

pub use wellscan_config::*;
