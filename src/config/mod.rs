//! Configuration loading and management for the paid-leave engine.
//!
//! This module provides functionality to load statutory leave policies from
//! YAML files, including the grant table, retention window, accumulation cap
//! and minimum-usage rule, versioned by effective date.
//!
//! # Example
//!
//! ```no_run
//! use leave_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/statutory").unwrap();
//! println!("Loaded policy: {}", config.metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CarryoverRules, FiscalYearStart, GrantTable, GrantTier, LeavePolicy, MinimumUsageRules,
    PolicyConfig, PolicyMetadata, StatutoryRules,
};
