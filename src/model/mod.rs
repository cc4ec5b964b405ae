//! In-memory model of solutions, projects, and configurations.
//!
//! The descriptor formats look properties up by string at evaluation time.
//! Here everything is evaluated once at parse time into typed
//! [`ConfigurationSettings`], so later queries never touch the descriptors.

mod configuration;
mod id;
mod project;
mod solution;

pub use configuration::{
    ConfigurationName, ConfigurationSettings, Defines, IncludeRules, parse_defines,
};
pub use id::ProjectId;
pub use project::Project;
pub use solution::Solution;
