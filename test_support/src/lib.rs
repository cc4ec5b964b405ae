//! Fixture builders for solution trees.
//!
//! Tests describe solutions and projects with [`SolutionSpec`] and
//! [`ProjectSpec`], then write them into a temporary [`Tree`] alongside
//! whatever sources and headers the scenario needs.

pub mod descriptor;
pub mod tree;

pub use descriptor::{ProjectSpec, SolutionSpec};
pub use tree::Tree;

/// Project type id Visual Studio assigns to C++ projects.
pub const CPP_PROJECT_TYPE: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";

/// Id of the ConsoleApp fixture project under `tests/data`.
pub const CONSOLE_APP_ID: &str = "C864A049-0A9E-4139-8217-DA58D9A3B73D";
