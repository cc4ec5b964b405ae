//! vcxgraph core library.
//!
//! Static analysis of MSBuild C/C++ builds: [`solution`] parses `.sln` files
//! and their `.vcxproj` descriptors into a [`model::Solution`], [`rules`]
//! derives include search paths per configuration, [`include_graph`] resolves
//! the transitive includes of a source file, and [`targets`] computes which
//! targets a build script would run. Nothing is compiled or executed.

pub mod cli;
pub mod dgml;
pub mod diagnostics;
pub mod include_graph;
pub mod model;
pub mod msbuild;
pub mod paths;
pub mod project;
pub mod rules;
pub mod runner;
pub mod solution;
pub mod targets;
