//! Viewer core for synthetic arterial trees.
//!
//! Reads growth-step VTK files, rebuilds the rooted tree, derives per-branch
//! attributes in breadth-first order and answers picking and render queries.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
