//! Estimates the on-disk size of assets by summing the files of their
//! deduplicated transitive dependency sets.

pub mod addressables;
pub mod asset_ref;
pub mod cli;
pub mod error;
pub mod graph;
pub mod path_utils;
pub mod program;
pub mod progress_bar;
pub mod project;
pub mod sizer;
pub mod utils;
