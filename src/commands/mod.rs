//! Command orchestration.
pub mod install;
