//! Pieces shared by every crate in the workspace: response types and
//! logging setup.

pub mod types;
pub mod utils;
