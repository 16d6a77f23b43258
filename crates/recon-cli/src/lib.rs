//! Library components of the `recon` command-line tool.

pub mod inputs;
pub mod logging;
