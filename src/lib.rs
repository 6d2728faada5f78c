pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod logging;
pub mod mutator;
pub mod release;
pub mod template;
pub mod ui;

pub use error::{ForgeError, Result};
