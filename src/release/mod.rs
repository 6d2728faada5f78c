//! Release branch forking and tag publishing

pub mod forge;
pub mod tags;

pub use forge::{fork_release_branch, render_branch_name, DIVERGE_MESSAGE};
pub use tags::{pending_tags, TagProcessor, TagReport};
