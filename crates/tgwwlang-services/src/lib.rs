//! Orchestration layer over the lower-level crates: the mutations an update
//! run applies to a langfile, and the run pipeline the CLI drives.

pub use tgwwlang_core::Result;

pub mod attributes;
pub mod comments;
pub mod merge;
pub mod pipeline;

pub use attributes::assign_attributes;
pub use comments::reattach_comments;
pub use merge::{merge_strings, MergeOptions};
pub use pipeline::{run, run_with_schema, Mode, ModelInput, RunRequest, Source};
