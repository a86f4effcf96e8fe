//! The state-machine rewriter.

mod state_machine;

pub use state_machine::{rewrite_body, RewriteError};
