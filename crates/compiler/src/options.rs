//! Compiler configuration consulted by the core.

use serde::{Deserialize, Serialize};

/// Options that influence naming and emission decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Allocate short `$`-names for types and members that are not visible
    /// outside their assembly.
    pub minimize_names: bool,
    /// Also minimize names of externally visible types and members.
    pub minimize_public_names: bool,
    /// Emit downcasts as the bare operand instead of a checked runtime call.
    pub omit_downcasts: bool,
    /// Skip the runtime helpers that check nullable values for null.
    pub omit_nullable_checks: bool,
}

impl CompilerOptions {
    pub fn new() -> CompilerOptions {
        CompilerOptions::default()
    }
}
