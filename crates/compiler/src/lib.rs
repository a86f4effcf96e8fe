//! # Reef Compiler Core
//!
//! The core of a compiler from a statically typed, class-based managed
//! language to script for a prototype-based runtime. Three subsystems do the
//! heavy lifting:
//!
//! - [`import`]: the metadata importer, a deterministic oracle that decides
//!   for every type and member how it appears in the output script, and
//!   validates the attribute combinations that drive those decisions.
//! - [`runtime`]: the runtime-call emitter, typed builders for the script
//!   expressions that address the runtime helper surface (type tests,
//!   nullable lifting, delegate binding, iterator and async primitives).
//! - [`rewrite`]: the state-machine rewriter, which lowers labels, gotos
//!   and exception regions to loop-and-switch dispatch.
//!
//! The source-language parser and type resolver are external; [`model`]
//! defines the read-only symbol graph they hand over. Diagnostics are
//! numbered and accumulate in a [`diag::DiagnosticCollector`]; the driver
//! checks the error flag between phases and suppresses output when set.
//!
//! ```no_run
//! use reef_compiler::import::MetadataImporter;
//! use reef_compiler::model::TypeModel;
//! use reef_compiler::options::CompilerOptions;
//!
//! let model = TypeModel::new();
//! // ... populated by the driver from the parsed compilation ...
//! let options = CompilerOptions::new();
//! let mut importer = MetadataImporter::new(&model, &options);
//! importer.prepare_all();
//! assert!(!importer.has_errors());
//! ```

pub mod diag;
pub mod import;
pub mod model;
pub mod options;
pub mod rewrite;
pub mod runtime;

pub use diag::{Diagnostic, DiagnosticCode, DiagnosticCollector, Severity};
pub use import::MetadataImporter;
pub use options::CompilerOptions;
pub use rewrite::rewrite_body;
pub use runtime::RuntimeLibrary;
