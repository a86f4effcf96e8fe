//! The runtime-call emitter.

mod library;

pub use library::RuntimeLibrary;
