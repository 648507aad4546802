//! Specification handling: file discovery, parsing, interpolation, and
//! materialization into deployable entries.

pub mod loader;
pub mod template;
pub mod types;

pub use loader::{find_spec_file, parse_spec, SpecLoader, DEFAULT_SPEC_FILES};
pub use types::{Entry, Generate, Provider, RawSpec, ResolvedSpec};
