pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod model;
pub mod parse;
pub mod transform;

pub use config::SynthConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use ir::SynthesisOutput;
pub use transform::{synthesize, synthesize_batch};
