pub mod composition;
pub mod name_normalizer;
mod operations;
pub mod ref_resolver;
pub mod registry;
pub mod synthesizer;

use log::info;
use rayon::prelude::*;

use crate::config::SynthConfig;
use crate::ir::SynthesisOutput;
use crate::model::SchemaModel;
use crate::parse::spec::OpenApiSpec;

pub use ref_resolver::{EntryState, Lookup, ReferenceResolver};
pub use registry::TypeRegistry;
pub use synthesizer::TypeSynthesizer;

/// Synthesize type declarations for every component schema of `spec`, plus
/// operation bindings when `config.include_operations` is set.
///
/// Never fails as a whole: schemas that cannot be synthesized are reported
/// in [`SynthesisOutput::diagnostics`] and left out.
pub fn synthesize(spec: &OpenApiSpec, config: &SynthConfig) -> SynthesisOutput {
    let (model, diagnostics) = SchemaModel::from_spec(spec);
    info!(
        "synthesizing {} component schemas ({:?})",
        model.len(),
        model.version()
    );

    let mut synth = TypeSynthesizer::new(&model, config);
    synth.run();

    let operations = if config.include_operations {
        operations::bind_operations(spec, &mut synth, &config.naming)
    } else {
        Vec::new()
    };

    synth.finish(operations, diagnostics)
}

/// Synthesize independent documents in parallel. Results keep input order.
pub fn synthesize_batch(specs: &[OpenApiSpec], config: &SynthConfig) -> Vec<SynthesisOutput> {
    specs
        .par_iter()
        .map(|spec| synthesize(spec, config))
        .collect()
}
