//! Invoice field extraction module.

pub mod enrichment;
mod matcher;
mod orchestrator;
pub mod rules;

pub use enrichment::{enrichment_prompt, parse_model_output, EnrichedFields, Enricher};
pub use matcher::{FieldMatches, LabelMatcher};
pub use orchestrator::{Orchestrator, SourceDocument};
