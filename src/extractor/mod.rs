//! Deterministic post-processing of model-generated text.

pub mod response;
pub mod sop;

pub use response::{extract_confidence, extract_reasoning, extract_steps, ResolutionSummary};
pub use sop::{sop_index_text, SopDocument, SopFallback};
