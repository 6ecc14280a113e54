//! Wire and domain records shared by the engine and its collaborators.
//!
//! - [`RawNode`] / [`IngestResponse`]: what the ingestion service returns.
//! - [`GroupType`]: how a node's children are jointly constrained.
//! - [`FeatureSnapshot`]: parent-free tree snapshot for transmission.
//! - [`CrossTreeConstraint`]: `requires` dependencies between branches.
//! - [`ValidationRequest`] / [`ValidationResponse`]: validator boundary.
//! - [`TranslateRequest`] / [`TranslateResponse`]: translator boundary.

mod constraint;
mod feature;
mod translation;
mod validation;

pub use constraint::*;
pub use feature::*;
pub use translation::*;
pub use validation::*;
