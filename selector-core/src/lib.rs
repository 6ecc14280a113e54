//! Selection-consistency engine for hierarchical feature models.
//!
//! # Core Concepts
//!
//! - [`FeatureTree`]: Indexed, parent-linked feature hierarchy built once per ingested
//!   document. Immutable until replaced wholesale.
//! - [`Selection`]: The set of currently chosen feature ids. Only the [`Propagator`]
//!   produces new selections.
//! - [`Propagator`]: Applies one select/deselect event under the mandatory and group rules.
//! - [`Payload`]: Constraint and selection document handed to an external validator.
//! - [`Session`]: One user's tree, selection, and expansion state with deterministic
//!   event replay.

pub mod models;
pub mod payload;
pub mod render;
pub mod selection;
pub mod session;
pub mod tree;

pub use models::*;
pub use payload::{build_payload, build_request, Payload};
pub use render::render_tree;
pub use selection::{Intent, Propagator, Selection, SelectionPolicy};
pub use session::{Session, SessionEvent};
pub use tree::{FeatureNode, FeatureTree, TreeError};
