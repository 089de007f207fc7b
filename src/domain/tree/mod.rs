//! Tree module - versioned decision DAG and its traversal.
//!
//! - `predicate` - closed predicate set with declared outcome domains
//! - `node` - branch and terminal nodes
//! - `tree` - catalog definition and the validated, immutable tree
//! - `validation` - structural checks run before activation
//! - `engine` - deterministic `step`

mod engine;
mod node;
mod predicate;
#[allow(clippy::module_inception)]
mod tree;
mod validation;

pub use engine::{NodeResult, TraversalError};
pub use node::{DecisionNode, Edge, NodeKind};
pub use predicate::{
    ConcernOutcome, HistoryOutcome, IntensityBand, Outcome, Predicate, SituationOutcome,
    TimeOutcome,
};
pub use tree::{DecisionTree, TreeDefinition};
pub use validation::{validate, StructuralError};
