//! Aggregation, selection workflow and reconciliation.
//!
//! - [`aggregate`]: fan a title out to the enabled providers
//! - [`BatchWorkflow`]: drive fetch / choose / apply over a batch of records
//! - [`reconcile`]: merge a chosen result into a record under an [`UpdateStrategy`]

mod aggregate;
mod reconcile;
mod workflow;

pub use aggregate::{aggregate, search_enabled};
pub use reconcile::{
    creator_signature, mapped_field_names, reconcile, ReconcileOutcome, UpdateStrategy,
};
pub use workflow::{
    BatchReport, BatchWorkflow, RecordState, Reporter, Selection, SelectionContext,
    SelectionSurface,
};
