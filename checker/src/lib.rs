// streamck — Stream type checker
//
// Library root. Builds a stream graph from scanner events, propagates
// operator-derived types to a fixpoint, and verifies that every stream
// carries exactly one type.

pub mod descriptor;
pub mod diag;
pub mod dot;
pub mod event;
pub mod graph;
pub mod operator;
pub mod pass;
pub mod pipeline;
pub mod propagate;
pub mod registry;
pub mod report;
pub mod verify;

pub use descriptor::{Descriptor, Locator, Provenance};
pub use event::{Argument, CallbackSignature, Event, NodeRef};
pub use graph::SchemaViolation;
pub use pipeline::{check, BuildSession, CheckOptions, Status};
pub use propagate::WorklistOrder;
pub use report::Report;
