// pipeline.rs — Build session state and pass orchestration
//
// A `BuildSession` owns everything one check produces: the stream graph, the
// accumulated diagnostics and the final status. Sessions share nothing, so
// any number can run side by side. `run_pipeline` executes the minimal
// ordered set of passes for a terminal pass; `check` runs all of them and
// assembles the report.
//
// Preconditions: the session is fresh (one session per event stream).
// Postconditions: after `PassId::Verify`, `status` is `Success` or `Fail`.
// Failure modes: `SchemaViolation` from the build pass aborts the run; later
//                passes never start and no report is produced.
// Side effects: `on_pass_complete` is called after each pass; phase timings
//               and pass invariants are logged at debug level.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diag::Diagnostic;
use crate::event::Event;
use crate::graph::{build_graph, SchemaViolation};
use crate::pass::{descriptor, required_passes, PassId};
use crate::propagate::{propagate, PropagationStats, WorklistOrder};
use crate::registry::StreamGraph;
use crate::report::Report;
use crate::verify::verify;

// ── Configuration ──────────────────────────────────────────────────────────

/// Knobs for one check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Pop discipline of the propagation worklist. Results do not depend on
    /// it; only the iteration count does.
    pub order: WorklistOrder,
}

// ── Session ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Fail,
    Success,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Fail => "fail",
            Status::Success => "success",
        };
        f.write_str(s)
    }
}

/// All state of one build.
#[derive(Debug)]
pub struct BuildSession {
    pub graph: StreamGraph,
    pub diagnostics: Vec<Diagnostic>,
    pub status: Status,
    pub options: CheckOptions,
    /// Set once the propagate pass has run.
    pub propagation: Option<PropagationStats>,
}

impl BuildSession {
    pub fn new(options: CheckOptions) -> Self {
        BuildSession {
            graph: StreamGraph::new(),
            diagnostics: Vec::new(),
            status: Status::Pending,
            options,
            propagation: None,
        }
    }

    /// Record a soft diagnostic. The build carries on. Reporting it to the
    /// user is up to the `on_pass_complete` callback.
    pub fn push_diagnostic(&mut self, diag: Diagnostic) {
        debug!(code = %diag.code(), "{}", diag.message);
        self.diagnostics.push(diag);
    }
}

impl Default for BuildSession {
    fn default() -> Self {
        Self::new(CheckOptions::default())
    }
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
///
/// Per-pass sequence: execute → log timing → `on_pass_complete` with the
/// diagnostics that pass raised.
pub fn run_pipeline<I>(
    session: &mut BuildSession,
    events: I,
    terminal: PassId,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), SchemaViolation>
where
    I: IntoIterator<Item = Event>,
{
    let mut events = Some(events);
    for pass_id in required_passes(terminal) {
        let t = Instant::now();
        let first_new = session.diagnostics.len();
        match pass_id {
            PassId::Build => {
                if let Some(events) = events.take() {
                    build_graph(session, events)?;
                }
            }
            PassId::Propagate => {
                let stats = propagate(&mut session.graph, session.options.order);
                session.propagation = Some(stats);
            }
            PassId::Verify => verify(session),
        }
        let elapsed = t.elapsed();
        let desc = descriptor(pass_id);
        debug!(
            invariants = desc.invariants,
            "{} complete, {:.1}ms ({} streams, {} edges)",
            desc.name,
            elapsed.as_secs_f64() * 1000.0,
            session.graph.len(),
            session.graph.edge_count()
        );
        on_pass_complete(pass_id, &session.diagnostics[first_new..]);
    }
    Ok(())
}

/// Check one event stream end to end and assemble the report.
pub fn check<I>(events: I, options: CheckOptions) -> Result<Report, SchemaViolation>
where
    I: IntoIterator<Item = Event>,
{
    let mut session = BuildSession::new(options);
    run_pipeline(&mut session, events, PassId::Verify, |_, _| {})?;
    Ok(Report::assemble(&session))
}
