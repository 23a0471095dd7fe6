// report.rs — Final structured report of a build session
//
// The report is the checker's only durable output:
//
//   { status, errors: [..], types: { stream: descriptor },
//     graph: { stream: [{ kind, weak, child }] } }
//
// Maps are keyed by stream name and sorted, so equal sessions serialize to
// byte-identical JSON. Writing the JSON anywhere is the caller's business.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::operator::OperatorKind;
use crate::pipeline::{BuildSession, Status};
use crate::registry::Stream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub status: Status,
    pub errors: Vec<String>,
    pub types: BTreeMap<String, Descriptor>,
    pub graph: BTreeMap<String, Vec<EdgeRecord>>,
}

/// One outgoing edge as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub kind: OperatorKind,
    pub weak: bool,
    pub child: String,
}

/// The type a stream's data carries downstream: the return type an operator
/// callback gave it, else its first registered input. This is a
/// simplification; with conflicting inputs it is not necessarily the most
/// specific type.
pub fn resolved_type(stream: &Stream) -> Option<&Descriptor> {
    stream
        .outputs
        .first()
        .or_else(|| stream.inputs.first())
        .map(|t| &t.descriptor)
}

impl Report {
    pub fn assemble(session: &BuildSession) -> Self {
        let graph = &session.graph;
        let mut types = BTreeMap::new();
        let mut edges = BTreeMap::new();

        for stream in graph.streams() {
            if let Some(d) = resolved_type(stream) {
                types.insert(stream.name.clone(), d.clone());
            }
            let records: Vec<EdgeRecord> = graph
                .children(stream.id)
                .map(|edge| EdgeRecord {
                    kind: edge.kind,
                    weak: edge.weak,
                    child: graph.stream(edge.target).name.clone(),
                })
                .collect();
            if !records.is_empty() {
                edges.insert(stream.name.clone(), records);
            }
        }

        Report {
            status: session.status,
            errors: session.diagnostics.iter().map(|d| d.headline()).collect(),
            types,
            graph: edges,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Pretty JSON (two-space indent).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Human summary: status line, one line per error, then resolved types.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "status: {} ({} errors, {} typed streams)",
            self.status,
            self.errors.len(),
            self.types.len()
        )?;
        for error in &self.errors {
            writeln!(f, "  {}", error)?;
        }
        for (name, descriptor) in &self.types {
            writeln!(f, "  {}: {}", name, descriptor)?;
        }
        Ok(())
    }
}
