// dot.rs — Graphviz DOT output for stream graphs
//
// Renders a (typically propagated) StreamGraph in DOT format suitable for
// `dot` or other Graphviz layout engines. Streams are labelled with their
// resolved type and coloured by consistency; weak edges are dashed.
//
// Preconditions: `graph` is a fully constructed StreamGraph.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt;

use crate::operator::OperatorKind;
use crate::registry::{Edge, Stream, StreamGraph};
use crate::report::resolved_type;

/// Emit the stream graph as a Graphviz DOT string.
pub fn emit_dot(graph: &StreamGraph) -> String {
    DotGraph(graph).to_string()
}

/// Display adapter producing the DOT text.
pub struct DotGraph<'a>(pub &'a StreamGraph);

impl fmt::Display for DotGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "digraph streams {{")?;
        writeln!(f, "    rankdir=LR;")?;
        writeln!(f, "    node [fontname=\"Helvetica\", fontsize=10];")?;
        writeln!(f, "    edge [fontname=\"Helvetica\", fontsize=9];")?;

        writeln!(f)?;
        for stream in graph.streams() {
            writeln!(f, "    n{} [{}];", stream.id.0, node_attrs(stream))?;
        }

        if graph.edge_count() > 0 {
            writeln!(f)?;
        }
        for edge in graph.edges() {
            writeln!(
                f,
                "    n{} -> n{} [{}];",
                edge.source.0,
                edge.target.0,
                edge_attrs(edge)
            )?;
        }

        writeln!(f, "}}")
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Consistent streams are blue, conflicting ones salmon, untyped ones gray.
fn node_attrs(stream: &Stream) -> String {
    let consistent = stream
        .inputs
        .iter()
        .all(|t| t.same_shape(&stream.inputs[0]));
    let color = if stream.inputs.is_empty() {
        "lightgray"
    } else if consistent {
        "lightblue"
    } else {
        "lightsalmon"
    };
    let label = match resolved_type(stream) {
        Some(d) => format!("{}\\n{}", escape(&stream.name), escape(&d.to_string())),
        None => escape(&stream.name),
    };
    format!("shape=box, style=filled, fillcolor={color}, label=\"{label}\"")
}

fn edge_attrs(edge: &Edge) -> String {
    let label = match edge.literal {
        Some(n) => format!("{}({})", edge.kind, n),
        None => edge.kind.to_string(),
    };
    let mut attrs = format!("label=\"{label}\"");
    if edge.weak {
        attrs.push_str(", style=dashed");
    } else if edge.kind == OperatorKind::To {
        attrs.push_str(", style=bold, color=blue");
    }
    attrs
}
