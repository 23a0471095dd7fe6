// verify.rs — Per-stream type consistency checks
//
// After propagation every stream's input list holds all types attributed to
// the data entering it. A consistent program has exactly one shape per
// stream; anything else is reported, all in one pass.
//
// Preconditions: propagation has reached its fixpoint.
// Postconditions: `session.status` is `Success` iff no diagnostic was raised
//                 by any pass, `Fail` otherwise.
// Failure modes: none (problems become diagnostics).
// Side effects: appends to `session.diagnostics`; sets `session.status`.

use crate::descriptor::place;
use crate::diag::{DiagKind, Diagnostic};
use crate::pipeline::{BuildSession, Status};
use crate::registry::Stream;

/// Check every stream and decide the session status.
pub fn verify(session: &mut BuildSession) {
    let mut found = Vec::new();
    for stream in session.graph.streams() {
        check_consistency(stream, &mut found);
        check_typed(stream, &mut found);
    }
    for diag in found {
        session.push_diagnostic(diag);
    }

    session.status = if session.diagnostics.is_empty() {
        Status::Success
    } else {
        Status::Fail
    };
}

/// One `TypeMismatch` per unordered pair of disagreeing inputs.
fn check_consistency(stream: &Stream, out: &mut Vec<Diagnostic>) {
    for (i, first) in stream.inputs.iter().enumerate() {
        for second in &stream.inputs[i + 1..] {
            if first.same_shape(second) {
                continue;
            }
            out.push(
                Diagnostic::new(
                    DiagKind::TypeMismatch,
                    first.locator.clone(),
                    format!(
                        "stream \"{}\" type {} at {} conflicts with type {} at {}",
                        stream.name,
                        first.descriptor,
                        place(first.locator.as_ref()),
                        second.descriptor,
                        place(second.locator.as_ref()),
                    ),
                )
                .with_related(
                    second.locator.clone(),
                    format!("{} ({})", second.descriptor, second.provenance),
                ),
            );
        }
    }
}

fn check_typed(stream: &Stream, out: &mut Vec<Diagnostic>) {
    if stream.inputs.is_empty() {
        out.push(
            Diagnostic::new(
                DiagKind::Untyped,
                stream.locator.clone(),
                format!("stream \"{}\" has no types at all", stream.name),
            )
            .with_hint("declare its type or feed it from a typed operator"),
        );
    }
}
