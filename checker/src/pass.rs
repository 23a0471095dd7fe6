// pass.rs — Pass descriptor module: metadata and dependency resolution
//
// Declares the checker's three passes and their dependency edges. Used by the
// pipeline runner to compute the minimal pass subset for a requested output
// (a DOT rendering needs the propagated graph but no verification).

use std::collections::HashSet;

// ── Pass identifiers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Build,
    Propagate,
    Verify,
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a checker pass.
pub struct PassDescriptor {
    /// Human-readable name for logs.
    pub name: &'static str,
    /// Passes whose outputs this pass consumes.
    pub inputs: &'static [PassId],
    /// Postcondition, for documentation and logs.
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::Build => PassDescriptor {
            name: "build",
            inputs: &[],
            invariants: "all streams and edges registered, operator types attached",
        },
        PassId::Propagate => PassDescriptor {
            name: "propagate",
            inputs: &[PassId::Build],
            invariants: "every strong child holds each output type of its parents",
        },
        PassId::Verify => PassDescriptor {
            name: "verify",
            inputs: &[PassId::Propagate],
            invariants: "diagnostics complete, status decided",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in execution order.
pub const ALL_PASSES: [PassId; 3] = [PassId::Build, PassId::Propagate, PassId::Verify];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}
