// propagate.rs — Worklist type propagation over the stream graph
//
// Pushes every stream's output descriptors into the inputs of its children
// along strong edges, until no stream changes. Feedback loops drawn with
// `to` are legal; termination follows from inputs only growing, additions
// being deduplicated by shape, and the set of distinct descriptors being
// fixed once the build pass is done.
//
// Preconditions: the build pass has completed.
// Postconditions: for every strong edge `s → t`, each output descriptor of
//                 `s` is (structurally) present among the inputs of `t`.
// Failure modes: none.
// Side effects: appends to stream input lists only; edges are untouched.

use std::collections::VecDeque;

use tracing::trace;

use crate::registry::{StreamGraph, StreamId};

/// Which end of the worklist is popped next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorklistOrder {
    /// Stack discipline: most recently enqueued stream first.
    #[default]
    Lifo,
    /// Queue discipline: streams in enqueue order.
    Fifo,
}

/// Work done by one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Streams popped from the worklist.
    pub iterations: usize,
    /// Descriptors appended to some stream's inputs.
    pub additions: usize,
}

struct Worklist {
    items: VecDeque<StreamId>,
    queued: Vec<bool>,
    order: WorklistOrder,
}

impl Worklist {
    /// Seeded with `seed` in the given order, followed by every stream the
    /// seed left out, in registration order. Duplicates are skipped.
    fn seeded(graph: &StreamGraph, seed: &[StreamId], order: WorklistOrder) -> Self {
        let mut worklist = Worklist {
            items: VecDeque::with_capacity(graph.len()),
            queued: vec![false; graph.len()],
            order,
        };
        for &id in seed {
            worklist.push(id);
        }
        for stream in graph.streams() {
            worklist.push(stream.id);
        }
        worklist
    }

    fn pop(&mut self) -> Option<StreamId> {
        let id = match self.order {
            WorklistOrder::Lifo => self.items.pop_back()?,
            WorklistOrder::Fifo => self.items.pop_front()?,
        };
        self.queued[id.0 as usize] = false;
        Some(id)
    }

    /// Enqueue unless already waiting.
    fn push(&mut self, id: StreamId) {
        let slot = &mut self.queued[id.0 as usize];
        if !*slot {
            *slot = true;
            self.items.push_back(id);
        }
    }
}

/// Run propagation to its fixpoint.
pub fn propagate(graph: &mut StreamGraph, order: WorklistOrder) -> PropagationStats {
    propagate_seeded(graph, order, &[])
}

/// Like [`propagate`], but the worklist starts out holding `seed` (in that
/// order) ahead of the remaining streams. The fixpoint does not depend on
/// the seed; the iteration count may.
pub fn propagate_seeded(
    graph: &mut StreamGraph,
    order: WorklistOrder,
    seed: &[StreamId],
) -> PropagationStats {
    let mut stats = PropagationStats::default();
    let mut worklist = Worklist::seeded(graph, seed, order);

    while let Some(id) = worklist.pop() {
        stats.iterations += 1;

        let stream = graph.stream(id);
        if stream.outputs.is_empty() {
            continue;
        }
        let outputs = stream.outputs.clone();
        let targets: Vec<StreamId> = graph
            .children(id)
            .filter(|edge| !edge.weak)
            .map(|edge| edge.target)
            .collect();

        for output in &outputs {
            for &target in &targets {
                if graph.stream(target).has_input(&output.descriptor) {
                    continue;
                }
                trace!(
                    from = %graph.stream(id).name,
                    to = %graph.stream(target).name,
                    descriptor = %output.descriptor,
                    "propagated"
                );
                graph.add_input(target, output.clone());
                stats.additions += 1;
                worklist.push(target);
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, Provenance, TypeInfo};
    use crate::operator::OperatorKind;
    use crate::registry::EdgeAttrs;

    fn out(d: Descriptor) -> TypeInfo {
        TypeInfo::new(d, Provenance::CallbackOutput, None)
    }

    fn input_shapes(g: &StreamGraph, name: &str) -> Vec<Descriptor> {
        g.by_name(name)
            .unwrap()
            .inputs
            .iter()
            .map(|t| t.descriptor.clone())
            .collect()
    }

    #[test]
    fn outputs_reach_strong_children() {
        let mut g = StreamGraph::new();
        let a = g.get_or_create("a", None);
        let b = g.get_or_create("b", None);
        let c = g.get_or_create("c", None);
        g.add_output(a, out(Descriptor::string()));
        g.connect(a, b, EdgeAttrs::strong(OperatorKind::Filter));
        g.connect(a, c, EdgeAttrs::weak(OperatorKind::With));

        let stats = propagate(&mut g, WorklistOrder::Lifo);
        assert_eq!(input_shapes(&g, "b"), vec![Descriptor::string()]);
        assert!(input_shapes(&g, "c").is_empty());
        assert_eq!(stats.additions, 1);
        // Provenance is preserved from the output.
        assert_eq!(g.stream(b).inputs[0].provenance, Provenance::CallbackOutput);
    }

    #[test]
    fn deduplicates_by_shape() {
        let mut g = StreamGraph::new();
        let a = g.get_or_create("a", None);
        let b = g.get_or_create("b", None);
        g.add_input(
            b,
            TypeInfo::new(Descriptor::number(), Provenance::ExplicitDeclaration, None),
        );
        g.add_output(a, out(Descriptor::number()));
        g.connect(a, b, EdgeAttrs::strong(OperatorKind::To));

        let stats = propagate(&mut g, WorklistOrder::Fifo);
        assert_eq!(stats.additions, 0);
        assert_eq!(g.stream(b).inputs.len(), 1);
    }

    #[test]
    fn terminates_on_cycles() {
        let mut g = StreamGraph::new();
        let a = g.get_or_create("a", None);
        let m = g.get_or_create("a.map", None);
        g.add_output(m, out(Descriptor::string()));
        g.connect(a, m, EdgeAttrs::strong(OperatorKind::Map));
        g.connect(m, a, EdgeAttrs::strong(OperatorKind::To));
        g.connect(m, m, EdgeAttrs::strong(OperatorKind::To));

        for order in [WorklistOrder::Lifo, WorklistOrder::Fifo] {
            let mut g = g.clone();
            let stats = propagate(&mut g, order);
            assert_eq!(input_shapes(&g, "a"), vec![Descriptor::string()]);
            assert_eq!(input_shapes(&g, "a.map"), vec![Descriptor::string()]);
            assert_eq!(stats.additions, 2);
        }
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut g = StreamGraph::new();
        let a = g.get_or_create("a", None);
        let b = g.get_or_create("b", None);
        g.add_output(a, out(Descriptor::boolean()));
        g.add_output(a, out(Descriptor::number()));
        g.connect(a, b, EdgeAttrs::strong(OperatorKind::On));

        let first = propagate(&mut g, WorklistOrder::Lifo);
        assert_eq!(first.additions, 2);
        let second = propagate(&mut g, WorklistOrder::Lifo);
        assert_eq!(second.additions, 0);
        assert_eq!(second.iterations, 2);
    }

    #[test]
    fn seed_order_does_not_change_fixpoint() {
        let mut g = StreamGraph::new();
        let ids: Vec<StreamId> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| g.get_or_create(n, None))
            .collect();
        g.add_output(ids[0], out(Descriptor::number()));
        g.add_output(ids[1], out(Descriptor::string()));
        g.add_output(ids[2], out(Descriptor::string()));
        g.connect(ids[0], ids[1], EdgeAttrs::strong(OperatorKind::Map));
        g.connect(ids[1], ids[2], EdgeAttrs::strong(OperatorKind::Map));
        g.connect(ids[2], ids[3], EdgeAttrs::strong(OperatorKind::Filter));
        g.connect(ids[2], ids[0], EdgeAttrs::strong(OperatorKind::To));

        let mut reference = g.clone();
        propagate(&mut reference, WorklistOrder::Lifo);

        let reversed: Vec<StreamId> = ids.iter().rev().copied().collect();
        for seed in [&ids[..], &reversed[..], &ids[2..3]] {
            for order in [WorklistOrder::Lifo, WorklistOrder::Fifo] {
                let mut g = g.clone();
                propagate_seeded(&mut g, order, seed);
                for name in ["a", "b", "c", "d"] {
                    assert_eq!(input_shapes(&g, name), input_shapes(&reference, name));
                }
            }
        }
    }

    #[test]
    fn empty_graph() {
        let mut g = StreamGraph::new();
        assert_eq!(
            propagate(&mut g, WorklistOrder::Fifo),
            PropagationStats::default()
        );
    }
}
