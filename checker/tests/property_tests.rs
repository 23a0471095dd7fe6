// Property-based tests for checker invariants.
//
// Random but protocol-respecting event streams are generated, then:
// 1. Worklist order: LIFO, FIFO and shuffled seeds reach identical input
//    sets per stream
// 2. Idempotence: propagating a converged graph changes nothing
// 3. Graph shape: names are interned and `to` never adds a stream
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use streamck::graph::GraphBuilder;
use streamck::pass::PassId;
use streamck::pipeline::{run_pipeline, BuildSession, CheckOptions};
use streamck::propagate::{propagate, propagate_seeded};
use streamck::registry::{StreamGraph, StreamId};
use streamck::*;

// ── Event generator ─────────────────────────────────────────────────────────

const OPERATORS: [&str; 7] = ["map", "filter", "to", "with", "any", "delay", "on"];

fn arb_descriptor() -> impl Strategy<Value = Descriptor> {
    prop_oneof![
        Just(Descriptor::number()),
        Just(Descriptor::string()),
        Just(Descriptor::boolean()),
        Just(Descriptor::array_of(Descriptor::number())),
    ]
}

/// (operator index, source pick, argument pick, callback param, callback return)
type Step = (usize, usize, usize, Descriptor, Descriptor);

fn arb_program() -> impl Strategy<Value = (Vec<Option<Descriptor>>, Vec<Step>)> {
    let decls = prop::collection::vec(prop::option::of(arb_descriptor()), 1..6);
    let steps = prop::collection::vec(
        (
            0..OPERATORS.len(),
            any::<usize>(),
            any::<usize>(),
            arb_descriptor(),
            arb_descriptor(),
        ),
        0..24,
    );
    (decls, steps)
}

/// Random sort keys used to permute the initial worklist.
fn arb_seed_keys() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(any::<u32>(), 1..48)
}

/// Stream argument of a known stream, by reference or by name literal.
fn known_stream(name: String, by_name: bool) -> Argument {
    if by_name {
        Argument::Name(name)
    } else {
        Argument::stream(name)
    }
}

/// Turn generated choices into events that only reference known streams.
fn to_events(decls: &[Option<Descriptor>], steps: &[Step]) -> Vec<Event> {
    let mut known: Vec<String> = Vec::new();
    let mut events = Vec::new();

    for (i, d) in decls.iter().enumerate() {
        let name = format!("s{}", i);
        events.push(Event::declare(name.clone(), d.clone()));
        known.push(name);
    }

    for (op, src, arg, param, ret) in steps {
        let operator = OPERATORS[*op];
        let source = known[src % known.len()].clone();
        let other = known[arg % known.len()].clone();
        let by_name = (arg / known.len()) % 2 == 1;
        let arguments = match operator {
            "map" => vec![Argument::callback(vec![param.clone()], ret.clone())],
            "to" => vec![known_stream(other, by_name)],
            "with" | "any" => vec![
                known_stream(other, by_name),
                Argument::callback(vec![param.clone()], ret.clone()),
            ],
            "delay" => vec![Argument::Number(10.0)],
            _ => vec![],
        };
        if operator != "to" {
            let derived = format!("{}.{}", source, operator);
            if !known.contains(&derived) {
                known.push(derived);
            }
        }
        events.push(Event::invoke(source, operator, arguments));
    }

    events
}

fn input_sets(graph: &StreamGraph) -> BTreeMap<String, HashSet<Descriptor>> {
    graph
        .streams()
        .map(|s| {
            (
                s.name.clone(),
                s.inputs.iter().map(|t| t.descriptor.clone()).collect(),
            )
        })
        .collect()
}

fn run_with(events: Vec<Event>, order: WorklistOrder) -> BuildSession {
    let mut session = BuildSession::new(CheckOptions { order });
    run_pipeline(&mut session, events, PassId::Verify, |_, _| {})
        .expect("generated events respect the protocol");
    session
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn worklist_order_is_irrelevant((decls, steps) in arb_program()) {
        let events = to_events(&decls, &steps);
        let lifo = run_with(events.clone(), WorklistOrder::Lifo);
        let fifo = run_with(events, WorklistOrder::Fifo);

        prop_assert_eq!(input_sets(&lifo.graph), input_sets(&fifo.graph));
        prop_assert_eq!(lifo.status, fifo.status);
        prop_assert_eq!(lifo.diagnostics.len(), fifo.diagnostics.len());
    }

    #[test]
    fn shuffled_seed_reaches_same_fixpoint(
        (decls, steps) in arb_program(),
        keys in arb_seed_keys(),
        fifo in any::<bool>(),
    ) {
        let mut session = BuildSession::default();
        run_pipeline(&mut session, to_events(&decls, &steps), PassId::Build, |_, _| {})
            .expect("generated events respect the protocol");

        let mut seed: Vec<StreamId> = session.graph.streams().map(|s| s.id).collect();
        seed.sort_by_key(|id| (keys[id.0 as usize % keys.len()], id.0));
        let order = if fifo { WorklistOrder::Fifo } else { WorklistOrder::Lifo };

        let mut reference = session.graph.clone();
        propagate(&mut reference, WorklistOrder::Lifo);
        let mut shuffled = session.graph.clone();
        propagate_seeded(&mut shuffled, order, &seed);

        prop_assert_eq!(input_sets(&shuffled), input_sets(&reference));
    }

    #[test]
    fn propagation_is_idempotent((decls, steps) in arb_program()) {
        let mut session = run_with(to_events(&decls, &steps), WorklistOrder::Lifo);
        let before = Report::assemble(&session);

        let stats = propagate(&mut session.graph, WorklistOrder::Lifo);
        prop_assert_eq!(stats.additions, 0);
        prop_assert_eq!(Report::assemble(&session), before);
    }

    #[test]
    fn names_interned_and_to_adds_nothing((decls, steps) in arb_program()) {
        let mut session = BuildSession::default();
        for event in to_events(&decls, &steps) {
            let is_to = matches!(&event, Event::Invoke(i) if i.operator == "to");
            let before = session.graph.len();
            let target = GraphBuilder::new(&mut session)
                .apply(event)
                .expect("generated events respect the protocol");
            if is_to {
                prop_assert!(target.is_some());
                prop_assert_eq!(session.graph.len(), before);
            }
        }

        let mut seen = HashSet::new();
        for stream in session.graph.streams() {
            prop_assert!(seen.insert(stream.name.clone()), "duplicate stream {}", stream.name);
            prop_assert_eq!(session.graph.lookup(&stream.name), Some(stream.id));
        }
    }

    #[test]
    fn success_iff_no_diagnostics((decls, steps) in arb_program()) {
        let session = run_with(to_events(&decls, &steps), WorklistOrder::Fifo);
        prop_assert_eq!(session.status == Status::Success, session.diagnostics.is_empty());
        prop_assert!(session.status != Status::Pending);
    }
}
