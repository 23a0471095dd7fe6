// graph.rs — Stream graph construction from scanner events
//
// Consumes declaration and invocation events in source order and populates
// the session's registry, drawing one edge per stream argument and applying
// the per-operator typing rules (callback parameter → target input, callback
// return → target output).
//
// Preconditions: events arrive in source order; any stream referenced by
//                `Argument::Stream` or an invocation source was returned by
//                an earlier event.
// Postconditions: every stream and edge of the program is registered;
//                 operator-derived descriptors are attached.
// Failure modes: unknown operators and callback shape problems → soft
//                `Diagnostic`s; scanner-protocol violations → `SchemaViolation`,
//                which aborts the build.
// Side effects: none.

use thiserror::Error;
use tracing::debug;

use crate::descriptor::{place, Descriptor, Locator, Provenance, TypeInfo};
use crate::diag::{DiagKind, Diagnostic};
use crate::event::{Argument, CallbackSignature, DeclareStream, Event, InvokeOperator, NodeRef};
use crate::operator::OperatorKind;
use crate::pipeline::BuildSession;
use crate::registry::{EdgeAttrs, StreamId};

// ── Fatal errors ────────────────────────────────────────────────────────────

/// The scanner broke the event protocol. No report can be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("\"{operator}\" at {place} is invoked on unknown stream \"{stream}\"")]
    UnresolvedSource {
        stream: String,
        operator: String,
        place: String,
    },

    #[error("argument of \"{operator}\" at {place} references unknown stream \"{stream}\"")]
    UnresolvedArgument {
        stream: String,
        operator: String,
        place: String,
    },

    #[error("\"{operator}\" at {place} has no target stream argument")]
    MissingTarget { operator: String, place: String },
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Feed every event into the session's graph.
pub fn build_graph<I>(session: &mut BuildSession, events: I) -> Result<(), SchemaViolation>
where
    I: IntoIterator<Item = Event>,
{
    let mut builder = GraphBuilder::new(session);
    for event in events {
        builder.apply(event)?;
    }
    Ok(())
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Applies events to a session one at a time. Exposed so a scanner can drive
/// it incrementally and use the returned references in later events.
pub struct GraphBuilder<'s> {
    session: &'s mut BuildSession,
}

/// Arguments of one invocation, split by role.
#[derive(Default)]
struct Partitioned {
    streams: Vec<StreamId>,
    literal: Option<f64>,
    callbacks: Vec<CallbackSignature>,
}

impl<'s> GraphBuilder<'s> {
    pub fn new(session: &'s mut BuildSession) -> Self {
        GraphBuilder { session }
    }

    /// Apply one event. Declarations always yield a reference; invocations
    /// of unknown operators yield none.
    pub fn apply(&mut self, event: Event) -> Result<Option<NodeRef>, SchemaViolation> {
        match event {
            Event::Declare(declare) => Ok(Some(self.declare(declare))),
            Event::Invoke(invoke) => self.invoke(invoke),
        }
    }

    pub fn declare(&mut self, event: DeclareStream) -> NodeRef {
        let graph = &mut self.session.graph;
        let id = graph.get_or_create(&event.name, event.locator.as_ref());
        if let Some(descriptor) = event.descriptor {
            debug!(stream = %event.name, %descriptor, "explicit declaration");
            graph.add_input(
                id,
                TypeInfo::new(descriptor, Provenance::ExplicitDeclaration, event.locator),
            );
        }
        NodeRef(event.name)
    }

    pub fn invoke(&mut self, event: InvokeOperator) -> Result<Option<NodeRef>, SchemaViolation> {
        let InvokeOperator {
            source,
            operator,
            arguments,
            locator,
        } = event;

        let source_id = self.session.graph.lookup(source.name()).ok_or_else(|| {
            SchemaViolation::UnresolvedSource {
                stream: source.name().to_string(),
                operator: operator.clone(),
                place: place(locator.as_ref()),
            }
        })?;

        let Some(kind) = OperatorKind::from_token(&operator) else {
            self.session.push_diagnostic(
                Diagnostic::new(
                    DiagKind::UnknownOperator,
                    locator.clone(),
                    format!(
                        "stream method \"{}\" at {} is of undefined type",
                        operator,
                        place(locator.as_ref())
                    ),
                )
                .with_hint("supported operators: to, on, map, filter, with, any, delay"),
            );
            return Ok(None);
        };

        let args = self.partition(kind, &operator, arguments, locator.as_ref())?;

        if kind == OperatorKind::To {
            return self.connect_to(source_id, &operator, args, locator).map(Some);
        }

        let target = self.spawn_target(kind, source_id, &args, locator.as_ref());

        match kind {
            OperatorKind::Map => self.type_map(target, &args.callbacks, locator.as_ref()),
            OperatorKind::With | OperatorKind::Any => {
                self.type_from_callback(kind, target, &args.callbacks, locator.as_ref())
            }
            OperatorKind::On | OperatorKind::Filter | OperatorKind::Delay | OperatorKind::To => {}
        }

        Ok(Some(NodeRef(self.session.graph.stream(target).name.clone())))
    }

    /// Split arguments by role. Name literals are fetched or created, except
    /// for `to`, which never adds a stream and so requires them registered.
    fn partition(
        &mut self,
        kind: OperatorKind,
        operator: &str,
        arguments: Vec<Argument>,
        locator: Option<&Locator>,
    ) -> Result<Partitioned, SchemaViolation> {
        let mut args = Partitioned::default();
        for arg in arguments {
            match arg {
                Argument::Stream(r) => {
                    args.streams.push(self.resolve(r.name(), operator, locator)?);
                }
                Argument::Name(name) if kind == OperatorKind::To => {
                    args.streams.push(self.resolve(&name, operator, locator)?);
                }
                Argument::Name(name) => {
                    args.streams.push(self.session.graph.get_or_create(&name, locator));
                }
                Argument::Number(n) => args.literal = Some(n),
                Argument::Callback(cb) => args.callbacks.push(cb),
            }
        }
        Ok(args)
    }

    fn resolve(
        &self,
        name: &str,
        operator: &str,
        locator: Option<&Locator>,
    ) -> Result<StreamId, SchemaViolation> {
        self.session
            .graph
            .lookup(name)
            .ok_or_else(|| SchemaViolation::UnresolvedArgument {
                stream: name.to_string(),
                operator: operator.to_string(),
                place: place(locator),
            })
    }

    /// `to` reuses its first stream argument as the target.
    fn connect_to(
        &mut self,
        source: StreamId,
        operator: &str,
        args: Partitioned,
        locator: Option<Locator>,
    ) -> Result<NodeRef, SchemaViolation> {
        let Some(&target) = args.streams.first() else {
            return Err(SchemaViolation::MissingTarget {
                operator: operator.to_string(),
                place: place(locator.as_ref()),
            });
        };
        let graph = &mut self.session.graph;
        graph.connect(
            source,
            target,
            EdgeAttrs {
                locator,
                ..EdgeAttrs::strong(OperatorKind::To)
            },
        );
        Ok(NodeRef(graph.stream(target).name.clone()))
    }

    /// Create `<source>.<kind>` and connect the source and every stream
    /// argument to it. Argument edges of `with` are weak.
    fn spawn_target(
        &mut self,
        kind: OperatorKind,
        source: StreamId,
        args: &Partitioned,
        locator: Option<&Locator>,
    ) -> StreamId {
        let graph = &mut self.session.graph;
        let name = kind.target_name(&graph.stream(source).name);
        let target = graph.get_or_create(&name, locator);

        graph.connect(
            source,
            target,
            EdgeAttrs {
                literal: args.literal,
                locator: locator.cloned(),
                ..EdgeAttrs::strong(kind)
            },
        );
        for &arg in &args.streams {
            graph.connect(
                arg,
                target,
                EdgeAttrs {
                    weak: kind == OperatorKind::With,
                    literal: args.literal,
                    locator: locator.cloned(),
                    kind,
                },
            );
        }
        target
    }

    fn type_map(
        &mut self,
        target: StreamId,
        callbacks: &[CallbackSignature],
        locator: Option<&Locator>,
    ) {
        let callback = match callbacks {
            [] => {
                self.session.push_diagnostic(
                    Diagnostic::new(
                        DiagKind::MissingCallback,
                        locator.cloned(),
                        format!(
                            "map operator at {} callback arg was NOT provided",
                            place(locator)
                        ),
                    )
                    .with_hint("map needs a one-parameter callback"),
                );
                return;
            }
            [callback] => callback,
            many => {
                self.push_extra_callbacks(OperatorKind::Map, many.len(), locator);
                return;
            }
        };

        let cb_place = callback.locator.as_ref().or(locator);
        if callback.params.len() != 1 {
            self.session.push_diagnostic(Diagnostic::new(
                DiagKind::ArityMismatch,
                cb_place.cloned(),
                format!(
                    "map operator callback at {} must take exactly 1 parameter, found {}",
                    place(cb_place),
                    callback.params.len()
                ),
            ));
            return;
        }

        let graph = &mut self.session.graph;
        graph.add_input(
            target,
            TypeInfo::new(
                callback.params[0].clone(),
                Provenance::CallbackInput,
                cb_place.cloned(),
            ),
        );
        graph.add_output(
            target,
            TypeInfo::new(
                callback.returns.clone(),
                Provenance::CallbackOutput,
                cb_place.cloned(),
            ),
        );
    }

    /// Shared rule for `with` and `any`: the callback's parameter list types
    /// the target's input as a tuple, its return types the output.
    fn type_from_callback(
        &mut self,
        kind: OperatorKind,
        target: StreamId,
        callbacks: &[CallbackSignature],
        locator: Option<&Locator>,
    ) {
        let callback = match callbacks {
            // Without a callback the target would carry its argument streams'
            // values; union vs ordered tuple of those is undecided, so no
            // typing is applied here.
            [] => return,
            [callback] => callback,
            many => {
                self.push_extra_callbacks(kind, many.len(), locator);
                return;
            }
        };

        let cb_place = callback.locator.as_ref().or(locator).cloned();
        let graph = &mut self.session.graph;
        graph.add_input(
            target,
            TypeInfo::new(
                Descriptor::Tuple(callback.params.clone()),
                Provenance::CallbackInput,
                cb_place.clone(),
            ),
        );
        graph.add_output(
            target,
            TypeInfo::new(
                callback.returns.clone(),
                Provenance::CallbackOutput,
                cb_place,
            ),
        );
    }

    fn push_extra_callbacks(&mut self, kind: OperatorKind, count: usize, locator: Option<&Locator>) {
        let expected = if kind == OperatorKind::Map {
            "exactly one callback"
        } else {
            "at most one callback"
        };
        self.session.push_diagnostic(Diagnostic::new(
            DiagKind::ArityMismatch,
            locator.cloned(),
            format!(
                "{} operator at {} takes {}, found {}",
                kind,
                place(locator),
                expected,
                count
            ),
        ));
    }
}
