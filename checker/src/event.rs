// event.rs — Scanner → builder event protocol
//
// The scanner walks user source, recognizes stream declarations and operator
// invocations, resolves types through a `TypeOracle`, and emits these
// already-discriminated events in source order. The checker never looks at
// syntax itself.
//
// Wire form (JSON): `[{"declare": {...}}, {"invoke": {...}}, ...]`.

use serde::{Deserialize, Serialize};

use crate::descriptor::{Descriptor, Locator};

/// Reference to a stream node by its session-unique name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub String);

impl NodeRef {
    pub fn new(name: impl Into<String>) -> Self {
        NodeRef(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// `DeclareStream(name, explicitDescriptor?, locator)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclareStream {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
}

/// `InvokeOperator(sourceRef, operatorToken, arguments, locator)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeOperator {
    pub source: NodeRef,
    pub operator: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
}

/// One operator argument, as classified by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// A stream expression already seen by the scanner. Must be registered.
    Stream(NodeRef),
    /// A stream named by literal; fetched or created by name. As the target
    /// of `to` it must already be registered.
    Name(String),
    /// A numeric literal (delay duration, take count, ...).
    Number(f64),
    /// A callback whose signature the oracle resolved.
    Callback(CallbackSignature),
}

/// Parameter and return descriptors of an operator callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackSignature {
    pub params: Vec<Descriptor>,
    pub returns: Descriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Declare(DeclareStream),
    Invoke(InvokeOperator),
}

impl Event {
    pub fn declare(name: impl Into<String>, descriptor: Option<Descriptor>) -> Self {
        Event::Declare(DeclareStream {
            name: name.into(),
            descriptor,
            locator: None,
        })
    }

    pub fn invoke(
        source: impl Into<String>,
        operator: impl Into<String>,
        arguments: Vec<Argument>,
    ) -> Self {
        Event::Invoke(InvokeOperator {
            source: NodeRef::new(source),
            operator: operator.into(),
            arguments,
            locator: None,
        })
    }

    pub fn at(mut self, locator: Locator) -> Self {
        match &mut self {
            Event::Declare(d) => d.locator = Some(locator),
            Event::Invoke(i) => i.locator = Some(locator),
        }
        self
    }
}

impl Argument {
    pub fn stream(name: impl Into<String>) -> Self {
        Argument::Stream(NodeRef::new(name))
    }

    pub fn callback(params: Vec<Descriptor>, returns: Descriptor) -> Self {
        Argument::Callback(CallbackSignature {
            params,
            returns,
            locator: None,
        })
    }
}

// ── Type oracle ─────────────────────────────────────────────────────────────

/// Resolves source constructs to descriptors. Implemented by scanners on top
/// of their host language's type checker.
pub trait TypeOracle {
    /// Scanner-side handle to a syntax node.
    type Handle;

    fn resolve_type(&self, handle: &Self::Handle) -> Descriptor;

    /// Ordered parameter descriptors and the return descriptor of a callable.
    fn resolve_callback_signature(&self, handle: &Self::Handle) -> (Vec<Descriptor>, Descriptor);
}

/// Build a `DeclareStream` event whose explicit type comes from the oracle.
pub fn declare_typed<O: TypeOracle>(
    oracle: &O,
    name: impl Into<String>,
    type_handle: &O::Handle,
    locator: Option<Locator>,
) -> Event {
    Event::Declare(DeclareStream {
        name: name.into(),
        descriptor: Some(oracle.resolve_type(type_handle)),
        locator,
    })
}

/// Build a callback argument from the oracle's signature of `handle`.
pub fn callback_argument<O: TypeOracle>(
    oracle: &O,
    handle: &O::Handle,
    locator: Option<Locator>,
) -> Argument {
    let (params, returns) = oracle.resolve_callback_signature(handle);
    Argument::Callback(CallbackSignature {
        params,
        returns,
        locator,
    })
}
