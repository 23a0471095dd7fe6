// descriptor.rs — Type descriptors, provenance tags, and source locators
//
// Descriptors are the serialized, structural form of a stream's data type as
// reported by the external type oracle. They compare by shape only; the
// provenance and locator attached to a descriptor on a node are carried for
// diagnostics and never take part in equality.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire key marking an array descriptor. Never a valid source field name.
pub const ARRAY_KEY: &str = "[]";

// ── Descriptor ──────────────────────────────────────────────────────────────

/// Structural description of a stream's data type.
///
/// Two descriptors are interchangeable iff they are equal by shape, which is
/// exactly the derived `PartialEq` (record fields live in a `BTreeMap`, so
/// field declaration order is irrelevant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "DescriptorRepr", into = "DescriptorRepr")]
pub enum Descriptor {
    /// A named leaf type: `number`, `string`, `boolean`, or whatever name the
    /// oracle produced for a type it could not decompose.
    Primitive(String),
    /// Homogeneous array of the element type.
    Array(Box<Descriptor>),
    /// Field name → field type.
    Record(BTreeMap<String, Descriptor>),
    /// Ordered list of types, e.g. the parameters of a multi-input callback.
    Tuple(Vec<Descriptor>),
}

impl Descriptor {
    pub fn primitive(name: impl Into<String>) -> Self {
        Descriptor::Primitive(name.into())
    }

    pub fn number() -> Self {
        Descriptor::primitive("number")
    }

    pub fn string() -> Self {
        Descriptor::primitive("string")
    }

    pub fn boolean() -> Self {
        Descriptor::primitive("boolean")
    }

    pub fn array_of(element: Descriptor) -> Self {
        Descriptor::Array(Box::new(element))
    }

    /// Build a record descriptor from `(field, type)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Descriptor)>,
    {
        Descriptor::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Descriptor>) -> Self {
        Descriptor::Tuple(items.into_iter().collect())
    }
}

/// Untagged JSON shape: string, array, or object. Arrays of a single element
/// type are objects with the lone key `"[]"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Primitive(String),
    Tuple(Vec<Descriptor>),
    Fields(BTreeMap<String, Descriptor>),
}

impl From<DescriptorRepr> for Descriptor {
    fn from(repr: DescriptorRepr) -> Self {
        match repr {
            DescriptorRepr::Primitive(name) => Descriptor::Primitive(name),
            DescriptorRepr::Tuple(items) => Descriptor::Tuple(items),
            DescriptorRepr::Fields(mut fields) => {
                if fields.len() == 1 {
                    if let Some(element) = fields.remove(ARRAY_KEY) {
                        return Descriptor::Array(Box::new(element));
                    }
                }
                Descriptor::Record(fields)
            }
        }
    }
}

impl From<Descriptor> for DescriptorRepr {
    fn from(descriptor: Descriptor) -> Self {
        match descriptor {
            Descriptor::Primitive(name) => DescriptorRepr::Primitive(name),
            Descriptor::Tuple(items) => DescriptorRepr::Tuple(items),
            Descriptor::Record(fields) => DescriptorRepr::Fields(fields),
            Descriptor::Array(element) => {
                let mut fields = BTreeMap::new();
                fields.insert(ARRAY_KEY.to_string(), *element);
                DescriptorRepr::Fields(fields)
            }
        }
    }
}

/// Compact JSON, e.g. `"number"`, `{"[]":"string"}`, `{"id":"number"}`.
impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// ── Provenance ──────────────────────────────────────────────────────────────

/// Why a descriptor was attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Given by the user on stream declaration.
    ExplicitDeclaration,
    /// Reserved: attributed by propagation. Propagated descriptors currently
    /// keep the provenance of the output they were copied from.
    InferredByPropagation,
    /// Reserved: derived from operator semantics rather than a callback.
    TransformedByOperator,
    /// A parameter type of an operator callback.
    CallbackInput,
    /// The return type of an operator callback.
    CallbackOutput,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Provenance::ExplicitDeclaration => "explicit declaration",
            Provenance::InferredByPropagation => "inferred by propagation",
            Provenance::TransformedByOperator => "transformed by operator",
            Provenance::CallbackInput => "callback input",
            Provenance::CallbackOutput => "callback output",
        };
        f.write_str(text)
    }
}

// ── Locator ─────────────────────────────────────────────────────────────────

/// Back-reference to the source construct an event came from.
///
/// Supplied by the scanner; the checker only renders it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Locator {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Locator {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({},{})", self.file, self.line, self.column)
    }
}

/// Render an optional locator for diagnostic text.
pub fn place(locator: Option<&Locator>) -> String {
    match locator {
        Some(loc) => loc.to_string(),
        None => "<unknown>".to_string(),
    }
}

// ── TypeInfo ────────────────────────────────────────────────────────────────

/// A descriptor as registered on a node: shape plus attribution.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub descriptor: Descriptor,
    pub provenance: Provenance,
    pub locator: Option<Locator>,
}

impl TypeInfo {
    pub fn new(descriptor: Descriptor, provenance: Provenance, locator: Option<Locator>) -> Self {
        TypeInfo {
            descriptor,
            provenance,
            locator,
        }
    }

    /// Structural equality of the carried descriptors. Attribution is ignored.
    pub fn same_shape(&self, other: &TypeInfo) -> bool {
        self.descriptor == other.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_equality_ignores_field_order() {
        let a = Descriptor::record([("x", Descriptor::number()), ("y", Descriptor::string())]);
        let b = Descriptor::record([("y", Descriptor::string()), ("x", Descriptor::number())]);
        assert_eq!(a, b);
    }

    #[test]
    fn nested_shapes_differ() {
        let a = Descriptor::array_of(Descriptor::number());
        let b = Descriptor::array_of(Descriptor::string());
        assert_ne!(a, b);
        assert_ne!(a, Descriptor::number());
    }

    #[test]
    fn same_shape_ignores_attribution() {
        let a = TypeInfo::new(
            Descriptor::number(),
            Provenance::ExplicitDeclaration,
            Some(Locator::new("a.ts", 1, 1)),
        );
        let b = TypeInfo::new(Descriptor::number(), Provenance::CallbackOutput, None);
        assert!(a.same_shape(&b));
    }

    #[test]
    fn wire_form() {
        let d = Descriptor::record([
            ("tags", Descriptor::array_of(Descriptor::string())),
            ("value", Descriptor::number()),
        ]);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"tags":{"[]":"string"},"value":"number"}"#
        );
        let pair = Descriptor::tuple([Descriptor::number(), Descriptor::boolean()]);
        assert_eq!(pair.to_string(), r#"["number","boolean"]"#);
    }

    #[test]
    fn wire_form_parses_back() {
        let d: Descriptor = serde_json::from_str(r#"{"[]":{"id":"number"}}"#).unwrap();
        assert_eq!(
            d,
            Descriptor::array_of(Descriptor::record([("id", Descriptor::number())]))
        );
        let r: Descriptor = serde_json::from_str(r#"{"[]":"number","n":"number"}"#).unwrap();
        assert!(matches!(r, Descriptor::Record(ref f) if f.len() == 2));
    }

    #[test]
    fn locator_display() {
        assert_eq!(Locator::new("src/app.ts", 3, 14).to_string(), "src/app.ts (3,14)");
        assert_eq!(place(None), "<unknown>");
    }
}
