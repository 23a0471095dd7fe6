// operator.rs — Stream operator kinds and token resolution
//
// Maps the method names a scanner finds on stream objects to the operator
// kinds the graph builder knows how to type. Several runtime aliases map to
// one kind.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The operator kinds the checker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    To,
    On,
    Map,
    Filter,
    With,
    Any,
    Delay,
}

/// All kinds in declaration order.
pub const ALL_KINDS: [OperatorKind; 7] = [
    OperatorKind::To,
    OperatorKind::On,
    OperatorKind::Map,
    OperatorKind::Filter,
    OperatorKind::With,
    OperatorKind::Any,
    OperatorKind::Delay,
];

impl OperatorKind {
    /// Resolve a method token, including runtime aliases. `None` for tokens
    /// the checker does not know.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "to" => Some(OperatorKind::To),
            "on" | "do" | "subscribe" => Some(OperatorKind::On),
            "map" => Some(OperatorKind::Map),
            "filter" => Some(OperatorKind::Filter),
            "with" | "withLatestFrom" => Some(OperatorKind::With),
            "any" | "combineLatest" => Some(OperatorKind::Any),
            "delay" => Some(OperatorKind::Delay),
            _ => None,
        }
    }

    /// Canonical name, used in reports and as the derived node suffix.
    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::To => "to",
            OperatorKind::On => "on",
            OperatorKind::Map => "map",
            OperatorKind::Filter => "filter",
            OperatorKind::With => "with",
            OperatorKind::Any => "any",
            OperatorKind::Delay => "delay",
        }
    }

    /// `to` is the only kind that reuses an existing node as its target.
    pub fn spawns_node(self) -> bool {
        self != OperatorKind::To
    }

    /// Name of the node an invocation on `source` creates.
    pub fn target_name(self, source: &str) -> String {
        format!("{}.{}", source, self.name())
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tokens_roundtrip() {
        for kind in ALL_KINDS {
            assert_eq!(OperatorKind::from_token(kind.name()), Some(kind));
        }
    }

    #[test]
    fn aliases() {
        assert_eq!(OperatorKind::from_token("do"), Some(OperatorKind::On));
        assert_eq!(OperatorKind::from_token("subscribe"), Some(OperatorKind::On));
        assert_eq!(
            OperatorKind::from_token("withLatestFrom"),
            Some(OperatorKind::With)
        );
        assert_eq!(
            OperatorKind::from_token("combineLatest"),
            Some(OperatorKind::Any)
        );
    }

    #[test]
    fn unknown_tokens() {
        assert_eq!(OperatorKind::from_token("flatMap"), None);
        assert_eq!(OperatorKind::from_token("Map"), None);
        assert_eq!(OperatorKind::from_token(""), None);
    }

    #[test]
    fn only_to_reuses_target() {
        let spawning: Vec<_> = ALL_KINDS.iter().filter(|k| k.spawns_node()).collect();
        assert_eq!(spawning.len(), 6);
        assert!(!OperatorKind::To.spawns_node());
        assert_eq!(OperatorKind::Delay.target_name("ticks"), "ticks.delay");
    }
}
