//! Edge types for graph control flow
//!
//! A node's successor is either a static edge (always the same target)
//! or a dynamic set the node chooses from at runtime via its output's
//! `goto` directive.

/// Special node identifiers
pub const START: &str = "__start__";
pub const END: &str = "__end__";

/// Target of an edge
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeTarget {
    /// Specific node
    Node(String),
    /// End of graph
    End,
}

impl EdgeTarget {
    /// Check if this is the END target
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Get the node name if this is a Node target
    pub fn node_name(&self) -> Option<&str> {
        match self {
            Self::Node(name) => Some(name),
            Self::End => None,
        }
    }
}

impl From<&str> for EdgeTarget {
    fn from(s: &str) -> Self {
        if s == END {
            Self::End
        } else {
            Self::Node(s.to_string())
        }
    }
}

/// Successor policy for a node.
#[derive(Clone, Debug)]
pub enum Successor {
    /// Fixed post-step: control always moves to this target.
    Static(EdgeTarget),
    /// The node chooses its own successor from this closed set.
    /// END is always an admissible choice and is the default when the
    /// node declines to choose.
    Dynamic { targets: Vec<String> },
}

impl Successor {
    /// Whether the given node name is an admissible dynamic choice.
    pub fn allows(&self, target: &str) -> bool {
        match self {
            Self::Static(_) => false,
            Self::Dynamic { targets } => {
                target == END || targets.iter().any(|t| t == target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_target_from_str() {
        assert_eq!(EdgeTarget::from("node_a"), EdgeTarget::Node("node_a".to_string()));
        assert_eq!(EdgeTarget::from(END), EdgeTarget::End);
    }

    #[test]
    fn test_dynamic_allows_declared_targets_and_end() {
        let succ = Successor::Dynamic { targets: vec!["a".to_string(), "b".to_string()] };
        assert!(succ.allows("a"));
        assert!(succ.allows("b"));
        assert!(succ.allows(END));
        assert!(!succ.allows("c"));
    }

    #[test]
    fn test_static_allows_nothing_dynamic() {
        let succ = Successor::Static(EdgeTarget::from("next"));
        assert!(!succ.allows("next"));
    }
}
