//! Config document abstraction layer.
//!
//! `ConfigDocument` and `ParseNode` wrap the `kdl` crate
//! types so policy parsing never touches KDL entries or spans directly.

use super::ConfigError;

/// Parsed KDL document paired with its source text.
pub(super) struct ConfigDocument {
    doc: kdl::KdlDocument,
    source: String,
}

/// Single KDL node with source context for line-number reporting.
pub(super) struct ParseNode<'a> {
    node: &'a kdl::KdlNode,
    source: &'a str,
}

impl ConfigDocument {
    /// Parse a KDL source string into a document.
    pub(super) fn parse(source: &str) -> Result<Self, ConfigError> {
        let doc: kdl::KdlDocument = source
            .parse()
            .map_err(|e: kdl::KdlError| ConfigError::ParseError(e.to_string()))?;
        Ok(Self {
            doc,
            source: source.to_string(),
        })
    }

    /// Every top-level node called `name`, in document order.
    pub(super) fn sections(&self, name: &str) -> Vec<ParseNode<'_>> {
        self.doc
            .nodes()
            .iter()
            .filter(|node| node.name().value() == name)
            .map(|node| ParseNode {
                node,
                source: &self.source,
            })
            .collect()
    }
}

impl<'a> ParseNode<'a> {
    /// The node's identifier (e.g. `"block"`, `"on-error"`).
    pub(super) fn name(&self) -> &'a str {
        self.node.name().value()
    }

    /// Positional string arguments, in order. Properties are excluded.
    pub(super) fn arguments(&self) -> Vec<&'a str> {
        self.node
            .entries()
            .iter()
            .filter(|e| e.name().is_none())
            .filter_map(|e| e.value().as_string())
            .collect()
    }

    /// Number of positional arguments of any type.
    pub(super) fn argument_count(&self) -> usize {
        self.node
            .entries()
            .iter()
            .filter(|e| e.name().is_none())
            .count()
    }

    /// Names of all `key=value` properties on the node.
    pub(super) fn property_names(&self) -> Vec<&'a str> {
        self.node
            .entries()
            .iter()
            .filter_map(|e| e.name().map(|n| n.value()))
            .collect()
    }

    /// String value of the last property named `key` (KDL: last one wins).
    pub(super) fn property(&self, key: &str) -> Option<&'a str> {
        self.node
            .entries()
            .iter()
            .filter(|e| e.name().map(|n| n.value()) == Some(key))
            .filter_map(|e| e.value().as_string())
            .last()
    }

    pub(super) fn has_children(&self) -> bool {
        self.node.children().is_some()
    }

    /// Nodes of the children block, or `None` when the node has none.
    pub(super) fn children(&self) -> Option<Vec<ParseNode<'a>>> {
        let source = self.source;
        self.node.children().map(|doc| {
            doc.nodes()
                .iter()
                .map(|node| ParseNode { node, source })
                .collect()
        })
    }

    /// 1-based line number of this node in the config text.
    pub(super) fn line(&self) -> usize {
        let offset = self.node.span().offset();
        self.source[..offset.min(self.source.len())]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1
    }
}
