//! Visitor side of the node double-dispatch protocol.

use crate::error::NodeError;
use crate::node::Node;
use std::collections::BTreeMap;

/// One method per node kind; visitors implement only the kinds they care
/// about, everything else is accepted silently.
pub trait NodeVisitor {
    fn visit_feature(&mut self, node: &Node) -> Result<(), NodeError> {
        let _ = node;
        Ok(())
    }

    fn visit_region(&mut self, node: &Node) -> Result<(), NodeError> {
        let _ = node;
        Ok(())
    }

    fn visit_comment(&mut self, node: &Node) -> Result<(), NodeError> {
        let _ = node;
        Ok(())
    }

    fn visit_sequence(&mut self, node: &Node) -> Result<(), NodeError> {
        let _ = node;
        Ok(())
    }
}

/// Collects the ranges of all visited feature nodes, in visit order.
#[derive(Debug, Default)]
pub struct RangeCollector {
    ranges: Vec<(u64, u64)>,
}

impl RangeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.ranges
    }
}

impl NodeVisitor for RangeCollector {
    fn visit_feature(&mut self, node: &Node) -> Result<(), NodeError> {
        self.ranges.push((node.start(), node.end()));
        Ok(())
    }
}

/// Counts visited nodes per kind.
#[derive(Debug, Default)]
pub struct NodeCounter {
    counts: BTreeMap<&'static str, usize>,
}

impl NodeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind_name: &str) -> usize {
        self.counts.get(kind_name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    fn bump(&mut self, node: &Node) {
        *self.counts.entry(node.kind().name()).or_insert(0) += 1;
    }
}

impl NodeVisitor for NodeCounter {
    fn visit_feature(&mut self, node: &Node) -> Result<(), NodeError> {
        self.bump(node);
        Ok(())
    }

    fn visit_region(&mut self, node: &Node) -> Result<(), NodeError> {
        self.bump(node);
        Ok(())
    }

    fn visit_comment(&mut self, node: &Node) -> Result<(), NodeError> {
        self.bump(node);
        Ok(())
    }

    fn visit_sequence(&mut self, node: &Node) -> Result<(), NodeError> {
        self.bump(node);
        Ok(())
    }
}
