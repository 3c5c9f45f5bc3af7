//! Annotation-graph nodes: genomic ranges, node kinds, tree ownership and
//! shared handles, plus the visitor entry point.
//!
//! A `Node` is built mutably, then either moved into a parent with
//! `add_child` (tree-owned, freed with its parent) or frozen into a
//! `NodeHandle` (standalone, reference-counted, freed when the last holder
//! drops).

use crate::error::NodeError;
use crate::shared_str::SharedStr;
use crate::visitor::NodeVisitor;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Inclusive genomic interval, `start <= end`, 1-based like GFF3 columns 4/5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    start: u64,
    end: u64,
}

impl Range {
    pub fn new(start: u64, end: u64) -> Result<Self, NodeError> {
        if start > end {
            return Err(NodeError::EmptyRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn point(pos: u64) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false // a range always spans at least one base
    }

    pub fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos <= self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    Both,
    Unknown,
}

impl Strand {
    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Both => '.',
            Strand::Unknown => '?',
        }
    }
}

/// Process-unique node identity; style overrides are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn from_value(value: u64) -> Self {
        Self(value)
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> NodeId {
    NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Feature { feature_type: String, strand: Strand },
    Region,
    Comment { text: String },
    Sequence { description: String },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Feature { .. } => "feature",
            NodeKind::Region => "region",
            NodeKind::Comment { .. } => "comment",
            NodeKind::Sequence { .. } => "sequence",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    range: Range,
    seqid: Option<SharedStr>,
    filename: Option<SharedStr>,
    line_number: u64,
    children: Vec<NodeHandle>,
}

impl Node {
    fn new(kind: NodeKind, range: Range) -> Self {
        Self {
            id: next_node_id(),
            kind,
            range,
            seqid: None,
            filename: None, // no filename means the node was generated
            line_number: 0,
            children: vec![],
        }
    }

    pub fn feature(feature_type: &str, range: Range, strand: Strand) -> Self {
        Self::new(
            NodeKind::Feature {
                feature_type: feature_type.to_owned(),
                strand,
            },
            range,
        )
    }

    pub fn region(range: Range) -> Self {
        Self::new(NodeKind::Region, range)
    }

    pub fn comment(text: &str) -> Self {
        Self::new(
            NodeKind::Comment {
                text: text.to_owned(),
            },
            Range::point(0),
        )
    }

    pub fn sequence(description: &str, range: Range) -> Self {
        Self::new(
            NodeKind::Sequence {
                description: description.to_owned(),
            },
            range,
        )
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn start(&self) -> u64 {
        self.range.start()
    }

    pub fn end(&self) -> u64 {
        self.range.end()
    }

    pub fn set_range(&mut self, range: Range) {
        self.range = range;
    }

    pub fn seqid(&self) -> Option<&str> {
        self.seqid.as_ref().map(SharedStr::as_str)
    }

    pub fn set_seqid(&mut self, seqid: SharedStr) {
        self.seqid = Some(seqid);
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_ref().map(SharedStr::as_str)
    }

    /// Line number in the originating file; 0 for generated nodes.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn set_origin(&mut self, filename: SharedStr, line_number: u64) {
        self.filename = Some(filename);
        self.line_number = line_number;
    }

    pub fn add_child(&mut self, child: Node) -> &mut Self {
        self.children.push(child.into_handle());
        self
    }

    pub fn add_child_handle(&mut self, child: NodeHandle) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn into_handle(self) -> NodeHandle {
        NodeHandle(Rc::new(self))
    }

    /// Depth-first double dispatch: this node's kind selects the visitor
    /// method, then children are visited in insertion order. The first
    /// handler error aborts the walk and is returned unchanged.
    pub fn accept(&self, visitor: &mut dyn NodeVisitor) -> Result<(), NodeError> {
        match &self.kind {
            NodeKind::Feature { .. } => visitor.visit_feature(self)?,
            NodeKind::Region => visitor.visit_region(self)?,
            NodeKind::Comment { .. } => visitor.visit_comment(self)?,
            NodeKind::Sequence { .. } => visitor.visit_sequence(self)?,
        }
        for child in &self.children {
            child.accept(visitor)?;
        }
        Ok(())
    }
}

/// Shared, immutable handle to a node and its subtree. Cloning bumps the
/// reference count; the subtree is freed when the count of every node on the
/// path to it reaches zero.
#[derive(Clone, Debug)]
pub struct NodeHandle(Rc<Node>);

impl NodeHandle {
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl Deref for NodeHandle {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}
