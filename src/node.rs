//! The execution tree. Nodes live in an arena and are addressed by index;
//! each node keeps both its successor and predecessor so that backward
//! lookups (finding the roll a filter binds to) are a plain index walk.

use crate::parse::{
    ArithmeticOperator, ConditionKind, ListContent, ListOperator, Range, Validator,
};

/// Index of a node inside its [`NodeArena`]. Only valid for the arena that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One `count:color` pair of a painter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PainterParameter {
    pub count: i64,
    pub color: String,
}

/// What a filter stage does with the rolls its validator selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBehavior {
    /// Keep only the matching rolls.
    Filter,
    /// Count the matching rolls instead of summing them.
    Count,
    /// Roll an additional die for every match.
    Explode,
    /// Reroll every match.
    Reroll,
}

/// One stage of the evaluable pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(i64),
    Text(String),
    /// `NdM` or `Nd[a-b]`.
    Roller {
        count: i64,
        faces: Range,
        unique: bool,
    },
    /// A bracketed list literal rolled as a set of outcomes.
    ListRoll {
        content: ListContent,
        operator: ListOperator,
    },
    /// Applies `operator` between the chain result so far and the result of
    /// the `operand` chain.
    Arithmetic {
        operator: ArithmeticOperator,
        operand: NodeId,
    },
    Filter {
        behavior: FilterBehavior,
        validator: Validator,
    },
    /// Branches on the outcome of the preceding roll. Branch chains are owned
    /// through their root ids.
    Conditional {
        kind: ConditionKind,
        validator: Validator,
        true_branch: NodeId,
        false_branch: Option<NodeId>,
    },
    Sort {
        ascending: bool,
    },
    Painter {
        parameters: Vec<PainterParameter>,
    },
    /// Reference to the result of an earlier top-level expression, 0-based.
    Variable {
        index: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionNode {
    pub kind: NodeKind,
    pub previous: Option<NodeId>,
    pub next: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeArena {
    nodes: Vec<ExecutionNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ExecutionNode {
            kind,
            previous: None,
            next: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &ExecutionNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Wires `to` as the successor of `from`.
    pub fn link(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].next = Some(to);
        self.nodes[to.0].previous = Some(from);
    }

    /// Tail of the chain starting at `start`; used every time a new stage is
    /// appended.
    pub fn get_latest_node(&self, start: NodeId) -> NodeId {
        let mut current = start;
        while let Some(next) = self.nodes[current.0].next {
            current = next;
        }
        current
    }

    /// Nearest roller-kind node at or before `from`, found by walking the
    /// predecessor links. Filters and sorts bind to roll output, not to an
    /// intermediate arithmetic stage.
    pub fn get_dice_roller_node(&self, from: NodeId) -> Option<NodeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if matches!(
                self.kind(id),
                NodeKind::Roller { .. } | NodeKind::ListRoll { .. }
            ) {
                return Some(id);
            }
            current = self.nodes[id.0].previous;
        }
        None
    }

    /// Appends a stage to the tail of the chain rooted at `start`.
    pub fn append(&mut self, start: NodeId, kind: NodeKind) -> NodeId {
        let tail = self.get_latest_node(start);
        let id = self.insert(kind);
        self.link(tail, id);
        id
    }

    /// Appends a sort stage to the chain rooted at `start`.
    pub fn add_sort(&mut self, start: NodeId, ascending: bool) -> NodeId {
        self.append(start, NodeKind::Sort { ascending })
    }
}
