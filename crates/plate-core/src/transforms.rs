use std::collections::BTreeSet;

use crate::core::{BlockType, Document, Marks, NodeRef, Selection};
use crate::ops::{Op, Transaction, apply_op};
use crate::query::{DocPos, NodeEntry, Span, nodes};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttrChange<T> {
    #[default]
    Keep,
    Set(T),
    /// Remove the attribute. For block types this falls back to [`BlockType::default`].
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePatch {
    pub bold: AttrChange<bool>,
    pub block_type: AttrChange<BlockType>,
}

impl NodePatch {
    pub fn set_bold() -> Self {
        Self {
            bold: AttrChange::Set(true),
            ..Self::default()
        }
    }

    pub fn clear_bold() -> Self {
        Self {
            bold: AttrChange::Clear,
            ..Self::default()
        }
    }

    pub fn set_block_type(block_type: BlockType) -> Self {
        Self {
            block_type: AttrChange::Set(block_type),
            ..Self::default()
        }
    }

    pub fn clear_block_type() -> Self {
        Self {
            block_type: AttrChange::Clear,
            ..Self::default()
        }
    }

    fn patch_marks(&self, marks: Marks) -> Marks {
        let bold = match self.bold {
            AttrChange::Keep => marks.bold,
            AttrChange::Set(bold) => bold,
            AttrChange::Clear => false,
        };
        Marks { bold }
    }

    fn patch_block_type(&self, kind: &BlockType) -> BlockType {
        match &self.block_type {
            AttrChange::Keep => kind.clone(),
            AttrChange::Set(next) => next.clone(),
            AttrChange::Clear => BlockType::default(),
        }
    }

    fn op_for(&self, entry: &NodeEntry<'_>) -> Option<Op> {
        match entry.node {
            NodeRef::Leaf(leaf) => {
                let marks = self.patch_marks(leaf.marks);
                (marks != leaf.marks).then(|| Op::SetLeafMarks {
                    path: entry.path.clone(),
                    marks,
                    previous: leaf.marks,
                })
            }
            NodeRef::Block(block) => {
                let block_type = self.patch_block_type(&block.kind);
                (block_type != block.kind).then(|| Op::SetBlockType {
                    path: entry.path.clone(),
                    block_type,
                    previous: block.kind.clone(),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetNodesOptions {
    pub split: bool,
}

impl SetNodesOptions {
    pub fn split() -> Self {
        Self { split: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub doc: Document,
    pub selection: Selection,
    pub tx: Transaction,
}

impl TransformOutcome {
    pub fn unchanged(doc: &Document, selection: &Selection) -> Self {
        Self {
            doc: doc.clone(),
            selection: selection.clone(),
            tx: Transaction::default(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn into_parts(self) -> (Document, Selection, Transaction) {
        (self.doc, self.selection, self.tx)
    }
}

/// Applies `patch` to every node in the selection that satisfies `matches`. Returns the input
/// unchanged, with an empty transaction, when no matched node would change.
///
/// # Panics
///
/// When `selection` does not resolve in `doc`.
pub fn set_nodes(
    doc: &Document,
    selection: &Selection,
    patch: &NodePatch,
    matches: impl Fn(NodeRef<'_>) -> bool,
    options: SetNodesOptions,
) -> TransformOutcome {
    let span = Span::of(doc, selection);
    let mut draft = Draft::new(doc);

    if options.split && !span.is_collapsed() {
        // End first, so the start edge still names the same leaf.
        draft.split_at(span.end, &matches);
        draft.split_at(span.start, &matches);
    }

    let scoped = span.to_selection(&draft.doc);
    let updates: Vec<Op> = nodes(&draft.doc, Some(&scoped))
        .filter(|entry| matches(entry.node))
        .filter_map(|entry| patch.op_for(&entry))
        .collect();

    if updates.is_empty() {
        tracing::trace!("set_nodes matched nothing that would change");
        return TransformOutcome::unchanged(doc, selection);
    }

    for op in updates {
        draft.apply(op);
    }
    // A caret toggle must only ever cover the leaf it patched.
    if !span.is_collapsed() {
        draft.merge_adjacent_leaves();
    }

    let selection = span.to_selection(&draft.doc);
    TransformOutcome {
        doc: draft.doc,
        selection,
        tx: Transaction::new(draft.ops),
    }
}

struct Draft {
    doc: Document,
    ops: Vec<Op>,
    touched: BTreeSet<usize>,
}

impl Draft {
    fn new(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            ops: Vec::new(),
            touched: BTreeSet::new(),
        }
    }

    fn apply(&mut self, op: Op) {
        if let Err(err) = apply_op(&mut self.doc, &op) {
            panic!("transform emitted an op that does not apply: {err}");
        }
        tracing::trace!(?op, "applied op");
        match &op {
            Op::SplitLeaf { path, .. } | Op::SetLeafMarks { path, .. } => {
                self.touched.insert(path[0]);
            }
            _ => {}
        }
        self.ops.push(op);
    }

    fn split_at(&mut self, pos: DocPos, matches: &impl Fn(NodeRef<'_>) -> bool) {
        let block = &self.doc.children[pos.block];
        let inside = block
            .leaf_ranges()
            .enumerate()
            .find(|(_, (start, end))| *start < pos.offset && pos.offset < *end);
        let Some((leaf_ix, (start, _))) = inside else {
            return;
        };
        if !matches(NodeRef::Leaf(&block.children[leaf_ix])) {
            return;
        }
        self.apply(Op::SplitLeaf {
            path: vec![pos.block, leaf_ix],
            position: pos.offset - start,
        });
    }

    fn merge_adjacent_leaves(&mut self) {
        for block_ix in self.touched.clone() {
            loop {
                let leaves = &self.doc.children[block_ix].children;
                let mergeable = (1..leaves.len())
                    .rev()
                    .find(|&ix| leaves[ix - 1].marks == leaves[ix].marks);
                let Some(leaf_ix) = mergeable else {
                    break;
                };
                let position = leaves[leaf_ix - 1].text.len();
                self.apply(Op::MergeLeaf {
                    path: vec![block_ix, leaf_ix],
                    position,
                });
            }
        }
    }
}
