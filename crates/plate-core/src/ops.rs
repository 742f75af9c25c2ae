use serde::{Deserialize, Serialize};

use crate::core::{BlockType, Document, Leaf, Marks, Path, Selection};
use crate::error::ApplyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Split the leaf at `path` at byte `position`; the tail becomes the next sibling.
    SplitLeaf { path: Path, position: usize },
    /// Merge the leaf at `path` into its previous sibling, whose text was `position` bytes long.
    MergeLeaf { path: Path, position: usize },
    SetLeafMarks {
        path: Path,
        marks: Marks,
        previous: Marks,
    },
    SetBlockType {
        path: Path,
        block_type: BlockType,
        previous: BlockType,
    },
    SetSelection {
        selection: Selection,
        previous: Selection,
    },
}

impl Op {
    pub fn is_selection_only(&self) -> bool {
        matches!(self, Op::SetSelection { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            meta: TransactionMeta::default(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn is_ast_change(&self) -> bool {
        self.ops.iter().any(|op| !op.is_selection_only())
    }
}

/// Applies one op to `doc` in place. Selection ops leave the document untouched.
pub fn apply_op(doc: &mut Document, op: &Op) -> Result<(), ApplyError> {
    match op {
        Op::SplitLeaf { path, position } => {
            let (block_ix, leaf_ix) = leaf_indices(path)?;
            let leaf = leaf_mut(doc, path)?;
            if *position > leaf.text.len() || !leaf.text.is_char_boundary(*position) {
                return Err(ApplyError::InvalidPath(format!(
                    "split position {position} is not inside leaf {path:?}"
                )));
            }
            let tail = Leaf {
                text: leaf.text.split_off(*position),
                marks: leaf.marks,
            };
            doc.children[block_ix].children.insert(leaf_ix + 1, tail);
            Ok(())
        }
        Op::MergeLeaf { path, .. } => {
            let (block_ix, leaf_ix) = leaf_indices(path)?;
            if leaf_ix == 0 {
                return Err(ApplyError::InvalidPath(format!(
                    "leaf {path:?} has no previous sibling to merge into"
                )));
            }
            leaf_mut(doc, path)?;
            let leaves = &mut doc.children[block_ix].children;
            let merged = leaves.remove(leaf_ix);
            leaves[leaf_ix - 1].text.push_str(&merged.text);
            Ok(())
        }
        Op::SetLeafMarks { path, marks, .. } => {
            leaf_mut(doc, path)?.marks = *marks;
            Ok(())
        }
        Op::SetBlockType {
            path, block_type, ..
        } => {
            let [block_ix] = path.as_slice() else {
                return Err(ApplyError::InvalidPath(format!(
                    "{path:?} does not name a block"
                )));
            };
            let block = doc.children.get_mut(*block_ix).ok_or_else(|| {
                ApplyError::InvalidPath(format!("block {block_ix} is out of bounds"))
            })?;
            block.kind = block_type.clone();
            Ok(())
        }
        Op::SetSelection { .. } => Ok(()),
    }
}

fn leaf_indices(path: &[usize]) -> Result<(usize, usize), ApplyError> {
    match path {
        [block, leaf] => Ok((*block, *leaf)),
        _ => Err(ApplyError::InvalidPath(format!(
            "{path:?} does not name a leaf"
        ))),
    }
}

fn leaf_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut Leaf, ApplyError> {
    doc.leaf_mut(path)
        .ok_or_else(|| ApplyError::InvalidPath(format!("leaf {path:?} is out of bounds")))
}
