use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Block, BlockType, Document, Leaf, Marks, Point, Selection};
use crate::error::{SelectionError, ValidationError};

/// `Strict` rejects block types other than paragraph and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

impl Document {
    pub fn from_value(value: &Value, mode: ValidationMode) -> Result<Self, ValidationError> {
        let Value::Array(blocks) = value else {
            return Err(ValidationError::NotAnArray);
        };

        let children = blocks
            .iter()
            .enumerate()
            .map(|(ix, block)| block_from_value(ix, block))
            .collect::<Result<Vec<_>, _>>()?;

        let doc = Document { children };
        doc.validate(mode)?;
        Ok(doc)
    }

    pub fn validate(&self, mode: ValidationMode) -> Result<(), ValidationError> {
        if self.children.is_empty() {
            return Err(ValidationError::EmptyDocument);
        }

        for (block_ix, block) in self.children.iter().enumerate() {
            if mode == ValidationMode::Strict && !block.kind.is_known() {
                return Err(ValidationError::UnknownBlockType {
                    block: block_ix,
                    kind: block.kind.to_string(),
                });
            }
            if block.children.is_empty() {
                return Err(ValidationError::EmptyBlock { block: block_ix });
            }
            if block.children.len() > 1 {
                if let Some(leaf_ix) = block.children.iter().position(|l| l.text.is_empty()) {
                    return Err(ValidationError::StrayEmptyLeaf {
                        block: block_ix,
                        leaf: leaf_ix,
                    });
                }
            }
        }

        Ok(())
    }
}

fn block_from_value(block_ix: usize, value: &Value) -> Result<Block, ValidationError> {
    let Value::Object(obj) = value else {
        return Err(ValidationError::BlockNotAnObject { block: block_ix });
    };

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .map(BlockType::from)
        .ok_or(ValidationError::MissingBlockType { block: block_ix })?;

    let leaves = obj
        .get("children")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingChildren { block: block_ix })?;

    let children = leaves
        .iter()
        .enumerate()
        .map(|(leaf_ix, leaf)| leaf_from_value(block_ix, leaf_ix, leaf))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Block { kind, children })
}

fn leaf_from_value(block: usize, leaf: usize, value: &Value) -> Result<Leaf, ValidationError> {
    let malformed = |reason: &str| ValidationError::MalformedLeaf {
        block,
        leaf,
        reason: reason.to_string(),
    };

    let Value::Object(obj) = value else {
        return Err(malformed("not an object"));
    };
    if obj.contains_key("children") {
        return Err(malformed("leaves cannot have children"));
    }

    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing string `text`"))?;

    let bold = match obj.get("bold") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(bold)) => *bold,
        Some(_) => return Err(malformed("`bold` must be a boolean")),
    };

    Ok(Leaf {
        text: text.to_string(),
        marks: Marks { bold },
    })
}

impl Selection {
    /// Checks that both points name a live leaf and sit on a character boundary inside it.
    pub fn check(&self, doc: &Document) -> Result<(), SelectionError> {
        check_point(doc, &self.anchor)?;
        check_point(doc, &self.focus)
    }
}

pub(crate) fn check_point(doc: &Document, point: &Point) -> Result<(), SelectionError> {
    let leaf = doc
        .leaf(&point.path)
        .ok_or_else(|| SelectionError::InvalidPath {
            path: point.path.clone(),
        })?;

    if point.offset > leaf.text.len() {
        return Err(SelectionError::OffsetOutOfBounds {
            path: point.path.clone(),
            offset: point.offset,
            len: leaf.text.len(),
        });
    }
    if !leaf.text.is_char_boundary(point.offset) {
        return Err(SelectionError::NotCharBoundary {
            path: point.path.clone(),
            offset: point.offset,
        });
    }
    Ok(())
}
