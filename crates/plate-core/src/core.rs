use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ValidationMode;

pub type Path = Vec<usize>;

pub const DEFAULT_STORAGE_KEY: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            children: vec![Block::paragraph("")],
        }
    }
}

impl Document {
    pub fn new(children: Vec<Block>) -> Self {
        Self { children }
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.children.get(index)
    }

    pub fn leaf(&self, path: &[usize]) -> Option<&Leaf> {
        match path {
            [block, leaf] => self.children.get(*block)?.children.get(*leaf),
            _ => None,
        }
    }

    pub fn node(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        match path {
            [block] => self.children.get(*block).map(NodeRef::Block),
            [_, _] => self.leaf(path).map(NodeRef::Leaf),
            _ => None,
        }
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn leaf_mut(&mut self, path: &[usize]) -> Option<&mut Leaf> {
        match path {
            [block, leaf] => self.children.get_mut(*block)?.children.get_mut(*leaf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub children: Vec<Leaf>,
}

impl Block {
    pub fn new(kind: BlockType, children: Vec<Leaf>) -> Self {
        Self { kind, children }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockType::Paragraph, vec![Leaf::new(text)])
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self::new(BlockType::Code, vec![Leaf::new(text)])
    }

    pub fn text(&self) -> String {
        self.children.iter().map(|leaf| leaf.text.as_str()).collect()
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(|leaf| leaf.text.len()).sum()
    }

    pub(crate) fn leaf_ranges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.children.iter().scan(0usize, |cursor, leaf| {
            let start = *cursor;
            *cursor += leaf.text.len();
            Some((start, *cursor))
        })
    }
}

/// Unknown tags are kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    #[default]
    Paragraph,
    Code,
    Other(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Code => "code",
            BlockType::Other(kind) => kind,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BlockType::Other(_))
    }
}

impl From<String> for BlockType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "paragraph" => BlockType::Paragraph,
            "code" => BlockType::Code,
            _ => BlockType::Other(value),
        }
    }
}

impl From<&str> for BlockType {
    fn from(value: &str) -> Self {
        BlockType::from(value.to_string())
    }
}

impl From<BlockType> for String {
    fn from(value: BlockType) -> Self {
        match value {
            BlockType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Leaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks { bold: true },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Block,
    Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Block(&'a Block),
    Leaf(&'a Leaf),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Block(_) => NodeKind::Block,
            NodeRef::Leaf(_) => NodeKind::Leaf,
        }
    }

    pub fn as_block(&self) -> Option<&'a Block> {
        match self {
            NodeRef::Block(block) => Some(block),
            NodeRef::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&'a Leaf> {
        match self {
            NodeRef::Leaf(leaf) => Some(leaf),
            NodeRef::Block(_) => None,
        }
    }

    pub fn is_block(&self) -> bool {
        self.kind() == NodeKind::Block
    }

    pub fn is_leaf(&self) -> bool {
        self.kind() == NodeKind::Leaf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .path
            .iter()
            .map(|ix| ix.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{path}:{}", self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Literal equality; points on either side of a leaf boundary are not collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start() -> Self {
        Self::collapsed(Point::new(vec![0, 0], 0))
    }
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub storage_key: String,
    pub validation: ValidationMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: String::new(),
            validation: ValidationMode::default(),
        }
        .with_defaults()
    }
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.storage_key.is_empty() {
            self.storage_key = DEFAULT_STORAGE_KEY.to_string();
        }
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }
}
