use crate::core::{Block, Document, NodeKind, NodeRef, Path, Point, Selection};
use crate::schema::check_point;

// Block index plus byte offset into the block's text. Stable across leaf splits and merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct DocPos {
    pub block: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Affinity {
    Forward,
    Backward,
}

/// # Panics
///
/// When the point does not name a live leaf of `doc`.
pub(crate) fn resolve_point(doc: &Document, point: &Point) -> DocPos {
    if let Err(err) = check_point(doc, point) {
        panic!("selection point {point} does not resolve in this document: {err}");
    }
    let block = point.path[0];
    let leaf = point.path[1];
    let before: usize = doc.children[block].children[..leaf]
        .iter()
        .map(|l| l.text.len())
        .sum();
    DocPos {
        block,
        offset: before + point.offset,
    }
}

pub(crate) fn leaf_index_at(block: &Block, offset: usize, affinity: Affinity) -> usize {
    let ranges: Vec<(usize, usize)> = block.leaf_ranges().collect();
    let strict = match affinity {
        Affinity::Forward => ranges.iter().position(|&(s, e)| s <= offset && offset < e),
        Affinity::Backward => ranges.iter().position(|&(s, e)| s < offset && offset <= e),
    };
    strict
        .or_else(|| {
            let mut touching = ranges
                .iter()
                .enumerate()
                .filter(|(_, (s, e))| *s <= offset && offset <= *e)
                .map(|(ix, _)| ix);
            match affinity {
                Affinity::Forward => touching.last(),
                Affinity::Backward => touching.next(),
            }
        })
        .unwrap_or(ranges.len().saturating_sub(1))
}

pub(crate) fn point_at(doc: &Document, pos: DocPos, affinity: Affinity) -> Point {
    let block = &doc.children[pos.block];
    let leaf = leaf_index_at(block, pos.offset, affinity);
    let start = block.leaf_ranges().nth(leaf).map_or(0, |(s, _)| s);
    Point::new(vec![pos.block, leaf], pos.offset - start)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: DocPos,
    pub end: DocPos,
    pub backward: bool,
}

impl Span {
    pub fn of(doc: &Document, selection: &Selection) -> Self {
        let anchor = resolve_point(doc, &selection.anchor);
        let focus = resolve_point(doc, &selection.focus);
        Span {
            start: anchor.min(focus),
            end: anchor.max(focus),
            backward: focus < anchor,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn to_selection(self, doc: &Document) -> Selection {
        let (start, end) = if self.is_collapsed() {
            let caret = point_at(doc, self.start, Affinity::Forward);
            (caret.clone(), caret)
        } else {
            (
                point_at(doc, self.start, Affinity::Forward),
                point_at(doc, self.end, Affinity::Backward),
            )
        };
        if self.backward {
            Selection::new(end, start)
        } else {
            Selection::new(start, end)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    All,
    Caret { block: usize, leaf: usize },
    Range(Span),
}

impl Scope {
    fn new(doc: &Document, selection: Option<&Selection>) -> Self {
        let Some(selection) = selection else {
            return Scope::All;
        };
        let span = Span::of(doc, selection);
        if span.is_collapsed() {
            let block = span.start.block;
            let leaf = leaf_index_at(&doc.children[block], span.start.offset, Affinity::Forward);
            Scope::Caret { block, leaf }
        } else {
            Scope::Range(span)
        }
    }

    fn contains_leaf(&self, block: usize, leaf: usize, (start, end): (usize, usize)) -> bool {
        match *self {
            Scope::All => true,
            Scope::Caret {
                block: caret_block,
                leaf: caret_leaf,
            } => caret_block == block && caret_leaf == leaf,
            Scope::Range(span) => {
                let leaf_start = DocPos {
                    block,
                    offset: start,
                };
                let leaf_end = DocPos { block, offset: end };
                if start < end {
                    leaf_start < span.end && span.start < leaf_end
                } else {
                    span.start <= leaf_start && leaf_start < span.end
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry<'a> {
    pub path: Path,
    pub node: NodeRef<'a>,
}

/// Nodes in scope, each block followed by its leaves. A caret on a leaf boundary scopes the
/// leaf to its right.
///
/// # Panics
///
/// When `selection` does not resolve in `doc`.
pub fn nodes<'a>(
    doc: &'a Document,
    selection: Option<&Selection>,
) -> impl Iterator<Item = NodeEntry<'a>> + use<'a> {
    let scope = Scope::new(doc, selection);

    doc.children
        .iter()
        .enumerate()
        .flat_map(move |(block_ix, block)| {
            let leaves: Vec<NodeEntry<'a>> = block
                .children
                .iter()
                .zip(block.leaf_ranges())
                .enumerate()
                .filter(|(leaf_ix, (_, range))| scope.contains_leaf(block_ix, *leaf_ix, *range))
                .map(|(leaf_ix, (leaf, _))| NodeEntry {
                    path: vec![block_ix, leaf_ix],
                    node: NodeRef::Leaf(leaf),
                })
                .collect();

            let head = (!leaves.is_empty()).then(|| NodeEntry {
                path: vec![block_ix],
                node: NodeRef::Block(block),
            });
            head.into_iter().chain(leaves)
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    First,
    Universal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub mode: MatchMode,
    pub kind: Option<NodeKind>,
}

impl FindOptions {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn universal() -> Self {
        Self {
            mode: MatchMode::Universal,
            kind: None,
        }
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult<'a> {
    First(Option<NodeEntry<'a>>),
    Universal {
        matched: bool,
        witness: Option<NodeEntry<'a>>,
    },
}

impl<'a> QueryResult<'a> {
    pub fn is_match(&self) -> bool {
        match self {
            QueryResult::First(entry) => entry.is_some(),
            QueryResult::Universal { matched, .. } => *matched,
        }
    }

    pub fn entry(&self) -> Option<&NodeEntry<'a>> {
        match self {
            QueryResult::First(entry) => entry.as_ref(),
            QueryResult::Universal { witness, .. } => witness.as_ref(),
        }
    }
}

/// `Universal` over an empty scope never matches.
pub fn find_nodes<'a>(
    doc: &'a Document,
    selection: Option<&Selection>,
    predicate: impl Fn(NodeRef<'a>) -> bool,
    options: FindOptions,
) -> QueryResult<'a> {
    let mut scoped = nodes(doc, selection)
        .filter(|entry| options.kind.is_none_or(|kind| entry.node.kind() == kind));

    match options.mode {
        MatchMode::First => QueryResult::First(scoped.find(|entry| predicate(entry.node))),
        MatchMode::Universal => {
            let Some(witness) = scoped.next() else {
                return QueryResult::Universal {
                    matched: false,
                    witness: None,
                };
            };
            let matched = predicate(witness.node) && scoped.all(|entry| predicate(entry.node));
            QueryResult::Universal {
                matched,
                witness: Some(witness),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Leaf;

    fn two_leaf_block() -> Block {
        Block::new(Default::default(), vec![Leaf::new("ab"), Leaf::bold("cd")])
    }

    #[test]
    fn boundary_offsets_follow_affinity() {
        let block = two_leaf_block();
        assert_eq!(leaf_index_at(&block, 2, Affinity::Forward), 1);
        assert_eq!(leaf_index_at(&block, 2, Affinity::Backward), 0);
        assert_eq!(leaf_index_at(&block, 0, Affinity::Backward), 0);
        assert_eq!(leaf_index_at(&block, 4, Affinity::Forward), 1);
    }

    #[test]
    fn resolve_point_counts_previous_leaves() {
        let doc = Document::new(vec![Block::paragraph("x"), two_leaf_block()]);
        let pos = resolve_point(&doc, &Point::new(vec![1, 1], 1));
        assert_eq!(pos, DocPos { block: 1, offset: 3 });
    }

    #[test]
    #[should_panic(expected = "does not resolve")]
    fn resolve_point_rejects_dangling_paths() {
        let doc = Document::default();
        resolve_point(&doc, &Point::new(vec![0, 3], 0));
    }
}
