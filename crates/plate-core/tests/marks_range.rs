use plate_lite_core::{
    Block, Document, Leaf, NodePatch, Op, Point, Selection, SetNodesOptions, is_bold_mark_active,
    set_nodes, toggle_bold_mark,
};
use pretty_assertions::assert_eq;

fn leaves(doc: &Document, block: usize) -> Vec<(String, bool)> {
    doc.children[block]
        .children
        .iter()
        .map(|leaf| (leaf.text.clone(), leaf.marks.bold))
        .collect()
}

fn range(anchor: (usize, usize, usize), focus: (usize, usize, usize)) -> Selection {
    Selection::new(
        Point::new(vec![anchor.0, anchor.1], anchor.2),
        Point::new(vec![focus.0, focus.1], focus.2),
    )
}

#[test]
fn toggle_bold_splits_leaf_at_selection_edges() {
    let doc = Document::new(vec![Block::paragraph("hello")]);
    let selection = range((0, 0, 1), (0, 0, 3));

    let outcome = toggle_bold_mark(&doc, &selection);

    assert_eq!(
        leaves(&outcome.doc, 0),
        vec![
            ("h".to_string(), false),
            ("el".to_string(), true),
            ("lo".to_string(), false),
        ]
    );
    assert_eq!(outcome.doc.plain_text(), "hello");
    assert_eq!(outcome.selection, range((0, 1, 0), (0, 1, 2)));
    assert!(outcome.tx.is_ast_change());
    assert_eq!(outcome.tx.meta.source.as_deref(), Some("marks.toggle_bold"));
    assert_eq!(
        outcome.tx.ops,
        vec![
            Op::SplitLeaf {
                path: vec![0, 0],
                position: 3,
            },
            Op::SplitLeaf {
                path: vec![0, 0],
                position: 1,
            },
            Op::SetLeafMarks {
                path: vec![0, 1],
                marks: plate_lite_core::Marks { bold: true },
                previous: plate_lite_core::Marks::default(),
            },
        ]
    );
}

#[test]
fn toggle_bold_twice_restores_original_leaves() {
    let doc = Document::new(vec![Block::paragraph("hello")]);
    let selection = range((0, 0, 1), (0, 0, 3));

    let first = toggle_bold_mark(&doc, &selection);
    assert!(is_bold_mark_active(&first.doc, &first.selection));

    let second = toggle_bold_mark(&first.doc, &first.selection);
    assert_eq!(second.doc, doc);
    assert_eq!(second.selection, selection);
    assert!(!is_bold_mark_active(&second.doc, &second.selection));
}

#[test]
fn toggle_bold_across_blocks_patches_only_selected_text() {
    let doc = Document::new(vec![Block::paragraph("one"), Block::paragraph("two")]);
    let selection = range((0, 0, 1), (1, 0, 2));

    let outcome = toggle_bold_mark(&doc, &selection);

    assert_eq!(
        leaves(&outcome.doc, 0),
        vec![("o".to_string(), false), ("ne".to_string(), true)]
    );
    assert_eq!(
        leaves(&outcome.doc, 1),
        vec![("tw".to_string(), true), ("o".to_string(), false)]
    );
    assert_eq!(outcome.selection, range((0, 1, 0), (1, 0, 2)));
}

#[test]
fn backward_selection_keeps_its_direction() {
    let doc = Document::new(vec![Block::paragraph("hello")]);
    let selection = range((0, 0, 3), (0, 0, 1));

    let outcome = toggle_bold_mark(&doc, &selection);

    assert_eq!(outcome.selection, range((0, 1, 2), (0, 1, 0)));
    assert_eq!(outcome.doc.children[0].children[1], Leaf::bold("el"));
}

#[test]
fn partially_bold_selection_becomes_fully_bold_and_merges() {
    let doc = Document::new(vec![Block::new(
        Default::default(),
        vec![Leaf::new("ab"), Leaf::bold("cd"), Leaf::new("ef")],
    )]);
    let selection = range((0, 0, 1), (0, 2, 1));
    assert!(!is_bold_mark_active(&doc, &selection));

    let outcome = toggle_bold_mark(&doc, &selection);

    assert_eq!(
        leaves(&outcome.doc, 0),
        vec![
            ("a".to_string(), false),
            ("bcde".to_string(), true),
            ("f".to_string(), false),
        ]
    );
    assert_eq!(outcome.selection, range((0, 1, 0), (0, 1, 4)));
    assert!(is_bold_mark_active(&outcome.doc, &outcome.selection));
}

#[test]
fn collapsed_caret_on_boundary_uses_the_leaf_to_the_right() {
    let doc = Document::new(vec![Block::new(
        Default::default(),
        vec![Leaf::new("ab"), Leaf::bold("cd")],
    )]);
    let caret = Selection::collapsed(Point::new(vec![0, 0], 2));

    assert!(is_bold_mark_active(&doc, &caret));

    let outcome = toggle_bold_mark(&doc, &caret);
    assert_eq!(
        leaves(&outcome.doc, 0),
        vec![("ab".to_string(), false), ("cd".to_string(), false)]
    );
    assert_eq!(outcome.selection, Selection::collapsed(Point::new(vec![0, 1], 0)));

    let back = toggle_bold_mark(&outcome.doc, &outcome.selection);
    assert_eq!(back.doc, doc);
}

#[test]
fn caret_toggle_twice_leaves_neighbouring_bold_alone() {
    let doc = Document::new(vec![Block::new(
        Default::default(),
        vec![Leaf::new("ab"), Leaf::bold("cde")],
    )]);
    let caret = Selection::collapsed(Point::new(vec![0, 0], 1));

    let first = toggle_bold_mark(&doc, &caret);
    assert_eq!(
        leaves(&first.doc, 0),
        vec![("ab".to_string(), true), ("cde".to_string(), true)]
    );
    assert_eq!(first.selection, caret);

    let second = toggle_bold_mark(&first.doc, &first.selection);
    assert_eq!(second.doc, doc);
    assert_eq!(second.selection, caret);
}

#[test]
fn toggles_over_a_selection_without_text_change_nothing() {
    let doc = Document::new(vec![Block::paragraph("ab"), Block::paragraph("cd")]);
    // From the end of the first block to the start of the second: no text in between.
    let selection = range((0, 0, 2), (1, 0, 0));

    let bold = toggle_bold_mark(&doc, &selection);
    assert!(bold.is_noop());
    assert_eq!(bold.doc, doc);
    assert_eq!(bold.selection, selection);

    let code = plate_lite_core::toggle_code_block(&doc, &selection);
    assert!(code.is_noop());
    assert_eq!(code.doc, doc);
    assert_eq!(code.selection, selection);
}

#[test]
fn collapsed_caret_inside_leaf_patches_the_whole_leaf() {
    let doc = Document::new(vec![Block::paragraph("hello")]);
    let caret = Selection::collapsed(Point::new(vec![0, 0], 2));

    let outcome = toggle_bold_mark(&doc, &caret);

    assert_eq!(leaves(&outcome.doc, 0), vec![("hello".to_string(), true)]);
    assert_eq!(outcome.selection, caret);
}

#[test]
fn multibyte_text_splits_on_char_boundaries() {
    let doc = Document::new(vec![Block::paragraph("héllo")]);
    // "é" spans bytes 1..3
    let selection = range((0, 0, 1), (0, 0, 3));

    let outcome = toggle_bold_mark(&doc, &selection);

    assert_eq!(
        leaves(&outcome.doc, 0),
        vec![
            ("h".to_string(), false),
            ("é".to_string(), true),
            ("llo".to_string(), false),
        ]
    );
}

#[test]
fn set_nodes_without_split_patches_whole_leaves() {
    let doc = Document::new(vec![Block::paragraph("hello")]);
    let selection = range((0, 0, 1), (0, 0, 3));

    let outcome = set_nodes(
        &doc,
        &selection,
        &NodePatch::set_bold(),
        |node| node.is_leaf(),
        SetNodesOptions::default(),
    );

    assert_eq!(outcome.doc.children[0].children, vec![Leaf::bold("hello")]);
    assert_eq!(outcome.selection, selection);
}

#[test]
fn set_nodes_that_changes_nothing_returns_input_untouched() {
    let doc = Document::new(vec![Block::new(
        Default::default(),
        vec![Leaf::bold("hello")],
    )]);
    let selection = range((0, 0, 1), (0, 0, 3));

    let outcome = set_nodes(
        &doc,
        &selection,
        &NodePatch::set_bold(),
        |node| node.is_leaf(),
        SetNodesOptions::split(),
    );

    assert!(outcome.is_noop());
    assert_eq!(outcome.doc, doc);
    assert_eq!(outcome.selection, selection);
}

#[test]
#[should_panic(expected = "does not resolve")]
fn dangling_selection_is_a_contract_violation() {
    let doc = Document::new(vec![Block::paragraph("hello")]);
    let selection = range((0, 0, 1), (0, 0, 9));
    toggle_bold_mark(&doc, &selection);
}
