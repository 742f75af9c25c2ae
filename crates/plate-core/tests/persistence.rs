use plate_lite_core::{
    Block, BlockType, Document, Editor, EditorCommand, EditorConfig, FileStore, KeyValueStore,
    Leaf, LoadSource, MemoryStore, Persistence, StorageError, ValidationMode, from_json_str, to_json,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn rich_doc() -> Document {
    Document::new(vec![
        Block::new(
            BlockType::Paragraph,
            vec![Leaf::new("plain "), Leaf::bold("bold")],
        ),
        Block::code("fn main() {}"),
        Block::new(BlockType::from("quote"), vec![Leaf::new("q")]),
    ])
}

#[test]
fn stored_json_has_the_expected_shape() {
    let value = serde_json::to_value(rich_doc()).expect("serialize");
    assert_eq!(
        value,
        json!([
            {
                "type": "paragraph",
                "children": [{"text": "plain "}, {"text": "bold", "bold": true}]
            },
            {"type": "code", "children": [{"text": "fn main() {}"}]},
            {"type": "quote", "children": [{"text": "q"}]}
        ])
    );
}

#[test]
fn serialize_then_parse_is_identity() {
    let doc = rich_doc();
    let raw = to_json(&doc).expect("serialize");
    let parsed = from_json_str(&raw, ValidationMode::Lenient).expect("parse");
    assert_eq!(parsed, doc);
}

#[test]
fn cleared_bold_reads_as_absent() {
    let raw = json!([{
        "type": "paragraph",
        "children": [{"text": "a", "bold": false}, {"text": "b", "bold": null}]
    }])
    .to_string();

    let doc = from_json_str(&raw, ValidationMode::Lenient).expect("parse");

    assert_eq!(
        doc.children[0].children,
        vec![Leaf::new("a"), Leaf::new("b")]
    );
    assert_eq!(
        serde_json::to_value(&doc).expect("serialize"),
        json!([{"type": "paragraph", "children": [{"text": "a"}, {"text": "b"}]}])
    );
}

#[rstest]
#[case::not_json("{not json")]
#[case::object("{}")]
#[case::empty_array("[]")]
#[case::missing_children(r#"[{"type":"paragraph"}]"#)]
#[case::empty_block(r#"[{"type":"paragraph","children":[]}]"#)]
#[case::leaf_without_text(r#"[{"type":"paragraph","children":[{"bold":true}]}]"#)]
fn malformed_state_falls_back_to_default(#[case] raw: &str) {
    let persistence = Persistence::default();
    let store = MemoryStore::with_value("content", raw);

    let loaded = persistence.load(&store);

    assert_eq!(loaded.source, LoadSource::Fallback);
    assert_eq!(loaded.doc, Document::default());
}

#[test]
fn missing_key_loads_default_document() {
    let editor = Editor::load(MemoryStore::new(), EditorConfig::default());

    assert_eq!(editor.load_source(), LoadSource::Missing);
    assert_eq!(editor.doc(), &Document::new(vec![Block::paragraph("")]));
}

#[test]
fn strict_mode_rejects_unknown_block_types() {
    let raw = json!([{"type": "heading", "children": [{"text": "x"}]}]).to_string();

    let lenient = Persistence::new("content", ValidationMode::Lenient)
        .load(&MemoryStore::with_value("content", raw.clone()));
    assert_eq!(lenient.source, LoadSource::Stored);
    assert_eq!(lenient.doc.children[0].kind, BlockType::from("heading"));

    let strict = Persistence::new("content", ValidationMode::Strict)
        .load(&MemoryStore::with_value("content", raw));
    assert_eq!(strict.source, LoadSource::Fallback);
}

#[test]
fn custom_key_is_used_for_reads_and_writes() {
    let config = EditorConfig::default().storage_key("notes");
    let mut editor = Editor::load(MemoryStore::new(), config);

    editor.run(EditorCommand::ToggleCodeBlock);

    assert_eq!(editor.store().get("content").expect("get"), None);
    assert!(editor.store().get("notes").expect("get").is_some());
}

#[test]
fn file_store_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut editor = Editor::load(FileStore::new(dir.path()), EditorConfig::default());
    assert_eq!(editor.load_source(), LoadSource::Missing);
    let report = editor.run(EditorCommand::ToggleCodeBlock);
    assert!(!report.persist.is_failed());
    assert!(dir.path().join("content.json").exists());

    let reopened = Editor::load(FileStore::new(dir.path()), EditorConfig::default());
    assert_eq!(reopened.load_source(), LoadSource::Stored);
    assert_eq!(reopened.doc().children[0].kind, BlockType::Code);
    assert_eq!(reopened.doc(), editor.doc());
}

#[test]
fn file_store_rejects_keys_that_escape_the_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path());

    assert!(store.path_for("../content").is_err());
    assert!(store.path_for("").is_err());
    assert!(store.path_for("content").is_ok());
}

#[test]
fn failed_file_write_leaves_no_temp_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A non-empty directory in place of the target makes the final rename fail.
    let blocker = dir.path().join("content.json");
    std::fs::create_dir(&blocker).expect("create blocker");
    std::fs::write(blocker.join("keep"), "x").expect("fill blocker");

    let mut store = FileStore::new(dir.path());
    let err = store.set("content", "[]").unwrap_err();

    assert!(matches!(err, StorageError::Io { ref key, .. } if key == "content"));
    assert!(!dir.path().join("content.json.tmp").exists());
    assert!(blocker.is_dir());
}
