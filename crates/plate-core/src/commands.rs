use std::fmt;
use std::str::FromStr;

use crate::core::{BlockType, Document, NodeKind, NodeRef, Selection};
use crate::query::{FindOptions, find_nodes};
use crate::transforms::{NodePatch, SetNodesOptions, TransformOutcome, set_nodes};

/// True when every leaf in the selection is bold.
pub fn is_bold_mark_active(doc: &Document, selection: &Selection) -> bool {
    find_nodes(
        doc,
        Some(selection),
        |node| node.as_leaf().is_some_and(|leaf| leaf.marks.bold),
        FindOptions::universal().kind(NodeKind::Leaf),
    )
    .is_match()
}

/// True when any block in the selection is a code block.
pub fn is_code_block_active(doc: &Document, selection: &Selection) -> bool {
    find_nodes(
        doc,
        Some(selection),
        |node| node.as_block().is_some_and(|block| block.kind == BlockType::Code),
        FindOptions::first().kind(NodeKind::Block),
    )
    .is_match()
}

pub fn toggle_bold_mark(doc: &Document, selection: &Selection) -> TransformOutcome {
    let patch = if is_bold_mark_active(doc, selection) {
        NodePatch::clear_bold()
    } else {
        NodePatch::set_bold()
    };
    let mut outcome = set_nodes(
        doc,
        selection,
        &patch,
        |node| node.is_leaf(),
        SetNodesOptions::split(),
    );
    outcome.tx.meta.source = Some(EditorCommand::ToggleBold.id().to_string());
    outcome
}

pub fn toggle_code_block(doc: &Document, selection: &Selection) -> TransformOutcome {
    let patch = if is_code_block_active(doc, selection) {
        NodePatch::clear_block_type()
    } else {
        NodePatch::set_block_type(BlockType::Code)
    };
    let mut outcome = set_nodes(
        doc,
        selection,
        &patch,
        |node: NodeRef<'_>| node.is_block(),
        SetNodesOptions::default(),
    );
    outcome.tx.meta.source = Some(EditorCommand::ToggleCodeBlock.id().to_string());
    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    ToggleBold,
    ToggleCodeBlock,
}

impl EditorCommand {
    pub const ALL: [EditorCommand; 2] = [EditorCommand::ToggleBold, EditorCommand::ToggleCodeBlock];

    pub fn id(&self) -> &'static str {
        match self {
            EditorCommand::ToggleBold => "marks.toggle_bold",
            EditorCommand::ToggleCodeBlock => "code_block.toggle",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditorCommand::ToggleBold => "Toggle bold",
            EditorCommand::ToggleCodeBlock => "Toggle code block",
        }
    }

    pub fn run(&self, doc: &Document, selection: &Selection) -> TransformOutcome {
        match self {
            EditorCommand::ToggleBold => toggle_bold_mark(doc, selection),
            EditorCommand::ToggleCodeBlock => toggle_code_block(doc, selection),
        }
    }

    /// Conventional bindings: a command modifier plus `b` or `` ` ``.
    pub fn for_chord(chord: &KeyChord) -> Option<Self> {
        if !chord.has_command_modifier() {
            return None;
        }
        match chord.key.as_str() {
            "b" => Some(EditorCommand::ToggleBold),
            "`" => Some(EditorCommand::ToggleCodeBlock),
            _ => None,
        }
    }
}

impl FromStr for EditorCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditorCommand::ALL
            .into_iter()
            .find(|cmd| cmd.id() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyChord {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    pub key: String,
}

impl KeyChord {
    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

impl FromStr for KeyChord {
    type Err = String;

    /// Parses `"ctrl+b"`, `"cmd+shift+x"` and the like. The last segment is the key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chord = KeyChord::default();
        let mut parts: Vec<&str> = s.split('+').collect();
        // "ctrl++" names the plus key
        if s.ends_with("++") {
            parts.truncate(parts.len() - 2);
            parts.push("+");
        }
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(format!("empty key chord: {s:?}"));
        };
        if key.is_empty() {
            return Err(format!("key chord {s:?} has no key"));
        }
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "cmd" | "meta" | "super" | "mod" => chord.meta = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                other => return Err(format!("unknown modifier {other:?} in {s:?}")),
            }
        }
        chord.key = key.to_lowercase();
        Ok(chord)
    }
}
