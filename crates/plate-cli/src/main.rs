use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use plate_lite_core::{
    CommandReport, Document, Editor, EditorCommand, EditorConfig, FileStore, KeyChord, LoadSource,
    PersistStatus, Point, Selection, ValidationMode, to_json_pretty,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Plate lite - a tiny rich-text document editor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding the stored documents
    #[arg(long, env = "PLATE_LITE_STORE", default_value = ".plate-lite")]
    store: PathBuf,

    /// Key the document is stored under
    #[arg(long, default_value = plate_lite_core::DEFAULT_STORAGE_KEY)]
    key: String,

    /// Reject block types other than `paragraph` and `code`
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored document
    Show {
        /// Print the stored JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Report which formatting is active for a selection
    Select(SelectionArgs),
    /// Toggle bold on the selected text
    Bold(SelectionArgs),
    /// Toggle code block on the selected blocks
    CodeBlock(SelectionArgs),
    /// Dispatch a key chord such as `ctrl+b`
    Key {
        chord: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Replace the stored document with an empty paragraph
    Reset,
}

#[derive(Args)]
struct SelectionArgs {
    /// Selection anchor, written `block.leaf:offset`
    #[arg(long, value_parser = parse_point, default_value = "0.0:0")]
    anchor: Point,

    /// Selection focus; defaults to the anchor
    #[arg(long, value_parser = parse_point)]
    focus: Option<Point>,
}

impl SelectionArgs {
    fn selection(&self) -> Selection {
        let focus = self.focus.clone().unwrap_or_else(|| self.anchor.clone());
        Selection::new(self.anchor.clone(), focus)
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = EditorConfig::default()
        .storage_key(cli.key.clone())
        .validation(if cli.strict {
            ValidationMode::Strict
        } else {
            ValidationMode::Lenient
        });
    let mut editor = Editor::load(FileStore::new(&cli.store), config);
    if editor.load_source() == LoadSource::Fallback {
        eprintln!(
            "warning: stored document under `{}` was unreadable, starting from an empty one",
            cli.key
        );
    }

    match cli.command {
        Commands::Show { json } => show(editor.doc(), json)?,
        Commands::Select(args) => {
            editor
                .set_selection(args.selection())
                .context("invalid selection")?;
            println!("bold: {}", yes_no(editor.is_bold_mark_active()));
            println!("code block: {}", yes_no(editor.is_code_block_active()));
        }
        Commands::Bold(args) => {
            let report = run(&mut editor, &args, EditorCommand::ToggleBold)?;
            finish(&editor, report)?;
        }
        Commands::CodeBlock(args) => {
            let report = run(&mut editor, &args, EditorCommand::ToggleCodeBlock)?;
            finish(&editor, report)?;
        }
        Commands::Key { chord, selection } => {
            let chord: KeyChord = chord
                .parse()
                .map_err(anyhow::Error::msg)
                .context("invalid key chord")?;
            editor
                .set_selection(selection.selection())
                .context("invalid selection")?;
            match editor.handle_key(&chord) {
                Some(report) => finish(&editor, report)?,
                None => println!("no command bound to `{}`", describe(&chord)),
            }
        }
        Commands::Reset => {
            let mut editor = Editor::new(
                Document::default(),
                Selection::start(),
                editor.config().clone(),
                FileStore::new(&cli.store),
            )?;
            editor
                .save()
                .with_context(|| format!("failed to write {}", cli.store.display()))?;
            println!("document reset");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(editor: &mut Editor, args: &SelectionArgs, command: EditorCommand) -> Result<CommandReport> {
    editor
        .set_selection(args.selection())
        .context("invalid selection")?;
    Ok(editor.run(command))
}

fn finish(editor: &Editor, report: CommandReport) -> Result<()> {
    tracing::debug!(command = %report.command, ops = report.tx.ops.len(), "command finished");
    match report.persist {
        PersistStatus::Written => {}
        PersistStatus::Skipped if report.is_noop() => {
            println!("{}: nothing to change", report.command.label());
        }
        PersistStatus::Skipped => {}
        PersistStatus::Failed(err) => {
            return Err(err).context("document changed but could not be saved");
        }
    }
    show(editor.doc(), false)
}

fn show(doc: &Document, json: bool) -> Result<()> {
    if json {
        println!("{}", to_json_pretty(doc).context("failed to encode document")?);
        return Ok(());
    }
    for (ix, block) in doc.children.iter().enumerate() {
        let text: String = block
            .children
            .iter()
            .map(|leaf| {
                if leaf.marks.bold {
                    format!("**{}**", leaf.text)
                } else {
                    leaf.text.clone()
                }
            })
            .collect();
        println!("{ix:>3} [{}] {text}", block.kind);
    }
    Ok(())
}

fn describe(chord: &KeyChord) -> String {
    let mut parts = Vec::new();
    if chord.ctrl {
        parts.push("ctrl");
    }
    if chord.meta {
        parts.push("meta");
    }
    if chord.alt {
        parts.push("alt");
    }
    if chord.shift {
        parts.push("shift");
    }
    parts.push(&chord.key);
    parts.join("+")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Parses `block.leaf:offset`, e.g. `0.1:3`.
fn parse_point(s: &str) -> Result<Point> {
    let Some((path, offset)) = s.split_once(':') else {
        bail!("expected `block.leaf:offset`, got {s:?}");
    };
    let path = path
        .split('.')
        .map(|ix| ix.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid path in {s:?}"))?;
    if path.len() != 2 {
        bail!("a point needs a block and a leaf index, got {s:?}");
    }
    let offset = offset
        .trim()
        .parse()
        .with_context(|| format!("invalid offset in {s:?}"))?;
    Ok(Point::new(path, offset))
}
