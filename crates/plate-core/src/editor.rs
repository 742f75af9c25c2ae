use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::commands::{self, EditorCommand, KeyChord};
use crate::core::{Document, EditorConfig, Selection};
use crate::error::{EditorError, StorageError};
use crate::ops::{Op, Transaction};
use crate::storage::{KeyValueStore, LoadSource, MemoryStore, Persistence};
use crate::transforms::TransformOutcome;

#[derive(Debug)]
pub enum PersistStatus {
    Skipped,
    Written,
    /// The write failed. The in-memory document is still the source of truth.
    Failed(StorageError),
}

impl PersistStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistStatus::Failed(_))
    }
}

#[derive(Debug)]
pub struct CommandReport {
    pub command: EditorCommand,
    pub tx: Transaction,
    pub persist: PersistStatus,
}

impl CommandReport {
    pub fn is_noop(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Sole owner and writer of the current document.
pub struct Editor {
    doc: Document,
    selection: Selection,
    config: EditorConfig,
    persistence: Persistence,
    store: Box<dyn KeyValueStore>,
    load_source: LoadSource,
}

impl Editor {
    pub fn new(
        doc: Document,
        selection: Selection,
        config: EditorConfig,
        store: impl KeyValueStore + 'static,
    ) -> Result<Self, EditorError> {
        let config = config.with_defaults();
        doc.validate(config.validation)?;
        selection.check(&doc)?;
        let persistence = Persistence::new(config.storage_key.clone(), config.validation);
        Ok(Self {
            doc,
            selection,
            config,
            persistence,
            store: Box::new(store),
            load_source: LoadSource::Provided,
        })
    }

    /// Opens a session on whatever `store` holds, falling back to the default document.
    pub fn load(store: impl KeyValueStore + 'static, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        let persistence = Persistence::new(config.storage_key.clone(), config.validation);
        let loaded = persistence.load(&store);
        Self {
            doc: loaded.doc,
            selection: Selection::start(),
            config,
            persistence,
            store: Box::new(store),
            load_source: loaded.source,
        }
    }

    pub fn in_memory() -> Self {
        Self::load(MemoryStore::new(), EditorConfig::default())
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Moves the selection. Selection changes are never persisted.
    pub fn set_selection(&mut self, selection: Selection) -> Result<Transaction, EditorError> {
        selection.check(&self.doc)?;
        if selection == self.selection {
            return Ok(Transaction::default());
        }
        let previous = std::mem::replace(&mut self.selection, selection.clone());
        Ok(Transaction::new(vec![Op::SetSelection {
            selection,
            previous,
        }])
        .source("set_selection"))
    }

    pub fn is_bold_mark_active(&self) -> bool {
        commands::is_bold_mark_active(&self.doc, &self.selection)
    }

    pub fn is_code_block_active(&self) -> bool {
        commands::is_code_block_active(&self.doc, &self.selection)
    }

    pub fn run(&mut self, command: EditorCommand) -> CommandReport {
        let outcome = command.run(&self.doc, &self.selection);
        tracing::debug!(
            %command,
            noop = outcome.is_noop(),
            ops = outcome.tx.ops.len(),
            "ran command"
        );
        self.commit(command, outcome)
    }

    pub fn run_command(&mut self, id: &str) -> Result<CommandReport, EditorError> {
        let command = id
            .parse::<EditorCommand>()
            .map_err(EditorError::UnknownCommand)?;
        Ok(self.run(command))
    }

    pub fn handle_key(&mut self, chord: &KeyChord) -> Option<CommandReport> {
        let command = EditorCommand::for_chord(chord)?;
        Some(self.run(command))
    }

    pub fn save(&mut self) -> Result<(), StorageError> {
        self.persistence.save(self.store.as_mut(), &self.doc)
    }

    fn commit(&mut self, command: EditorCommand, outcome: TransformOutcome) -> CommandReport {
        let (doc, selection, tx) = outcome.into_parts();
        if tx.is_empty() {
            return CommandReport {
                command,
                tx,
                persist: PersistStatus::Skipped,
            };
        }

        self.doc = doc;
        self.selection = selection;

        let persist = if tx.is_ast_change() {
            match self.save() {
                Ok(()) => PersistStatus::Written,
                Err(err) => {
                    tracing::warn!(
                        key = %self.persistence.key(),
                        %err,
                        "failed to persist document, keeping in-memory state"
                    );
                    PersistStatus::Failed(err)
                }
            }
        } else {
            PersistStatus::Skipped
        };

        CommandReport {
            command,
            tx,
            persist,
        }
    }
}

/// Commands from all threads run one at a time through a single lock.
#[derive(Clone)]
pub struct SharedEditor {
    inner: Arc<Mutex<Editor>>,
}

impl SharedEditor {
    pub fn new(editor: Editor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(editor)),
        }
    }

    pub fn run(&self, command: EditorCommand) -> CommandReport {
        self.lock().run(command)
    }

    pub fn set_selection(&self, selection: Selection) -> Result<Transaction, EditorError> {
        self.lock().set_selection(selection)
    }

    pub fn snapshot(&self) -> (Document, Selection) {
        let editor = self.lock();
        (editor.doc.clone(), editor.selection.clone())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Editor) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Editor> {
        // Commands never leave the editor half-updated, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
