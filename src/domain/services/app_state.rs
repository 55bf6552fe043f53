#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::BubbleList;
use super::Scroll;
use crate::domain::models::file_name_from_path;
use crate::domain::models::is_pdf_path;
use crate::domain::models::Action;
use crate::domain::models::Author;
use crate::domain::models::ConversationError;
use crate::domain::models::FileSource;
use crate::domain::models::Generation;
use crate::domain::models::GenerationCounter;
use crate::domain::models::Manifest;
use crate::domain::models::ManifestError;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::ProcessingError;
use crate::domain::models::SessionBox;
use crate::domain::models::SlashCommand;

pub const PROCESSING_ERROR: &str =
    "There was an error processing your documents. Please ensure they are valid PDFs and try again.";
pub const SEND_ERROR: &str =
    "An error occurred while communicating with the AI. Please try again.";
pub const NO_SESSION_ERROR: &str = "Please upload and process documents to start a chat session.";
pub const EMPTY_HINT: &str =
    "Use /open PATH... or /set NAME to load documents, then ask anything about them. Type /help for every command.";

pub fn greeting(file_names: &[String]) -> String {
    return format!(
        "I've finished reading **{}**. What would you like to know?",
        file_names.join(", ")
    );
}

/// Everything the UI renders. Only the UI loop mutates it; results coming
/// back from the actions worker carry the generation they were started under
/// and are dropped once a newer selection has replaced it.
pub struct AppState<'a> {
    pub bubble_list: BubbleList<'a>,
    pub document_sets: Manifest,
    pub error: Option<String>,
    pub files: Vec<String>,
    pub generation: GenerationCounter,
    pub is_loading: bool,
    pub is_manifest_loading: bool,
    pub is_parsing: bool,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub messages: Vec<Message>,
    pub pending_set: Option<String>,
    pub scroll: Scroll,
    pub session: Option<SessionBox>,
}

impl<'a> AppState<'a> {
    pub fn new(generation: GenerationCounter) -> AppState<'a> {
        return AppState {
            bubble_list: BubbleList::new(),
            document_sets: Manifest::default(),
            error: None,
            files: vec![],
            generation,
            is_loading: false,
            is_manifest_loading: true,
            is_parsing: false,
            last_known_height: 0,
            last_known_width: 0,
            messages: vec![],
            pending_set: None,
            scroll: Scroll::default(),
            session: None,
        };
    }

    pub fn is_chat_ready(&self) -> bool {
        return self.session.is_some() && !self.is_parsing;
    }

    /// Shown in place of the transcript until there is something to read.
    pub fn empty_hint(&self) -> Option<&'static str> {
        if !self.messages.is_empty() || self.is_parsing {
            return None;
        }

        return Some(EMPTY_HINT);
    }

    pub fn handle_slash_commands(
        &mut self,
        input_str: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let mut should_break = false;
        let mut should_continue = false;

        if let Some(command) = SlashCommand::parse(input_str) {
            if command.is_quit() {
                should_break = true;
            } else if command.is_open() {
                self.select_files(command.args, tx)?;
                should_continue = true;
            } else if command.is_set() {
                match command.args.first() {
                    Some(id) => self.select_set(id, tx)?,
                    None => self.add_message(Message::new_with_type(
                        Author::Docchat,
                        MessageType::Error,
                        "You must specify a set with `/set` or `/s`. Run `/sets` to see what is available.",
                    )),
                }
                should_continue = true;
            } else if command.is_set_list() {
                self.add_message(Message::new(Author::Docchat, &self.set_list_text()));
                should_continue = true;
            } else if command.is_clear() {
                self.clear_files();
                should_continue = true;
            } else if command.is_help() {
                self.add_message(Message::new(Author::Docchat, &help_text()));
                should_continue = true;
            }
        }

        return Ok((should_break, should_continue));
    }

    fn set_list_text(&self) -> String {
        if self.is_manifest_loading {
            return "Document sets are still loading.".to_string();
        }
        if self.document_sets.is_empty() {
            return "No document sets are available.".to_string();
        }

        return self
            .document_sets
            .sets()
            .iter()
            .enumerate()
            .map(|(idx, set)| {
                let n = idx + 1;
                return format!(
                    "- ({n}) {name} [{id}], {count} file(s)",
                    name = set.display_name(),
                    id = set.id,
                    count = set.files.len()
                );
            })
            .collect::<Vec<String>>()
            .join("\n");
    }

    /// Local upload. Anything that is not a PDF by extension is left out.
    pub fn select_files(
        &mut self,
        paths: Vec<String>,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        let pdfs = paths
            .into_iter()
            .filter(|path| return is_pdf_path(path))
            .collect::<Vec<String>>();

        if pdfs.is_empty() {
            self.error = Some("Please select one or more PDF files.".to_string());
            return Ok(());
        }

        return self.begin_processing(FileSource::Local(pdfs), tx);
    }

    pub fn select_set(&mut self, id_or_index: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        let set = match self.document_sets.find(id_or_index) {
            Some(set) => set.clone(),
            None => {
                self.error = Some(format!("Document set \"{id_or_index}\" not found."));
                return Ok(());
            }
        };

        if set.files.is_empty() {
            self.error = Some(format!(
                "No files are listed for the \"{}\" set in metadata.json.",
                set.id
            ));
            return Ok(());
        }

        return self.begin_processing(FileSource::Set(set), tx);
    }

    /// Starts a new selection. Whatever was live before is superseded, its
    /// in-flight work is ignored when it reports back.
    pub fn begin_processing(
        &mut self,
        source: FileSource,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        let generation = self.generation.advance();

        self.files = match &source {
            FileSource::Local(paths) => paths.iter().map(|e| return file_name_from_path(e)).collect(),
            FileSource::Set(set) => set.files.iter().map(|e| return file_name_from_path(e)).collect(),
        };
        self.is_parsing = true;
        self.is_loading = false;
        self.error = None;
        self.session = None;
        self.replace_messages(vec![]);

        tracing::debug!(generation, files = self.files.len(), "processing files");
        tx.send(Action::ProcessFiles(generation, source))?;

        return Ok(());
    }

    pub fn clear_files(&mut self) {
        self.generation.advance();
        self.files = vec![];
        self.is_parsing = false;
        self.is_loading = false;
        self.session = None;
        self.replace_messages(vec![]);
    }

    /// Returns false when the message was not sent.
    pub fn send_message(&mut self, text: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<bool> {
        let session = match &self.session {
            Some(session) => session.clone(),
            None => {
                self.error = Some(NO_SESSION_ERROR.to_string());
                return Ok(false);
            }
        };

        if self.is_loading || self.is_parsing {
            tracing::debug!("ignoring message while a reply is in flight");
            return Ok(false);
        }

        self.is_loading = true;
        self.error = None;
        self.messages.push(Message::new(Author::User, text));
        self.add_message(Message::new(Author::Model, ""));

        tx.send(Action::SendMessage(
            self.generation.current(),
            session,
            text.to_string(),
        ))?;

        return Ok(true);
    }

    pub fn handle_manifest_loaded(&mut self, res: Result<Manifest, ManifestError>) {
        self.is_manifest_loading = false;

        match res {
            Ok(manifest) => {
                tracing::info!(sets = manifest.len(), "loaded document sets");
                self.document_sets = manifest;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load document sets");
                if let Some(id) = self.pending_set.take() {
                    tracing::warn!(set = %id, "skipping the requested set");
                }
                self.document_sets = Manifest::default();
                self.error = Some(format!("Could not load document sets: {err}"));
            }
        }
    }

    /// Selects the set requested at startup once the manifest is in.
    pub fn select_pending_set(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if self.is_manifest_loading {
            return Ok(());
        }

        if let Some(id) = self.pending_set.take() {
            self.select_set(&id, tx)?;
        }

        return Ok(());
    }

    pub fn handle_files_selected(&mut self, generation: Generation, file_names: Vec<String>) {
        if !self.generation.is_current(generation) {
            return;
        }

        self.files = file_names;
    }

    pub fn handle_session_ready(
        &mut self,
        generation: Generation,
        file_names: Vec<String>,
        session: SessionBox,
    ) {
        if !self.generation.is_current(generation) {
            tracing::debug!(generation, "dropping session for a superseded selection");
            return;
        }

        self.is_parsing = false;
        self.session = Some(session);
        self.replace_messages(vec![Message::new(Author::Model, &greeting(&file_names))]);
        self.files = file_names;
    }

    pub fn handle_processing_failed(&mut self, generation: Generation, err: ProcessingError) {
        if !self.generation.is_current(generation) {
            return;
        }

        tracing::error!(error = %err, "failed to process documents");

        self.is_parsing = false;
        self.files = vec![];
        self.session = None;

        match err {
            ProcessingError::Fetch(fetch_err) => {
                self.error = Some(fetch_err.to_string());
            }
            ProcessingError::Conversation(ConversationError::Configuration(config_err)) => {
                let text = config_err.to_string();
                self.add_message(Message::new_with_type(
                    Author::Model,
                    MessageType::Error,
                    &text,
                ));
                self.error = Some(text);
            }
            ProcessingError::Conversation(_) => {
                self.add_message(Message::new_with_type(
                    Author::Model,
                    MessageType::Error,
                    SEND_ERROR,
                ));
                self.error = Some(SEND_ERROR.to_string());
            }
            ProcessingError::Read { .. } | ProcessingError::Extraction { .. } => {
                self.error = Some(PROCESSING_ERROR.to_string());
            }
        }
    }

    pub fn handle_reply_fragment(&mut self, generation: Generation, text: &str) {
        if !self.generation.is_current(generation) || !self.is_loading {
            return;
        }

        if let Some(last_message) = self.messages.last_mut() {
            if last_message.author == Author::Model {
                last_message.append(text);
            }
        }

        self.sync_dependants();
    }

    pub fn handle_reply_done(&mut self, generation: Generation) {
        if !self.generation.is_current(generation) {
            return;
        }

        self.is_loading = false;
        self.sync_dependants();
    }

    pub fn handle_reply_failed(&mut self, generation: Generation, err: ConversationError) {
        if !self.generation.is_current(generation) {
            return;
        }

        tracing::error!(error = %err, "reply failed");

        self.is_loading = false;
        self.error = Some(SEND_ERROR.to_string());

        let mut messages = self.messages.to_vec();
        if let Some(last_message) = messages.last() {
            if last_message.author == Author::Model && last_message.text.is_empty() {
                messages.pop();
            }
        }
        messages.push(Message::new_with_type(
            Author::Model,
            MessageType::Error,
            SEND_ERROR,
        ));
        self.replace_messages(messages);
        self.scroll.last();
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.sync_dependants();
        self.scroll.last();
    }

    fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.bubble_list.clear();
        self.scroll.reset();
        self.sync_dependants();
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.messages, self.last_known_width.into());

        let lines_len = u16::try_from(self.bubble_list.len()).unwrap_or(u16::MAX);
        self.scroll.set_state(lines_len, self.last_known_height);

        if self.is_loading {
            self.scroll.last();
        }
    }
}
