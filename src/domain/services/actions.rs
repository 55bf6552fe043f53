#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use futures::future::try_join_all;
use futures::StreamExt;
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task;

use crate::domain::models::Action;
use crate::domain::models::ConversationBox;
use crate::domain::models::Event;
use crate::domain::models::ExtractionError;
use crate::domain::models::ExtractorBox;
use crate::domain::models::FileSource;
use crate::domain::models::Generation;
use crate::domain::models::GenerationCounter;
use crate::domain::models::ManifestLoaderBox;
use crate::domain::models::ProcessingError;
use crate::domain::models::SessionBox;
use crate::domain::models::UploadedFile;
use crate::domain::models::DOCUMENT_DELIMITER;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /open (/o) PATH... - Reads one or more local PDF files and starts a new chat about them. Wrap paths containing spaces in double quotes.
- /sets (/ls) - Lists the predefined document sets from metadata.json.
- /set (/s) [SET_ID,SET_INDEX] - Loads a predefined document set. You can pass either the set id, or the index from /sets.
- /clear - Clears the active documents and the conversation.
- /quit /exit (/q) - Exit Docchat.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- Enter - Send your message.
- Shift+Enter - Start a new line, where the terminal reports it.
- CTRL+C - Exit.

Loading a new set of documents always starts a new conversation. Replies are based only on the text of the loaded documents.
        "#;

    return text.trim().to_string();
}

pub async fn read_local_files(paths: &[String]) -> Result<Vec<UploadedFile>, ProcessingError> {
    let reads = paths.iter().map(|path| {
        return async move {
            let res = fs::read(path).await;
            return res
                .map(|content| return UploadedFile::from_path(path, content))
                .map_err(|err| {
                    return ProcessingError::Read {
                        path: path.to_string(),
                        reason: err.to_string(),
                    };
                });
        };
    });

    return try_join_all(reads).await;
}

/// Extracts every file concurrently and joins the results in selection order.
/// The first failure fails the whole batch.
pub async fn extract_all(
    extractor: ExtractorBox,
    files: Vec<UploadedFile>,
) -> Result<String, ProcessingError> {
    let extractions = files.into_iter().map(|file| {
        let extractor = extractor.clone();
        return async move {
            let name = file.name.to_string();
            let res = task::spawn_blocking(move || return extractor.extract(&file.content)).await;

            match res {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(err)) => {
                    return Err(ProcessingError::Extraction {
                        file: name,
                        source: err,
                    })
                }
                Err(err) => {
                    return Err(ProcessingError::Extraction {
                        file: name,
                        source: ExtractionError::Interrupted(err.to_string()),
                    })
                }
            }
        };
    });

    let texts = try_join_all(extractions).await?;
    return Ok(texts.join(DOCUMENT_DELIMITER));
}

/// Runs file reads, extraction, and model calls off the UI loop. Every result
/// is reported back as an `Event` tagged with the generation it was started
/// under.
#[derive(Clone)]
pub struct ActionsService {
    extractor: ExtractorBox,
    conversation: ConversationBox,
    manifest: ManifestLoaderBox,
    generation: GenerationCounter,
}

impl ActionsService {
    pub fn new(
        extractor: ExtractorBox,
        conversation: ConversationBox,
        manifest: ManifestLoaderBox,
        generation: GenerationCounter,
    ) -> ActionsService {
        return ActionsService {
            extractor,
            conversation,
            manifest,
            generation,
        };
    }

    async fn load_files(&self, source: FileSource) -> Result<Vec<UploadedFile>, ProcessingError> {
        match source {
            FileSource::Local(paths) => return read_local_files(&paths).await,
            FileSource::Set(set) => {
                tracing::debug!(set = %set.id, files = set.files.len(), "downloading document set");
                return Ok(self.manifest.resolve(&set).await?);
            }
        }
    }

    async fn load_manifest(&self, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
        let res = self.manifest.load().await;
        tx.send(Event::ManifestLoaded(res))?;
        return Ok(());
    }

    fn is_superseded(&self, generation: Generation) -> bool {
        if self.generation.is_current(generation) {
            return false;
        }

        tracing::debug!(
            generation,
            current = self.generation.current(),
            "dropping work for a superseded selection"
        );
        return true;
    }

    pub async fn process_files(
        &self,
        generation: Generation,
        source: FileSource,
        tx: &mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let files = match self.load_files(source).await {
            Ok(files) => files,
            Err(err) => {
                tx.send(Event::ProcessingFailed(generation, err))?;
                return Ok(());
            }
        };
        if self.is_superseded(generation) {
            return Ok(());
        }

        let file_names = files
            .iter()
            .map(|file| return file.name.to_string())
            .collect::<Vec<String>>();
        tx.send(Event::FilesSelected(generation, file_names.clone()))?;

        let document_text = match extract_all(self.extractor.clone(), files).await {
            Ok(text) => text,
            Err(err) => {
                tx.send(Event::ProcessingFailed(generation, err))?;
                return Ok(());
            }
        };
        if self.is_superseded(generation) {
            return Ok(());
        }

        tracing::info!(
            generation,
            files = file_names.len(),
            chars = document_text.len(),
            "extracted documents"
        );

        let session = match self
            .conversation
            .open_session(&file_names, &document_text)
            .await
        {
            Ok(session) => session,
            Err(err) => {
                tx.send(Event::ProcessingFailed(generation, err.into()))?;
                return Ok(());
            }
        };
        if self.is_superseded(generation) {
            return Ok(());
        }

        tx.send(Event::SessionReady(generation, file_names, session))?;
        return Ok(());
    }

    pub async fn stream_reply(
        &self,
        generation: Generation,
        session: SessionBox,
        message: &str,
        tx: &mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let mut stream = match session.send(message).await {
            Ok(stream) => stream,
            Err(err) => {
                tx.send(Event::ReplyFailed(generation, err))?;
                return Ok(());
            }
        };

        while let Some(fragment) = stream.next().await {
            if self.is_superseded(generation) {
                return Ok(());
            }

            match fragment {
                Ok(text) => tx.send(Event::ReplyFragment(generation, text))?,
                Err(err) => {
                    tx.send(Event::ReplyFailed(generation, err))?;
                    return Ok(());
                }
            }
        }

        tx.send(Event::ReplyDone(generation))?;
        return Ok(());
    }

    pub async fn start(
        self,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        loop {
            let action = match rx.recv().await {
                Some(action) => action,
                None => return Ok(()),
            };

            let service = self.clone();
            let worker_tx = tx.clone();
            match action {
                Action::LoadManifest() => {
                    tokio::spawn(async move {
                        if let Err(err) = service.load_manifest(&worker_tx).await {
                            tracing::error!(error = ?err, "failed to report document sets");
                        }
                    });
                }
                Action::ProcessFiles(generation, source) => {
                    tokio::spawn(async move {
                        if let Err(err) = service.process_files(generation, source, &worker_tx).await {
                            tracing::error!(error = ?err, "failed to report processing result");
                        }
                    });
                }
                Action::SendMessage(generation, session, message) => {
                    tokio::spawn(async move {
                        if let Err(err) = service
                            .stream_reply(generation, session, &message, &worker_tx)
                            .await
                        {
                            tracing::error!(error = ?err, "failed to report reply");
                        }
                    });
                }
            }
        }
    }
}
