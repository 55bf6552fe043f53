use super::DocumentSet;
use super::Generation;
use super::SessionBox;

/// Where a file selection comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    Local(Vec<String>),
    Set(DocumentSet),
}

pub enum Action {
    LoadManifest(),
    ProcessFiles(Generation, FileSource),
    SendMessage(Generation, SessionBox, String),
}
