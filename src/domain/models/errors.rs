use thiserror::Error;

/// A document could not be turned into text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("not a well-formed PDF document: {0}")]
    Malformed(String),
    #[error("text on page {page} could not be decoded: {reason}")]
    UndecodablePage { page: u32, reason: String },
    #[error("extraction was interrupted: {0}")]
    Interrupted(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Failed to load document configuration: {0}")]
    Unreachable(String),
    #[error("Failed to load document configuration, the server returned {0}.")]
    Status(u16),
    #[error("Document configuration is malformed: {0}")]
    Malformed(String),
    #[error("Document configuration is missing from metadata.json.")]
    MissingDocumentSets,
}

/// A path listed in a document set could not be downloaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to load file: \"{path}\". {reason}")]
pub struct DocumentFetchError {
    pub path: String,
    pub reason: String,
}

impl DocumentFetchError {
    pub fn new(path: &str, reason: &str) -> DocumentFetchError {
        return DocumentFetchError {
            path: path.to_string(),
            reason: reason.to_string(),
        };
    }

    pub fn not_found(path: &str) -> DocumentFetchError {
        return DocumentFetchError::new(
            path,
            "It was not found (404). The path in metadata.json must exactly match a deployed file, including capitalization.",
        );
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No Gemini API token is configured. Set `gemini-token` in your config file or the DOCCHAT_GEMINI_TOKEN environment variable.")]
    MissingCredential,
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("A reply is already streaming for this session.")]
    Busy,
    #[error("Gemini is not reachable: {0}")]
    Transport(String),
    #[error("Gemini request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Gemini returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Everything that can abort turning a file selection into a session.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Fetch(#[from] DocumentFetchError),
    #[error("Failed to read \"{path}\": {reason}")]
    Read { path: String, reason: String },
    #[error("Failed to extract text from \"{file}\": {source}")]
    Extraction {
        file: String,
        #[source]
        source: ExtractionError,
    },
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}
