use tui_textarea::Input;

use super::ConversationError;
use super::Generation;
use super::Manifest;
use super::ManifestError;
use super::ProcessingError;
use super::SessionBox;

pub enum Event {
    ManifestLoaded(Result<Manifest, ManifestError>),
    FilesSelected(Generation, Vec<String>),
    SessionReady(Generation, Vec<String>, SessionBox),
    ProcessingFailed(Generation, ProcessingError),
    ReplyFragment(Generation, String),
    ReplyDone(Generation),
    ReplyFailed(Generation, ConversationError),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardEnter(),
    KeyboardShiftEnter(),
    KeyboardPaste(String),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}
