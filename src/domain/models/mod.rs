mod action;
mod author;
mod conversation;
mod document;
mod errors;
mod event;
mod extractor;
mod generation;
mod loading;
mod manifest_loader;
mod message;
mod slash_commands;
mod textarea;

pub use action::*;
pub use author::*;
pub use conversation::*;
pub use document::*;
pub use errors::*;
pub use event::*;
pub use extractor::*;
pub use generation::*;
pub use loading::*;
pub use manifest_loader::*;
pub use message::*;
pub use slash_commands::*;
pub use textarea::*;
