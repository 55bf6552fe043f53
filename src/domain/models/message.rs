#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub author: Author,
    pub text: String,
    mtype: MessageType,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            author: author.clone(),
            text: text.to_string().replace('\t', "  "),
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            author: author.clone(),
            text: text.to_string().replace('\t', "  "),
            mtype,
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn append(&mut self, text: &str) {
        self.text += &text.replace('\t', "  ");
    }

    /// Splits a line on `**` markers, flagging the segments that sit between
    /// a pair of markers as bold. An unmatched trailing marker stays bold to
    /// the end of the line, which is how partially streamed text reads best.
    pub fn bold_segments(line: &str) -> Vec<(bool, String)> {
        return line
            .split("**")
            .enumerate()
            .filter_map(|(idx, part)| {
                if part.is_empty() {
                    return None;
                }
                return Some((idx % 2 == 1, part.to_string()));
            })
            .collect();
    }
}
