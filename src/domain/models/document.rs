#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_json::Value;

use super::ManifestError;

pub const DOCUMENT_DELIMITER: &str = "\n\n---\n\n";

/// Name used when a set path has no usable last segment.
const FALLBACK_FILE_NAME: &str = "document.pdf";

pub fn file_name_from_path(path: &str) -> String {
    let name = path.trim_end().rsplit(['/', '\\']).next().unwrap_or("");
    if name.is_empty() {
        return FALLBACK_FILE_NAME.to_string();
    }

    return name.to_string();
}

pub fn is_pdf_path(path: &str) -> bool {
    return file_name_from_path(path).to_lowercase().ends_with(".pdf");
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: &str, content: Vec<u8>) -> UploadedFile {
        return UploadedFile {
            name: name.to_string(),
            content,
        };
    }

    pub fn from_path(path: &str, content: Vec<u8>) -> UploadedFile {
        return UploadedFile::new(&file_name_from_path(path), content);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentSet {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl DocumentSet {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            return &self.id;
        }

        return &self.name;
    }
}

/// Predefined document sets, in the order the manifest declares them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    sets: Vec<DocumentSet>,
}

impl Manifest {
    pub fn new(sets: Vec<DocumentSet>) -> Manifest {
        return Manifest { sets };
    }

    pub fn parse(json: &str) -> Result<Manifest, ManifestError> {
        let doc: Value =
            serde_json::from_str(json).map_err(|err| return ManifestError::Malformed(err.to_string()))?;

        let entries = match doc.get("documentSets") {
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                return Err(ManifestError::Malformed(
                    "documentSets must be an object".to_string(),
                ))
            }
            None => return Err(ManifestError::MissingDocumentSets),
        };

        let mut sets = vec![];
        for (id, entry) in entries {
            let mut set: DocumentSet = serde_json::from_value(entry.clone()).map_err(|err| {
                return ManifestError::Malformed(format!("set \"{id}\": {err}"));
            })?;
            set.id = id.to_string();
            sets.push(set);
        }

        return Ok(Manifest { sets });
    }

    pub fn sets(&self) -> &[DocumentSet] {
        return &self.sets;
    }

    pub fn is_empty(&self) -> bool {
        return self.sets.is_empty();
    }

    pub fn len(&self) -> usize {
        return self.sets.len();
    }

    pub fn get(&self, id: &str) -> Option<&DocumentSet> {
        return self.sets.iter().find(|set| return set.id == id);
    }

    /// Looks a set up by id, falling back to its 1-based position in the list.
    pub fn find(&self, id_or_index: &str) -> Option<&DocumentSet> {
        if let Some(set) = self.get(id_or_index) {
            return Some(set);
        }

        if let Ok(idx) = id_or_index.parse::<usize>() {
            if idx >= 1 && idx <= self.sets.len() {
                return Some(&self.sets[idx - 1]);
            }
        }

        return None;
    }
}
