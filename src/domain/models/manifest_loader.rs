use std::sync::Arc;

use async_trait::async_trait;

use super::DocumentFetchError;
use super::DocumentSet;
use super::Manifest;
use super::ManifestError;
use super::UploadedFile;

#[async_trait]
pub trait ManifestLoader {
    /// Fetches the manifest once. There is no retry, a failure is final for
    /// this attempt.
    async fn load(&self) -> Result<Manifest, ManifestError>;

    /// Downloads every file of a set, in the set's order. Either every file
    /// resolves or the first failing path is reported and nothing is kept.
    async fn resolve(&self, set: &DocumentSet) -> Result<Vec<UploadedFile>, DocumentFetchError>;
}

pub type ManifestLoaderBox = Arc<dyn ManifestLoader + Send + Sync>;
