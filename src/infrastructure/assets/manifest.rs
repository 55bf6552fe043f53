#[cfg(test)]
#[path = "manifest_test.rs"]
mod tests;

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::StatusCode;
use reqwest::Url;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ConfigurationError;
use crate::domain::models::DocumentFetchError;
use crate::domain::models::DocumentSet;
use crate::domain::models::Manifest;
use crate::domain::models::ManifestError;
use crate::domain::models::ManifestLoader;
use crate::domain::models::UploadedFile;

pub const MANIFEST_FILE: &str = "metadata.json";

/// Where the manifest and the files it lists are served from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetRoot {
    Http(Url),
    Directory(PathBuf),
}

impl AssetRoot {
    pub fn parse(root: &str) -> Result<AssetRoot, ConfigurationError> {
        if root.starts_with("http://") || root.starts_with("https://") {
            let mut base = root.to_string();
            if !base.ends_with('/') {
                base.push('/');
            }

            let url = Url::parse(&base).map_err(|_| {
                return ConfigurationError::InvalidValue {
                    key: ConfigKey::AssetRoot.to_string(),
                    value: root.to_string(),
                };
            })?;

            return Ok(AssetRoot::Http(url));
        }

        return Ok(AssetRoot::Directory(PathBuf::from(root)));
    }

    /// Resolves a manifest path against the root. Paths are always relative to
    /// the root, and are percent-encoded for http roots.
    pub fn url(&self, path: &str) -> Result<Url, String> {
        match self {
            AssetRoot::Http(base) => {
                return base
                    .join(path.trim_start_matches('/'))
                    .map_err(|err| return err.to_string());
            }
            AssetRoot::Directory(_) => {
                return Err("asset root is a directory".to_string());
            }
        }
    }

    pub fn file_path(&self, path: &str) -> Option<PathBuf> {
        match self {
            AssetRoot::Http(_) => return None,
            AssetRoot::Directory(dir) => return Some(dir.join(path.trim_start_matches('/'))),
        }
    }
}

pub struct AssetManifest {
    root: AssetRoot,
    timeout: Duration,
    client: reqwest::Client,
}

impl AssetManifest {
    pub fn new(root: AssetRoot, timeout: Duration) -> AssetManifest {
        return AssetManifest {
            root,
            timeout,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config() -> Result<AssetManifest, ConfigurationError> {
        let root = AssetRoot::parse(&Config::get(ConfigKey::AssetRoot))?;
        let timeout_str = Config::get(ConfigKey::RequestTimeout);
        let timeout = timeout_str.parse::<u64>().map_err(|_| {
            return ConfigurationError::InvalidValue {
                key: ConfigKey::RequestTimeout.to_string(),
                value: timeout_str.to_string(),
            };
        })?;

        return Ok(AssetManifest::new(root, Duration::from_millis(timeout)));
    }

    async fn fetch(&self, path: &str) -> Result<UploadedFile, DocumentFetchError> {
        if let Some(file_path) = self.root.file_path(path) {
            let content = fs::read(&file_path).await.map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    return DocumentFetchError::not_found(path);
                }
                return DocumentFetchError::new(path, &err.to_string());
            })?;

            return Ok(UploadedFile::from_path(path, content));
        }

        let url = self
            .root
            .url(path)
            .map_err(|err| return DocumentFetchError::new(path, &err))?;

        let res = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                return DocumentFetchError::new(path, &format!("The request failed: {err}"));
            })?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            tracing::warn!(path = path, "document set file not found");
            return Err(DocumentFetchError::not_found(path));
        }
        if !status.is_success() {
            tracing::warn!(path = path, status = status.as_u16(), "document set file failed to download");
            return Err(DocumentFetchError::new(
                path,
                &format!("The server returned status {}.", status.as_u16()),
            ));
        }

        let content = res.bytes().await.map_err(|err| {
            return DocumentFetchError::new(path, &format!("The download was interrupted: {err}"));
        })?;

        return Ok(UploadedFile::from_path(path, content.to_vec()));
    }
}

#[async_trait]
impl ManifestLoader for AssetManifest {
    #[allow(clippy::implicit_return)]
    async fn load(&self) -> Result<Manifest, ManifestError> {
        let body = match &self.root {
            AssetRoot::Directory(dir) => fs::read_to_string(dir.join(MANIFEST_FILE))
                .await
                .map_err(|err| return ManifestError::Unreachable(err.to_string()))?,
            AssetRoot::Http(_) => {
                let url = self
                    .root
                    .url(MANIFEST_FILE)
                    .map_err(ManifestError::Unreachable)?;

                let res = self
                    .client
                    .get(url)
                    .timeout(self.timeout)
                    .send()
                    .await
                    .map_err(|err| return ManifestError::Unreachable(err.to_string()))?;

                if !res.status().is_success() {
                    return Err(ManifestError::Status(res.status().as_u16()));
                }

                res.text()
                    .await
                    .map_err(|err| return ManifestError::Unreachable(err.to_string()))?
            }
        };

        let manifest = Manifest::parse(&body)?;
        tracing::info!(sets = manifest.len(), "loaded document set manifest");

        return Ok(manifest);
    }

    #[allow(clippy::implicit_return)]
    async fn resolve(&self, set: &DocumentSet) -> Result<Vec<UploadedFile>, DocumentFetchError> {
        let files = try_join_all(set.files.iter().map(|path| return self.fetch(path))).await?;
        tracing::info!(set = %set.id, files = files.len(), "resolved document set");

        return Ok(files);
    }
}
