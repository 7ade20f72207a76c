//! External asset-storage collaborator.
//!
//! Uploaded files are staged in a [`TempAsset`] first; the backing temp file
//! is removed when the value drops, whether the upload succeeded or not.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, asset: &TempAsset) -> anyhow::Result<UploadedAsset>;
}

/// A multipart upload staged on local disk.
pub struct TempAsset {
    file: NamedTempFile,
    file_name: String,
}

impl TempAsset {
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> anyhow::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            file_name: file_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Talks to the real asset provider over HTTP.
pub struct HttpAssetStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpAssetStore {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, asset: &TempAsset) -> anyhow::Result<UploadedAsset> {
        let bytes = tokio::fs::read(asset.path()).await?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(asset.file_name().to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let body: UploadResponse = response.json().await?;
        Ok(UploadedAsset { url: body.url })
    }
}

/// Hands out deterministic URLs without any network. Used by tests and by
/// local development when no provider is configured.
#[derive(Default)]
pub struct StaticAssetStore {
    base_url: String,
}

impl StaticAssetStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AssetStore for StaticAssetStore {
    async fn upload(&self, asset: &TempAsset) -> anyhow::Result<UploadedAsset> {
        Ok(UploadedAsset {
            url: format!("{}/{}", self.base_url, asset.file_name()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_asset_is_removed_on_drop() {
        let asset = TempAsset::from_bytes("avatar.png", b"not-really-a-png").unwrap();
        let path = asset.path().to_path_buf();
        assert!(path.exists());
        drop(asset);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn static_store_derives_url_from_file_name() {
        let store = StaticAssetStore::new("https://cdn.test");
        let asset = TempAsset::from_bytes("avatar.png", b"bytes").unwrap();
        let uploaded = store.upload(&asset).await.unwrap();
        assert_eq!(uploaded.url, "https://cdn.test/avatar.png");
    }
}
