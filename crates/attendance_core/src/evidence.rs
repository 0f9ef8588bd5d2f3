//! Photographic evidence (odometer, bus ticket) and its transport encoding.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::warn;

use crate::error::{describe, ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttachmentSource {
    File(PathBuf),
    Bytes(Vec<u8>),
    DataUrl(String),
}

/// A user-selected file. Name and MIME type are kept for display only and are
/// never part of the encoded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: Option<String>,
    source: AttachmentSource,
}

impl Attachment {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: None,
            source: AttachmentSource::File(path.to_path_buf()),
        }
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            source: AttachmentSource::Bytes(bytes),
        }
    }

    /// Accepts `data:<mime>;base64,<payload>` as produced by browser file readers.
    pub fn from_data_url(filename: impl Into<String>, data_url: impl Into<String>) -> Self {
        let data_url = data_url.into();
        let mime_type = data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split([';', ',']).next())
            .filter(|mime| !mime.is_empty())
            .map(str::to_string);
        Self {
            filename: filename.into(),
            mime_type,
            source: AttachmentSource::DataUrl(data_url),
        }
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            AttachmentSource::File(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read attachment '{}'", path.display())),
            AttachmentSource::Bytes(bytes) => Ok(bytes.clone()),
            AttachmentSource::DataUrl(data_url) => decode_data_url(data_url),
        }
    }
}

fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (metadata, payload) = data_url
        .split_once(',')
        .ok_or_else(|| anyhow!("data url has no payload separator"))?;
    if !metadata.starts_with("data:") || !metadata.ends_with(";base64") {
        return Err(anyhow!("only base64 data urls are supported"));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| anyhow!("invalid base64 payload in data url: {e}"))
}

/// Encodes an attachment for the wire. No attachment encodes to `""`; whether
/// evidence is required is the validator's call, not this function's.
pub async fn encode(attachment: Option<&Attachment>) -> ClientResult<String> {
    let Some(attachment) = attachment else {
        return Ok(String::new());
    };
    let bytes = attachment.read_bytes().await.map_err(|err| {
        warn!(filename = %attachment.filename, "evidence read failed: {err:#}");
        ClientError::EncodingFailed(describe(&err))
    })?;
    Ok(STANDARD.encode(bytes))
}
