//! Input video references.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ModelError, ModelResult};

/// Where the long-form input video lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    /// Object in the binary store, keyed by the job owner plus this path.
    Stored { path: String },
    /// Externally hosted video (e.g. a YouTube watch URL).
    Url { url: String },
}

impl MediaSource {
    pub fn stored(path: impl Into<String>) -> Self {
        Self::Stored { path: path.into() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Check that the reference is well formed.
    ///
    /// Stored paths must be relative, non-empty and free of `..` segments.
    /// URLs must parse and use http or https.
    pub fn validate(&self) -> ModelResult<()> {
        match self {
            MediaSource::Stored { path } => {
                let trimmed = path.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::invalid_source("stored path is empty"));
                }
                if trimmed.starts_with('/') {
                    return Err(ModelError::invalid_source("stored path must be relative"));
                }
                if trimmed.split('/').any(|segment| segment == "..") {
                    return Err(ModelError::invalid_source("stored path must not contain '..'"));
                }
                Ok(())
            }
            MediaSource::Url { url } => {
                let parsed = Url::parse(url)
                    .map_err(|e| ModelError::invalid_source(format!("invalid url: {}", e)))?;
                match parsed.scheme() {
                    "http" | "https" => Ok(()),
                    other => Err(ModelError::invalid_source(format!(
                        "unsupported url scheme '{}'",
                        other
                    ))),
                }
            }
        }
    }

    /// Playable pointer handed out with every clip.
    ///
    /// Clip files are not extracted, so this always points at the original media.
    pub fn media_reference(&self, owner: &str) -> String {
        match self {
            MediaSource::Stored { path } => format!("stored:{}/{}", owner, path),
            MediaSource::Url { url } => url.clone(),
        }
    }

    /// Best-effort MIME type for uploads to the oracle.
    pub fn mime_type(&self) -> &'static str {
        let name = match self {
            MediaSource::Stored { path } => path.as_str(),
            MediaSource::Url { url } => url.as_str(),
        };
        let ext = name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
        match ext.as_str() {
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "avi" => "video/x-msvideo",
            _ => "video/mp4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_path_validation() {
        assert!(MediaSource::stored("uploads/talk.mp4").validate().is_ok());
        assert!(MediaSource::stored("").validate().is_err());
        assert!(MediaSource::stored("   ").validate().is_err());
        assert!(MediaSource::stored("/etc/passwd").validate().is_err());
        assert!(MediaSource::stored("uploads/../secrets.mp4").validate().is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(MediaSource::url("https://youtube.com/watch?v=abc").validate().is_ok());
        assert!(MediaSource::url("ftp://example.com/a.mp4").validate().is_err());
        assert!(MediaSource::url("not a url").validate().is_err());
    }

    #[test]
    fn test_media_reference() {
        let stored = MediaSource::stored("uploads/talk.mp4");
        assert_eq!(stored.media_reference("user-1"), "stored:user-1/uploads/talk.mp4");

        let url = MediaSource::url("https://example.com/v.mp4");
        assert_eq!(url.media_reference("user-1"), "https://example.com/v.mp4");
    }

    #[test]
    fn test_tagged_serialization() {
        let json = serde_json::to_value(MediaSource::stored("a/b.mov")).unwrap();
        assert_eq!(json["kind"], "stored");
        assert_eq!(json["path"], "a/b.mov");
        assert_eq!(MediaSource::stored("a/b.mov").mime_type(), "video/quicktime");
    }
}
