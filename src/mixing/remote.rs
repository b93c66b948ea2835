//! Remote mixing service client.
//!
//! Uploads every source track as a multipart `files` part and streams the
//! returned MP3 into the destination. Any failure is a REMOTE_SERVICE_ERROR;
//! the orchestrator falls back to a local overlay.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::StatusCode;

use crate::config::RemoteConfig;
use crate::error::{MixError, Result};
use crate::types::TrackRef;

use super::composer::discard_partial;

/// Maximum length of a response body echoed into an error message.
const BODY_EXCERPT: usize = 300;

/// Client for the remote mixing endpoint.
#[derive(Debug, Clone)]
pub struct RemoteMixer {
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl RemoteMixer {
    /// Returns None unless the configuration is usable.
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        if !config.is_usable() {
            return None;
        }
        Some(Self {
            endpoint: config.endpoint.clone()?.trim().to_string(),
            api_key: config.api_key.clone()?,
            timeout: Duration::from_secs(config.timeout_sec),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `tracks` to the service and writes the mix to `dest`.
    ///
    /// Only a 200 response with a non-empty body counts as success. On
    /// failure `dest` is removed.
    pub fn mix(&self, tracks: &[TrackRef], dest: &Path) -> Result<()> {
        let result = self.request(tracks, dest);
        if result.is_err() {
            discard_partial(dest);
        }
        result
    }

    fn request(&self, tracks: &[TrackRef], dest: &Path) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| MixError::remote_failed(format!("Failed to create HTTP client: {}", e)))?;

        let form = build_form(tracks)?;
        log::info!("sending {} tracks to {}", tracks.len(), self.endpoint);

        let mut response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| MixError::remote_failed(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(MixError::remote_failed(format!(
                "HTTP {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let mut file = fs::File::create(dest)
            .map_err(|e| MixError::io(format!("Failed to create {}", dest.display()), e))?;

        let mut written: u64 = 0;
        let mut buffer = [0u8; 65536];
        loop {
            let n = response
                .read(&mut buffer)
                .map_err(|e| MixError::remote_failed(format!("Failed to read response: {}", e)))?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])
                .map_err(|e| MixError::io(format!("Failed to write {}", dest.display()), e))?;
            written += n as u64;
        }

        if written == 0 {
            return Err(MixError::remote_failed("empty response body"));
        }
        log::info!("remote mix received ({} bytes)", written);
        Ok(())
    }
}

fn build_form(tracks: &[TrackRef]) -> Result<Form> {
    let mut form = Form::new()
        .text("mode", "mixing")
        .text("output_format", "mp3");

    for track in tracks {
        let bytes = fs::read(&track.path)
            .map_err(|e| MixError::io(format!("Failed to read {}", track.name), e))?;
        let part = Part::bytes(bytes)
            .file_name(track.name.clone())
            .mime_str("audio/mpeg")
            .map_err(|e| MixError::remote_failed(format!("Invalid upload part: {}", e)))?;
        form = form.part("files", part);
    }
    Ok(form)
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.len() <= BODY_EXCERPT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn usable() -> RemoteConfig {
        RemoteConfig {
            endpoint: Some(" http://127.0.0.1:9/mix ".to_string()),
            api_key: Some("key".to_string()),
            timeout_sec: 2,
        }
    }

    #[test]
    fn unusable_config_gives_no_client() {
        assert!(RemoteMixer::from_config(&RemoteConfig::default()).is_none());

        let mut config = usable();
        config.api_key = None;
        assert!(RemoteMixer::from_config(&config).is_none());
    }

    #[test]
    fn endpoint_is_trimmed() {
        let mixer = RemoteMixer::from_config(&usable()).unwrap();
        assert_eq!(mixer.endpoint(), "http://127.0.0.1:9/mix");
        assert_eq!(mixer.timeout, Duration::from_secs(2));
    }

    #[test]
    fn unreachable_endpoint_is_remote_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.mp3");
        std::fs::write(&src, b"ID3").unwrap();
        let track = TrackRef::from_path(&src).unwrap();
        let dest = dir.path().join("out.mp3");

        let mixer = RemoteMixer::from_config(&usable()).unwrap();
        let err = mixer.mix(&[track.clone(), track], &dest).unwrap_err();
        assert_eq!(err.code, ErrorCode::RemoteServiceError);
        assert!(!dest.exists());
    }

    #[test]
    fn excerpt_truncates() {
        assert_eq!(excerpt("  short "), "short");
        let long = "é".repeat(BODY_EXCERPT);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= BODY_EXCERPT + 3);
    }

    #[test]
    fn form_rejects_missing_file() {
        let track = TrackRef {
            path: "/nonexistent/djmix/a.mp3".into(),
            name: "a.mp3".to_string(),
        };
        let err = build_form(&[track]).unwrap_err();
        assert_eq!(err.code, ErrorCode::Io);
    }
}
