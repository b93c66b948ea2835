//! Mix request as received from the calling layer.

use serde::{Deserialize, Deserializer, Serialize};

/// Requested mixing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MixMode {
    /// Tempo/key-aware two-track crossfade.
    Smart,
    /// Anything else: remote or naive multiplex.
    #[default]
    Simple,
}

impl MixMode {
    /// Parses a mode string. Only "smart" (any case) selects the smart path.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("smart") {
            MixMode::Smart
        } else {
            MixMode::Simple
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MixMode::Smart => "smart",
            MixMode::Simple => "simple",
        }
    }
}

impl<'de> Deserialize<'de> for MixMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(MixMode::parse).unwrap_or_default())
    }
}

/// `{files: [name, ...], mode: "smart" | ""}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixRequest {
    /// Track names relative to the uploads directory.
    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub mode: MixMode,
}

impl MixRequest {
    pub fn new(files: Vec<String>, mode: MixMode) -> Self {
        Self { files, mode }
    }
}
