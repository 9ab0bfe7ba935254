// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::path::{Component, PathBuf};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory holding label files and the annotation document.
    pub data_dir: PathBuf,
    /// Directory uploaded annotation images are written to.
    pub upload_dir: PathBuf,
    /// Directory served under `/static`. Upload URLs resolve against it.
    pub static_dir: PathBuf,
    /// Maximum request body size in MB.
    pub max_upload_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let static_dir: PathBuf = std::env::var("STATIC_DIR")
            .unwrap_or_else(|_| "./static".into())
            .into();
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5001".into())
                .parse()
                .unwrap_or(5001),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| static_dir.join("data")),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| static_dir.join("uploads").join("annotations")),
            max_upload_size_mb: std::env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| "50".into())
                .parse()
                .unwrap_or(50),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            static_dir,
        }
    }

    /// Public URL prefix of uploaded images: `upload_dir` relative to
    /// `static_dir`, mounted under `/static`. `None` when the upload
    /// directory is not inside the static directory.
    pub fn upload_url_prefix(&self) -> Option<String> {
        let relative = self.upload_dir.strip_prefix(&self.static_dir).ok()?;
        let mut prefix = String::from("/static");
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    prefix.push('/');
                    prefix.push_str(part.to_str()?);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(prefix)
    }

    /// Configuration rooted at `root`, with defaults for everything else.
    #[cfg(test)]
    pub fn rooted_at(root: &std::path::Path) -> Self {
        let static_dir = root.join("static");
        Self {
            port: 0,
            data_dir: static_dir.join("data"),
            upload_dir: static_dir.join("uploads").join("annotations"),
            static_dir,
            max_upload_size_mb: 1,
            request_timeout_secs: 5,
            cors_origins: vec!["*".into()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
