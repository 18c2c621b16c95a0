pub mod client;

use std::path::PathBuf;

pub use client::DataClient;

/// Where a series body is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Http(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` locations are fetched; anything else is a path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Http(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
