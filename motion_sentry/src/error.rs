use std::path::PathBuf;

/// Errors surfaced by configuration loading and the host-facing shims.
///
/// The per-frame path never fails: degenerate input degrades to a no-op tick.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid label font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("frame source failed: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, Error>;
