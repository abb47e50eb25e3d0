use thiserror::Error;

/// Errors while locating or reading a per-device layout file
///
/// None of these is fatal; the resolver falls back to the default bindings.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("No layout file for device: {0}")]
    NotFound(String),

    #[error("Malformed layout file: {0}")]
    Malformed(String),

    #[error("Failed to read layout file: {0}")]
    Io(#[from] std::io::Error),
}
