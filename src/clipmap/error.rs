use std::fmt;

/// A convenient result type wrapping [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while constructing a clipmap or loading its inputs.
///
/// The per-frame update path is deliberately infallible; transient conditions
/// (tiles not yet resident, stale invalidations) are skipped or dropped, never
/// surfaced here.
#[derive(Debug)]
pub enum Error {
    Config(String),
    Io(std::io::Error),
    Parse(serde_json::Error),
    Image(image::ImageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "invalid clipmap configuration: {msg}"),
            Error::Io(err) => write!(f, "failed to read clipmap input: {err}"),
            Error::Parse(err) => write!(f, "failed to parse clipmap config: {err}"),
            Error::Image(err) => write!(f, "failed to load source image: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Image(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Parse(value)
    }
}

impl From<image::ImageError> for Error {
    fn from(value: image::ImageError) -> Self {
        Error::Image(value)
    }
}
