use crate::all::*;

// Failure categories that callers may want to tell apart. Everything else is
// reported through plain `anyhow` context chains.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
  #[error("Invalid configuration: {0}")]
  Configuration(String),
  #[error("Missing resource {}.", .0.display())]
  MissingResource(PathBuf),
  #[error("Sample index {index} is out of range for a dataset of length {len}.")]
  IndexOutOfRange { index: usize, len: usize },
  #[error("Video index {index} is out of range for {len} videos.")]
  VideoOutOfRange { index: usize, len: usize },
}

pub fn configuration_error(message: impl Into<String>) -> anyhow::Error {
  DatasetError::Configuration(message.into()).into()
}

pub fn is_configuration_error(err: &anyhow::Error) -> bool {
  matches!(err.downcast_ref::<DatasetError>(), Some(DatasetError::Configuration(_)))
}
