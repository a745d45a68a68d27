use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitterError {
    #[error("Please upload an image first.")]
    MissingInput,

    #[error("An image is already being processed")]
    AlreadySubmitting,

    #[error("Processing service responded with status {0}")]
    Status(StatusCode),

    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to read archive: {0}")]
    Decode(#[from] zip::result::ZipError),

    #[error("Archive contains no files")]
    EmptyArchive,

    #[error("Processing stopped before producing a result")]
    WorkerStopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse grouping used to decide what the user gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    Transport,
    Decode,
    Local,
}

impl SplitterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitterError::MissingInput | SplitterError::AlreadySubmitting => {
                ErrorKind::MissingInput
            }
            SplitterError::Status(_)
            | SplitterError::Transport(_)
            | SplitterError::WorkerStopped => ErrorKind::Transport,
            SplitterError::Decode(_) | SplitterError::EmptyArchive => ErrorKind::Decode,
            SplitterError::Io(_) | SplitterError::Image(_) | SplitterError::Config(_) => {
                ErrorKind::Local
            }
        }
    }

    /// Text shown in the window. Transport and decode failures share one
    /// generic line; the detailed error only goes to the log.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Transport | ErrorKind::Decode => {
                "Processing failed, please try again.".to_string()
            }
            ErrorKind::MissingInput | ErrorKind::Local => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitterError>;
