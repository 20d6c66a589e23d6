//! Error type shared by the client, fetcher and CLI.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Credentials missing or rejected by the token endpoint
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Catalog answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No audio features for track \"{name}\" ({track_id})")]
    MissingAudioFeatures { track_id: String, name: String },

    #[error("Not a Spotify artist URI, URL or id: {0}")]
    InvalidArtist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let url = response.get_url().to_string();
                let body = response.into_string().unwrap_or_default();
                Error::Http { url, status, body }
            }
            ureq::Error::Transport(transport) => Error::Transport(transport.to_string()),
        }
    }
}
