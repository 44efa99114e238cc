use thiserror::Error;

/// Fatal errors. These abort the whole request before any page iteration
/// starts; they are never folded into a partial result.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Malformed request: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Per-page failures. Recorded as that page's diagnostic; aggregation over
/// the remaining pages continues.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Container with type '{0}' wasn't found!")]
    ContainerNotFound(String),

    #[error("Searched element with type '{0}' wasn't found!")]
    ItemNotFound(String),

    #[error("No data found!")]
    NoData,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
