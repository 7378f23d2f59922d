use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read alert document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write alert document {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("alert document {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize alert document: {0}")]
    Serialize(#[source] serde_json::Error),
}
