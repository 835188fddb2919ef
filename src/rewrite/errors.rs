use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The link is not `<origin>/firefox/downloads/file/<id>/<filename>`.
    #[error("not an origin download url: {0}")]
    MalformedDownloadUrl(String),

    #[error("malformed package reference: {0}")]
    MalformedPackageRef(String),
}
