/// Domain errors that the HTTP boundary maps onto specific status codes.
///
/// Services raise these inside `color_eyre` reports; everything else becomes
/// a generic failure at the boundary. No error is fatal to the process and
/// nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    PermissionDenied(&'static str),
    #[error("Netease cookie not found. Please sync your playlists first.")]
    MissingCredential,
    #[error("Netease API request failed: {0}")]
    Upstream(String),
    #[error("{0}")]
    Invalid(&'static str),
}
