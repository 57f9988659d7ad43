//! Error types for ledger service communication.

use thiserror::Error;

/// Errors that can occur while talking to the remote ledger.
///
/// # Error Categories
///
/// - **Network errors**: [`RequestFailed`](LedgerError::RequestFailed),
///   [`MiddlewareError`](LedgerError::MiddlewareError)
/// - **Server errors**: [`ServerError`](LedgerError::ServerError)
/// - **Client errors**: [`UrlError`](LedgerError::UrlError)
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The HTTP request failed due to a network or connection error:
    /// connection refused, timeout, DNS failure, TLS handshake.
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// An error occurred in the retry middleware layer, usually meaning all
    /// retry attempts have been exhausted.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// The ledger returned a non-success HTTP status code. Contains the
    /// status and the response body for debugging.
    #[error("Ledger error {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Joining the base URL with a request path produced an invalid URL.
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}
