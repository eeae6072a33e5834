//! One-shot retry for idempotent collaborator lookups.

use tracing::warn;

/// Sends a read request, retrying once when the transport fails (connect
/// error or timeout). Mutating calls and notification dispatch must not go
/// through here: a retried mutation could apply a side effect twice on the
/// remote service.
pub(crate) async fn send_lookup(
    builder: reqwest::RequestBuilder,
) -> std::result::Result<reqwest::Response, reqwest::Error> {
    let retry = builder.try_clone();
    match builder.send().await {
        Ok(response) => Ok(response),
        Err(err) if err.is_timeout() || err.is_connect() => match retry {
            Some(builder) => {
                warn!(error = %err, "collaborator lookup failed, retrying once");
                builder.send().await
            }
            None => Err(err),
        },
        Err(err) => Err(err),
    }
}
