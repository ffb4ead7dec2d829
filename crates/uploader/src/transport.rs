//! Transport trait the upload flow talks through.
//!
//! The application implements this on top of its HTTP client. Keeping it a
//! trait leaves the state machine free of network code and testable with
//! scripted mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mediadrop_protocol::{ApiResponse, HttpMethod, MEDIA_UPLOAD_ENDPOINT, UploadCommand};
use tracing::trace;

use crate::error::UploadError;

/// Future returned by [`Transport`] calls.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send + 'a>>;

/// Failure of a single request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Issues requests against the media API.
///
/// `params` is the JSON object produced by [`UploadCommand::to_params`].
/// Implementations must not hold on to `params` beyond the call.
pub trait Transport: Send + Sync {
    fn get(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_>;

    fn post(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        (**self).get(endpoint, params)
    }

    fn post(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        (**self).post(endpoint, params)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        (**self).get(endpoint, params)
    }

    fn post(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        (**self).post(endpoint, params)
    }
}

/// Sends `command` to the media upload endpoint with the verb it requires.
pub(crate) async fn send_command<T: Transport + ?Sized>(
    transport: &T,
    command: &UploadCommand,
) -> Result<ApiResponse, UploadError> {
    let params = command.to_params()?;
    let method = command.method();
    trace!(command = command.name(), %method, "sending command");

    let resp = match method {
        HttpMethod::Get => transport.get(MEDIA_UPLOAD_ENDPOINT, &params).await?,
        HttpMethod::Post => transport.post(MEDIA_UPLOAD_ENDPOINT, &params).await?,
    };
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockTransport};
    use mediadrop_protocol::MediaId;
    use serde_json::json;

    #[tokio::test]
    async fn status_goes_out_as_get() {
        let mock = MockTransport::new();
        mock.push_ok(json!({"processing_info": {"state": "succeeded"}}));

        let id = MediaId::from("7");
        send_command(&mock, &UploadCommand::status(&id)).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            Call {
                method: HttpMethod::Get,
                endpoint: MEDIA_UPLOAD_ENDPOINT.into(),
                params: json!({"command": "STATUS", "media_id": "7"}),
            }
        );
    }

    #[tokio::test]
    async fn finalize_goes_out_as_post() {
        let mock = MockTransport::new();
        mock.push_ok(json!({}));

        let id = MediaId::from("7");
        send_command(&mock, &UploadCommand::finalize(&id)).await.unwrap();

        assert_eq!(mock.calls()[0].method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn transport_failure_becomes_upload_error() {
        let mock = MockTransport::new();
        mock.push_err(TransportError::Api {
            status: 400,
            body: "bad".into(),
        });

        let id = MediaId::from("7");
        let err = send_command(&mock, &UploadCommand::finalize(&id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::Transport(TransportError::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn arc_transport_delegates() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({"ok": true}));

        let id = MediaId::from("1");
        let resp = send_command(&mock, &UploadCommand::finalize(&id)).await.unwrap();
        assert_eq!(resp.body, json!({"ok": true}));
        assert_eq!(mock.call_count(), 1);
    }
}
