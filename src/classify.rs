//! Response and failure classification.
//!
//! Turns a raw transport response into an [`ApiResponse`]. Only `200`, `201`,
//! `202` and `204` count as success; everything else goes through the failure
//! classifier, which tries to read a `{ "message": ... }` envelope and falls
//! back to the raw body text.

use crate::error::BoxError;
use crate::serializer::{deserialize, Serializer};
use crate::transport::RawResponse;
use crate::{ApiResponse, ApiStatus, Error};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize};

/// Message used when the transport produced no response at all.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Received an Empty Http Response";

/// Decodes a successful body. `Ok(None)` means there is no data to attach.
pub type Decoder<T> = fn(&dyn Serializer, &Bytes) -> std::result::Result<Option<T>, BoxError>;

/// Ignores the body.
pub fn decode_nothing(_: &dyn Serializer, _: &Bytes) -> std::result::Result<Option<()>, BoxError> {
    Ok(None)
}

/// Deserializes the body with the configured serializer. Empty bodies yield no data.
pub fn decode_typed<T>(
    serializer: &dyn Serializer,
    body: &Bytes,
) -> std::result::Result<Option<T>, BoxError>
where
    T: DeserializeOwned,
{
    if body.is_empty() {
        return Ok(None);
    }
    deserialize(serializer, body).map(Some)
}

/// Copies the body verbatim, bypassing the serializer.
pub fn decode_stream(
    _: &dyn Serializer,
    body: &Bytes,
) -> std::result::Result<Option<Bytes>, BoxError> {
    Ok(Some(body.clone()))
}

#[derive(Debug, Deserialize)]
struct FailureEnvelope {
    #[serde(alias = "Message")]
    message: String,
}

/// Classifies a transport response.
pub fn classify<T>(
    raw: Option<&RawResponse>,
    serializer: &dyn Serializer,
    decoder: Decoder<T>,
) -> ApiResponse<T> {
    let Some(raw) = raw else {
        return ApiResponse::failure(
            ApiStatus::None,
            Some(EMPTY_RESPONSE_MESSAGE.to_string()),
            None,
        );
    };

    let status = ApiStatus::from_code(raw.status);
    if !status.is_success_code() {
        return classify_failure(status, Some(raw.body.as_ref()), serializer);
    }

    match decoder(serializer, &raw.body) {
        Ok(data) => ApiResponse::success(status, data),
        Err(e) => {
            let raw_response = String::from_utf8_lossy(&raw.body).into_owned();
            tracing::error!(
                error = %e,
                raw_response = %raw_response,
                "Failed to deserialize response"
            );

            let error = Error::DeserializationFailed {
                raw_response,
                serde_error: e.to_string(),
                status,
            };
            ApiResponse::failure(status, Some(error.to_string()), Some(error))
        }
    }
}

/// Classifies a response outside the success set.
///
/// Envelope parse errors are logged and swallowed.
pub fn classify_failure<T>(
    status: ApiStatus,
    body: Option<&[u8]>,
    serializer: &dyn Serializer,
) -> ApiResponse<T> {
    let message = match body.filter(|b| !b.is_empty()) {
        None => String::new(),
        Some(body) => match deserialize::<FailureEnvelope>(serializer, body) {
            Ok(envelope) => envelope.message,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    status = %status,
                    "Failure body is not a message envelope"
                );
                let text = String::from_utf8_lossy(body);
                if text.trim().is_empty() {
                    String::new()
                } else {
                    text.into_owned()
                }
            }
        },
    };

    if status.is_client_error() {
        tracing::error!(status = %status, message = %message, "Client error (4xx)");
    } else if status.is_server_error() {
        tracing::warn!(status = %status, message = %message, "Server error (5xx)");
    }

    ApiResponse::failure(status, Some(message), None)
}
