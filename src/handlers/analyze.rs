//! Analysis handlers: streaming and buffered relay of user text to the
//! chat-completion backend.

use crate::error::AppError;
use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Pull the `text` field out of the raw request body.
///
/// The body is parsed manually so a malformed body maps to the pre-stream
/// 500 path rather than an extractor-level rejection.
fn extract_text(body: &Bytes) -> Result<String, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid request body: {}", e)))?;

    match value.get("text").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(AppError::BadRequest(
            "Text is required and must be a non-empty string".to_string(),
        )),
    }
}

/// `POST /api/analyze` — streaming analysis.
///
/// Fragments are relayed to the client in arrival order, unbuffered, as raw
/// UTF-8 text. The 200 status and streaming headers are committed as soon as
/// the body passes validation, before the backend call is opened, so any
/// backend failure — on open or mid-stream — is appended to the open body as
/// an inline `[Fehler: …]` marker instead of an error status. Only a
/// malformed request body yields a 500 JSON error.
pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let text = extract_text(&body)?;

    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(32);

    tokio::spawn(async move {
        let mut upstream = match state.provider.stream(&state.system_prompt, &text).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Error in streaming analysis: {}", e);
                let marker = format!("\n\n[Fehler: {}]", e);
                let _ = tx.send(Ok(Bytes::from(marker))).await;
                return;
            }
        };

        while let Some(item) = upstream.next().await {
            match item {
                Ok(fragment) => {
                    // A dropped receiver means the client disconnected; stop
                    // relaying and let the upstream call drop with the task.
                    if tx.send(Ok(Bytes::from(fragment))).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!("Error in streaming analysis: {}", e);
                    let marker = format!("\n\n[Fehler: {}]", e);
                    let _ = tx.send(Ok(Bytes::from(marker))).await;
                    return;
                }
            }
        }
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response())
}

/// `POST /api/analyze/complete` — buffered analysis.
pub async fn analyze_complete(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let text = extract_text(&body)?;

    let outcome = state.provider.complete(&state.system_prompt, &text).await?;

    let result = outcome
        .text
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| "No response generated".to_string());

    Ok(Json(json!({
        "result": result,
        "model": outcome.model,
        "usage": outcome.usage,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_accepts_plain_text_field() {
        let body = Bytes::from(r#"{"text":"some claim"}"#);
        assert_eq!(extract_text(&body).unwrap(), "some claim");
    }

    #[test]
    fn extract_text_rejects_missing_empty_and_non_string() {
        for body in [
            r#"{}"#,
            r#"{"text":""}"#,
            r#"{"text":"   "}"#,
            r#"{"text":42}"#,
            r#"{"text":null}"#,
        ] {
            let err = extract_text(&Bytes::from(body)).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "body: {}", body);
        }
    }

    #[test]
    fn extract_text_maps_malformed_body_to_internal_error() {
        let err = extract_text(&Bytes::from("not json")).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn extract_text_preserves_surrounding_whitespace() {
        // Trimming is only for validation; the model sees the original text.
        let body = Bytes::from(r#"{"text":" claim "}"#);
        assert_eq!(extract_text(&body).unwrap(), " claim ");
    }
}
