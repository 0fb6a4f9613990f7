use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::IntoResponse,
};

/// Attach permissive CORS headers to every response, including errors and
/// streamed bodies. Preflight handling lives in the per-route OPTIONS
/// handlers; this middleware only decorates whatever response comes back.
pub async fn cors_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );

    response
}
