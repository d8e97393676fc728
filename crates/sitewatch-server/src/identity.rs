use axum::{extract::Request, http::Method, middleware::Next, response::Response};

use crate::api::error_response;
use crate::logging::TraceId;

/// The caller identity taken from the `x-user-id` header.
///
/// Authentication happens upstream (session gateway); this service only
/// records who performed a mutation in the alert audit trail.
#[derive(Clone)]
pub struct UserId(pub String);

impl std::ops::Deref for UserId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

/// Reads `x-user-id` into request extensions. Mutating methods without
/// an identity are rejected, since transitions and writes must be
/// attributable.
pub async fn identity_middleware(mut req: Request, next: Next) -> Response {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match user_id {
        Some(id) => {
            req.extensions_mut().insert(UserId(id));
        }
        None => {
            let mutating = matches!(
                *req.method(),
                Method::POST | Method::PUT | Method::PATCH | Method::DELETE
            );
            if mutating {
                let trace_id = req
                    .extensions()
                    .get::<TraceId>()
                    .map(|t| t.0.clone())
                    .unwrap_or_default();
                return error_response(
                    axum::http::StatusCode::UNAUTHORIZED,
                    &trace_id,
                    "unauthorized",
                    "Missing x-user-id header",
                );
            }
        }
    }

    next.run(req).await
}
