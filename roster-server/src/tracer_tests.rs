//! # Tracer Tests
//!
//! Checks the span, response and failure hooks of the HTTP trace layer.

#[cfg(test)]
mod tests {
    use super::super::tracer::*;
    use crate::middleware::request_context::RequestContext;
    use axum::{Router, body::Body, routing::get};
    use axum::http::{Method, Request, Response, StatusCode, Version};
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_http::{
        classify::ServerErrorsFailureClass,
        trace::{MakeSpan, OnResponse},
    };
    use tracing::{Level, span};
    use tracing_subscriber::util::SubscriberInitExt;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .version(Version::HTTP_11)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn trace_layer_passes_responses_through_and_records_them() {
        let handle = crate::server::metrics_handle();
        let app = Router::new()
            .route("/traced", get(|| async { StatusCode::ACCEPTED }))
            .layer(create_trace_layer());

        let response = app.oneshot(request(Method::GET, "/traced")).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(
            handle
                .render()
                .contains("http_responses_total{status=\"202\"}"),
            "expected the layer's response hook to count the request"
        );
    }

    #[test]
    fn make_span_uses_request_id_from_context() {
        let _guard = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .set_default();

        let mut request = request(Method::POST, "/api/users");
        request.extensions_mut().insert(RequestContext {
            request_id: "req-42".into(),
            user_id: None,
        });

        let span = HttpMakeSpan.make_span(&request);
        assert_eq!(span.metadata().map(tracing::Metadata::name), Some("http_request"));
    }

    #[test]
    fn make_span_without_context_still_builds() {
        let _guard = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .set_default();

        let span = HttpMakeSpan.make_span(&request(Method::GET, "/healthz"));
        assert!(!span.is_disabled());
    }

    #[test]
    fn request_hook_handles_every_method() {
        let _guard = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .set_default();

        for method in [Method::GET, Method::POST, Method::OPTIONS] {
            let span = span!(Level::INFO, "test_method_span", method = %method);
            on_request_handler(&request(method, "/api/auth/login?x=1"), &span);
        }
    }

    #[test]
    fn failure_hook_handles_server_errors() {
        let _guard = tracing_subscriber::fmt()
            .with_max_level(Level::ERROR)
            .set_default();

        for status_code in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let span = span!(Level::ERROR, "test_status_span", status = %status_code);
            on_failure_handler(
                ServerErrorsFailureClass::StatusCode(status_code),
                Duration::from_millis(100),
                &span,
            );
        }
    }

    #[test]
    fn http_metrics_recorded_for_response() {
        let handle = crate::server::metrics_handle();
        let _subscriber_guard = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .finish()
            .set_default();

        let span = HttpMakeSpan.make_span(&request(Method::GET, "/metrics-test"));
        let response = Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .body(Body::empty())
            .unwrap();

        HttpOnResponse.on_response(&response, Duration::from_millis(10), &span);

        let metrics = handle.render();
        assert!(
            metrics.contains("http_responses_total{status=\"418\"}"),
            "expected counter line for response status"
        );
        assert!(
            metrics.contains("http_request_duration_seconds"),
            "expected samples for request duration"
        );
    }
}
