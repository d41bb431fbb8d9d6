//! Static file serving.
//!
//! Files are served from the root directory by [`ServeDir`], which handles
//! path decoding, traversal rejection, content types and streaming. HTML
//! pages are buffered so the reload client can be injected.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::error::ServerError;
use crate::inject;
use crate::state::AppState;

/// File served for directory requests.
const INDEX_FILE: &str = "index.html";

/// Serve the file a request path resolves to.
///
/// A path ending in `/` is served from that directory's `index.html`, so a
/// trailing slash after a regular file is not found. A directory requested
/// without the slash is redirected to it.
pub(crate) async fn serve_file(
    State(state): State<Arc<AppState>>,
    mut request: Request,
) -> Result<Response, ServerError> {
    point_at_index(&mut request);
    let path = request.uri().path().to_owned();

    let Ok(response) = ServeDir::new(&state.root_dir).oneshot(request).await;

    if response.status() != StatusCode::OK || !inject::is_html(&path) {
        return Ok(response.map(Body::new));
    }

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(Body::new(body), usize::MAX).await?;

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    Ok(Response::from_parts(
        parts,
        Body::from(inject_page(&path, bytes.into())),
    ))
}

/// Rewrite a directory request (`/docs/`) to its index file.
fn point_at_index(request: &mut Request) {
    let path = request.uri().path();
    if !path.ends_with('/') {
        return;
    }

    if let Ok(uri) = format!("{path}{INDEX_FILE}").parse::<Uri>() {
        *request.uri_mut() = uri;
    }
}

/// Inject the reload client into a page, or return it untouched if it is not
/// valid UTF-8.
fn inject_page(path: &str, bytes: Vec<u8>) -> Vec<u8> {
    match String::from_utf8(bytes) {
        Ok(text) => inject::inject_reload_client(&text).into_owned().into_bytes(),
        Err(e) => {
            tracing::warn!(path, "HTML is not valid UTF-8, serving unmodified");
            e.into_bytes()
        }
    }
}
