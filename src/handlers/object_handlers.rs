//! HTTP handlers for public object URLs and the response builder shared
//! with the song streaming endpoint.
//! Bodies are streamed from the blob store, never buffered.

use crate::{
    models::object::Object,
    services::range_stream::{MediaStream, StreamError},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Value of the request's `Range` header. A header that is not visible
/// ASCII is a malformed range.
pub fn range_header(headers: &HeaderMap) -> Result<Option<&str>, StreamError> {
    headers
        .get(header::RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| StreamError::InvalidRange("header is not ASCII".into()))
        })
        .transpose()
}

/// `200 OK` for a whole object, `206 Partial Content` for a range.
///
/// With `inline_name` set, a `Content-Disposition: inline` header names the
/// file for in-browser playback.
pub fn media_response(stream: MediaStream, inline_name: Option<&str>) -> Response {
    let status = if stream.range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let content_length = stream.content_length();
    let content_range = stream.content_range();
    let object = stream.object;

    let mut response = Response::new(Body::from_stream(stream.body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    set_object_headers(headers, &object, content_length);
    if let Some(value) = content_range.and_then(|v| HeaderValue::from_str(&v).ok()) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    if let Some(name) = inline_name {
        headers.insert(header::CONTENT_DISPOSITION, inline_disposition(name));
    }
    response
}

/// RFC 5987 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `inline` disposition naming `name`. Clients that only read `filename`
/// get an ASCII approximation, the exact UTF-8 name travels in `filename*`.
pub fn inline_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    let encoded = utf8_percent_encode(name, ATTR_CHAR);
    let value = format!("inline; filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded);
    // Only visible ASCII remains after the mapping above.
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

/// GET `/objects/{bucket}/{*key}`: the target of every public URL.
/// Honors `Range` like the song stream.
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, StreamError> {
    let stream = state
        .streamer
        .open(&bucket, &key, range_header(&headers)?)
        .await?;
    Ok(media_response(stream, None))
}

/// HEAD `/objects/{bucket}/{*key}`: same headers as GET but no body.
pub async fn head_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, StreamError> {
    let object = state.blobs.head(&bucket, &key).await?;
    let mut response = Response::new(Body::empty());
    set_object_headers(response.headers_mut(), &object, object.len());
    Ok(response)
}

/// GET `/objects/{bucket}`: keys stored in a bucket.
pub async fn list_objects(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> Result<Json<Vec<String>>, StreamError> {
    Ok(Json(state.blobs.list(&bucket).await?))
}

fn set_object_headers(headers: &mut HeaderMap, meta: &Object, length: u64) {
    let content_type = meta
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    if let Some(etag) = meta.etag.as_ref() {
        let quoted = format!("\"{}\"", etag);
        if let Ok(value) = HeaderValue::from_str(&quoted) {
            headers.insert(header::ETAG, value);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&meta.last_modified.to_rfc2822()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}
