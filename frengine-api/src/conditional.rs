/// Conditional GET responses
///
/// Read handlers compute the resource's reconciled "last touched" instant
/// and hand it here with the full body. The client either gets a bodyless
/// `304 Not Modified` or the body, and both carry `Last-Modified`.
///
/// An `If-Modified-Since` header that does not parse is ignored, so the
/// request is served as if it were unconditional.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use frengine_shared::freshness::{http_date, is_fresh, parse_http_date};

/// The request's `If-Modified-Since`, if present and well formed
pub fn if_modified_since(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get(header::IF_MODIFIED_SINCE)?
        .to_str()
        .ok()
        .and_then(parse_http_date)
}

/// Answers a read with `304` or the body
///
/// With no `last_modified` (an empty collection) the body is always sent
/// and no validator header is set.
pub fn respond<B>(headers: &HeaderMap, last_modified: Option<DateTime<Utc>>, body: B) -> Response
where
    B: IntoResponse,
{
    let Some(last_modified) = last_modified else {
        return body.into_response();
    };

    let mut response = if is_fresh(if_modified_since(headers), last_modified).is_fresh() {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        body.into_response()
    };

    if let Ok(value) = HeaderValue::from_str(&http_date(last_modified)) {
        response.headers_mut().insert(header::LAST_MODIFIED, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn with_ims(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_MODIFIED_SINCE, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_unconditional_request() {
        let response = respond(&HeaderMap::new(), Some(at(1_000)), "body");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::LAST_MODIFIED).unwrap(),
            "Thu, 01 Jan 1970 00:16:40 GMT"
        );
    }

    #[test]
    fn test_fresh_request_gets_304() {
        let headers = with_ims("Thu, 01 Jan 1970 00:16:40 GMT");
        let response = respond(&headers, Some(at(1_000)), "body");

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.headers().contains_key(header::LAST_MODIFIED));
    }

    #[test]
    fn test_stale_request_gets_body() {
        let headers = with_ims("Thu, 01 Jan 1970 00:16:39 GMT");
        let response = respond(&headers, Some(at(1_000)), "body");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_garbage_header_is_ignored() {
        let headers = with_ims("not a date");
        assert_eq!(if_modified_since(&headers), None);

        let response = respond(&headers, Some(at(1_000)), "body");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_no_last_modified() {
        let headers = with_ims("Thu, 01 Jan 1970 00:16:40 GMT");
        let response = respond(&headers, None, "body");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::LAST_MODIFIED));
    }
}
