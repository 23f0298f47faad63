//! Response handling and transformation.
//!
//! # Responsibilities
//! - Correct a missing or generic Content-Type from the decoded request path
//!
//! # Design Decisions
//! - Best effort: trusts the path extension, never inspects the body
//! - Fail-open: anything unexpected leaves the upstream header as it was
//! - Only `""`, `text/plain` and `application/octet-stream` count as generic;
//!   parameters (e.g. `; charset=utf-8`) make a type specific

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue};
use std::borrow::Cow;

/// Content-Type values that say nothing useful about the payload.
const GENERIC_CONTENT_TYPES: [&str; 3] = ["", "text/plain", "application/octet-stream"];

/// A Content-Type correction that was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeFix {
    pub previous: String,
    pub corrected: String,
}

/// Percent-decoded form of a request path, or the raw path when the
/// escapes do not decode to UTF-8.
pub fn decoded_path(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Extension of the last path segment, without the dot.
pub fn path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Whether the current Content-Type should be replaced.
fn is_generic(current: Option<&HeaderValue>) -> bool {
    match current {
        None => true,
        Some(value) => value
            .to_str()
            .map(|v| GENERIC_CONTENT_TYPES.contains(&v))
            .unwrap_or(false),
    }
}

/// Replace a missing or generic Content-Type with the type registered for
/// the extension of `path`. Returns the change, if one was made.
pub fn correct_content_type(headers: &mut HeaderMap, path: &str) -> Option<ContentTypeFix> {
    let ext = path_extension(path)?;
    let mime = mime_guess::from_ext(ext).first()?;

    let current = headers.get(CONTENT_TYPE);
    if !is_generic(current) {
        return None;
    }
    let previous = current
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let corrected = HeaderValue::from_str(mime.essence_str()).ok()?;
    headers.insert(CONTENT_TYPE, corrected);

    let fix = ContentTypeFix {
        previous,
        corrected: mime.essence_str().to_string(),
    };
    tracing::info!(
        path = %path,
        from = %fix.previous,
        to = %fix.corrected,
        "Fixed MIME type"
    );
    Some(fix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(ext: &str) -> String {
        mime_guess::from_ext(ext).first().unwrap().essence_str().to_string()
    }

    fn with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extension_of_last_segment() {
        assert_eq!(path_extension("/static/app.js"), Some("js"));
        assert_eq!(path_extension("/archive.tar.gz"), Some("gz"));
        assert_eq!(path_extension("/v1.2/users"), None);
        assert_eq!(path_extension("/dir.js/"), None);
        assert_eq!(path_extension("/trailing."), None);
        assert_eq!(path_extension("/"), None);
    }

    #[test]
    fn escaped_extension_decoded() {
        assert_eq!(decoded_path("/app%2Ejs"), "/app.js");
        assert_eq!(path_extension(&decoded_path("/my%20file.css")), Some("css"));
        assert_eq!(decoded_path("/plain/path"), "/plain/path");
    }

    #[test]
    fn undecodable_path_kept_raw() {
        assert_eq!(decoded_path("/bad%FF.js"), "/bad%FF.js");
    }

    #[test]
    fn text_plain_replaced() {
        let mut headers = with_content_type("text/plain");
        let fix = correct_content_type(&mut headers, "/app.js").unwrap();

        assert_eq!(fix.previous, "text/plain");
        assert_eq!(fix.corrected, registered("js"));
        assert_eq!(headers[CONTENT_TYPE], registered("js").as_str());
    }

    #[test]
    fn octet_stream_replaced() {
        let mut headers = with_content_type("application/octet-stream");
        assert!(correct_content_type(&mut headers, "/styles/site.css").is_some());
        assert_eq!(headers[CONTENT_TYPE], "text/css");
    }

    #[test]
    fn missing_and_empty_treated_alike() {
        let mut missing = HeaderMap::new();
        let mut empty = with_content_type("");

        let a = correct_content_type(&mut missing, "/index.html").unwrap();
        let b = correct_content_type(&mut empty, "/index.html").unwrap();

        assert_eq!(a.previous, "");
        assert_eq!(a, b);
        assert_eq!(missing[CONTENT_TYPE], "text/html");
        assert_eq!(empty[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn specific_type_untouched() {
        let mut headers = with_content_type("application/json");
        assert!(correct_content_type(&mut headers, "/data.js").is_none());
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn parameters_make_type_specific() {
        let mut headers = with_content_type("text/plain; charset=utf-8");
        assert!(correct_content_type(&mut headers, "/app.js").is_none());
        assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn unknown_extension_untouched() {
        let mut headers = with_content_type("text/plain");
        assert!(correct_content_type(&mut headers, "/file.zzzunknown").is_none());
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn no_extension_untouched() {
        let mut headers = HeaderMap::new();
        assert!(correct_content_type(&mut headers, "/api/users").is_none());
        assert!(headers.get(CONTENT_TYPE).is_none());
    }
}
