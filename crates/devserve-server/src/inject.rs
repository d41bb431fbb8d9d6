//! Reload client injection for HTML pages.

use std::borrow::Cow;

/// Path of the WebSocket endpoint the reload client connects to.
pub const RELOAD_PATH: &str = "/__ws";

/// Global set by the reload client. Its presence in a document means the
/// client is already there.
pub const INJECTION_MARKER: &str = "__DEVSERVE_LIVE_RELOAD__";

/// Script inserted before `</body>`.
pub const RELOAD_CLIENT: &str = r#"<script>
(function () {
  if (window.__DEVSERVE_LIVE_RELOAD__) return;
  window.__DEVSERVE_LIVE_RELOAD__ = true;
  var scheme = location.protocol === "https:" ? "wss://" : "ws://";
  var socket = new WebSocket(scheme + location.host + "/__ws");
  socket.onmessage = function () { location.reload(); };
})();
</script>
"#;

const BODY_CLOSE: &str = "</body>";

/// Whether a request path names an HTML document (`.html` suffix,
/// case-sensitive).
pub fn is_html(path: &str) -> bool {
    path.ends_with(".html")
}

/// Insert [`RELOAD_CLIENT`] right before the first `</body>`.
///
/// Documents that already contain [`INJECTION_MARKER`] or have no `</body>`
/// are returned unchanged.
pub fn inject_reload_client(html: &str) -> Cow<'_, str> {
    if html.contains(INJECTION_MARKER) {
        return Cow::Borrowed(html);
    }

    let Some(at) = html.find(BODY_CLOSE) else {
        return Cow::Borrowed(html);
    };

    let mut out = String::with_capacity(html.len() + RELOAD_CLIENT.len());
    out.push_str(&html[..at]);
    out.push_str(RELOAD_CLIENT);
    out.push_str(&html[at..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_client_carries_marker_and_path() {
        assert!(RELOAD_CLIENT.contains(INJECTION_MARKER));
        assert!(RELOAD_CLIENT.contains(RELOAD_PATH));
    }

    #[test]
    fn test_inject_before_body_close() {
        let html = "<html><body><h1>Hi</h1></body></html>";

        let out = inject_reload_client(html);

        assert_eq!(
            out,
            format!("<html><body><h1>Hi</h1>{RELOAD_CLIENT}</body></html>")
        );
    }

    #[test]
    fn test_inject_leaves_other_bytes_alone() {
        let html = "<!doctype html>\n<body>\n  <p>x</p>\n</body>\n<!-- tail -->\n";

        let out = inject_reload_client(html);
        let at = html.find("</body>").unwrap();

        assert_eq!(&out[..at], &html[..at]);
        assert_eq!(&out[at..at + RELOAD_CLIENT.len()], RELOAD_CLIENT);
        assert_eq!(&out[at + RELOAD_CLIENT.len()..], &html[at..]);
    }

    #[test]
    fn test_inject_only_first_body_close() {
        let html = "<body>a</body><template></body></template>";

        let out = inject_reload_client(html);

        assert_eq!(out.matches(INJECTION_MARKER).count(), 2);
        assert_eq!(out.matches(RELOAD_CLIENT).count(), 1);
        assert!(out.ends_with("</body><template></body></template>"));
    }

    #[test]
    fn test_inject_is_idempotent() {
        let html = "<html><body>page</body></html>";

        let once = inject_reload_client(html).into_owned();
        let twice = inject_reload_client(&once);

        assert_eq!(twice, once);
        assert!(matches!(twice, Cow::Borrowed(_)));
    }

    #[test]
    fn test_marker_present_returns_input() {
        let html = "<body><script>window.__DEVSERVE_LIVE_RELOAD__=1</script></body>";

        let out = inject_reload_client(html);

        assert_eq!(out, html);
    }

    #[test]
    fn test_missing_body_close_returns_input() {
        let html = "<html><p>fragment</p></html>";

        let out = inject_reload_client(html);

        assert_eq!(out, html);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_uppercase_body_close_not_matched() {
        let html = "<BODY>x</BODY>";

        assert_eq!(inject_reload_client(html), html);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("/index.html"));
        assert!(is_html("/sub/page.html"));
        assert!(!is_html("/index.HTML"));
        assert!(!is_html("/index.htm"));
        assert!(!is_html("/style.css"));
        assert!(!is_html("/html"));
    }
}
