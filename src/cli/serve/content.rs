//! Live reload script injection for served HTML.

use crate::utils::html::rfind_tag;
use crate::utils::mime;

/// URL the injected `<script>` loads the client from.
pub const HOTRELOAD_PATH: &str = "/__sprig/hotreload.js";

/// Inject the live reload client when the body is HTML and reload is on.
pub fn maybe_inject_hotreload(body: Vec<u8>, content_type: &str, ws_port: Option<u16>) -> Vec<u8> {
    match (mime::is_html(content_type), ws_port) {
        (true, Some(_)) => inject_hotreload_script(&body),
        _ => body,
    }
}

/// Insert the script tag before the last `</body>`, or append it.
fn inject_hotreload_script(content: &[u8]) -> Vec<u8> {
    let script = format!("<script src=\"{HOTRELOAD_PATH}\"></script>");
    let script = script.as_bytes();

    let at = rfind_tag(content, b"</body>").unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + script.len());
    result.extend_from_slice(&content[..at]);
    result.extend_from_slice(script);
    result.extend_from_slice(&content[at..]);
    result
}
