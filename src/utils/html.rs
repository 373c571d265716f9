//! HTML helpers: escaping and tag-anchored insertion.

use std::borrow::Cow;

/// Escape HTML special characters in text content.
///
/// Borrows when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Byte offset of the last `tag` in `html`, ASCII case-insensitive.
pub fn rfind_tag(html: &[u8], tag: &[u8]) -> Option<usize> {
    if tag.is_empty() || html.len() < tag.len() {
        return None;
    }
    html.windows(tag.len())
        .rposition(|w| w.eq_ignore_ascii_case(tag))
}

/// Byte offset of the first `tag` in `html`, ASCII case-insensitive.
pub fn find_tag(html: &[u8], tag: &[u8]) -> Option<usize> {
    if tag.is_empty() || html.len() < tag.len() {
        return None;
    }
    html.windows(tag.len())
        .position(|w| w.eq_ignore_ascii_case(tag))
}

/// Byte offset just past the opening `<body ...>` tag.
pub fn body_start(html: &[u8]) -> Option<usize> {
    let open = find_tag(html, b"<body")?;
    // `<body>` or `<body class=...>`, not `<bodyfoo>`
    match html.get(open + 5)? {
        b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/' => {}
        _ => return None,
    }
    let close = html[open..].iter().position(|&b| b == b'>')?;
    Some(open + close + 1)
}
