//! Content preparation for isolated surfaces: `<base>` injection for HTML
//! creatives and a synthesized wrapper document for images.

use crate::size::AdSize;
use scraper::{Html, Selector};
use url::Url;

/// How a creative is loaded into its surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreativeKind {
    /// An HTML5 bundle entry point, fetched and injected as text
    Document,
    /// Anything else, wrapped in a synthesized document
    Image,
}

impl CreativeKind {
    /// Classify by the `.html` suffix of the address path (case-insensitive).
    pub fn from_address(address: &str) -> Self {
        let path = address
            .split(['?', '#'])
            .next()
            .unwrap_or(address);
        if path.to_ascii_lowercase().ends_with(".html") {
            CreativeKind::Document
        } else {
            CreativeKind::Image
        }
    }
}

/// Resolve `address` against the host page and drop its final path segment,
/// giving the directory relative resources inside the creative live in.
pub fn base_href(address: &str, host_origin: &Url) -> String {
    match host_origin.join(address) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let dir = url.path().rfind('/').map(|idx| url.path()[..=idx].to_string());
            if let Some(dir) = dir {
                url.set_path(&dir);
            }
            url.to_string()
        }
        Err(e) => {
            log::debug!("cannot resolve creative address {:?}: {}", address, e);
            host_origin.to_string()
        }
    }
}

/// Escape a value for use inside a double-quoted HTML attribute
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn base_tag(base: &str) -> String {
    format!(r#"<base href="{}">"#, escape_attr(base))
}

/// Whether the document already declares a `<base>` element.
pub fn has_base_element(html: &str) -> bool {
    let document = Html::parse_document(html);
    Selector::parse("base")
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

/// Byte offset just past the opening `<head ...>` tag, if there is one.
fn head_tag_end(html: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact
    let lower = html.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("<head") {
        let after = from + pos + "<head".len();
        match bytes.get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() || *c == b'/' => {
                return lower[after..].find('>').map(|i| after + i + 1);
            }
            // <header> and friends
            _ => from = after,
        }
    }
    None
}

/// Make relative URLs in `html` resolve against `base`.
///
/// A document that declares its own `<base>` is left alone. Otherwise the tag
/// goes right after the opening `<head>`, or in front of everything when the
/// document has no head.
pub fn inject_base(html: &str, base: &str) -> String {
    if has_base_element(html) {
        return html.to_string();
    }
    let tag = base_tag(base);
    match head_tag_end(html) {
        Some(end) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..end]);
            out.push_str(&tag);
            out.push_str(&html[end..]);
            out
        }
        None => format!("{tag}{html}"),
    }
}

/// The `src` for an image creative, relative to `base` when possible.
pub fn image_src(address: &str, base: &str, host_origin: &Url) -> String {
    let target = match host_origin.join(address) {
        Ok(url) => url,
        Err(_) => return address.to_string(),
    };
    Url::parse(base)
        .ok()
        .and_then(|base| base.make_relative(&target))
        .filter(|rel| !rel.is_empty())
        .unwrap_or_else(|| target.to_string())
}

/// Build the wrapper document shown for an image creative: fixed to the
/// declared size with the image centered inside it.
pub fn image_document(src: &str, size: AdSize, base: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    {base}
    <style>
      body {{
        margin: 0;
        padding: 0;
        overflow: hidden;
        width: {w}px;
        height: {h}px;
      }}
      .ad-container {{
        width: 100%;
        height: 100%;
        display: flex;
        align-items: center;
        justify-content: center;
      }}
      img {{
        max-width: 100%;
        max-height: 100%;
        object-fit: contain;
      }}
    </style>
  </head>
  <body>
    <div class="ad-container">
      <img src="{src}" alt="Ad Preview" />
    </div>
  </body>
</html>
"#,
        base = base_tag(base),
        w = size.width,
        h = size.height,
        src = escape_attr(src),
    )
}
