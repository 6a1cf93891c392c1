use crate::html::CatalogPage;
use regex::Regex;
use std::sync::LazyLock;

static ATT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]attid=([0-9]+)").expect("valid regex"));

/// Find the internal attachment identifier the download API is keyed on.
///
/// The catalog never prints it; it only shows up as an `AttID` query
/// parameter on image and player URLs. Sources are tried in order and the
/// first hit wins:
/// 1. the `og:image` meta tag
/// 2. every `<img src>`, in document order
/// 3. every `<a href>`, in document order
///
/// `None` means the page exposes no audio, not that extraction failed.
pub fn resolve_attachment_id(page: &CatalogPage) -> Option<u64> {
    if let Some(id) = page
        .meta("property", "og:image")
        .and_then(|og| attachment_param(&og))
    {
        return Some(id);
    }

    let from_attr = |css: &str, attr: &str| {
        page.select_all(css)
            .into_iter()
            .filter_map(|el| el.value().attr(attr))
            .find_map(attachment_param)
    };

    from_attr("img[src]", "src").or_else(|| from_attr("a[href]", "href"))
}

fn attachment_param(url: &str) -> Option<u64> {
    ATT_ID
        .captures_iter(url)
        .find_map(|caps| caps[1].parse().ok())
}
