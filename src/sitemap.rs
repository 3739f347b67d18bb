//! Sitemap generation: a flat list of absolute URLs serialized as a minimal
//! `urlset` document.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!     <url>
//!         <loc>https://example.org/log/index.html</loc>
//!     </url>
//! </urlset>
//! ```

use std::borrow::Cow;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// The URL list for one sitemap file, in traversal order: site root, then
/// entries, then groups, then tags.
pub struct Sitemap {
    urls: Vec<String>,
}

impl Sitemap {
    pub fn new(urls: Vec<String>) -> Sitemap {
        Sitemap { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for url in &self.urls {
            xml.push_str("    <url>\n        <loc>");
            xml.push_str(&escape_xml(url));
            xml.push_str("</loc>\n    </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!("hello", escape_xml("hello"));
        assert_eq!("a &amp; b", escape_xml("a & b"));
        assert_eq!("&lt;x&gt;", escape_xml("<x>"));
    }

    #[test]
    fn test_empty_sitemap() {
        let xml = Sitemap::new(Vec::new()).to_xml();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{}">"#, SITEMAP_NS)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_sitemap_lists_urls_in_order() {
        let sitemap = Sitemap::new(vec![
            "https://example.org/log/index.html".to_owned(),
            "https://example.org/log/2020/2020-02-25/mist.html".to_owned(),
            "https://example.org/log/2020/index.html".to_owned(),
        ]);
        let xml = sitemap.to_xml();

        assert_eq!(3, xml.matches("<url>").count());
        let index = xml.find("index.html</loc>").unwrap();
        let mist = xml.find("mist.html</loc>").unwrap();
        assert!(index < mist);
    }

    #[test]
    fn test_sitemap_escapes_locs() {
        let xml = Sitemap::new(vec!["https://example.org/?a=1&b=2".to_owned()]).to_xml();
        assert!(xml.contains("<loc>https://example.org/?a=1&amp;b=2</loc>"));
    }

    #[test]
    fn test_round_trip_preserves_url_set() {
        let urls = vec![
            "https://example.org/log/index.html".to_owned(),
            "https://example.org/log/2020/index.html".to_owned(),
            "https://example.org/log/photo.html".to_owned(),
        ];
        let xml = Sitemap::new(urls.clone()).to_xml();

        let parsed: Vec<&str> = xml
            .lines()
            .filter_map(|line| {
                line.trim()
                    .strip_prefix("<loc>")
                    .and_then(|rest| rest.strip_suffix("</loc>"))
            })
            .collect();
        assert_eq!(urls, parsed);
    }
}
