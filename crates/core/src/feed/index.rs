//! Anchor extraction from an HTML index page.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// A link on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Visible text with markup stripped and entities decoded.
    pub text: String,
}

impl Anchor {
    /// The `index`-th `separator`-delimited field of the text.
    pub fn field(&self, separator: &str, index: usize) -> Option<&str> {
        self.text.split(separator).nth(index)
    }
}

/// All anchors with an `href`, in document order.
pub fn parse_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(Anchor {
                href: href.to_string(),
                text: element.text().collect::<String>().trim().to_string(),
            })
        })
        .collect()
}
