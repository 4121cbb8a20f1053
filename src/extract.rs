//! Markup normalisation and a light title/body pass.
//!
//! This is deliberately simple: strip the elements that never carry
//! article text, then read the headline and paragraphs with CSS selectors.

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};

/// Elements removed before anything is persisted.
pub const HTML_TAG_IGNORE: [&str; 8] =
    ["script", "style", "img", "figure", "svg", "a", "button", "link"];

/// Attributes removed from every element that survives [`HTML_TAG_IGNORE`].
pub const HTML_ATTR_IGNORE: [&str; 1] = ["style"];

static IGNORED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(&HTML_TAG_IGNORE.join(", ")).expect("static selector"));
static IGNORED_ATTRS: Lazy<Selector> = Lazy::new(|| {
    let selector = HTML_ATTR_IGNORE.iter().map(|a| format!("[{a}]")).join(", ");
    Selector::parse(&selector).expect("static selector")
});
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("static selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));
static ARTICLE_P: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("static selector"));
static P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Title and body text of an article.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedArticle {
    pub title: String,
    pub content: String,
}

/// Remove [`HTML_TAG_IGNORE`] elements, strip [`HTML_ATTR_IGNORE`]
/// attributes from what is left, and return the remaining markup.
#[instrument(level = "debug", skip_all)]
pub fn clean_html(html: &str) -> String {
    let mut document = Html::parse_document(html);
    let ignored: Vec<_> = document.select(&IGNORED).map(|el| el.id()).collect();

    for id in ignored {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let styled: Vec<_> = document.select(&IGNORED_ATTRS).map(|el| el.id()).collect();
    for id in styled {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                element
                    .attrs
                    .retain(|(name, _)| !HTML_ATTR_IGNORE.contains(&&*name.local));
            }
        }
    }

    let output = document.html();
    if !html.is_empty() {
        debug!(
            ratio = %format!("{:.2}%", output.len() as f64 / html.len() as f64 * 100.0),
            "HTML cleaned"
        );
    }
    output
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().join(" ")
}

/// Pull the headline and paragraph text out of `html`.
pub fn extract_article(html: &str) -> ExtractedArticle {
    let document = Html::parse_document(html);

    let title = document
        .select(&OG_TITLE)
        .filter_map(|meta| meta.value().attr("content"))
        .map(|t| t.split_whitespace().join(" "))
        .chain(document.select(&TITLE).map(element_text))
        .chain(document.select(&H1).map(element_text))
        .find(|t| !t.is_empty())
        .unwrap_or_default();

    let paragraphs = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect()
    };

    let mut body = paragraphs(&ARTICLE_P);
    if body.is_empty() {
        body = paragraphs(&P);
    }

    debug!(%title, paragraphs = body.len(), "Article extracted");
    ExtractedArticle {
        title,
        content: body.join("\n\n"),
    }
}
