//! Per-article Markdown rendering.

use crate::models::ArticleRecord;

/// Render an article as Markdown.
///
/// ```text
/// # {title}
///
/// [URL]({url}) ([Fetched URL]({resolved_url}))
///
/// {content}
/// ```
pub fn article_to_markdown(article: &ArticleRecord) -> String {
    format!(
        "# {}\n\n[URL]({}) ([Fetched URL]({}))\n\n{}\n\n",
        article.title, article.url, article.resolved_url, article.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_to_markdown() {
        let article = ArticleRecord {
            id: "id".to_string(),
            url: "https://example.com/a".to_string(),
            resolved_url: "http://web.archive.org/web/1/https://example.com/a".to_string(),
            strategy: "archive".to_string(),
            title: "Headline".to_string(),
            content: "Para one.\n\nPara two.".to_string(),
            html: String::new(),
        };

        assert_eq!(
            article_to_markdown(&article),
            "# Headline\n\n[URL](https://example.com/a) ([Fetched URL](http://web.archive.org/web/1/https://example.com/a))\n\nPara one.\n\nPara two.\n\n"
        );
    }
}
