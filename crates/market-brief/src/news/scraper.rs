//! Page text scraping

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, error};

const USER_AGENT: &str = "Mozilla/5.0";

/// Source of raw page text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Visible text of the page at `url`; empty on any failure
    async fn fetch_text(&self, url: &str) -> String;
}

/// Fetches a page over HTTP and keeps its paragraph text
#[derive(Debug, Clone)]
pub struct HttpScraper {
    client: Client,
}

impl HttpScraper {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> crate::Result<String> {
        let url = url::Url::parse(url)
            .map_err(|e| crate::BriefError::Config(format!("invalid news URL {url}: {e}")))?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl NewsSource for HttpScraper {
    async fn fetch_text(&self, url: &str) -> String {
        match self.fetch_html(url).await {
            Ok(html) => {
                let text = paragraph_text(&html);
                debug!(url, chars = text.len(), "scraped page");
                text
            },
            Err(e) => {
                error!(url, error = %e, "error scraping page");
                String::new()
            },
        }
    }
}

/// Text of every `<p>` element, whitespace collapsed, joined by single spaces.
///
/// Comments and script bodies are never paragraph text, and character
/// references are decoded by the HTML parser.
pub fn paragraph_text(html: &str) -> String {
    let Ok(paragraphs) = Selector::parse("p") else {
        return String::new();
    };

    Html::parse_document(html)
        .select(&paragraphs)
        .map(|p| {
            let text = p.text().collect::<String>();
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text() {
        let html = r#"
            <html><head><title>ignored</title></head>
            <body>
              <div>not a paragraph</div>
              <p class="lead">TSMC  raises <b>AI</b> outlook.</p>
              <P>Supply chain &amp; export rules
                 weigh on China sales.</P>
              <p>   </p>
            </body></html>
        "#;

        assert_eq!(
            paragraph_text(html),
            "TSMC raises AI outlook. Supply chain & export rules weigh on China sales."
        );
    }

    #[test]
    fn test_paragraph_text_without_paragraphs() {
        assert_eq!(paragraph_text("<div>nothing here</div>"), "");
    }

    #[test]
    fn test_paragraph_text_skips_comments_and_scripts() {
        let html = "<!-- <p>hidden comment</p> -->\
            <script>var s='<p>in script</p>';</script>\
            <p>It&#8217;s up<div>x</div><p>Second</p>";

        let text = paragraph_text(html);
        assert!(!text.contains("hidden comment"));
        assert!(!text.contains("in script"));
        assert_eq!(text, "It\u{2019}s up Second");
    }

    #[test]
    fn test_paragraph_text_decodes_entities() {
        assert_eq!(
            paragraph_text("<p>a &lt;b&gt; &quot;c&quot; &#39;d&#39;&nbsp;e</p>"),
            "a <b> \"c\" 'd' e"
        );
    }

    #[tokio::test]
    async fn test_invalid_url_yields_empty_text() {
        let scraper = HttpScraper::new(Duration::from_secs(1)).unwrap();
        assert_eq!(scraper.fetch_text("not a url").await, "");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_text() {
        let scraper = HttpScraper::new(Duration::from_secs(30)).unwrap();
        let text = scraper.fetch_text("https://finance.yahoo.com/quote/TSM/news/").await;
        assert!(!text.is_empty());
    }
}
