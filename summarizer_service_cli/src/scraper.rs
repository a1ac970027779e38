use crate::{Article, Comment, Error, Result};
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use chrono::Utc;
use ego_tree::NodeRef;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; article-summarizer)";

/// Tags that survive body pre-filtering; every other tag is unwrapped.
const KEPT_TAGS: [&str; 10] = ["h1", "h2", "h3", "h4", "h5", "h6", "ul", "li", "blockquote", "b"];
/// Tags dropped together with their content.
const DROPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];
/// Unwrapped tags whose end also ends a run of text.
const BLOCK_TAGS: [&str; 17] = [
    "p", "div", "section", "article", "aside", "header", "footer", "main", "figure", "figcaption", "pre",
    "table", "tr", "td", "th", "ol", "dl",
];
const LANGUAGES: [&str; 4] = ["ru", "en", "es", "zh"];

/// Anything that can turn an article URL into an [`Article`].
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_article(&self, url: &str) -> Result<Article>;
}

pub struct ArticleFetcher {
    client: Client,
    max_elapsed: Duration,
}

impl ArticleFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build()?,
            max_elapsed: Duration::from_secs(60),
        })
    }

    /// Fetches and parses an article, then collects its comments.
    pub async fn fetch(&self, url: &str) -> Result<Article> {
        let url = normalize_article_url(url);
        let body = self.get_with_retry(&url).await?;
        let mut article = parse_article(&url, &body)?;

        let (comments, author_comments) = self.fetch_comments(&url, article.author.as_deref()).await;
        article.comments = comments;
        article.author_comments = author_comments;
        info!(url = %article.url, comments = article.comments.len(), "article fetched");
        Ok(article)
    }

    /// A failure here only costs the comments, never the article.
    pub async fn fetch_comments(&self, article_url: &str, author: Option<&str>) -> (Vec<Comment>, Vec<Comment>) {
        let comments_url = format!("{}/comments/", article_url.trim_end_matches('/'));
        match self.get_with_retry(&comments_url).await {
            Ok(body) => parse_comments(&body, author),
            Err(e) => {
                warn!(url = %comments_url, "comments unavailable: {}", e);
                (Vec::new(), Vec::new())
            }
        }
    }

    async fn get_with_retry(&self, url: &str) -> Result<String> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..ExponentialBackoff::default()
        };

        retry(backoff, || async {
            match self.get(url).await {
                Ok(body) => Ok(body),
                Err(RequestFailure::Transient(e)) => {
                    warn!(url, "request failed, retrying: {}", e);
                    Err(backoff::Error::transient(e))
                }
                Err(RequestFailure::Permanent(e)) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    async fn get(&self, url: &str) -> std::result::Result<String, RequestFailure> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RequestFailure::Transient(e.into()))?;

        let status = res.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RequestFailure::Transient(Error::Fetch(format!("{} answered HTTP {}", url, status))));
        }
        if !status.is_success() {
            return Err(RequestFailure::Permanent(Error::Fetch(format!("{} answered HTTP {}", url, status))));
        }

        let body = res.text().await.map_err(|e| RequestFailure::Transient(e.into()))?;
        if body.contains("Attention Required!") || body.contains("Checking your browser") {
            return Err(RequestFailure::Permanent(Error::Fetch(format!(
                "{} returned a bot protection page",
                url
            ))));
        }
        Ok(body)
    }
}

#[async_trait]
impl ArticleSource for ArticleFetcher {
    async fn fetch_article(&self, url: &str) -> Result<Article> {
        self.fetch(url).await
    }
}

enum RequestFailure {
    Transient(Error),
    Permanent(Error),
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::StructureParseFailure(format!("bad selector {:?}: {:?}", css, e)))
}

fn first_text(doc: &Html, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Extracts article fields and the pre-filtered body from a page.
pub fn parse_article(url: &str, html: &str) -> Result<Article> {
    let doc = Html::parse_document(html);

    let title = match first_text(&doc, "h1.tm-title")? {
        Some(title) => title,
        None => first_text(&doc, "title")?.unwrap_or_else(|| "Untitled".to_string()),
    };
    let mut article = Article::new(url.to_string(), title);

    article.author = first_text(&doc, ".tm-user-info__user")?
        .and_then(|a| a.split_whitespace().next().map(str::to_string));

    let time_selector = selector("time")?;
    if let Some(time) = doc.select(&time_selector).next() {
        if let Some(datetime) = time.value().attr("datetime") {
            if let Ok(date) = chrono::DateTime::parse_from_rfc3339(datetime) {
                article.published_at = Some(date.with_timezone(&Utc));
            }
        }
    }

    article.reading_time = first_text(&doc, "span.tm-article-reading-time__label")?;

    let views_selector = selector("span.tm-icon-counter__value")?;
    article.views = doc
        .select(&views_selector)
        .last()
        .map(|el| el.text().collect::<String>().trim().to_string());

    let tag_selector = selector("a.tm-tags-list__link")?;
    article.tags = doc
        .select(&tag_selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let body = ["#post-content-body", "article", "body"]
        .iter()
        .map(|css| selector(css))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .find_map(|sel| doc.select(&sel).next());

    if let Some(body) = body {
        let img_selector = selector("img[src]")?;
        article.images = body
            .select(&img_selector)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect();
        article.body_markup = filter_body(body);
    }

    Ok(article)
}

/// Pairs comment bodies with their authors, in page order.
///
/// The second list holds the comments written by the article's author.
pub fn parse_comments(html: &str, article_author: Option<&str>) -> (Vec<Comment>, Vec<Comment>) {
    let doc = Html::parse_document(html);
    let (Ok(body_selector), Ok(author_selector)) = (
        selector("div.tm-comment__body-content"),
        selector("a.tm-user-info__username"),
    ) else {
        return (Vec::new(), Vec::new());
    };

    let mut comments = Vec::new();
    let mut author_comments = Vec::new();
    for (body, author) in doc.select(&body_selector).zip(doc.select(&author_selector)) {
        let text = body.text().collect::<String>().trim().to_string();
        let name = author.text().collect::<String>().trim().to_string();
        let comment = Comment::new(name.clone(), text);
        if article_author == Some(name.as_str()) {
            author_comments.push(comment.clone());
        }
        comments.push(comment);
    }
    (comments, author_comments)
}

/// Re-serializes `body` keeping only structural tags; other tags are
/// replaced by their children.
pub fn filter_body(body: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in body.children() {
        write_filtered(child, &mut out);
    }
    out
}

fn write_filtered(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => escape_into(text, out),
        Node::Element(el) => {
            let name = el.name();
            if DROPPED_TAGS.contains(&name) {
                return;
            }
            if name == "br" {
                out.push_str("<br>");
                return;
            }
            let kept = KEPT_TAGS.contains(&name);
            if kept {
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
            for child in node.children() {
                write_filtered(child, out);
            }
            if kept {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            } else if BLOCK_TAGS.contains(&name) {
                out.push(' ');
            }
        }
        _ => {}
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Rewrites Habr article links to `https://habr.com/<lang>/articles/<id>/`.
///
/// URLs from other hosts, or without a recognizable article id, come back
/// unchanged.
pub fn normalize_article_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.host_str().is_some_and(|h| h.contains("habr.com")) {
        return url.to_string();
    }

    let parts: Vec<String> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    let after = |marker: &str| {
        parts
            .iter()
            .position(|p| p == marker)
            .and_then(|i| parts.get(i + 1))
            .cloned()
    };
    let id = if parts.iter().any(|p| p == "amp") {
        after("publications")
    } else if parts.iter().any(|p| p == "articles") {
        after("articles")
    } else if parts.iter().any(|p| p == "post") {
        after("post")
    } else {
        parts
            .iter()
            .find(|p| p.chars().all(|c| c.is_ascii_digit()))
            .cloned()
    };
    let Some(id) = id else {
        return url.to_string();
    };

    let lang = parts
        .iter()
        .find(|p| LANGUAGES.contains(&p.as_str()))
        .map(String::as_str)
        .unwrap_or("ru");

    parsed.set_path(&format!("/{}/articles/{}/", lang, id));
    parsed.set_query(None);
    parsed.set_fragment(None);
    parsed.to_string()
}
