//! Static HTML page rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use crate::article::Article;
use crate::rss::is_valid_url;

const STYLESHEET: &str = "body{font-family:-apple-system,BlinkMacSystemFont,\"Segoe UI\",Helvetica,Arial,sans-serif;max-width:48rem;margin:0 auto;padding:1rem;color:#222;line-height:1.4}\
h1{font-size:1.6rem;border-bottom:1px solid #ddd;padding-bottom:.5rem}\
article.item{margin:1.2rem 0}\
article.item h2{font-size:1.1rem;margin:0 0 .2rem}\
article.item time{font-size:.8rem;color:#777}\
article.item p{margin:.3rem 0 0;color:#444}\
footer{font-size:.8rem;color:#777;margin-top:2rem}";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to format page: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Everything besides the articles that ends up in the page.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub title: String,
    /// Shown in the footer when set. Left out of the page otherwise, so the
    /// output depends only on the articles and the title.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: "prtech.news".to_string(),
            generated_at: None,
        }
    }
}

/// Render the ordered articles into one self-contained HTML document.
pub fn render_page(articles: &[Article], options: &PageOptions) -> Result<Vec<u8>, RenderError> {
    let title = encode_text(&options.title);
    let mut html = String::with_capacity(1024 + articles.len() * 512);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    )?;
    writeln!(html, "<title>{}</title>", title)?;
    writeln!(html, "<style>{}</style>", STYLESHEET)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<header><h1>{}</h1></header>", title)?;
    writeln!(html, "<main>")?;

    if articles.is_empty() {
        writeln!(html, "<p class=\"empty\">No matching articles.</p>")?;
    }

    for article in articles {
        write_article(&mut html, article)?;
    }

    writeln!(html, "</main>")?;
    if let Some(generated_at) = options.generated_at {
        writeln!(
            html,
            "<footer>Updated <time datetime=\"{0}\">{0}</time></footer>",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
    }
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    Ok(html.into_bytes())
}

fn write_article(html: &mut String, article: &Article) -> Result<(), RenderError> {
    let title = encode_text(&article.title);

    writeln!(html, "<article class=\"item\">")?;
    // Anything other than http(s), e.g. `javascript:`, loses its link.
    if is_valid_url(&article.link) {
        writeln!(
            html,
            "<h2><a href=\"{}\" rel=\"noopener noreferrer\">{}</a></h2>",
            encode_double_quoted_attribute(&article.link),
            title
        )?;
    } else {
        writeln!(html, "<h2>{}</h2>", title)?;
    }
    if let Some(published) = article.published {
        writeln!(
            html,
            "<time datetime=\"{}\">{}</time>",
            published.to_rfc3339_opts(SecondsFormat::Secs, true),
            published.format("%Y-%m-%d %H:%M UTC")
        )?;
    }
    if !article.description.is_empty() {
        writeln!(html, "<p>{}</p>", encode_text(&article.description))?;
    }
    writeln!(html, "</article>")?;

    Ok(())
}
