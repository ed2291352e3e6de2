//! Server-side HTML for the web front end.
//!
//! Pages are plain strings. Every interpolated value goes through
//! [`escape_html`]; the model's Markdown summary is converted with
//! pulldown-cmark; raw HTML inside it is shown as text and link targets are
//! limited to web and mail URLs.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::types::{Analysis, VideoId};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }
header a { color: inherit; text-decoration: none; }
form { display: flex; gap: .5rem; margin: 1.5rem 0; }
input[type=url] { flex: 1; padding: .6rem; font-size: 1rem; }
button { padding: .6rem 1.2rem; font-size: 1rem; cursor: pointer; }
.error { background: #ffebe9; border: 1px solid #ff8182; padding: 1rem; border-radius: 6px; }
.meta { color: #59636e; }
details pre { white-space: pre-wrap; background: #f6f8fa; padding: 1rem; border-radius: 6px; }
"#;

const URL_FORM: &str = r#"<form action="/analyze" method="post">
<input type="url" name="youtube_url" placeholder="https://www.youtube.com/watch?v=..." required>
<button type="submit">Summarize</button>
</form>"#;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Relative URLs and the `http`, `https` and `mailto` schemes.
fn is_safe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match normalized.find([':', '/', '?', '#']) {
        Some(i) if normalized[i..].starts_with(':') => {
            matches!(&normalized[..i], "http" | "https" | "mailto")
        }
        _ => true,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Markdown to HTML. Raw HTML blocks and inline tags are escaped, and link or
/// image targets with any other scheme than http(s) or mailto become `#`.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            }),
            other => other,
        });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<header><h1><a href="/">Recap</a></h1></header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

pub fn home_page() -> String {
    let body = format!(
        "<p>Paste a YouTube link to get a structured summary of the video.</p>\n{URL_FORM}\n\
         <p class=\"meta\"><a href=\"/index\">How it works</a></p>"
    );
    page("Recap", &body)
}

pub fn index_page() -> String {
    let body = format!(
        "<h2>How it works</h2>\n\
         <ol>\n\
         <li>The video's captions are downloaded, English first, otherwise the first track available.</li>\n\
         <li>Captions in other languages are machine-translated to English.</li>\n\
         <li>The first 5000 words are sent to a language model for a sectioned summary.</li>\n\
         </ol>\n\
         <p>Videos without subtitles cannot be summarized.</p>\n\
         {URL_FORM}"
    );
    page("Recap: how it works", &body)
}

fn video_link(video_id: &VideoId) -> String {
    let id = escape_html(video_id.as_str());
    format!(
        "<p class=\"meta\">Video: <a href=\"https://www.youtube.com/watch?v={id}\">{id}</a></p>"
    )
}

pub fn result_page(analysis: &Analysis) -> String {
    let mut body = String::new();
    body.push_str(&video_link(&analysis.video_id));
    body.push_str(&format!(
        "<p class=\"meta\">Transcript language: {}</p>\n",
        escape_html(&analysis.language)
    ));
    body.push_str("<section class=\"summary\">\n");
    body.push_str(&markdown_to_html(&analysis.summary));
    body.push_str("</section>\n");
    body.push_str(&format!(
        "<details><summary>Transcript</summary><pre>{}</pre></details>\n",
        escape_html(&analysis.transcript)
    ));
    body.push_str(URL_FORM);
    page("Recap: summary", &body)
}

pub fn error_page(message: &str, video_id: Option<&VideoId>) -> String {
    let mut body = format!("<div class=\"error\">{}</div>\n", escape_html(message));
    if let Some(video_id) = video_id {
        body.push_str(&video_link(video_id));
    }
    body.push_str(URL_FORM);
    page("Recap: error", &body)
}
