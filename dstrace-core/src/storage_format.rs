//! Render a (transformed) notebook as Confluence storage-format XHTML.
//!
//! Honors the markers left by the transform stages: code cells tagged
//! `noinput` are rendered without their source, and collapsed cells end up
//! inside an `expand` macro. Binary outputs (images, widgets) are skipped.
//!
//! Storage format is XHTML, so HTML is only passed through when it parses as
//! well-formed XML. Other HTML (`<br>`, `&nbsp;`, unclosed tags) is shown as
//! text instead of failing the page update.

use std::sync::OnceLock;

use pulldown_cmark::{html, Event, Options, Parser};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::directive::NO_INPUT_TAG;
use crate::notebook::{Cell, CellType, Notebook};

const DEFAULT_LANGUAGE: &str = "python";

pub fn render_notebook(notebook: &Notebook) -> String {
    let language = notebook.language().unwrap_or(DEFAULT_LANGUAGE);
    let mut body = String::new();
    for cell in &notebook.cells {
        let rendered = render_cell(cell, language);
        if rendered.is_empty() {
            continue;
        }
        if cell.is_collapsed() {
            body.push_str(r#"<ac:structured-macro ac:name="expand"><ac:rich-text-body>"#);
            body.push_str(&rendered);
            body.push_str("</ac:rich-text-body></ac:structured-macro>");
        } else {
            body.push_str(&rendered);
        }
    }
    body
}

fn render_cell(cell: &Cell, language: &str) -> String {
    match &cell.cell_type {
        CellType::Markdown => markdown_to_html(&cell.source.concat()),
        CellType::Code => {
            let mut out = String::new();
            if !cell.has_tag(NO_INPUT_TAG) && !cell.is_empty() {
                out.push_str(&code_macro(&cell.source.concat(), language));
            }
            for output in cell.outputs.iter().flatten() {
                out.push_str(&render_output(output));
            }
            out
        }
        other => {
            debug!(cell_type = ?other, "Skipping non-renderable cell");
            String::new()
        }
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(
        markdown,
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
    )
    .map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

fn code_macro(code: &str, language: &str) -> String {
    format!(
        concat!(
            r#"<ac:structured-macro ac:name="code">"#,
            r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
            "<ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body>",
            "</ac:structured-macro>"
        ),
        escape(language),
        code.trim_end().replace("]]>", "]]]]><![CDATA[>")
    )
}

fn render_output(output: &Value) -> String {
    let kind = output.get("output_type").and_then(Value::as_str);
    match kind {
        Some("stream") => preformatted(&multiline(output.get("text"))),
        Some("execute_result") | Some("display_data") => {
            let Some(data) = output.get("data") else {
                return String::new();
            };
            let html = data.get("text/html").map(|h| multiline(Some(h)));
            if let Some(html) = html.as_deref().filter(|h| is_xhtml(h)) {
                html.to_string()
            } else if let Some(md) = data.get("text/markdown") {
                markdown_to_html(&multiline(Some(md)))
            } else if let Some(text) = data.get("text/plain") {
                preformatted(&multiline(Some(text)))
            } else if let Some(html) = html {
                debug!("HTML output is not well-formed XHTML; rendering as text");
                preformatted(&html)
            } else {
                debug!("Skipping output without a text representation");
                String::new()
            }
        }
        Some("error") => {
            let traceback = output
                .get("traceback")
                .and_then(Value::as_array)
                .map(|lines| {
                    lines
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default();
            preformatted(&strip_ansi(&traceback))
        }
        other => {
            debug!(output_type = ?other, "Skipping unknown output type");
            String::new()
        }
    }
}

fn is_xhtml(fragment: &str) -> bool {
    roxmltree::Document::parse(&format!("<div>{fragment}</div>")).is_ok()
}

/// Notebook "multiline strings" are either a string or a list of strings.
fn multiline(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn preformatted(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("<pre>{}</pre>", escape(text.trim_end()))
}

fn strip_ansi(text: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI pattern"))
        .replace_all(text, "")
        .into_owned()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
