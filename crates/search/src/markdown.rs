//! Restricted markdown subset used by company research summaries
//!
//! Exactly four rules apply:
//! - `**text**` becomes a strong span
//! - a line starting with `- ` becomes a list item; consecutive items share one list
//! - a blank line becomes an explicit break
//! - any other line becomes a paragraph
//!
//! Everything else (headings, links, tables, ...) stays literal paragraph text.

use serde::Serialize;

/// Inline run inside a paragraph or list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Strong(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Vec<Inline>),
    List(Vec<Vec<Inline>>),
    Break,
}

/// Parsed research content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Parse `content` into blocks
pub fn parse(content: &str) -> Document {
    let mut blocks: Vec<Block> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            blocks.push(Block::Break);
            continue;
        }

        match line.strip_prefix("- ") {
            Some(item) => {
                let item = parse_inline(item);
                match blocks.last_mut() {
                    Some(Block::List(items)) => items.push(item),
                    _ => blocks.push(Block::List(vec![item])),
                }
            }
            None => blocks.push(Block::Paragraph(parse_inline(line))),
        }
    }

    Document { blocks }
}

/// Split a line into text and `**strong**` runs; an unmatched `**` stays literal
fn parse_inline(line: &str) -> Vec<Inline> {
    let mut runs = Vec::new();
    let mut text = String::new();
    let mut rest = line;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        match after.find("**") {
            Some(close) if close > 0 => {
                text.push_str(&rest[..open]);
                if !text.is_empty() {
                    runs.push(Inline::Text(std::mem::take(&mut text)));
                }
                runs.push(Inline::Strong(after[..close].to_string()));
                rest = &after[close + 2..];
            }
            _ => {
                text.push_str(&rest[..open + 2]);
                rest = after;
            }
        }
    }

    text.push_str(rest);
    if !text.is_empty() {
        runs.push(Inline::Text(text));
    }
    runs
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render as HTML; all text is escaped
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(runs) => {
                    html.push_str("<p>");
                    push_runs(&mut html, runs);
                    html.push_str("</p>");
                }
                Block::List(items) => {
                    html.push_str("<ul>");
                    for item in items {
                        html.push_str("<li>");
                        push_runs(&mut html, item);
                        html.push_str("</li>");
                    }
                    html.push_str("</ul>");
                }
                Block::Break => html.push_str("<br>"),
            }
        }
        html
    }
}

fn push_runs(html: &mut String, runs: &[Inline]) {
    for run in runs {
        match run {
            Inline::Text(text) => push_escaped(html, text),
            Inline::Strong(text) => {
                html.push_str("<strong>");
                push_escaped(html, text);
                html.push_str("</strong>");
            }
        }
    }
}

fn push_escaped(html: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            _ => html.push(c),
        }
    }
}
