//! Main-content selection for HTML pages.
//!
//! Paragraphs are scored by length and comma count and their scores are
//! credited to the enclosing container (full) and the container above it
//! (half). Containers start from a tag score plus a class/id weight, and
//! the total is scaled down by link density. The winner's block elements
//! become paragraphs separated by blank lines.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;

/// Elements never considered part of the readable text.
const STRIPPED_TAGS: [&str; 13] = [
    "script", "style", "nav", "header", "footer", "aside", "form", "noscript", "iframe", "svg",
    "template", "button", "select",
];

const CANDIDATE_TAGS: [&str; 6] = ["article", "main", "section", "div", "td", "blockquote"];

const BLOCK_TAGS: [&str; 21] = [
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "dl", "dt", "dd", "pre",
    "blockquote", "div", "section", "article", "main", "figcaption", "br",
];

const MIN_PARAGRAPH_CHARS: usize = 25;
const MIN_CANDIDATE_SCORE: f64 = 10.0;
const CLASS_WEIGHT: f64 = 25.0;

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)")
        .expect("static regex compile")
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|share|shoutbox|sidebar|skyscraper|social|sponsor|ad-break|agegate|pagination|pager|popup|promo|widget)")
        .expect("static regex compile")
});

static COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(comment|disqus|respond)").expect("static regex compile"));

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("static regex compile"));

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\s*/?\s*[a-zA-Z][^>]*>").expect("static regex compile"));

/// Returns the readable text of a full HTML document, or an empty string
/// when nothing readable was found.
#[must_use]
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document.root_element();

    if let Some(best) = best_candidate(root) {
        let text = render_blocks(best);
        if !text.is_empty() {
            return text;
        }
    }

    fallback_paragraphs(root)
}

/// Renders embedded feed content, which may be an HTML fragment or plain
/// text. No readability scoring is applied; the whole item is the article.
#[must_use]
pub fn render_fragment(content: &str) -> String {
    if !MARKUP.is_match(content) {
        return normalize_plain_text(content);
    }
    let fragment = Html::parse_fragment(content);
    render_blocks(fragment.root_element())
}

/// Collapses whitespace inside paragraphs and keeps blank-line breaks.
#[must_use]
pub fn normalize_plain_text(text: &str) -> String {
    PARAGRAPH_BREAK
        .split(text)
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn best_candidate(root: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut index = HashMap::new();
    let mut candidates: Vec<(ElementRef<'_>, f64)> = Vec::new();

    for node in root.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if !matches!(element.value().name(), "p" | "pre") || is_stripped(element) {
            continue;
        }

        let text = collapse_whitespace(&visible_text(element));
        let chars = text.chars().count();
        if chars < MIN_PARAGRAPH_CHARS {
            continue;
        }
        let commas = text.matches(',').count().min(3) as f64;
        let length_bonus = (chars / 100).min(3) as f64;
        let score = 1.0 + commas + length_bonus;

        let ancestors = element.ancestors().filter_map(ElementRef::wrap).take(2);
        for (level, ancestor) in ancestors.enumerate() {
            if !CANDIDATE_TAGS.contains(&ancestor.value().name()) {
                continue;
            }
            let slot = *index.entry(ancestor.id()).or_insert_with(|| {
                candidates.push((ancestor, initial_score(ancestor)));
                candidates.len() - 1
            });
            candidates[slot].1 += if level == 0 { score } else { score / 2.0 };
        }
    }

    let mut best: Option<(ElementRef<'_>, f64)> = None;
    for (element, score) in candidates {
        let score = score * (1.0 - link_density(element));
        if score < MIN_CANDIDATE_SCORE {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((element, score));
        }
    }
    best.map(|(element, _)| element)
}

fn initial_score(element: ElementRef<'_>) -> f64 {
    let base = match element.value().name() {
        "article" | "main" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        _ => 0.0,
    };
    base + class_id_weight(element)
}

fn class_id_weight(element: ElementRef<'_>) -> f64 {
    let mut names = Vec::new();
    if let Some(id) = element.value().attr("id") {
        names.push(id);
    }
    if let Some(class) = element.value().attr("class") {
        names.extend(class.split_whitespace());
    }

    for name in names {
        if POSITIVE.is_match(name) {
            return CLASS_WEIGHT;
        }
        if NEGATIVE.is_match(name) {
            return -CLASS_WEIGHT;
        }
    }
    0.0
}

fn link_density(element: ElementRef<'_>) -> f64 {
    let total = collapse_whitespace(&visible_text(element)).chars().count();
    if total == 0 {
        return 0.0;
    }
    let linked: usize = element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "a")
        .map(|a| collapse_whitespace(&visible_text(a)).chars().count())
        .sum();
    (linked as f64 / total as f64).min(1.0)
}

fn is_stripped(element: ElementRef<'_>) -> bool {
    STRIPPED_TAGS.contains(&element.value().name())
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| STRIPPED_TAGS.contains(&a.value().name()))
}

fn is_comment_section(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("id").is_some_and(|id| COMMENTS.is_match(id))
        || value.attr("class").is_some_and(|c| COMMENTS.is_match(c))
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child)
                    && !STRIPPED_TAGS.contains(&child.value().name())
                {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_blocks(root: ElementRef<'_>) -> String {
    let mut blocks = Vec::new();
    let mut current = String::new();
    render_into(root, &mut blocks, &mut current);
    flush(&mut blocks, &mut current);
    blocks.join("\n\n")
}

fn render_into(element: ElementRef<'_>, blocks: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if STRIPPED_TAGS.contains(&name) || name == "table" || is_comment_section(child) {
                    continue;
                }
                if BLOCK_TAGS.contains(&name) {
                    flush(blocks, current);
                    render_into(child, blocks, current);
                    flush(blocks, current);
                } else {
                    render_into(child, blocks, current);
                }
            }
            _ => {}
        }
    }
}

fn flush(blocks: &mut Vec<String>, current: &mut String) {
    let text = collapse_whitespace(current);
    if !text.is_empty() {
        blocks.push(text);
    }
    current.clear();
}

fn fallback_paragraphs(root: ElementRef<'_>) -> String {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "p" && !is_stripped(*e))
        .filter(|e| {
            !e.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "table")
        })
        .map(|p| collapse_whitespace(&visible_text(p)))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
