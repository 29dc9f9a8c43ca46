//! Markup helpers shared by the locators and component extractors
//!
//! Two families live here: selector queries over an already parsed element
//! (scraper), and raw-markup scanning that pairs an opening tag with its
//! matching close tag by counting nesting depth.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Any start or end tag. Group 1 marks an end tag, group 2 is the name,
/// group 3 the attribute tail (a trailing `/` makes it self-closing).
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").unwrap());

static MARKUP_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// A balanced element cut out of raw markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub tag: &'a str,
    /// Byte offset of the opening tag in the scanned markup
    pub start: usize,
    /// Opening tag through matching closing tag
    pub outer: &'a str,
    /// Everything between the opening and closing tag
    pub inner: &'a str,
}

/// Find the close tag balancing an element opened at `content_start`.
///
/// Returns `(close_start, close_end)` byte offsets into `markup`, or `None`
/// when the element is never closed.
fn find_balanced_close(markup: &str, tag: &str, content_start: usize) -> Option<(usize, usize)> {
    let mut depth = 1usize;

    for caps in TAG_RE.captures_iter(&markup[content_start..]) {
        if !caps[2].eq_ignore_ascii_case(tag) {
            continue;
        }
        let whole = caps.get(0)?;
        if !caps[1].is_empty() {
            depth -= 1;
            if depth == 0 {
                return Some((content_start + whole.start(), content_start + whole.end()));
            }
        } else if !caps[3].trim_end().ends_with('/') {
            depth += 1;
        }
    }

    None
}

fn balanced_at<'a>(markup: &'a str, caps: &regex::Captures<'a>) -> Option<Fragment<'a>> {
    let whole = caps.get(0)?;
    let tag = caps.name("tag")?;
    let (close_start, close_end) = find_balanced_close(markup, tag.as_str(), whole.end())?;
    Some(Fragment {
        tag: tag.as_str(),
        start: whole.start(),
        outer: &markup[whole.start()..close_end],
        inner: &markup[whole.end()..close_start],
    })
}

/// All balanced elements whose opening tag matches `open`.
///
/// `open` must expose the element name as the named group `tag`. Opening tags
/// that are never closed are skipped.
pub fn balanced_fragments<'a>(markup: &'a str, open: &Regex) -> Vec<Fragment<'a>> {
    open.captures_iter(markup)
        .filter_map(|caps| balanced_at(markup, &caps))
        .collect()
}

/// First balanced element whose opening tag matches `open`; scanning stops
/// at the first hit.
pub fn first_fragment<'a>(markup: &'a str, open: &Regex) -> Option<Fragment<'a>> {
    open.captures_iter(markup)
        .find_map(|caps| balanced_at(markup, &caps))
}

/// First balanced element for the first pattern that yields one
pub fn first_balanced<'a>(markup: &'a str, patterns: &[Regex]) -> Option<Fragment<'a>> {
    patterns.iter().find_map(|re| first_fragment(markup, re))
}

/// Opening (not closing) `tag` tags in `markup`
pub fn count_open_tags(markup: &str, tag: &str) -> usize {
    TAG_RE
        .captures_iter(markup)
        .filter(|caps| caps[1].is_empty() && caps[2].eq_ignore_ascii_case(tag))
        .count()
}

/// Strip tags from a raw markup snippet and collapse whitespace
pub fn strip_tags(snippet: &str) -> String {
    collapse_whitespace(&MARKUP_TAG_RE.replace_all(snippet, " "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, whitespace collapsed
pub fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Parse a selector, treating an invalid one as matching nothing
pub fn selector(selector_str: &str) -> Option<Selector> {
    Selector::parse(selector_str).ok()
}

/// Elements under `root` matching a CSS selector
pub fn select_all<'a>(root: &ElementRef<'a>, selector_str: &str) -> Vec<ElementRef<'a>> {
    match selector(selector_str) {
        Some(sel) => root.select(&sel).collect(),
        None => vec![],
    }
}

/// First element under `root` matching a CSS selector
pub fn select_first<'a>(root: &ElementRef<'a>, selector_str: &str) -> Option<ElementRef<'a>> {
    let sel = selector(selector_str)?;
    root.select(&sel).next()
}

pub fn count(root: &ElementRef, selector_str: &str) -> usize {
    match selector(selector_str) {
        Some(sel) => root.select(&sel).count(),
        None => 0,
    }
}

pub fn exists(root: &ElementRef, selector_str: &str) -> bool {
    select_first(root, selector_str).is_some()
}

/// A CSS selector optionally narrowed by text content or by a descendant,
/// for the `:contains(..)` / `:has(..)` forms CSS engines lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub selector: &'static str,
    /// Case-insensitive substring of the element's text
    pub contains: Option<&'static str>,
    /// Selector some descendant must match
    pub has: Option<&'static str>,
}

impl Query {
    pub const fn css(selector: &'static str) -> Self {
        Self { selector, contains: None, has: None }
    }

    pub const fn containing(selector: &'static str, needle: &'static str) -> Self {
        Self { selector, contains: Some(needle), has: None }
    }

    pub const fn having(selector: &'static str, descendant: &'static str) -> Self {
        Self { selector, contains: None, has: Some(descendant) }
    }

    fn accepts(&self, element: &ElementRef) -> bool {
        let text_ok = self.contains.is_none_or(|needle| {
            element_text(element).to_lowercase().contains(&needle.to_lowercase())
        });
        text_ok && self.has.is_none_or(|descendant| exists(element, descendant))
    }

    pub fn all<'a>(&self, root: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
        select_all(root, self.selector)
            .into_iter()
            .filter(|el| self.accepts(el))
            .collect()
    }

    pub fn first<'a>(&self, root: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        select_all(root, self.selector)
            .into_iter()
            .find(|el| self.accepts(el))
    }
}

/// Text of `element` when it is a link, otherwise of every link inside it
pub fn own_or_nested_link_texts(element: &ElementRef) -> Vec<String> {
    let links = if element.value().name() == "a" {
        vec![*element]
    } else {
        select_all(element, "a")
    };
    links
        .iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// `href` of `element` when it is a link, otherwise of every link inside it
pub fn own_or_nested_hrefs(element: &ElementRef) -> Vec<String> {
    let links = if element.value().name() == "a" {
        vec![*element]
    } else {
        select_all(element, "a")
    };
    links
        .iter()
        .filter_map(|link| link.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(String::from)
        .collect()
}

/// Matches of `selector_str` that are not nested inside another match
pub fn select_outermost<'a>(root: &ElementRef<'a>, selector_str: &str) -> Vec<ElementRef<'a>> {
    let matched = select_all(root, selector_str);
    let ids: Vec<_> = matched.iter().map(|el| el.id()).collect();

    matched
        .into_iter()
        .filter(|el| !el.ancestors().any(|node| ids.contains(&node.id())))
        .collect()
}

/// Non-empty trimmed link texts under every element matched by `selector_str`
pub fn link_texts(root: &ElementRef, selector_str: &str) -> Vec<String> {
    select_outermost(root, selector_str)
        .iter()
        .flat_map(|container| select_all(container, "a"))
        .map(|link| element_text(&link))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Non-empty `href` values of links under every element matched by `selector_str`
pub fn link_hrefs(root: &ElementRef, selector_str: &str) -> Vec<String> {
    select_outermost(root, selector_str)
        .iter()
        .flat_map(|container| select_all(container, "a"))
        .filter_map(|link| link.value().attr("href").map(String::from))
        .filter(|href| !href.is_empty())
        .collect()
}
