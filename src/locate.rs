//! Structural locator: finds the single best header or footer candidate
//!
//! A [`Cascade`] is an ordered list of strategies, first hit wins. DOM
//! strategies come first; raw-markup strategies come last and close each
//! opening tag by depth counting, so nested markup of the same tag never
//! truncates or overruns the located element.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::markup::{self, Fragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Header,
    Footer,
}

#[derive(Debug)]
pub enum Strategy {
    /// First element matching a CSS selector
    First(&'static str),
    /// Last element matching a CSS selector
    Last(&'static str),
    /// Opening-tag regex over raw markup (must capture the name as `tag`)
    Raw(Regex),
}

impl Strategy {
    /// Raw strategy from a pattern; `None` if the pattern does not compile
    pub fn raw(pattern: &str) -> Option<Self> {
        Regex::new(pattern).ok().map(Strategy::Raw)
    }

    fn apply<'a>(&self, document: Option<&'a Html>, markup: &'a str) -> Option<Located<'a>> {
        match self {
            Strategy::First(sel) => {
                let sel = markup::selector(sel)?;
                document?.select(&sel).next().map(Located::Element)
            }
            Strategy::Last(sel) => {
                let sel = markup::selector(sel)?;
                document?.select(&sel).last().map(Located::Element)
            }
            Strategy::Raw(re) => markup::first_fragment(markup, re).map(Located::Fragment),
        }
    }

    fn describe(&self) -> &str {
        match self {
            Strategy::First(sel) | Strategy::Last(sel) => sel,
            Strategy::Raw(re) => re.as_str(),
        }
    }
}

/// Where a header/footer was found
#[derive(Debug, Clone, Copy)]
pub enum Located<'a> {
    Element(ElementRef<'a>),
    Fragment(Fragment<'a>),
}

impl<'a> Located<'a> {
    /// Serialized content of the located element (without its own tags)
    pub fn inner_html(&self) -> String {
        match self {
            Located::Element(el) => el.inner_html(),
            Located::Fragment(fragment) => fragment.inner.to_string(),
        }
    }

    pub fn element(&self) -> Option<ElementRef<'a>> {
        match self {
            Located::Element(el) => Some(*el),
            Located::Fragment(_) => None,
        }
    }

    /// Node of `document` for this hit; raw hits are mapped back with
    /// [`resolve_fragment`].
    pub fn dom_element(&self, document: &'a Html, markup: &str) -> Option<ElementRef<'a>> {
        match self {
            Located::Element(el) => Some(*el),
            Located::Fragment(fragment) => resolve_fragment(document, markup, fragment),
        }
    }
}

/// Element of `document` (parsed from `markup`) that a raw fragment was cut from.
///
/// The n-th raw opening tag of a name is taken as the n-th element of that
/// name, and it must carry the fragment's `id` and `class` values.
pub fn resolve_fragment<'d>(
    document: &'d Html,
    markup: &str,
    fragment: &Fragment,
) -> Option<ElementRef<'d>> {
    let preceding = markup::count_open_tags(markup.get(..fragment.start)?, fragment.tag);
    let sel = markup::selector(&fragment.tag.to_ascii_lowercase())?;
    let element = document.select(&sel).nth(preceding)?;

    let opening = &fragment.outer[..=fragment.outer.find('>')?];
    let same_node = ["id", "class"]
        .iter()
        .all(|name| element.value().attr(name).is_none_or(|value| opening.contains(value)));
    same_node.then_some(element)
}

/// Root element of a raw fragment re-parsed into `scratch`.
pub fn fragment_root<'d>(scratch: &'d Html, fragment: &Fragment) -> Option<ElementRef<'d>> {
    let sel = markup::selector(fragment.tag)?;
    scratch.select(&sel).next()
}

/// Ordered strategy list
#[derive(Debug)]
pub struct Cascade {
    strategies: Vec<Strategy>,
}

impl Cascade {
    /// DOM selectors first (in order), then raw patterns (in order)
    pub fn new(strategies: Vec<Strategy>, raw_patterns: &[&str]) -> Self {
        let mut strategies = strategies;
        strategies.extend(raw_patterns.iter().filter_map(|p| Strategy::raw(p)));
        Self { strategies }
    }

    /// Selector-only chain followed by raw patterns
    pub fn from_selectors(selectors: &[&'static str], raw_patterns: &[&str]) -> Self {
        Self::new(selectors.iter().map(|s| Strategy::First(*s)).collect(), raw_patterns)
    }

    /// Run the cascade. With no document only raw strategies can hit.
    pub fn locate<'a>(&self, document: Option<&'a Html>, markup: &'a str) -> Option<Located<'a>> {
        self.strategies.iter().find_map(|strategy| {
            let located = strategy.apply(document, markup)?;
            debug!(strategy = strategy.describe(), "structural strategy matched");
            Some(located)
        })
    }
}

/// Opening `<header>`/`<footer>`-like tags for the raw fallback
pub fn raw_semantic_tag(tag: &str) -> String {
    format!(r"(?i)<(?P<tag>{tag})(?:\s[^>]*)?>")
}

/// Opening tag (one of `tags`, regex alternation) with an attribute from
/// `attrs` whose value contains one of `needles`
pub fn raw_named(tags: &str, attrs: &str, needles: &str) -> String {
    format!(
        r#"(?i)<(?P<tag>{tags})\s[^>]*?\b(?:{attrs})\s*=\s*["'][^"']*(?:{needles})[^"']*["'][^>]*>"#
    )
}

/// Opening `<div>` whose class or id contains `needle`
pub fn raw_div_named(needle: &str) -> String {
    raw_named("div", "class|id", needle)
}

static HEADER: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::from_selectors(
        &[
            "header",
            "[role='banner']",
            "div.header",
            "div#header",
            ".site-header",
            "#site-header",
            ".main-header",
            "#main-header",
        ],
        &[raw_semantic_tag("header").as_str(), raw_div_named("header").as_str()],
    )
});

static FOOTER: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::from_selectors(
        &[
            "footer",
            "[role='contentinfo']",
            "div.footer",
            "div#footer",
            ".site-footer",
            "#site-footer",
            ".main-footer",
            "#main-footer",
        ],
        &[raw_semantic_tag("footer").as_str(), raw_div_named("footer").as_str()],
    )
});

/// Generic cascade for a role: semantic tag, role attribute, class/id names,
/// then raw markup.
pub fn generic_cascade(role: Role) -> &'static Cascade {
    match role {
        Role::Header => &HEADER,
        Role::Footer => &FOOTER,
    }
}

pub fn locate<'a>(document: &'a Html, markup: &'a str, role: Role) -> Option<Located<'a>> {
    generic_cascade(role).locate(Some(document), markup)
}
