//! Content segmentation for generic (non-CMS) pages

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::config::ParserConfig;
use crate::markup::{self, element_text};

/// Elements considered as content sections
pub const CANDIDATE_SELECTOR: &str = "section, div.section, div[class*='section'], \
    div[class*='block'], div[class*='container'], div.content, main > div";

/// A DOM subtree that may become a content block
#[derive(Debug, Clone)]
pub struct CandidateSection<'a> {
    pub element: ElementRef<'a>,
    /// Serialized element; identity for deduplication
    pub outer_html: String,
    pub inner_html: String,
}

/// `element` is `container` or lies inside it
pub fn is_within(element: &ElementRef, container: &ElementRef) -> bool {
    element.id() == container.id() || element.ancestors().any(|node| node.id() == container.id())
}

fn has_image(element: &ElementRef) -> bool {
    markup::exists(element, "img")
}

/// Candidate sections in document order, outside the header and footer,
/// deduplicated by markup and without noise.
pub fn segment<'a>(
    document: &'a Html,
    header: Option<ElementRef<'a>>,
    footer: Option<ElementRef<'a>>,
    config: &ParserConfig,
) -> Vec<CandidateSection<'a>> {
    let Some(selector) = markup::selector(CANDIDATE_SELECTOR) else {
        return vec![];
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut sections = Vec::new();

    for element in document.select(&selector) {
        if header.is_some_and(|h| is_within(&element, &h))
            || footer.is_some_and(|f| is_within(&element, &f))
        {
            continue;
        }

        let outer_html = element.html();
        if !seen.insert(outer_html.clone()) {
            continue;
        }

        let with_image = has_image(&element);
        if !with_image && element_text(&element).chars().count() < config.min_text_len {
            continue;
        }
        let inner_html = element.inner_html();
        if !with_image && inner_html.len() < config.min_html_len {
            continue;
        }

        sections.push(CandidateSection {
            element,
            outer_html,
            inner_html,
        });
    }

    debug!(count = sections.len(), "content candidates after filtering");
    sections
}
