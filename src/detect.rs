//! Platform fingerprinting
//!
//! Each platform owns a fixed signature set; a single marker hit is enough.
//! The detector walks the signatures in priority order. The generic HTML5
//! signature (doctype, charset meta) appears on nearly every page, CMS pages
//! included, so it is always checked after every CMS signature.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::Platform;

/// Marker set identifying one platform
#[derive(Debug)]
pub struct Signature {
    pub platform: Platform,
    literals: &'static [&'static str],
    patterns: Vec<Regex>,
}

impl Signature {
    fn new(platform: Platform, literals: &'static [&'static str], patterns: &[&str]) -> Self {
        Self {
            platform,
            literals,
            patterns: patterns.iter().filter_map(|p| Regex::new(p).ok()).collect(),
        }
    }

    /// First marker found in `markup`, if any
    pub fn first_hit(&self, markup: &str) -> Option<&str> {
        if let Some(literal) = self.literals.iter().copied().find(|lit| markup.contains(lit)) {
            return Some(literal);
        }
        self.patterns
            .iter()
            .find(|re| re.is_match(markup))
            .map(|re| re.as_str())
    }

    pub fn matches(&self, markup: &str) -> bool {
        self.first_hit(markup).is_some()
    }
}

const WORDPRESS_MARKERS: &[&str] = &[
    "wp-content",
    "wp-includes",
    "wp-json",
    r#"<meta name="generator" content="WordPress"#,
    r#"class="wordpress""#,
    "/wp-admin/",
    "/wp-login.php",
];

const TILDA_MARKERS: &[&str] = &[
    "tilda.ws",
    "tildacdn.com",
    r#"<meta name="generator" content="Tilda"#,
    "data-tilda",
    r#"class="t-"#,
    r#"id="t-"#,
];

/// Tilda layout classes as whole tokens of a class list, so `content-body`
/// or `front-page` do not count
const TILDA_CLASS_TOKEN: &str =
    r#"(?i)\bclass\s*=\s*["'](?:[^"']*\s)?t-(?:body|page|records|rec)["'\s]"#;

const BITRIX_MARKERS: &[&str] = &[
    "bitrix/js",
    "bitrix/templates",
    r#"<meta name="generator" content="Bitrix"#,
    "BX.",
    "b24-widget",
    r#"class="bx-"#,
    r#"id="bx_"#,
    "<!-- Bitrix",
    "1C-Bitrix",
    "/bitrix/",
];

const HTML5_MARKERS: &[&str] = &["<html lang"];

/// Signatures in evaluation order. HTML5 must stay last.
static SIGNATURES: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    vec![
        Signature::new(Platform::WordPress, WORDPRESS_MARKERS, &[]),
        Signature::new(Platform::Tilda, TILDA_MARKERS, &[TILDA_CLASS_TOKEN]),
        Signature::new(Platform::Bitrix, BITRIX_MARKERS, &[]),
        Signature::new(
            Platform::Html5,
            HTML5_MARKERS,
            &[r"(?i)<!doctype\s+html\s*>", r#"(?i)<meta\s+charset=["']?utf-8["']?\s*/?>"#],
        ),
    ]
});

/// Signature for a single platform (`None` for `Unknown`)
pub fn signature(platform: Platform) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|sig| sig.platform == platform)
}

/// Determine the platform that produced `markup`.
pub fn detect(markup: &str) -> Platform {
    for sig in SIGNATURES.iter() {
        if let Some(marker) = sig.first_hit(markup) {
            debug!(platform = %sig.platform, marker, "platform signature matched");
            return sig.platform;
        }
    }
    Platform::Unknown
}

/// Every platform whose signature matches, in evaluation order
pub fn detect_all(markup: &str) -> Vec<Platform> {
    SIGNATURES
        .iter()
        .filter(|sig| sig.matches(markup))
        .map(|sig| sig.platform)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cms_wins_over_generic_html5() {
        let html = r#"<!DOCTYPE html><html lang="ru"><head><meta charset="UTF-8">
            <link rel="stylesheet" href="/wp-content/themes/x/style.css"></head></html>"#;
        assert_eq!(detect(html), Platform::WordPress);
        assert_eq!(detect_all(html), vec![Platform::WordPress, Platform::Html5]);
    }

    #[test]
    fn test_each_cms() {
        assert_eq!(
            detect(r#"<!DOCTYPE html><div id="allrecords" class="t-records"></div>"#),
            Platform::Tilda
        );
        assert_eq!(
            detect(r#"<!doctype html><script src="/bitrix/js/main/core/core.js"></script>"#),
            Platform::Bitrix
        );
    }

    #[test]
    fn test_tilda_class_tokens() {
        assert_eq!(detect(r#"<body class="t-body"><div class="r t-rec">x</div></body>"#), Platform::Tilda);
        assert_eq!(detect(r#"<div id="rec1" class="r t-rec" data-record-type="1"></div>"#), Platform::Tilda);
    }

    #[test]
    fn test_similar_class_names_stay_generic() {
        let html = r#"<!DOCTYPE html><html lang="en"><body class="front-page">
            <div class="content-body"><section class="about-page t-recipe">text</section></div></body></html>"#;
        assert_eq!(detect(html), Platform::Html5);
    }

    #[test]
    fn test_generic_and_unknown() {
        assert_eq!(detect("<!doctype html><html><body>hi</body></html>"), Platform::Html5);
        assert_eq!(detect(r#"<html><head><meta charset="utf-8"></head></html>"#), Platform::Html5);
        assert_eq!(detect("<div>fragment</div>"), Platform::Unknown);
    }

    #[test]
    fn test_detected_cms_always_has_marker() {
        let pages = [
            "<p>plain</p>",
            r#"<!DOCTYPE html><img src="https://static.tildacdn.com/a.png">"#,
            "<html lang=\"en\"><body>BX.ready()</body></html>",
        ];
        for page in pages {
            let platform = detect(page);
            if platform.is_cms() {
                assert!(signature(platform).unwrap().matches(page));
            }
        }
    }
}
