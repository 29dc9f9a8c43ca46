//! WordPress: regions and components are cut straight out of the raw markup.
//!
//! Every element is closed by depth counting (see [`crate::markup`]), so a
//! `<div class="header">` with nested `<div>`s is captured whole and nothing
//! after its real closing tag leaks in.

use std::sync::LazyLock;

use regex::Regex;

use super::{put_list, put_text, PlatformParser};
use crate::locate::{raw_div_named, raw_named, raw_semantic_tag};
use crate::markup::{self, balanced_fragments, first_balanced, first_fragment, strip_tags};
use crate::model::{Block, BlockType, Content, Platform};

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

static HEADER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        raw_semantic_tag("header"),
        raw_named("[a-z][a-z0-9]*", "role", "banner"),
        raw_div_named("site-header"),
        raw_div_named("header"),
    ])
});

static FOOTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        raw_semantic_tag("footer"),
        raw_named("[a-z][a-z0-9]*", "role", "contentinfo"),
        raw_div_named("site-footer"),
        raw_div_named("footer"),
    ])
});

static ANCHOR_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(&raw_semantic_tag("a")).unwrap());
static LOGO_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&raw_named("a", "class", "logo")).unwrap());
static LOGO_IMG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*\b(?:alt|title)\s*=\s*["'][^"']*logo"#).unwrap()
});
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img\b[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());

static MENU_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[raw_semantic_tag("nav"), raw_named("div|ul", "class", "menu|navigation")])
});
static CONTACT_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[raw_named("div", "class", "contact|phone|email|address")]));
static SEARCH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        raw_named("form", "class|id", "search"),
        raw_named("form", "role", "search"),
    ])
});

static WIDGET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[raw_named("div", "class", "widgets"), raw_named("div", "class", "sidebar")])
});
static COPYRIGHT_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[raw_named("div|p", "class", "copyright")]));
/// Copyright sign up to the nearest year; no tag nesting involved
static COPYRIGHT_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(?:©|&copy;).*?\d{4}").unwrap());
static SOCIAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[raw_named("div", "class", "social"), raw_named("ul", "class", "social|socials")])
});
static FOOTER_NAV_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        raw_named("nav", "class", "footer-navigation"),
        raw_named("ul", "class", "footer-menu"),
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct WordPressParser;

/// Logo: image source when available, otherwise the logo link markup
fn logo(region: &str) -> Option<String> {
    let anchors = || balanced_fragments(region, &ANCHOR_OPEN).into_iter();
    let fragment = first_fragment(region, &LOGO_ANCHOR)
        .or_else(|| anchors().find(|a| LOGO_IMG.is_match(a.inner)))
        .or_else(|| anchors().find(|a| IMG_SRC.is_match(a.inner)))?;

    IMG_SRC
        .captures(fragment.inner)
        .map(|caps| caps[1].to_string())
        .or_else(|| Some(fragment.outer.to_string()))
}

/// Menu: link texts of the first navigation container
fn menu(region: &str) -> Vec<String> {
    let Some(container) = first_balanced(region, &MENU_PATTERNS) else {
        return vec![];
    };
    balanced_fragments(container.inner, &ANCHOR_OPEN)
        .iter()
        .map(|a| strip_tags(a.inner))
        .filter(|text| !text.is_empty())
        .collect()
}

fn outer(region: &str, patterns: &[Regex]) -> Option<String> {
    first_balanced(region, patterns).map(|f| f.outer.to_string())
}

fn copyright(region: &str) -> Option<String> {
    outer(region, &COPYRIGHT_PATTERNS)
        .or_else(|| COPYRIGHT_TEXT.find(region).map(|m| markup::collapse_whitespace(m.as_str())))
}

impl PlatformParser for WordPressParser {
    fn platform(&self) -> Platform {
        Platform::WordPress
    }

    fn parse_header(&self, markup: &str) -> Option<Block> {
        let region = first_balanced(markup, &HEADER_PATTERNS)?;

        let mut content = Content::new();
        put_text(&mut content, "logo", logo(region.outer));
        put_list(&mut content, "menu", menu(region.outer));
        put_text(&mut content, "contacts", outer(region.outer, &CONTACT_PATTERNS));
        put_text(&mut content, "search", outer(region.outer, &SEARCH_PATTERNS));

        Block::new(BlockType::Header, Platform::WordPress, content, region.inner)
    }

    fn parse_footer(&self, markup: &str) -> Option<Block> {
        let region = first_balanced(markup, &FOOTER_PATTERNS)?;

        let mut content = Content::new();
        put_text(&mut content, "widgets", outer(region.outer, &WIDGET_PATTERNS));
        put_text(&mut content, "copyright", copyright(region.outer));
        put_text(&mut content, "social", outer(region.outer, &SOCIAL_PATTERNS));
        put_text(&mut content, "nav_links", outer(region.outer, &FOOTER_NAV_PATTERNS));

        Block::new(BlockType::Footer, Platform::WordPress, content, region.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="ru"><head><link rel="stylesheet" href="/wp-content/themes/astra/style.css"></head>
<body>
<div id="masthead" class="site-header">
  <div class="inside">
    <a href="/" class="custom-logo-link"><img src="/wp-content/uploads/logo.png" class="custom-logo"></a>
  </div>
  <nav class="main-navigation"><ul><li><a href="/">Главная</a></li><li><a href="/about">О нас</a></li></ul></nav>
  <div class="header-contacts"><a href="tel:+74951234567">+7 495 123-45-67</a></div>
  <form role="search" class="search-form" action="/"><input type="search" name="s"></form>
</div>
<div class="after-header">Unrelated trailing markup</div>
<div class="site-footer">
  <div class="footer-widgets"><div class="widget">W</div></div>
  <div class="site-info"><div class="copyright">© 2024 Company</div></div>
  <ul class="socials"><li><a href="https://vk.com/x">VK</a></li></ul>
  <ul class="footer-menu"><li><a href="/policy">Policy</a></li></ul>
</div>
</body></html>"#;

    #[test]
    fn test_header_is_balanced_and_mined() {
        let block = WordPressParser.parse_header(PAGE).unwrap();
        assert_eq!(block.platform, Platform::WordPress);
        assert!(block.html.contains("search-form"));
        assert!(!block.html.contains("Unrelated trailing markup"));

        assert_eq!(block.content["logo"], "/wp-content/uploads/logo.png");
        assert_eq!(block.content["menu"], serde_json::json!(["Главная", "О нас"]));
        assert!(block.content["contacts"].as_str().unwrap().contains("+7 495"));
        assert!(block.content["search"].as_str().unwrap().starts_with("<form"));
    }

    #[test]
    fn test_footer_components() {
        let block = WordPressParser.parse_footer(PAGE).unwrap();
        assert!(block.content["widgets"].as_str().unwrap().contains("widget"));
        assert_eq!(block.content["copyright"], r#"<div class="copyright">© 2024 Company</div>"#);
        assert!(block.content["social"].as_str().unwrap().contains("vk.com"));
        assert!(block.content["nav_links"].as_str().unwrap().contains("/policy"));
    }

    #[test]
    fn test_copyright_text_fallback() {
        let markup = "<footer><p>Все права защищены &copy; ООО Ромашка, 2019</p></footer>";
        let block = WordPressParser.parse_footer(markup).unwrap();
        assert_eq!(block.content["copyright"], "&copy; ООО Ромашка, 2019");
    }

    #[test]
    fn test_missing_region_yields_no_block() {
        assert!(WordPressParser.parse_header("<main>wp-content</main>").is_none());
        assert!(WordPressParser.parse_footer("<footer>   </footer>").is_none());
    }

    #[test]
    fn test_absent_components_are_omitted() {
        let block = WordPressParser.parse_header("<header><p>Just a tagline</p></header>").unwrap();
        assert!(block.content.is_empty());
        assert_eq!(block.html, "<p>Just a tagline</p>");
    }
}
