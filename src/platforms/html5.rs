//! Generic header/footer extraction for pages without a CMS signature

use scraper::{ElementRef, Html};

use super::{extract_region, located_block, put_list, put_text, PlatformParser};
use crate::locate::{generic_cascade, Located, Role};
use crate::markup::{self, element_text, link_hrefs, link_texts, select_all};
use crate::model::{Block, BlockType, Content, Platform};

const LOGO: &[&str] = &["a img", ".logo", ".site-logo", "#logo", "img[src*='logo']", "img"];
const MENU: &[&str] = &["nav", ".navigation", ".menu", "ul.menu"];
const CONTACT: &[&str] = &[".contact", ".phone", ".email"];
const COPYRIGHT: &[&str] = &[".copyright", ".site-info"];
const SOCIAL: &[&str] = &[".social", ".social-links", ".socials"];

/// Generic parser; the same extraction serves HTML5 and unrecognized pages,
/// only the platform tag differs.
#[derive(Debug, Clone, Copy)]
pub struct Html5Parser {
    platform: Platform,
}

impl Html5Parser {
    pub const GENERIC: Html5Parser = Html5Parser { platform: Platform::Html5 };
    pub const UNKNOWN: Html5Parser = Html5Parser { platform: Platform::Unknown };
}

fn logo(root: &ElementRef) -> Option<String> {
    LOGO.iter()
        .flat_map(|sel| select_all(root, sel))
        .find_map(|el| {
            el.value()
                .attr("src")
                .or_else(|| markup::select_first(&el, "img[src]").and_then(|img| img.value().attr("src")))
                .filter(|src| !src.is_empty())
                .map(String::from)
        })
}

fn first_nonempty_texts(root: &ElementRef, selectors: &[&str], collect: fn(&ElementRef, &str) -> Vec<String>) -> Vec<String> {
    selectors
        .iter()
        .map(|sel| collect(root, sel))
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

fn contact(root: &ElementRef) -> Option<String> {
    CONTACT
        .iter()
        .filter_map(|sel| markup::select_first(root, sel))
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

fn copyright(root: &ElementRef) -> Option<String> {
    let by_class = COPYRIGHT
        .iter()
        .filter_map(|sel| markup::select_first(root, sel))
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty());
    by_class.or_else(|| {
        select_all(root, "p, div")
            .iter()
            .map(element_text)
            .filter(|text| text.contains('©') || text.contains("&copy;") || text.contains("Copyright"))
            .last()
    })
}

fn header_content(root: &ElementRef) -> Content {
    let mut content = Content::new();
    put_text(&mut content, "logo", logo(root));
    put_list(&mut content, "menu", first_nonempty_texts(root, MENU, link_texts));
    put_text(&mut content, "contact", contact(root));
    content
}

fn footer_content(root: &ElementRef) -> Content {
    let mut content = Content::new();
    put_text(&mut content, "copyright", copyright(root));
    put_list(&mut content, "social", first_nonempty_texts(root, SOCIAL, link_hrefs));
    content
}

/// Generic extraction over a region located elsewhere
pub(crate) fn generic_block(located: Located, role: Role, platform: Platform) -> Option<Block> {
    match role {
        Role::Header => located_block(located, BlockType::Header, platform, header_content),
        Role::Footer => located_block(located, BlockType::Footer, platform, footer_content),
    }
}

impl PlatformParser for Html5Parser {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn parse_header(&self, markup: &str) -> Option<Block> {
        let document = Html::parse_document(markup);
        extract_region(
            &document,
            markup,
            generic_cascade(Role::Header),
            BlockType::Header,
            self.platform,
            header_content,
        )
    }

    fn parse_footer(&self, markup: &str) -> Option<Block> {
        let document = Html::parse_document(markup);
        extract_region(
            &document,
            markup,
            generic_cascade(Role::Footer),
            BlockType::Footer,
            self.platform,
            footer_content,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"></head><body>
<header>
  <a href="/"><img src="/img/brand.png" alt="Brand"></a>
  <nav><a href="/">Home</a><a href="/about">About</a><a href="/contact">Contact</a></nav>
  <span class="phone">+1 555 0100</span>
</header>
<footer>
  <ul class="social"><li><a href="https://twitter.com/brand">Twitter</a></li></ul>
  <p>Copyright 2024 Brand Inc.</p>
</footer>
</body></html>"#;

    #[test]
    fn test_header_components() {
        let block = Html5Parser::GENERIC.parse_header(PAGE).unwrap();
        assert_eq!(block.platform, Platform::Html5);
        assert_eq!(block.content["logo"], "/img/brand.png");
        assert_eq!(block.content["menu"], json!(["Home", "About", "Contact"]));
        assert_eq!(block.content["contact"], "+1 555 0100");
    }

    #[test]
    fn test_footer_copyright_fallback() {
        let block = Html5Parser::GENERIC.parse_footer(PAGE).unwrap();
        assert_eq!(block.content["copyright"], "Copyright 2024 Brand Inc.");
        assert_eq!(block.content["social"], json!(["https://twitter.com/brand"]));
    }

    #[test]
    fn test_unknown_pages_use_generic_extraction() {
        let markup = r#"<div class="top header"><a href="/x">X</a></div><p>body</p>"#;
        let block = Html5Parser::UNKNOWN.parse_header(markup).unwrap();
        assert_eq!(block.platform, Platform::Unknown);
        assert_eq!(block.html, r#"<a href="/x">X</a>"#);
        assert!(Html5Parser::UNKNOWN.parse_footer(markup).is_none());
    }
}
