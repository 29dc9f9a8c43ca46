//! 1C-Bitrix: conventional header/footer containers, component markers and
//! an edition hint taken from script paths.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;

use super::{extract_region, put_flag, put_list, put_text, PlatformParser};
use crate::locate::{raw_div_named, raw_semantic_tag, Cascade};
use crate::markup::{self, element_text, own_or_nested_hrefs, select_all, Query};
use crate::model::{Block, BlockType, Content, Platform};

static HEADER: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::from_selectors(
        &[
            "header",
            "div.header",
            "div#header",
            ".site-header",
            "#site-header",
            "div[role='banner']",
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
            "div.footer",
            "div#footer",
            ".site-footer",
            "#site-footer",
            "div[role='contentinfo']",
            ".main-footer",
            "#main-footer",
        ],
        &[raw_semantic_tag("footer").as_str(), raw_div_named("footer").as_str()],
    )
});

/// Edition markers, newest first
static VERSION_MARKERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("modern", r"BX24\.|b24-"),
        ("legacy", r"bitrix/js/main/core/core"),
        ("old", r"bitrix/components/bitrix"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

static FIVE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{5,}").unwrap());

const LOGO: &[&str] = &[".logo", ".site-logo", "#logo", "a img"];
const MENU: &[&str] = &["nav", ".navigation", ".menu", "ul.menu"];
const SEARCH: &[&str] = &[
    "form[role='search']",
    ".search-form",
    "input[type='search']",
    "form[action*='search']",
];
const PHONE: &[&str] = &[".phone", ".contact-phone", "a[href^='tel:']"];
const CART: &[&str] = &[".cart", ".shopping-cart", "a[href*='cart']", "a[href*='basket']"];
const AUTH: &[&str] = &[".login", ".auth", "a[href*='login']", "a[href*='auth']"];

const COPYRIGHT: &[&str] = &[".copyright", ".site-info", "p", "div"];
const FOOTER_MENU: &[&str] = &["nav", ".footer-menu", "ul.menu"];
const CONTACTS: &[&str] = &[".contacts", ".footer-contacts", ".address"];
const SOCIAL: &[&str] = &[".social", ".social-links", ".socials"];
const DEVELOPER: &[&str] = &[".developer", ".developed-by", "a[href*='developer']"];

/// First edition marker found in the page, `unknown` otherwise
pub fn detect_bitrix_version(markup: &str) -> &'static str {
    VERSION_MARKERS
        .iter()
        .find(|(_, re)| re.is_match(markup))
        .map(|(name, _)| *name)
        .unwrap_or("unknown")
}

/// Phone check used for Bitrix blocks: 5 or more consecutive digits once
/// everything except digits and `+` is removed
pub fn is_valid_bitrix_phone(text: &str) -> bool {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    cleaned.len() >= 5 && FIVE_DIGITS.is_match(&cleaned)
}

fn any_match(root: &ElementRef, selectors: &[&str]) -> bool {
    selectors.iter().any(|sel| markup::exists(root, sel))
}

/// Logo image source, or the logo link when the logo carries no image
fn put_logo(content: &mut Content, root: &ElementRef) {
    for sel in LOGO {
        let Some(el) = markup::select_first(root, sel) else {
            continue;
        };
        let src = el
            .value()
            .attr("src")
            .map(String::from)
            .or_else(|| markup::select_first(&el, "img[src]").and_then(|img| img.value().attr("src").map(String::from)));
        if let Some(src) = src {
            content.insert("logo".to_string(), Value::String(src));
            return;
        }
        if let Some(href) = el.value().attr("href") {
            content.insert("logo_link".to_string(), Value::String(href.to_string()));
            return;
        }
    }
}

fn menu(root: &ElementRef, selectors: &[&str]) -> Vec<String> {
    selectors
        .iter()
        .map(|sel| markup::link_texts(root, sel))
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

fn phones(root: &ElementRef) -> Vec<String> {
    PHONE
        .iter()
        .map(|sel| {
            select_all(root, sel)
                .iter()
                .map(element_text)
                .filter(|text| is_valid_bitrix_phone(text))
                .collect::<Vec<_>>()
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn is_copyright(text: &str) -> bool {
    text.contains('©') || text.contains("&copy;") || text.contains("Copyright")
}

fn copyright(root: &ElementRef) -> Option<String> {
    COPYRIGHT.iter().find_map(|sel| {
        select_all(root, sel)
            .iter()
            .map(element_text)
            .filter(|text| is_copyright(text))
            .last()
    })
}

/// Lines of the first contacts container that has any
fn contacts(root: &ElementRef) -> Vec<String> {
    CONTACTS
        .iter()
        .map(|sel| {
            markup::select_outermost(root, sel)
                .iter()
                .flat_map(|container| {
                    let lines: Vec<String> = Query::css("p, div")
                        .all(container)
                        .iter()
                        .map(element_text)
                        .filter(|text| !text.is_empty())
                        .collect();
                    if lines.is_empty() {
                        vec![element_text(container)]
                    } else {
                        lines
                    }
                })
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn social(root: &ElementRef) -> Vec<String> {
    SOCIAL
        .iter()
        .map(|sel| {
            markup::select_outermost(root, sel)
                .iter()
                .flat_map(own_or_nested_hrefs)
                .collect::<Vec<_>>()
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn developer(root: &ElementRef) -> Option<String> {
    DEVELOPER
        .iter()
        .filter_map(|sel| markup::select_first(root, sel))
        .find_map(|el| own_or_nested_hrefs(&el).into_iter().next())
}

fn version_content(markup: &str) -> Content {
    let mut content = Content::new();
    content.insert("version".to_string(), Value::from(detect_bitrix_version(markup)));
    content
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BitrixParser;

impl PlatformParser for BitrixParser {
    fn platform(&self) -> Platform {
        Platform::Bitrix
    }

    fn parse_header(&self, markup: &str) -> Option<Block> {
        let document = Html::parse_document(markup);
        extract_region(&document, markup, &HEADER, BlockType::Header, Platform::Bitrix, |root| {
            let mut content = version_content(markup);
            put_logo(&mut content, root);
            put_list(&mut content, "menu", menu(root, MENU));
            put_flag(&mut content, "search", any_match(root, SEARCH));
            put_list(&mut content, "phones", phones(root));
            put_flag(&mut content, "cart", any_match(root, CART));
            put_flag(&mut content, "auth", any_match(root, AUTH));
            content
        })
    }

    fn parse_footer(&self, markup: &str) -> Option<Block> {
        let document = Html::parse_document(markup);
        extract_region(&document, markup, &FOOTER, BlockType::Footer, Platform::Bitrix, |root| {
            let mut content = version_content(markup);
            put_text(&mut content, "copyright", copyright(root));
            put_list(&mut content, "menu", menu(root, FOOTER_MENU));
            put_list(&mut content, "contacts", contacts(root));
            put_list(&mut content, "social", social(root));
            put_text(&mut content, "developer", developer(root));
            content
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"<!DOCTYPE html><html><head>
<script src="/bitrix/js/main/core/core.min.js"></script></head><body>
<header class="header">
  <a class="logo" href="/"><img src="/upload/logo.svg" alt="Company"></a>
  <ul class="menu"><li><a href="/catalog/">Каталог</a></li><li><a href="/delivery/">Доставка</a></li></ul>
  <form action="/search/" class="search-form"><input type="text" name="q"></form>
  <div class="phone">8 (800) 555-35-35</div>
  <div class="phone">звоните</div>
  <a href="/personal/basket/">Корзина</a>
  <a href="/auth/">Войти</a>
</header>
<main><p>Catalog body</p></main>
<footer>
  <div class="footer-contacts"><p>Москва, Ленина 1</p><p>info@shop.ru</p></div>
  <div class="socials"><a href="https://vk.com/shop">VK</a><a href="https://ok.ru/shop">OK</a></div>
  <div class="bottom"><span class="copyright">© 2010-2024 Магазин</span></div>
  <div class="developer"><a href="https://studio.example">Разработка сайта</a></div>
</footer>
</body></html>"#;

    #[test]
    fn test_header_components() {
        let block = BitrixParser.parse_header(PAGE).unwrap();
        assert_eq!(block.platform, Platform::Bitrix);
        assert!(!block.html.contains("Catalog body"));

        let keys: Vec<_> = block.content.keys().cloned().collect();
        assert_eq!(keys, vec!["version", "logo", "menu", "search", "phones", "cart", "auth"]);
        assert_eq!(block.content["version"], "legacy");
        assert_eq!(block.content["logo"], "/upload/logo.svg");
        assert_eq!(block.content["menu"], json!(["Каталог", "Доставка"]));
        assert_eq!(block.content["phones"], json!(["8 (800) 555-35-35"]));
    }

    #[test]
    fn test_footer_components() {
        let block = BitrixParser.parse_footer(PAGE).unwrap();
        assert_eq!(block.content["copyright"], "© 2010-2024 Магазин");
        assert_eq!(block.content["contacts"], json!(["Москва, Ленина 1", "info@shop.ru"]));
        assert_eq!(block.content["social"], json!(["https://vk.com/shop", "https://ok.ru/shop"]));
        assert_eq!(block.content["developer"], "https://studio.example");
    }

    #[test]
    fn test_version_order_and_default() {
        assert_eq!(detect_bitrix_version("BX24.init(); bitrix/components/bitrix/menu"), "modern");
        assert_eq!(detect_bitrix_version("/bitrix/components/bitrix/news.list/"), "old");
        assert_eq!(detect_bitrix_version("<p>nothing</p>"), "unknown");
    }

    #[test]
    fn test_phone_threshold() {
        assert!(is_valid_bitrix_phone("+7 (999) 123-45-67"));
        assert!(is_valid_bitrix_phone("12345"));
        assert!(!is_valid_bitrix_phone("12-34"));
        assert!(!is_valid_bitrix_phone("+1234"));
    }

    #[test]
    fn test_raw_fallback_region() {
        let markup = r#"<script src="/bitrix/templates/shop/script.js"></script>
<div class="top-header-wrap"><div class="inner"><div class="logo"><img src="/upload/brand.png"></div><div class="phone">+7 (343) 200-10-10</div></div><a href="/auth/">Вход</a></div>
<div class="catalog">Каталог</div>"#;
        let block = BitrixParser.parse_header(markup).unwrap();
        assert_eq!(
            block.html,
            r#"<div class="inner"><div class="logo"><img src="/upload/brand.png"></div><div class="phone">+7 (343) 200-10-10</div></div><a href="/auth/">Вход</a>"#
        );

        let keys: Vec<_> = block.content.keys().cloned().collect();
        assert_eq!(keys, vec!["version", "logo", "phones", "auth"]);
        assert_eq!(block.content["version"], "unknown");
        assert_eq!(block.content["logo"], "/upload/brand.png");
        assert_eq!(block.content["phones"], json!(["+7 (343) 200-10-10"]));
        assert!(BitrixParser.parse_footer(markup).is_none());
    }

    #[test]
    fn test_no_container_no_block() {
        assert!(BitrixParser.parse_header("<div id=\"bx_1\">catalog</div>").is_none());
        assert!(BitrixParser.parse_footer("<div id=\"bx_1\">catalog</div>").is_none());
    }
}
