//! Tilda: pages are stacks of `div#recNNN` records; header and footer are
//! records of known types, falling back to the first/last record.

use std::sync::LazyLock;

use scraper::{ElementRef, Html};
use serde_json::{json, Value};

use super::{extract_region, put_list, put_text, PlatformParser};
use crate::locate::{raw_named, Cascade, Strategy};
use crate::markup::{element_text, own_or_nested_hrefs, own_or_nested_link_texts, Query};
use crate::model::{Block, BlockType, Content, Platform};

static HEADER: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::new(
        vec![
            Strategy::First("div[id^='t-header']"),
            Strategy::First("div[data-record-type='257']"),
            Strategy::First("div[data-record-type='258']"),
            Strategy::First("div[data-record-type='396']"),
            Strategy::First("div.t-site-header-wrapper"),
            Strategy::First(".t396__elem.header"),
            Strategy::First("div[id^='rec']"),
        ],
        &[
            raw_named("div", "class", "t-header|tn-header").as_str(),
            raw_named("div", "id", "header").as_str(),
        ],
    )
});

static FOOTER: LazyLock<Cascade> = LazyLock::new(|| {
    Cascade::new(
        vec![
            Strategy::First("div[id^='t-footer']"),
            Strategy::First("div[data-record-type='56']"),
            Strategy::First("div[data-record-type='106']"),
            Strategy::First("div[data-record-type='331']"),
            Strategy::First("div.t-site-footer-wrapper"),
            Strategy::First(".t396__elem.footer"),
            Strategy::Last("div[id^='rec']"),
        ],
        &[
            raw_named("div", "class", "t-footer|tn-footer").as_str(),
            raw_named("div", "id", "footer").as_str(),
        ],
    )
});

const LOGO: &[Query] = &[
    Query::css(".t-logo"),
    Query::css(".t-logo__img"),
    Query::css("img[imgfield='img']"),
    Query::css("a.t-menu__logo-wrapper img"),
];

const HEADER_MENU: &[Query] = &[
    Query::css(".t-menu__nav"),
    Query::css(".t-menu__nav-item"),
    Query::css(".tn-elem[data-elem-type='text'] a"),
];

const PHONE: &[Query] = &[
    Query::css(".t-menu__phone-item"),
    Query::css(".t-info_phone"),
    Query::containing(".tn-elem[data-elem-type='text']", "+"),
];

const SOCIAL: &[Query] = &[Query::css(".t-sociallinks"), Query::css(".t-sociallinks__item")];

const BUTTON: &[Query] = &[
    Query::css(".t-btn"),
    Query::having("a[href]", ".t-btn"),
    Query::css(".tn-atom.t-btn"),
];

const COPYRIGHT: &[Query] = &[
    Query::css(".t-copyright"),
    Query::css(".t-footer_inlined-copyright"),
    Query::containing(".tn-elem", "©"),
    Query::containing(".tn-elem", "copyright"),
];

const CONTACT: &[Query] = &[
    Query::css(".t-footer_address"),
    Query::css(".t-info_address"),
    Query::containing(".tn-elem", "contact"),
    Query::containing(".tn-elem", "адрес"),
];

const FOOTER_MENU: &[Query] = &[Query::css(".t-footer_menu"), Query::css(".t-footer__nav-item")];

/// Phone check used for Tilda blocks: at least 7 digits plus a `+` or `(`
pub fn is_likely_tilda_phone(text: &str) -> bool {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | ' '))
        .collect();
    let digits = cleaned.chars().filter(char::is_ascii_digit).count();
    digits >= 7 && (cleaned.contains('+') || cleaned.contains('('))
}

/// Items from the first query whose matches produce any
fn first_nonempty<F>(root: &ElementRef, queries: &[Query], collect: F) -> Vec<String>
where
    F: Fn(&ElementRef) -> Vec<String>,
{
    queries
        .iter()
        .map(|query| query.all(root).iter().flat_map(&collect).collect::<Vec<_>>())
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

fn first_text(root: &ElementRef, queries: &[Query]) -> Option<String> {
    queries
        .iter()
        .filter_map(|query| query.first(root))
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

fn logo(root: &ElementRef) -> Option<String> {
    LOGO.iter()
        .filter_map(|query| query.first(root))
        .find_map(|el| el.value().attr("src").map(String::from))
}

fn phone(root: &ElementRef) -> Option<String> {
    PHONE
        .iter()
        .filter_map(|query| query.first(root))
        .map(|el| element_text(&el))
        .find(|text| is_likely_tilda_phone(text))
}

fn button(root: &ElementRef) -> Option<Value> {
    BUTTON.iter().filter_map(|query| query.first(root)).find_map(|el| {
        let text = element_text(&el);
        if text.is_empty() {
            return None;
        }
        Some(match el.value().attr("href").filter(|href| !href.is_empty()) {
            Some(href) => json!({ "text": text, "link": href }),
            None => json!({ "text": text }),
        })
    })
}

/// Copyright by known classes, else the last `div`/`p` showing a copyright sign
fn copyright(root: &ElementRef) -> Option<String> {
    first_text(root, COPYRIGHT).or_else(|| {
        Query::css("div, p")
            .all(root)
            .iter()
            .map(element_text)
            .filter(|text| text.contains('©') || text.contains("&copy;"))
            .last()
    })
}

fn header_content(root: &ElementRef) -> Content {
    let mut content = Content::new();
    put_text(&mut content, "logo", logo(root));
    put_list(&mut content, "menu", first_nonempty(root, HEADER_MENU, own_or_nested_link_texts));
    put_text(&mut content, "phone", phone(root));
    put_list(&mut content, "social", first_nonempty(root, SOCIAL, own_or_nested_hrefs));
    if let Some(button) = button(root) {
        content.insert("button".to_string(), button);
    }
    content
}

fn footer_content(root: &ElementRef) -> Content {
    let mut content = Content::new();
    put_text(&mut content, "copyright", copyright(root));
    put_text(&mut content, "contact", first_text(root, CONTACT));
    put_list(&mut content, "social", first_nonempty(root, SOCIAL, own_or_nested_hrefs));
    put_list(&mut content, "menu", first_nonempty(root, FOOTER_MENU, own_or_nested_link_texts));
    content
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TildaParser;

impl PlatformParser for TildaParser {
    fn platform(&self) -> Platform {
        Platform::Tilda
    }

    fn parse_header(&self, markup: &str) -> Option<Block> {
        let document = Html::parse_document(markup);
        extract_region(&document, markup, &HEADER, BlockType::Header, Platform::Tilda, header_content)
    }

    fn parse_footer(&self, markup: &str) -> Option<Block> {
        let document = Html::parse_document(markup);
        extract_region(&document, markup, &FOOTER, BlockType::Footer, Platform::Tilda, footer_content)
    }
}
