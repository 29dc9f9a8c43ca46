//! Page pipeline: detect the platform, extract header and footer, then
//! segment and label content sections on generic pages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::classify::classify_element;
use crate::config::ParserConfig;
use crate::detect;
use crate::locate::{self, Role};
use crate::model::{Block, BlockType, Content, Platform};
use crate::platforms::{generic_block, parser_for};
use crate::segment::{segment, CandidateSection};
use crate::templates::TemplateSet;

/// Early-abort budget, consulted before each block is started.
#[derive(Debug, Clone, Default)]
pub struct ParseBudget {
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl ParseBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Abort once `flag` is set by another thread
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Blocks extracted from one page, header first and footer last
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub platform: Platform,
    pub blocks: Vec<Block>,
    /// The budget ran out before every block was attempted
    pub aborted: bool,
}

impl PageResult {
    fn new(platform: Platform) -> Self {
        Self {
            platform,
            blocks: Vec::new(),
            aborted: false,
        }
    }

    pub fn headers(&self) -> impl Iterator<Item = &Block> {
        self.of_type(BlockType::Header)
    }

    pub fn footers(&self) -> impl Iterator<Item = &Block> {
        self.of_type(BlockType::Footer)
    }

    pub fn content_blocks(&self) -> impl Iterator<Item = &Block> {
        self.of_type(BlockType::Content)
    }

    fn of_type(&self, block_type: BlockType) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.block_type == block_type)
    }
}

/// Run the whole extraction for one page.
///
/// Never fails: a block that cannot be extracted is simply absent.
/// `templates` only apply to content sections of generic pages.
pub fn parse_page(
    markup: &str,
    templates: &TemplateSet,
    config: &ParserConfig,
    budget: &ParseBudget,
) -> PageResult {
    parse_detected(markup, detect::detect(markup), templates, config, budget)
}

/// [`parse_page`] for a page whose platform is already known
pub fn parse_detected(
    markup: &str,
    platform: Platform,
    templates: &TemplateSet,
    config: &ParserConfig,
    budget: &ParseBudget,
) -> PageResult {
    let mut page = PageResult::new(platform);

    if platform.is_cms() {
        parse_cms_page(markup, &mut page, budget);
    } else {
        parse_generic_page(markup, templates, config, &mut page, budget);
    }

    debug!(
        platform = %platform,
        blocks = page.blocks.len(),
        aborted = page.aborted,
        "Parsed page"
    );
    page
}

fn parse_cms_page(markup: &str, page: &mut PageResult, budget: &ParseBudget) {
    let parser = parser_for(page.platform);

    if budget.is_exhausted() {
        page.aborted = true;
        return;
    }
    page.blocks.extend(parser.parse_header(markup));

    if budget.is_exhausted() {
        page.aborted = true;
        return;
    }
    page.blocks.extend(parser.parse_footer(markup));
}

fn parse_generic_page(
    markup: &str,
    templates: &TemplateSet,
    config: &ParserConfig,
    page: &mut PageResult,
    budget: &ParseBudget,
) {
    let platform = page.platform;
    let document = Html::parse_document(markup);
    let header = locate::locate(&document, markup, Role::Header);
    let footer = locate::locate(&document, markup, Role::Footer);

    if budget.is_exhausted() {
        page.aborted = true;
        return;
    }
    page.blocks
        .extend(header.and_then(|located| generic_block(located, Role::Header, platform)));

    let sections = segment(
        &document,
        header.and_then(|located| located.dom_element(&document, markup)),
        footer.and_then(|located| located.dom_element(&document, markup)),
        config,
    );

    let mut emitted = 0;
    for section in &sections {
        if config.max_content_blocks.is_some_and(|max| emitted >= max) {
            break;
        }
        if budget.is_exhausted() {
            page.aborted = true;
            return;
        }
        if let Some(block) = content_block(section, templates, platform) {
            page.blocks.push(block);
            emitted += 1;
        }
    }

    if budget.is_exhausted() {
        page.aborted = true;
        return;
    }
    page.blocks
        .extend(footer.and_then(|located| generic_block(located, Role::Footer, platform)));
}

/// Label a section by the first matching template, else by heuristics
fn content_block(
    section: &CandidateSection,
    templates: &TemplateSet,
    platform: Platform,
) -> Option<Block> {
    let mut content = Content::new();
    match templates.find_match(&section.inner_html) {
        Some(rule) => {
            content.insert("template_name".to_string(), Value::from(rule.block_type.clone()));
            content.insert("template_id".to_string(), Value::from(rule.id));
            content.insert("matched_pattern".to_string(), Value::Bool(true));
        }
        None => {
            let label = classify_element(&section.element);
            content.insert("template_name".to_string(), Value::from(label.as_str()));
            content.insert("matched_pattern".to_string(), Value::Bool(false));
        }
    }
    Block::new(BlockType::Content, platform, content, section.inner_html.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRecord;
    use serde_json::json;

    const STUDIO_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"><title>Studio</title></head>
<body>
<header>
  <a href="/"><img src="/logo.png" alt="Studio"></a>
  <nav><a href="/">Home</a><a href="/work">Work</a><a href="/blog">Blog</a></nav>
</header>
<main>
  <section class="intro"><h2>About the studio</h2><p>We design and build websites for small businesses.</p></section>
  <section class="signup"><h2>Write to us about your project</h2><p>We answer within one business day.</p><form action="/send"><input name="name"><button>Send</button></form></section>
</main>
</body></html>"#;

    fn form_template() -> TemplateSet {
        TemplateSet::from_records(&[TemplateRecord {
            id: 7,
            block_type: "Форма обратной связи".to_string(),
            platform: Platform::Html5,
            payload: json!({"priority": 1, "step1": "<form", "step2": ["Send", "Отправить"]}),
        }])
    }

    #[test]
    fn test_header_without_footer() {
        let page = parse_page(
            STUDIO_PAGE,
            &TemplateSet::default(),
            &ParserConfig::default(),
            &ParseBudget::unlimited(),
        );
        assert_eq!(page.platform, Platform::Html5);
        assert!(!page.aborted);

        let headers: Vec<_> = page.headers().collect();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].content["logo"], "/logo.png");
        assert_eq!(headers[0].content["menu"].as_array().unwrap().len(), 3);
        assert_eq!(page.footers().count(), 0);
        assert_eq!(page.blocks[0].block_type, BlockType::Header);
    }

    #[test]
    fn test_heuristic_labels() {
        let page = parse_page(
            STUDIO_PAGE,
            &TemplateSet::default(),
            &ParserConfig::default(),
            &ParseBudget::unlimited(),
        );
        let labels: Vec<_> = page.content_blocks().filter_map(Block::template_name).collect();
        assert_eq!(labels, vec!["Текстовый блок", "Форма обратной связи"]);
        assert!(page
            .content_blocks()
            .all(|b| b.content["matched_pattern"] == false && b.platform == Platform::Html5));
    }

    #[test]
    fn test_template_match_wins() {
        let page = parse_page(
            STUDIO_PAGE,
            &form_template(),
            &ParserConfig::default(),
            &ParseBudget::unlimited(),
        );
        let content: Vec<_> = page.content_blocks().collect();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0].content["matched_pattern"], false);
        assert!(content[0].content.get("template_id").is_none());

        let matched = &content[1].content;
        assert_eq!(matched["template_name"], "Форма обратной связи");
        assert_eq!(matched["template_id"], 7);
        assert_eq!(matched["matched_pattern"], true);
        assert!(content[1].html.starts_with("<h2>Write to us"));
    }

    #[test]
    fn test_content_cap() {
        let config = ParserConfig {
            max_content_blocks: Some(1),
            ..ParserConfig::default()
        };
        let page = parse_page(STUDIO_PAGE, &TemplateSet::default(), &config, &ParseBudget::unlimited());
        assert_eq!(page.content_blocks().count(), 1);
        assert!(!page.aborted);
    }

    #[test]
    fn test_cms_page_header_and_footer_only() {
        let markup = r#"<!DOCTYPE html><html lang="ru"><head>
<link rel="stylesheet" href="/wp-content/themes/blog/style.css"></head><body>
<header class="site-header"><nav class="main-navigation"><a href="/">Главная</a></nav></header>
<section><p>A long article body that would be a content block on a generic page.</p></section>
<footer><div class="site-info">© 2024 Blog</div></footer>
</body></html>"#;
        let page = parse_page(markup, &form_template(), &ParserConfig::default(), &ParseBudget::unlimited());
        assert_eq!(page.platform, Platform::WordPress);
        let types: Vec<_> = page.blocks.iter().map(|b| b.block_type).collect();
        assert_eq!(types, vec![BlockType::Header, BlockType::Footer]);
    }

    #[test]
    fn test_cancelled_budget() {
        let flag = Arc::new(AtomicBool::new(false));
        let budget = ParseBudget::unlimited().with_cancel_flag(flag.clone());
        assert!(!budget.is_exhausted());

        flag.store(true, Ordering::Relaxed);
        let page = parse_page(STUDIO_PAGE, &TemplateSet::default(), &ParserConfig::default(), &budget);
        assert!(page.aborted);
        assert!(page.blocks.is_empty());
    }

    #[test]
    fn test_expired_deadline() {
        let budget = ParseBudget::unlimited().with_deadline(Instant::now());
        assert!(budget.is_exhausted());
        assert!(!ParseBudget::unlimited().with_timeout(Duration::from_secs(60)).is_exhausted());
    }

    #[test]
    fn test_sections_inside_raw_located_header_excluded() {
        let markup = r#"<!DOCTYPE html><html lang="en"><body>
<div class="top-header"><div class="container"><p>Free delivery on all orders over fifty dollars</p></div></div>
<section><p>The real content section with plenty of text in it.</p></section>
</body></html>"#;
        let page = parse_page(markup, &TemplateSet::default(), &ParserConfig::default(), &ParseBudget::unlimited());
        assert_eq!(block_types(&page), vec![BlockType::Header, BlockType::Content]);
        assert!(page.blocks[0].html.contains("Free delivery"));
        assert!(page.content_blocks().all(|b| !b.html.contains("Free delivery")));
    }

    fn block_types(page: &PageResult) -> Vec<BlockType> {
        page.blocks.iter().map(|b| b.block_type).collect()
    }

    #[test]
    fn test_unknown_page_uses_generic_path() {
        let markup = r#"<div class="header"><a href="/">Home</a></div>
<section><p>Plain markup without any doctype or platform fingerprint.</p></section>"#;
        let page = parse_page(markup, &TemplateSet::default(), &ParserConfig::default(), &ParseBudget::unlimited());
        assert_eq!(page.platform, Platform::Unknown);
        assert_eq!(page.blocks.len(), 2);
        assert!(page.blocks.iter().all(|b| b.platform == Platform::Unknown));
    }
}
