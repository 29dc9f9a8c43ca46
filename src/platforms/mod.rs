//! Per-platform header/footer parsers
//!
//! Each platform is a stateless unit struct implementing [`PlatformParser`].
//! Adding a platform means adding an implementation and registering it in
//! [`parser_for`]; shared code never branches on the platform.

mod bitrix;
mod html5;
mod tilda;
mod wordpress;

pub use bitrix::{detect_bitrix_version, is_valid_bitrix_phone, BitrixParser};
pub use html5::Html5Parser;
pub(crate) use html5::generic_block;
pub use tilda::{is_likely_tilda_phone, TildaParser};
pub use wordpress::WordPressParser;

use scraper::{ElementRef, Html};
use serde_json::Value;

use crate::detect;
use crate::locate::{fragment_root, Cascade, Located};
use crate::model::{Block, BlockType, Content, Platform};

pub trait PlatformParser: Send + Sync {
    fn platform(&self) -> Platform;

    /// Does `markup` carry this platform's signature
    fn detect(&self, markup: &str) -> bool {
        detect::signature(self.platform()).is_some_and(|sig| sig.matches(markup))
    }

    fn parse_header(&self, markup: &str) -> Option<Block>;

    fn parse_footer(&self, markup: &str) -> Option<Block>;
}

/// Parser for a platform; unknown pages get the generic parser
pub fn parser_for(platform: Platform) -> &'static dyn PlatformParser {
    match platform {
        Platform::WordPress => &WordPressParser,
        Platform::Tilda => &TildaParser,
        Platform::Bitrix => &BitrixParser,
        Platform::Html5 => &Html5Parser::GENERIC,
        Platform::Unknown => &Html5Parser::UNKNOWN,
    }
}

/// Locate a region with `cascade` and mine it with `components`.
pub(crate) fn extract_region<F>(
    document: &Html,
    markup: &str,
    cascade: &Cascade,
    block_type: BlockType,
    platform: Platform,
    components: F,
) -> Option<Block>
where
    F: Fn(&ElementRef) -> Content,
{
    let located = cascade.locate(Some(document), markup)?;
    located_block(located, block_type, platform, components)
}

/// Block for an already located region.
///
/// Raw-markup hits are re-parsed so the same DOM extractors run on them.
pub(crate) fn located_block<F>(
    located: Located,
    block_type: BlockType,
    platform: Platform,
    components: F,
) -> Option<Block>
where
    F: Fn(&ElementRef) -> Content,
{
    let content = match located {
        Located::Element(el) => components(&el),
        Located::Fragment(fragment) => {
            let scratch = Html::parse_fragment(fragment.outer);
            fragment_root(&scratch, &fragment)
                .map(|root| components(&root))
                .unwrap_or_default()
        }
    };
    Block::new(block_type, platform, content, located.inner_html())
}

pub(crate) fn put_text(content: &mut Content, key: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        content.insert(key.to_string(), Value::String(value));
    }
}

pub(crate) fn put_list(content: &mut Content, key: &str, values: Vec<String>) {
    if !values.is_empty() {
        content.insert(key.to_string(), Value::from(values));
    }
}

pub(crate) fn put_flag(content: &mut Content, key: &str, present: bool) {
    if present {
        content.insert(key.to_string(), Value::Bool(true));
    }
}
