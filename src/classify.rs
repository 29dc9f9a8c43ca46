//! Heuristic labelling of content sections
//!
//! Used when no template rule matches. Features are counted from the DOM
//! once; the label comes from [`DECISION_TABLE`], evaluated top-down. Several
//! predicates are often true at once, so the table order is the behaviour.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use serde::{Serialize, Serializer};

use crate::markup::{self, element_text};

static PHONE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\+\d{1,3}\s*\(\d{3,}\)\s*\d{3,}",
        r"\+\d{10,}",
        r"\d{3,}[\s-]?\d{3,}[\s-]?\d{2,}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

/// Phone number or e-mail address somewhere in `text`
pub fn contains_phone_or_email(text: &str) -> bool {
    PHONE_PATTERNS.iter().any(|re| re.is_match(text)) || EMAIL_RE.is_match(text)
}

/// Structural counts and flags of one candidate section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFeatures {
    pub images: usize,
    pub buttons: usize,
    pub headings: usize,
    pub paragraphs: usize,
    pub forms: usize,
    pub tables: usize,
    pub has_map: bool,
    pub has_contact_info: bool,
    pub has_products: bool,
    pub has_slider: bool,
    pub has_faq: bool,
    pub two_columns: bool,
    pub three_columns: bool,
}

impl SectionFeatures {
    pub fn from_element(section: &ElementRef) -> Self {
        Self {
            images: markup::count(section, "img"),
            buttons: markup::count(section, "button, a.btn, .button, [class*='btn-']"),
            headings: markup::count(section, "h1, h2, h3, h4, h5, h6"),
            paragraphs: markup::count(section, "p"),
            forms: markup::count(section, "form"),
            tables: markup::count(section, "table"),
            has_map: markup::exists(section, "[class*='map'], iframe[src*='map']"),
            has_contact_info: markup::exists(section, "[class*='contact'], [id*='contact']")
                || contains_phone_or_email(&element_text(section)),
            has_products: markup::exists(section, "[class*='product'], [class*='item'], .card"),
            has_slider: markup::exists(
                section,
                "[class*='slider'], [class*='carousel'], [class*='swiper']",
            ),
            has_faq: markup::exists(section, "[class*='faq'], [class*='accordion'], .collapse"),
            two_columns: has_column_layout(section, 2),
            three_columns: has_column_layout(section, 3),
        }
    }

    fn has_text(&self) -> bool {
        self.paragraphs > 0 || self.headings > 0
    }
}

/// Grid class names for `columns` (or any generic grid/row/flex class), or
/// exactly `columns` direct `div` children.
pub fn has_column_layout(section: &ElementRef, columns: usize) -> bool {
    let class_patterns = [
        format!("col-{columns}"),
        format!("column-{columns}"),
        format!("grid-{columns}"),
        "row".to_string(),
        "flex".to_string(),
        "grid".to_string(),
    ];
    if class_patterns
        .iter()
        .any(|pattern| markup::exists(section, &format!("[class*='{pattern}']")))
    {
        return true;
    }

    let direct_divs = section
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "div")
        .count();
    direct_divs == columns
}

/// Qualitative label of a content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentLabel {
    Map,
    FeedbackForm,
    Contacts,
    Faq,
    Table,
    SliderWithText,
    Slider,
    Products,
    ImageAction,
    TextImage,
    TextAction,
    ImageThreeColumns,
    Image,
    TextTwoColumns,
    Text,
    MixedContent,
}

impl ContentLabel {
    /// Label as stored with blocks and used by the template catalogue
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentLabel::Map => "Карта",
            ContentLabel::FeedbackForm => "Форма обратной связи",
            ContentLabel::Contacts => "Контакты",
            ContentLabel::Faq => "FAQ",
            ContentLabel::Table => "Таблица",
            ContentLabel::SliderWithText => "Карусель, слайд шоу с текстом",
            ContentLabel::Slider => "Карусель, слайд шоу",
            ContentLabel::Products => "Товары",
            ContentLabel::ImageAction => "Картинка + Действие",
            ContentLabel::TextImage => "Текст блок + Картинка",
            ContentLabel::TextAction => "Текст + Действие",
            ContentLabel::ImageThreeColumns => "Блок с картинкой 3 колонки",
            ContentLabel::Image => "Блок с картинкой",
            ContentLabel::TextTwoColumns => "Текстовый блок 2 колонки",
            ContentLabel::Text => "Текстовый блок",
            ContentLabel::MixedContent => "Смешанный контент",
        }
    }
}

impl std::fmt::Display for ContentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub type Predicate = fn(&SectionFeatures) -> bool;

/// Ordered (predicate, label) pairs; first satisfied predicate wins.
pub const DECISION_TABLE: &[(Predicate, ContentLabel)] = &[
    (|f: &SectionFeatures| f.has_map, ContentLabel::Map),
    (|f: &SectionFeatures| f.forms > 0, ContentLabel::FeedbackForm),
    (|f: &SectionFeatures| f.has_contact_info, ContentLabel::Contacts),
    (|f: &SectionFeatures| f.has_faq, ContentLabel::Faq),
    (|f: &SectionFeatures| f.tables > 0, ContentLabel::Table),
    (|f: &SectionFeatures| f.has_slider && f.has_text(), ContentLabel::SliderWithText),
    (|f: &SectionFeatures| f.has_slider, ContentLabel::Slider),
    (|f: &SectionFeatures| f.has_products, ContentLabel::Products),
    (|f: &SectionFeatures| f.images > 0 && f.buttons > 0, ContentLabel::ImageAction),
    (|f: &SectionFeatures| f.paragraphs > 0 && f.images > 0, ContentLabel::TextImage),
    (|f: &SectionFeatures| f.paragraphs > 0 && f.buttons > 0, ContentLabel::TextAction),
    (|f: &SectionFeatures| f.images > 0 && f.three_columns, ContentLabel::ImageThreeColumns),
    (|f: &SectionFeatures| f.images > 0, ContentLabel::Image),
    (|f: &SectionFeatures| f.has_text() && f.two_columns, ContentLabel::TextTwoColumns),
    (|f: &SectionFeatures| f.has_text(), ContentLabel::Text),
];

/// Label for a feature set; never empty.
pub fn classify(features: &SectionFeatures) -> ContentLabel {
    DECISION_TABLE
        .iter()
        .find(|(predicate, _)| predicate(features))
        .map(|(_, label)| *label)
        .unwrap_or(ContentLabel::MixedContent)
}

pub fn classify_element(section: &ElementRef) -> ContentLabel {
    classify(&SectionFeatures::from_element(section))
}
