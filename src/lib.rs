//! Block parser: turns a web page's markup into structured blocks
//!
//! - Platform detection (WordPress, Tilda, Bitrix, generic HTML5)
//! - Header/footer location and component extraction per platform
//! - Content segmentation for generic pages
//! - Template rule matching with a heuristic classifier as fallback
//! - FFI interface (JSON in, JSON out) for C/C++ hosts

pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod ffi;
pub mod locate;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod platforms;
pub mod segment;
pub mod service;
pub mod templates;

pub use classify::{classify, ContentLabel, SectionFeatures};
pub use config::ParserConfig;
pub use detect::detect;
pub use error::{ParseError, ServiceError};
pub use ffi::*;
pub use model::{Block, BlockType, Content, OperationStatus, Platform};
pub use pipeline::{parse_detected, parse_page, PageResult, ParseBudget};
pub use platforms::{parser_for, PlatformParser};
pub use service::{BlockStore, ParserService, TemplateStore};
pub use templates::{Step, TemplateRecord, TemplateRule, TemplateSet};
