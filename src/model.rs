//! Block data model shared by every platform parser

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Ordered attribute map carried by a block (`logo`, `menu`, `template_name`, ...)
pub type Content = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Header,
    Footer,
    Content,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Header => "header",
            BlockType::Footer => "footer",
            BlockType::Content => "content",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-management system that produced a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WordPress,
    Tilda,
    Bitrix,
    Html5,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::WordPress => "wordpress",
            Platform::Tilda => "tilda",
            Platform::Bitrix => "bitrix",
            Platform::Html5 => "html5",
            Platform::Unknown => "unknown",
        }
    }

    /// CMS platforms get dedicated header/footer extractors and no
    /// content segmentation.
    pub fn is_cms(&self) -> bool {
        matches!(self, Platform::WordPress | Platform::Tilda | Platform::Bitrix)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted structural unit of a page.
///
/// `id`, `operation_id` and `created_at` stay unset until the persistence
/// side writes the block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<Uuid>,
    pub block_type: BlockType,
    pub platform: Platform,
    pub content: Content,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Block {
    /// Build a block, refusing empty markup.
    pub fn new(
        block_type: BlockType,
        platform: Platform,
        content: Content,
        html: impl Into<String>,
    ) -> Option<Self> {
        let html = html.into();
        if html.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: None,
            operation_id: None,
            block_type,
            platform,
            content,
            html,
            created_at: None,
        })
    }

    /// Copy of this block stamped with persistence identity.
    pub fn assigned(&self, operation_id: Uuid, id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            operation_id: Some(operation_id),
            created_at: Some(created_at),
            ..self.clone()
        }
    }

    pub fn template_name(&self) -> Option<&str> {
        self.content.get("template_name").and_then(Value::as_str)
    }
}

/// Lifecycle of one page-processing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Processing,
    Completed,
    Error,
}
