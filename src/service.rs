//! One page-processing operation against the persistence collaborators
//!
//! Storage lives behind [`TemplateStore`] and [`BlockStore`]; this module
//! only sequences the calls around [`parse_detected`].

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ParserConfig;
use crate::detect;
use crate::error::ServiceError;
use crate::model::{Block, OperationStatus, Platform};
use crate::pipeline::{parse_detected, PageResult, ParseBudget};
use crate::templates::{TemplateRecord, TemplateSet};

pub trait TemplateStore {
    /// Stored templates for `platform`
    fn templates_for(&self, platform: Platform) -> Result<Vec<TemplateRecord>, ServiceError>;
}

pub trait BlockStore {
    fn update_status(&self, operation_id: Uuid, status: OperationStatus) -> Result<(), ServiceError>;

    /// Persist a block; the returned copy carries the stored id and timestamp
    fn save_block(&self, block: &Block) -> Result<Block, ServiceError>;
}

impl<S: TemplateStore + ?Sized> TemplateStore for &S {
    fn templates_for(&self, platform: Platform) -> Result<Vec<TemplateRecord>, ServiceError> {
        (**self).templates_for(platform)
    }
}

impl<S: BlockStore + ?Sized> BlockStore for &S {
    fn update_status(&self, operation_id: Uuid, status: OperationStatus) -> Result<(), ServiceError> {
        (**self).update_status(operation_id, status)
    }

    fn save_block(&self, block: &Block) -> Result<Block, ServiceError> {
        (**self).save_block(block)
    }
}

pub struct ParserService<T, B> {
    templates: T,
    blocks: B,
    config: ParserConfig,
}

impl<T: TemplateStore, B: BlockStore> ParserService<T, B> {
    pub fn new(templates: T, blocks: B, config: ParserConfig) -> Self {
        Self {
            templates,
            blocks,
            config,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn block_store(&self) -> &B {
        &self.blocks
    }

    /// Process `markup` under a fresh operation id
    pub fn submit(&self, markup: &str, budget: &ParseBudget) -> Result<(Uuid, PageResult), ServiceError> {
        let operation_id = Uuid::new_v4();
        let page = self.process(operation_id, markup, budget)?;
        Ok((operation_id, page))
    }

    /// Run one operation: mark it processing, parse, save every block,
    /// mark it completed.
    ///
    /// Templates that fail to load are treated as absent. A failed save
    /// marks the operation as errored and stops.
    pub fn process(
        &self,
        operation_id: Uuid,
        markup: &str,
        budget: &ParseBudget,
    ) -> Result<PageResult, ServiceError> {
        self.blocks.update_status(operation_id, OperationStatus::Processing)?;

        let platform = detect::detect(markup);
        let templates = self.load_templates(platform);
        let mut page = parse_detected(markup, platform, &templates, &self.config, budget);

        let mut saved = Vec::with_capacity(page.blocks.len());
        for block in &page.blocks {
            let stamped = Block {
                operation_id: Some(operation_id),
                ..block.clone()
            };
            match self.blocks.save_block(&stamped) {
                Ok(stored) => saved.push(stored),
                Err(err) => {
                    warn!(%operation_id, error = %err, "Saving block failed");
                    if let Err(status_err) = self.blocks.update_status(operation_id, OperationStatus::Error) {
                        warn!(%operation_id, error = %status_err, "Marking operation as failed did not succeed");
                    }
                    return Err(err);
                }
            }
        }
        page.blocks = saved;

        self.blocks.update_status(operation_id, OperationStatus::Completed)?;
        info!(
            %operation_id,
            platform = %platform,
            blocks = page.blocks.len(),
            "Operation completed"
        );
        Ok(page)
    }

    /// Content templates only apply to generic pages
    fn load_templates(&self, platform: Platform) -> TemplateSet {
        if platform.is_cms() {
            return TemplateSet::default();
        }
        match self.templates.templates_for(platform) {
            Ok(records) => TemplateSet::from_records(&records).for_platform(platform),
            Err(err) => {
                warn!(platform = %platform, error = %err, "Template load failed, classifying heuristically");
                TemplateSet::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::Utc;
    use serde_json::json;

    #[derive(Default)]
    struct MemoryStore {
        statuses: RefCell<Vec<OperationStatus>>,
        saved: RefCell<Vec<Block>>,
        fail_saves: bool,
        fail_templates: bool,
    }

    impl TemplateStore for MemoryStore {
        fn templates_for(&self, platform: Platform) -> Result<Vec<TemplateRecord>, ServiceError> {
            if self.fail_templates {
                return Err(ServiceError::Templates {
                    platform,
                    message: "connection refused".to_string(),
                });
            }
            Ok(vec![TemplateRecord {
                id: 3,
                block_type: "Текстовый блок".to_string(),
                platform,
                payload: json!({"step1": "landing"}),
            }])
        }
    }

    impl BlockStore for MemoryStore {
        fn update_status(&self, _operation_id: Uuid, status: OperationStatus) -> Result<(), ServiceError> {
            self.statuses.borrow_mut().push(status);
            Ok(())
        }

        fn save_block(&self, block: &Block) -> Result<Block, ServiceError> {
            if self.fail_saves {
                return Err(ServiceError::SaveBlock {
                    operation_id: block.operation_id.unwrap_or_default(),
                    message: "disk full".to_string(),
                });
            }
            let stored = block.assigned(block.operation_id.unwrap(), Uuid::new_v4(), Utc::now());
            self.saved.borrow_mut().push(stored.clone());
            Ok(stored)
        }
    }

    const PAGE: &str = r#"<!DOCTYPE html><html lang="en"><body>
<header><a href="/">Home</a></header>
<section><p>Welcome to our landing page with enough text to keep.</p></section>
</body></html>"#;

    #[test]
    fn test_blocks_saved_with_operation() {
        let store = MemoryStore::default();
        let service = ParserService::new(&store, &store, ParserConfig::default());
        let operation_id = Uuid::new_v4();

        let page = service.process(operation_id, PAGE, &ParseBudget::unlimited()).unwrap();
        assert_eq!(page.blocks.len(), 2);
        assert!(page.blocks.iter().all(|b| b.operation_id == Some(operation_id) && b.id.is_some()));
        assert_eq!(page.blocks[1].content["template_id"], 3);
        assert_eq!(store.saved.borrow().len(), 2);
        assert_eq!(
            *store.statuses.borrow(),
            vec![OperationStatus::Processing, OperationStatus::Completed]
        );
    }

    #[test]
    fn test_template_failure_degrades() {
        let store = MemoryStore {
            fail_templates: true,
            ..MemoryStore::default()
        };
        let service = ParserService::new(&store, &store, ParserConfig::default());
        let (_, page) = service.submit(PAGE, &ParseBudget::unlimited()).unwrap();
        assert_eq!(page.blocks[1].content["matched_pattern"], false);
        assert_eq!(store.statuses.borrow().last(), Some(&OperationStatus::Completed));
    }

    #[test]
    fn test_save_failure_marks_error() {
        let store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        };
        let service = ParserService::new(&store, &store, ParserConfig::default());
        let err = service.process(Uuid::new_v4(), PAGE, &ParseBudget::unlimited()).unwrap_err();
        assert!(matches!(err, ServiceError::SaveBlock { .. }));
        assert_eq!(
            *store.statuses.borrow(),
            vec![OperationStatus::Processing, OperationStatus::Error]
        );
    }
}
