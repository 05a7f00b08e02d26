// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared application state for the API gateway
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use pgx_processor::KnowledgeBase;
use std::sync::Arc;

use crate::validator::FileValidator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Read-only knowledge base, loaded once at startup
    knowledge_base: KnowledgeBase,

    /// Upload checks applied before parsing
    validator: FileValidator,
}

impl AppState {
    pub fn with_validator(knowledge_base: KnowledgeBase, validator: FileValidator) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                knowledge_base,
                validator,
            }),
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.inner.knowledge_base
    }

    pub fn validator(&self) -> &FileValidator {
        &self.inner.validator
    }

    #[cfg(test)]
    pub fn mock() -> Self {
        Self::with_validator(KnowledgeBase::cpic(), FileValidator::new())
    }
}
