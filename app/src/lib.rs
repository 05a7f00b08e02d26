// ==============================================================================
// lib.rs - Pharmacogenomic Processor Library
// ==============================================================================
// Description: Library interface for VCF parsing, star-allele resolution,
//              phenotype inference and drug risk analysis
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod analyzer;
pub mod knowledge_base;
mod knowledge_data;
pub mod models;
pub mod parsers;
pub mod phenotype;
pub mod resolver;

pub use analyzer::{parse_drug_list, AnalysisError, Analyzer};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseError};
pub use models::{AnalysisResult, DrugResult, MetabolizerPhenotype, RiskCategory};
pub use parsers::{Compression, VcfParseError, VcfParser};
