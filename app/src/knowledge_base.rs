// ==============================================================================
// knowledge_base.rs - Pharmacogenomic Knowledge Base
// ==============================================================================
// Description: Immutable, indexed lookup over star-allele function tables,
//              the rsID fallback map and drug-gene-phenotype guidance
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Built once at startup and shared read-only (Arc) across requests; no
// interior mutability, so concurrent readers need no locking.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::knowledge_data::{ALLELE_FUNCTIONS, INTERACTIONS, RSID_ALLELES};
use crate::models::{DrugGeneInteraction, FunctionCategory, MetabolizerPhenotype};

/// Knowledge base loading errors
#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    #[error("Failed to read knowledge base file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid knowledge base JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Knowledge base contains no drug-gene interactions")]
    NoInteractions,
}

/// A (gene, star allele) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlleleRef {
    pub gene: String,
    pub star_allele: String,
}

impl AlleleRef {
    pub fn new(gene: impl Into<String>, star_allele: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            star_allele: star_allele.into(),
        }
    }
}

/// Composite index key: drug lowercased, gene uppercased, exact phenotype
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionKey {
    drug: String,
    gene: String,
    phenotype: MetabolizerPhenotype,
}

impl InteractionKey {
    pub fn new(drug: &str, gene: &str, phenotype: MetabolizerPhenotype) -> Self {
        Self {
            drug: normalize_drug(drug),
            gene: normalize_gene(gene),
            phenotype,
        }
    }
}

pub fn normalize_drug(drug: &str) -> String {
    drug.trim().to_lowercase()
}

pub fn normalize_gene(gene: &str) -> String {
    gene.trim().to_uppercase()
}

fn normalize_rsid(rsid: &str) -> String {
    rsid.trim().to_lowercase()
}

/// Serializable source tables, the shape of an external JSON dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeTables {
    /// gene -> star allele -> function category
    #[serde(default)]
    pub allele_functions: HashMap<String, HashMap<String, FunctionCategory>>,

    /// rsID -> (gene, star allele)
    #[serde(default)]
    pub rsid_alleles: HashMap<String, AlleleRef>,

    /// Guidance rows; row order drives the per-drug gene order
    pub interactions: Vec<DrugGeneInteraction>,
}

/// Read-only query surface over the static pharmacogenomic tables
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    allele_functions: HashMap<String, HashMap<String, FunctionCategory>>,
    rsid_alleles: HashMap<String, AlleleRef>,
    interactions: HashMap<InteractionKey, DrugGeneInteraction>,
    drug_genes: HashMap<String, Vec<String>>,
    drugs: Vec<String>,
    genes: Vec<String>,
}

impl KnowledgeBase {
    /// Built-in CPIC-aligned dataset
    pub fn cpic() -> Self {
        let allele_functions = ALLELE_FUNCTIONS
            .iter()
            .map(|(gene, alleles)| {
                let table = alleles
                    .iter()
                    .map(|(star, func)| (star.to_string(), *func))
                    .collect();
                (gene.to_string(), table)
            })
            .collect();

        let rsid_alleles = RSID_ALLELES
            .iter()
            .map(|(rsid, gene, star)| (rsid.to_string(), AlleleRef::new(*gene, *star)))
            .collect();

        let interactions = INTERACTIONS
            .iter()
            .map(|row| DrugGeneInteraction {
                drug: row.drug.to_string(),
                gene: row.gene.to_string(),
                phenotype: row.phenotype,
                risk: row.risk,
                recommendation: row.recommendation.to_string(),
                mechanism: row.mechanism.to_string(),
                evidence_level: row.evidence_level.to_string(),
                guideline_url: row.guideline_url.map(str::to_string),
            })
            .collect();

        Self::from_tables(KnowledgeTables {
            allele_functions,
            rsid_alleles,
            interactions,
        })
    }

    /// Build the indexes from raw tables
    pub fn from_tables(tables: KnowledgeTables) -> Self {
        let allele_functions: HashMap<String, HashMap<String, FunctionCategory>> = tables
            .allele_functions
            .into_iter()
            .map(|(gene, alleles)| {
                let alleles = alleles
                    .into_iter()
                    .map(|(star, func)| (star.trim().to_string(), func))
                    .collect();
                (normalize_gene(&gene), alleles)
            })
            .collect();

        let rsid_alleles: HashMap<String, AlleleRef> = tables
            .rsid_alleles
            .into_iter()
            .map(|(rsid, allele)| {
                let allele = AlleleRef::new(normalize_gene(&allele.gene), allele.star_allele.trim());
                (normalize_rsid(&rsid), allele)
            })
            .collect();

        let mut interactions = HashMap::with_capacity(tables.interactions.len());
        let mut drug_genes: HashMap<String, Vec<String>> = HashMap::new();
        let mut genes: BTreeSet<String> = BTreeSet::new();

        for interaction in tables.interactions {
            let drug = normalize_drug(&interaction.drug);
            let gene = normalize_gene(&interaction.gene);

            let drug_gene_list = drug_genes.entry(drug.clone()).or_default();
            if !drug_gene_list.contains(&gene) {
                drug_gene_list.push(gene.clone());
            }
            genes.insert(gene.clone());

            let key = InteractionKey::new(&drug, &gene, interaction.phenotype);
            let previous = interactions.insert(
                key,
                DrugGeneInteraction {
                    drug,
                    gene,
                    ..interaction
                },
            );
            if let Some(previous) = previous {
                warn!(
                    "Duplicate interaction for {}/{}/{}; keeping the later row",
                    previous.drug, previous.gene, previous.phenotype
                );
            }
        }

        genes.extend(allele_functions.keys().cloned());
        genes.extend(rsid_alleles.values().map(|a| a.gene.clone()));

        let mut drugs: Vec<String> = drug_genes.keys().cloned().collect();
        drugs.sort();

        Self {
            allele_functions,
            rsid_alleles,
            interactions,
            drug_genes,
            drugs,
            genes: genes.into_iter().collect(),
        }
    }

    /// Load an alternative dataset from a JSON file shaped like `KnowledgeTables`
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, KnowledgeBaseError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let tables: KnowledgeTables = serde_json::from_reader(reader)?;

        if tables.interactions.is_empty() {
            return Err(KnowledgeBaseError::NoInteractions);
        }

        let kb = Self::from_tables(tables);
        info!(
            "Loaded knowledge base from {}: {} drugs, {} genes, {} interactions",
            path.display(),
            kb.drugs.len(),
            kb.genes.len(),
            kb.interaction_count()
        );
        Ok(kb)
    }

    /// Exact (drug, gene, phenotype) match; None means "no rule authored"
    pub fn lookup_interaction(
        &self,
        drug: &str,
        gene: &str,
        phenotype: MetabolizerPhenotype,
    ) -> Option<&DrugGeneInteraction> {
        self.interactions.get(&InteractionKey::new(drug, gene, phenotype))
    }

    /// Genes relevant to a drug, in first-seen table order
    pub fn genes_for_drug(&self, drug: &str) -> &[String] {
        self.drug_genes
            .get(&normalize_drug(drug))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_known_drug(&self, drug: &str) -> bool {
        self.drug_genes.contains_key(&normalize_drug(drug))
    }

    /// Function category of a star allele, None when the table lacks it
    pub fn allele_function(&self, gene: &str, star_allele: &str) -> Option<FunctionCategory> {
        self.allele_functions
            .get(&normalize_gene(gene))
            .and_then(|alleles| alleles.get(star_allele.trim()))
            .copied()
    }

    pub fn has_function_table(&self, gene: &str) -> bool {
        self.allele_functions.contains_key(&normalize_gene(gene))
    }

    /// rsID fallback resolution
    pub fn allele_for_rsid(&self, rsid: &str) -> Option<&AlleleRef> {
        self.rsid_alleles.get(&normalize_rsid(rsid))
    }

    /// All drug names, sorted
    pub fn drugs(&self) -> &[String] {
        &self.drugs
    }

    /// All gene names, sorted
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::cpic()
    }
}
