// ==============================================================================
// resolver.rs - Variant to Star-Allele Resolution
// ==============================================================================
// Description: Maps VCF records to (gene, star allele) pairs through INFO
//              annotations or the rsID fallback table, per sample
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzer::AnalysisError;
use crate::knowledge_base::{normalize_gene, AlleleRef, KnowledgeBase};
use crate::models::{DetectedAllele, ResolutionSource, VariantFile, VariantRecord};

/// INFO key carrying the gene symbol
pub const INFO_GENE: &str = "GENE";
/// INFO key carrying the star allele label
pub const INFO_STAR: &str = "STAR";
/// INFO key carrying a bare dbSNP number, used when ID is "."
pub const INFO_RS: &str = "RS";

/// Resolution of a single record, independent of any sample
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub allele: AlleleRef,
    pub rsid: String,
    pub source: ResolutionSource,
}

/// Detected alleles for one sample, grouped by gene in file order
pub type DetectedAlleles = BTreeMap<String, Vec<DetectedAllele>>;

pub struct VariantResolver<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> VariantResolver<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Annotation wins over the rsID table; None means unresolved
    pub fn resolve_record(&self, record: &VariantRecord) -> Option<Resolution> {
        let rsid = record_rsid(record);

        if let Some(allele) = annotated_allele(record) {
            return Some(Resolution {
                allele,
                rsid: rsid.unwrap_or_else(|| VariantRecord::UNKNOWN_ID.to_string()),
                source: ResolutionSource::Annotation,
            });
        }

        let rsid = rsid?;
        let allele = self.kb.allele_for_rsid(&rsid)?.clone();
        Some(Resolution {
            allele,
            rsid,
            source: ResolutionSource::RsidMap,
        })
    }

    /// Non-reference calls of one sample, grouped by gene.
    ///
    /// Reference-homozygous and no-call genotypes are resolved but not
    /// reported. Records that resolve to nothing are dropped.
    pub fn detected_alleles(
        &self,
        file: &VariantFile,
        sample_idx: usize,
    ) -> Result<DetectedAlleles, AnalysisError> {
        let mut detected = DetectedAlleles::new();
        let mut unresolved = 0usize;

        for record in &file.records {
            let genotype = record.genotypes.get(sample_idx).copied().ok_or_else(|| {
                AnalysisError::Internal(format!(
                    "record {}:{} has {} genotype calls, sample index {} requested",
                    record.chromosome,
                    record.position,
                    record.genotypes.len(),
                    sample_idx
                ))
            })?;

            let Some(resolution) = self.resolve_record(record) else {
                unresolved += 1;
                continue;
            };

            if !genotype.carries_variant() {
                continue;
            }

            debug!(
                "{}:{} {} -> {} {} ({})",
                record.chromosome,
                record.position,
                genotype,
                resolution.allele.gene,
                resolution.allele.star_allele,
                resolution.rsid
            );

            detected
                .entry(resolution.allele.gene.clone())
                .or_default()
                .push(DetectedAllele {
                    gene: resolution.allele.gene,
                    star_allele: resolution.allele.star_allele,
                    rsid: resolution.rsid,
                    genotype,
                    zygosity: genotype.zygosity(),
                    source: resolution.source,
                });
        }

        debug!(
            "Resolved {} records, {} unresolved, {} genes with variants",
            file.records.len() - unresolved,
            unresolved,
            detected.len()
        );

        Ok(detected)
    }
}

fn annotated_allele(record: &VariantRecord) -> Option<AlleleRef> {
    let gene = record.info.get(INFO_GENE).map(|g| g.trim()).filter(|g| !g.is_empty())?;
    let star = record.info.get(INFO_STAR).map(|s| s.trim()).filter(|s| !s.is_empty())?;
    Some(AlleleRef::new(normalize_gene(gene), star))
}

/// ID column if set, otherwise `rs` + INFO RS number
fn record_rsid(record: &VariantRecord) -> Option<String> {
    if record.has_known_id() {
        return Some(record.id.clone());
    }
    record
        .info
        .get(INFO_RS)
        .map(|rs| rs.trim())
        .filter(|rs| !rs.is_empty() && rs.bytes().all(|b| b.is_ascii_digit()))
        .map(|rs| format!("rs{rs}"))
}
