// ==============================================================================
// phenotype.rs - Metabolizer Phenotype Inference
// ==============================================================================
// Description: Diploid activity-score rule turning one gene's detected alleles
//              into a metabolizer phenotype
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
//
// Each non-reference copy contributes the activity score of its star allele
// (unlisted alleles count as normal function). The list is padded with normal
// copies to two, sorted, and the two lowest scores are summed:
//
//   >= 2.5  Ultra-rapid
//   >= 1.5  Normal
//   >= 1.0  Intermediate
//   <  1.0  Poor
//
// No variant copies at all is the wild-type diplotype and is Normal.
// ==============================================================================

use crate::knowledge_base::KnowledgeBase;
use crate::models::{DetectedAllele, FunctionCategory, MetabolizerPhenotype};

/// Score reported for a wild-type (*1/*1) diplotype
pub const WILD_TYPE_ACTIVITY_SCORE: f64 = 2.0;

const ULTRA_RAPID_THRESHOLD: f64 = 2.5;
const NORMAL_THRESHOLD: f64 = 1.5;
const INTERMEDIATE_THRESHOLD: f64 = 1.0;

/// Summed activity score, or None when no variant copy was detected
pub fn activity_score(kb: &KnowledgeBase, gene: &str, alleles: &[DetectedAllele]) -> Option<f64> {
    let mut scores: Vec<f64> = alleles
        .iter()
        .flat_map(|allele| {
            let score = kb
                .allele_function(gene, &allele.star_allele)
                .unwrap_or(FunctionCategory::Normal)
                .activity_score();
            std::iter::repeat(score).take(allele.genotype.alt_copies())
        })
        .collect();

    if scores.is_empty() {
        return None;
    }

    // Excess copies are not pruned; only the two lowest count
    while scores.len() < 2 {
        scores.push(FunctionCategory::Normal.activity_score());
    }
    scores.sort_by(f64::total_cmp);

    Some(scores[0] + scores[1])
}

pub fn phenotype_for_score(score: f64) -> MetabolizerPhenotype {
    if score >= ULTRA_RAPID_THRESHOLD {
        MetabolizerPhenotype::UltraRapid
    } else if score >= NORMAL_THRESHOLD {
        MetabolizerPhenotype::Normal
    } else if score >= INTERMEDIATE_THRESHOLD {
        MetabolizerPhenotype::Intermediate
    } else {
        MetabolizerPhenotype::Poor
    }
}

/// Total over any input; an empty or unknown gene yields Normal
pub fn infer_phenotype(
    kb: &KnowledgeBase,
    gene: &str,
    alleles: &[DetectedAllele],
) -> MetabolizerPhenotype {
    activity_score(kb, gene, alleles).map_or(MetabolizerPhenotype::Normal, phenotype_for_score)
}
