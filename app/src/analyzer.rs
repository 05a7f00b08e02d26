// ==============================================================================
// analyzer.rs - Pharmacogenomic Analysis Pipeline
// ==============================================================================
// Description: Sample selection, per-drug gene assessment, multi-gene
//              aggregation and result assembly
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use chrono::Utc;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::knowledge_base::{normalize_drug, KnowledgeBase};
use crate::models::{
    AnalysisResult, AnalysisWarning, DetectedAllele, DrugResult, GeneAssessment,
    MetabolizerPhenotype, RiskCategory, VariantFile, WarningCode,
};
use crate::phenotype::{activity_score, phenotype_for_score, WILD_TYPE_ACTIVITY_SCORE};
use crate::resolver::{DetectedAlleles, VariantResolver};

/// Analysis failures (parse failures are reported by the reader)
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Variant file contains no samples to analyze")]
    NoSample,

    #[error("Sample '{0}' not found in variant file")]
    SampleNotFound(String),

    #[error("Internal analysis error: {0}")]
    Internal(String),
}

const UNKNOWN_DRUG_RECOMMENDATION: &str =
    "No pharmacogenomic guidance is available for this drug. Use standard prescribing information.";
const INSUFFICIENT_DATA_RECOMMENDATION: &str =
    "Insufficient data to make a genotype-guided recommendation. Use standard prescribing information.";

/// Split a comma-separated drug list, trimming and dropping empty names
pub fn parse_drug_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Analyzer<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> Analyzer<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Explicit sample by exact name, otherwise the first sample in the header
    pub fn select_sample(
        file: &VariantFile,
        sample: Option<&str>,
    ) -> Result<(usize, String), AnalysisError> {
        if file.samples.is_empty() {
            return Err(AnalysisError::NoSample);
        }

        match sample {
            Some(name) => file
                .sample_index(name)
                .map(|idx| (idx, name.to_string()))
                .ok_or_else(|| AnalysisError::SampleNotFound(name.to_string())),
            None => Ok((0, file.samples[0].clone())),
        }
    }

    /// Run the full pipeline for one sample and a list of drugs
    pub fn analyze(
        &self,
        file: &VariantFile,
        sample: Option<&str>,
        drugs: &[String],
        parse_time_ms: Option<f64>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let (sample_idx, sample_id) = Self::select_sample(file, sample)?;
        info!(
            "Analyzing sample {} ({} of {} samples) against {} drugs",
            sample_id,
            sample_idx + 1,
            file.samples.len(),
            drugs.len()
        );

        let detected = VariantResolver::new(self.kb).detected_alleles(file, sample_idx)?;
        let resolved_variants: usize = detected.values().map(Vec::len).sum();

        let results: Vec<DrugResult> = drugs
            .iter()
            .map(|drug| self.assess_drug(drug, &detected))
            .collect();

        let mut risk_counts: BTreeMap<RiskCategory, usize> =
            RiskCategory::ALL.iter().map(|risk| (*risk, 0)).collect();
        for result in &results {
            *risk_counts.entry(result.risk).or_default() += 1;
        }

        info!(
            "Analysis complete for {}: {} variants in file, {} detected alleles, {} drug results",
            sample_id,
            file.records.len(),
            resolved_variants,
            results.len()
        );

        Ok(AnalysisResult {
            analysis_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            sample_id,
            samples_in_file: file.samples.len(),
            total_variants: file.records.len(),
            resolved_variants,
            parse_time_ms,
            risk_counts,
            results,
        })
    }

    fn assess_drug(&self, requested: &str, detected: &DetectedAlleles) -> DrugResult {
        let drug = normalize_drug(requested);

        if !self.kb.is_known_drug(&drug) {
            warn!("Drug '{}' is not in the knowledge base", drug);
            return DrugResult {
                warnings: vec![AnalysisWarning::new(
                    WarningCode::UnknownDrug,
                    format!("Drug '{drug}' is not in the pharmacogenomic knowledge base"),
                )],
                drug,
                gene: None,
                genes: Vec::new(),
                phenotype: None,
                risk: RiskCategory::Unknown,
                recommendation: UNKNOWN_DRUG_RECOMMENDATION.to_string(),
                explanation: String::new(),
                activity_score: None,
                evidence_level: None,
                guideline_url: None,
                variants: Vec::new(),
            };
        }

        let mut warnings = Vec::new();
        let mut assessments: Vec<GeneAssessment> = self
            .kb
            .genes_for_drug(&drug)
            .iter()
            .map(|gene| {
                let alleles = detected.get(gene).map(Vec::as_slice).unwrap_or(&[]);
                self.assess_gene(&drug, gene, alleles, &mut warnings)
            })
            .collect();

        // Stable: equal severities keep knowledge-base gene order
        assessments.sort_by_key(|a| Reverse(a.risk));

        let Some(primary) = assessments.first() else {
            return DrugResult {
                drug,
                gene: None,
                genes: Vec::new(),
                phenotype: None,
                risk: RiskCategory::Unknown,
                recommendation: INSUFFICIENT_DATA_RECOMMENDATION.to_string(),
                explanation: String::new(),
                activity_score: None,
                evidence_level: None,
                guideline_url: None,
                variants: Vec::new(),
                warnings,
            };
        };

        let (recommendation, explanation) = if assessments.len() == 1 {
            (primary.recommendation.clone(), primary.mechanism.clone())
        } else {
            (
                join_by_gene(&assessments, |a| &a.recommendation),
                join_by_gene(&assessments, |a| &a.mechanism),
            )
        };

        DrugResult {
            gene: Some(primary.gene.clone()),
            phenotype: Some(primary.phenotype),
            risk: primary.risk,
            activity_score: Some(primary.activity_score),
            evidence_level: primary.evidence_level.clone(),
            guideline_url: primary.guideline_url.clone(),
            variants: assessments
                .iter()
                .flat_map(|a| a.variants.iter().cloned())
                .collect(),
            drug,
            recommendation,
            explanation,
            genes: assessments,
            warnings,
        }
    }

    fn assess_gene(
        &self,
        drug: &str,
        gene: &str,
        alleles: &[DetectedAllele],
        warnings: &mut Vec<AnalysisWarning>,
    ) -> GeneAssessment {
        if !self.kb.has_function_table(gene) {
            warnings.push(AnalysisWarning::new(
                WarningCode::UnknownGene,
                format!("No allele function table for {gene}; star alleles count as normal function"),
            ));
        }
        if alleles.is_empty() {
            warnings.push(AnalysisWarning::new(
                WarningCode::NoDetectedVariants,
                format!("No variants detected in {gene}; assuming a wild-type (*1/*1) diplotype"),
            ));
        }

        let score = activity_score(self.kb, gene, alleles);
        let phenotype = score.map_or(MetabolizerPhenotype::Normal, phenotype_for_score);

        let mut assessment = GeneAssessment {
            gene: gene.to_string(),
            phenotype,
            activity_score: score.unwrap_or(WILD_TYPE_ACTIVITY_SCORE),
            risk: RiskCategory::Unknown,
            recommendation: INSUFFICIENT_DATA_RECOMMENDATION.to_string(),
            mechanism: format!("No guideline entry for {drug} in {gene} {phenotype}s."),
            evidence_level: None,
            guideline_url: None,
            variants: alleles.to_vec(),
        };

        match self.kb.lookup_interaction(drug, gene, phenotype) {
            Some(interaction) => {
                assessment.risk = interaction.risk;
                assessment.recommendation = interaction.recommendation.clone();
                assessment.mechanism = interaction.mechanism.clone();
                assessment.evidence_level =
                    Some(interaction.evidence_level.clone()).filter(|level| !level.is_empty());
                assessment.guideline_url = interaction.guideline_url.clone();
            }
            None => {
                warn!("No interaction rule for {}/{}/{}", drug, gene, phenotype);
                warnings.push(AnalysisWarning::new(
                    WarningCode::UnknownInteraction,
                    format!("No guideline entry for {drug} with {gene} {phenotype}"),
                ));
            }
        }

        assessment
    }
}

fn join_by_gene(assessments: &[GeneAssessment], text: impl Fn(&GeneAssessment) -> &String) -> String {
    assessments
        .iter()
        .map(|a| format!("{}: {}", a.gene, text(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::KnowledgeTables;
    use crate::models::DrugGeneInteraction;
    use crate::parsers::VcfParser;

    fn vcf(samples: &[&str], body: &str) -> VariantFile {
        let mut header = String::from("##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO");
        if !samples.is_empty() {
            header.push_str("\tFORMAT");
            for s in samples {
                header.push('\t');
                header.push_str(s);
            }
        }
        VcfParser::new()
            .parse_bytes(format!("{header}\n{body}").as_bytes())
            .unwrap()
    }

    fn codeine_file(gt: &str) -> VariantFile {
        vcf(
            &["PATIENT_001"],
            &format!("22\t42128945\trs3892097\tC\tT\t.\tPASS\t.\tGT\t{gt}\n"),
        )
    }

    fn drugs(names: &[&str]) -> Vec<String> {
        names.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_parse_drug_list() {
        assert_eq!(
            parse_drug_list(" codeine, Warfarin ,,simvastatin , "),
            vec!["codeine", "Warfarin", "simvastatin"]
        );
        assert!(parse_drug_list(" , ").is_empty());
    }

    #[test]
    fn test_codeine_poor_metabolizer() {
        let kb = KnowledgeBase::cpic();
        let result = Analyzer::new(&kb)
            .analyze(&codeine_file("1/1"), None, &drugs(&["Codeine"]), Some(1.5))
            .unwrap();

        assert_eq!(result.sample_id, "PATIENT_001");
        assert_eq!(result.parse_time_ms, Some(1.5));
        assert_eq!(result.resolved_variants, 1);

        let codeine = &result.results[0];
        assert_eq!(codeine.drug, "codeine");
        assert_eq!(codeine.gene.as_deref(), Some("CYP2D6"));
        assert_eq!(codeine.phenotype, Some(MetabolizerPhenotype::Poor));
        assert_eq!(codeine.risk, RiskCategory::Ineffective);
        assert_eq!(codeine.activity_score, Some(0.0));
        assert!(codeine.recommendation.contains("AVOID codeine"));
        assert_eq!(codeine.variants.len(), 1);
        assert_eq!(codeine.variants[0].star_allele, "*4");
        assert!(codeine.warnings.is_empty());
        assert_eq!(result.risk_counts[&RiskCategory::Ineffective], 1);
        assert_eq!(result.risk_counts[&RiskCategory::Safe], 0);
    }

    #[test]
    fn test_codeine_reference_is_safe() {
        let kb = KnowledgeBase::cpic();
        let result = Analyzer::new(&kb)
            .analyze(&codeine_file("0/0"), None, &drugs(&["codeine"]), None)
            .unwrap();

        let codeine = &result.results[0];
        assert_eq!(codeine.phenotype, Some(MetabolizerPhenotype::Normal));
        assert_eq!(codeine.risk, RiskCategory::Safe);
        assert_eq!(codeine.activity_score, Some(WILD_TYPE_ACTIVITY_SCORE));
        assert!(codeine.variants.is_empty());
        assert_eq!(codeine.warnings.len(), 1);
        assert_eq!(codeine.warnings[0].code, WarningCode::NoDetectedVariants);
    }

    #[test]
    fn test_unknown_drug_is_a_warning_not_a_failure() {
        let kb = KnowledgeBase::cpic();
        let result = Analyzer::new(&kb)
            .analyze(&codeine_file("1/1"), None, &drugs(&["aspirin", "codeine"]), None)
            .unwrap();

        assert_eq!(result.results.len(), 2);
        let aspirin = &result.results[0];
        assert_eq!(aspirin.drug, "aspirin");
        assert_eq!(aspirin.risk, RiskCategory::Unknown);
        assert_eq!(aspirin.gene, None);
        assert!(aspirin.genes.is_empty());
        assert_eq!(aspirin.warnings[0].code, WarningCode::UnknownDrug);
        assert_eq!(result.results[1].drug, "codeine");
        assert_eq!(result.risk_counts[&RiskCategory::Unknown], 1);
    }

    #[test]
    fn test_sample_selection() {
        let kb = KnowledgeBase::cpic();
        let file = vcf(
            &["FIRST", "SECOND"],
            "22\t42128945\trs3892097\tC\tT\t.\tPASS\t.\tGT\t0/0\t0/1\n",
        );
        let analyzer = Analyzer::new(&kb);

        let first = analyzer.analyze(&file, None, &drugs(&["codeine"]), None).unwrap();
        assert_eq!(first.sample_id, "FIRST");
        assert_eq!(first.samples_in_file, 2);
        assert_eq!(first.results[0].risk, RiskCategory::Safe);

        let second = analyzer
            .analyze(&file, Some("SECOND"), &drugs(&["codeine"]), None)
            .unwrap();
        assert_eq!(second.sample_id, "SECOND");
        assert_eq!(second.results[0].phenotype, Some(MetabolizerPhenotype::Intermediate));
        assert_eq!(second.results[0].risk, RiskCategory::AdjustDosage);

        assert!(matches!(
            analyzer.analyze(&file, Some("second"), &drugs(&["codeine"]), None),
            Err(AnalysisError::SampleNotFound(name)) if name == "second"
        ));
    }

    #[test]
    fn test_zero_samples_is_no_sample_error() {
        let kb = KnowledgeBase::cpic();
        let file = vcf(&[], "22\t42128945\trs3892097\tC\tT\t.\tPASS\t.\n");

        assert!(matches!(
            Analyzer::new(&kb).analyze(&file, None, &drugs(&["codeine"]), None),
            Err(AnalysisError::NoSample)
        ));
        assert!(matches!(
            Analyzer::new(&kb).analyze(&file, Some("ANY"), &drugs(&["codeine"]), None),
            Err(AnalysisError::NoSample)
        ));
    }

    #[test]
    fn test_unresolved_variants_are_dropped() {
        let kb = KnowledgeBase::cpic();
        let file = vcf(
            &["S1"],
            "1\t1000\trs0000001\tA\tG\t.\tPASS\t.\tGT\t1/1\n\
             1\t2000\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\n",
        );
        let result = Analyzer::new(&kb)
            .analyze(&file, None, &drugs(&["codeine"]), None)
            .unwrap();

        assert_eq!(result.total_variants, 2);
        assert_eq!(result.resolved_variants, 0);
        assert_eq!(result.results[0].risk, RiskCategory::Safe);
    }

    fn interaction(gene: &str, phenotype: MetabolizerPhenotype, risk: RiskCategory) -> DrugGeneInteraction {
        DrugGeneInteraction {
            drug: "warfarin".to_string(),
            gene: gene.to_string(),
            phenotype,
            risk,
            recommendation: format!("{gene} advice."),
            mechanism: format!("{gene} mechanism."),
            evidence_level: "A".to_string(),
            guideline_url: None,
        }
    }

    #[test]
    fn test_multi_gene_aggregation_orders_by_severity() {
        let kb = KnowledgeBase::from_tables(KnowledgeTables {
            interactions: vec![
                interaction("CYP2C9", MetabolizerPhenotype::Normal, RiskCategory::Safe),
                interaction("VKORC1", MetabolizerPhenotype::Normal, RiskCategory::AdjustDosage),
            ],
            ..Default::default()
        });
        let file = vcf(&["S1"], "1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/0\n");

        let result = Analyzer::new(&kb)
            .analyze(&file, None, &drugs(&["warfarin"]), None)
            .unwrap();
        let warfarin = &result.results[0];

        assert_eq!(warfarin.gene.as_deref(), Some("VKORC1"));
        assert_eq!(warfarin.risk, RiskCategory::AdjustDosage);
        let genes: Vec<&str> = warfarin.genes.iter().map(|g| g.gene.as_str()).collect();
        assert_eq!(genes, vec!["VKORC1", "CYP2C9"]);
        assert_eq!(warfarin.recommendation, "VKORC1: VKORC1 advice. CYP2C9: CYP2C9 advice.");
        assert_eq!(warfarin.explanation, "VKORC1: VKORC1 mechanism. CYP2C9: CYP2C9 mechanism.");
        // Neither gene has a function table here
        assert_eq!(
            warfarin
                .warnings
                .iter()
                .filter(|w| w.code == WarningCode::UnknownGene)
                .count(),
            2
        );
    }

    #[test]
    fn test_equal_severity_keeps_table_order() {
        let kb = KnowledgeBase::from_tables(KnowledgeTables {
            interactions: vec![
                interaction("CYP2C9", MetabolizerPhenotype::Normal, RiskCategory::Safe),
                interaction("VKORC1", MetabolizerPhenotype::Normal, RiskCategory::Safe),
            ],
            ..Default::default()
        });
        let file = vcf(&["S1"], "1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/0\n");

        let result = Analyzer::new(&kb)
            .analyze(&file, None, &drugs(&["warfarin"]), None)
            .unwrap();

        assert_eq!(result.results[0].gene.as_deref(), Some("CYP2C9"));
    }

    #[test]
    fn test_missing_interaction_is_unknown_risk() {
        let kb = KnowledgeBase::from_tables(KnowledgeTables {
            interactions: vec![interaction("VKORC1", MetabolizerPhenotype::Poor, RiskCategory::Toxic)],
            ..Default::default()
        });
        let file = vcf(&["S1"], "1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/0\n");

        let result = Analyzer::new(&kb)
            .analyze(&file, None, &drugs(&["warfarin"]), None)
            .unwrap();
        let warfarin = &result.results[0];

        assert_eq!(warfarin.risk, RiskCategory::Unknown);
        assert_eq!(warfarin.phenotype, Some(MetabolizerPhenotype::Normal));
        assert_eq!(warfarin.recommendation, INSUFFICIENT_DATA_RECOMMENDATION);
        assert!(warfarin
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::UnknownInteraction));
    }
}
