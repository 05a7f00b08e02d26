// ==============================================================================
// models.rs - Pharmacogenomic Data Models
// ==============================================================================
// Description: Variant, genotype, phenotype and risk types shared by the
//              reader, resolver, inference engine and analyzer
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Parsed variant file: header-ordered sample names plus data records
#[derive(Debug, Clone, Default)]
pub struct VariantFile {
    /// Value of `##fileformat=` if the file declared one (e.g. "VCFv4.2")
    pub file_format: Option<String>,

    /// Sample names in header order
    pub samples: Vec<String>,

    /// Data records in file order
    pub records: Vec<VariantRecord>,
}

impl VariantFile {
    /// Index of a sample by exact name
    pub fn sample_index(&self, name: &str) -> Option<usize> {
        self.samples.iter().position(|s| s == name)
    }
}

/// One VCF data line
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Chromosome as written in the file ("22", "chr10", ...)
    pub chromosome: String,

    /// 1-based position
    pub position: u64,

    /// rsID, or "unknown" when the ID column is "."
    pub id: String,

    /// Reference allele
    pub ref_allele: String,

    /// Alternate alleles (empty when ALT is ".")
    pub alt_alleles: Vec<String>,

    /// INFO key/value pairs; flags map to an empty string
    pub info: HashMap<String, String>,

    /// One call per sample, header order
    pub genotypes: Vec<GenotypeCall>,
}

impl VariantRecord {
    pub const UNKNOWN_ID: &'static str = "unknown";

    pub fn has_known_id(&self) -> bool {
        self.id != Self::UNKNOWN_ID
    }
}

/// Diploid genotype call. `None` is a missing allele (".").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenotypeCall {
    pub alleles: [Option<u32>; 2],
    pub phased: bool,
}

/// Zygosity of a diploid call relative to the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    HomozygousReference,
    Heterozygous,
    HomozygousAlternate,
    NoCall,
}

impl GenotypeCall {
    pub fn new(first: Option<u32>, second: Option<u32>, phased: bool) -> Self {
        Self {
            alleles: [first, second],
            phased,
        }
    }

    /// Fully missing call ("./.")
    pub fn no_call() -> Self {
        Self::new(None, None, false)
    }

    /// Number of copies carrying a non-reference allele (0, 1 or 2)
    pub fn alt_copies(&self) -> usize {
        self.alleles
            .iter()
            .filter(|a| matches!(a, Some(idx) if *idx > 0))
            .count()
    }

    pub fn zygosity(&self) -> Zygosity {
        if self.alleles.iter().all(Option::is_none) {
            return Zygosity::NoCall;
        }
        match self.alt_copies() {
            0 => Zygosity::HomozygousReference,
            1 => Zygosity::Heterozygous,
            _ => Zygosity::HomozygousAlternate,
        }
    }

    /// True when the call carries variant signal (at least one ALT copy)
    pub fn carries_variant(&self) -> bool {
        self.alt_copies() > 0
    }
}

impl fmt::Display for GenotypeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.phased { '|' } else { '/' };
        let render = |a: Option<u32>| a.map_or_else(|| ".".to_string(), |i| i.to_string());
        write!(f, "{}{}{}", render(self.alleles[0]), sep, render(self.alleles[1]))
    }
}

impl Serialize for GenotypeCall {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How a record was mapped to a (gene, star allele) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// INFO carried GENE and STAR
    Annotation,
    /// Looked up through the rsID fallback table
    RsidMap,
}

/// A resolved, non-reference call for one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedAllele {
    pub gene: String,
    pub star_allele: String,
    pub rsid: String,
    pub genotype: GenotypeCall,
    pub zygosity: Zygosity,
    pub source: ResolutionSource,
}

/// Star-allele function category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCategory {
    Normal,
    Decreased,
    NoFunction,
    Increased,
}

impl FunctionCategory {
    /// Activity score contributed by one copy
    pub fn activity_score(&self) -> f64 {
        match self {
            FunctionCategory::Normal => 1.0,
            FunctionCategory::Decreased => 0.5,
            FunctionCategory::NoFunction => 0.0,
            FunctionCategory::Increased => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Normal => "normal",
            FunctionCategory::Decreased => "decreased",
            FunctionCategory::NoFunction => "no_function",
            FunctionCategory::Increased => "increased",
        }
    }
}

/// Diploid metabolizer phenotype for one gene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetabolizerPhenotype {
    #[serde(rename = "Ultra-rapid Metabolizer")]
    UltraRapid,
    #[serde(rename = "Normal Metabolizer")]
    Normal,
    #[serde(rename = "Intermediate Metabolizer")]
    Intermediate,
    #[serde(rename = "Poor Metabolizer")]
    Poor,
    #[serde(rename = "Indeterminate")]
    Indeterminate,
}

impl MetabolizerPhenotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetabolizerPhenotype::UltraRapid => "Ultra-rapid Metabolizer",
            MetabolizerPhenotype::Normal => "Normal Metabolizer",
            MetabolizerPhenotype::Intermediate => "Intermediate Metabolizer",
            MetabolizerPhenotype::Poor => "Poor Metabolizer",
            MetabolizerPhenotype::Indeterminate => "Indeterminate",
        }
    }
}

impl fmt::Display for MetabolizerPhenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical risk category of a drug-gene-phenotype combination
///
/// Ordered by severity, so `max()` picks the verdict to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Safe")]
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    #[serde(rename = "Toxic")]
    Toxic,
    #[serde(rename = "Ineffective")]
    Ineffective,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Safe,
        RiskCategory::AdjustDosage,
        RiskCategory::Toxic,
        RiskCategory::Ineffective,
        RiskCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Safe => "Safe",
            RiskCategory::AdjustDosage => "Adjust Dosage",
            RiskCategory::Toxic => "Toxic",
            RiskCategory::Ineffective => "Ineffective",
            RiskCategory::Unknown => "Unknown",
        }
    }

    /// Display severity: Toxic > Ineffective > Adjust Dosage > Unknown > Safe
    pub fn severity(&self) -> u8 {
        match self {
            RiskCategory::Toxic => 4,
            RiskCategory::Ineffective => 3,
            RiskCategory::AdjustDosage => 2,
            RiskCategory::Unknown => 1,
            RiskCategory::Safe => 0,
        }
    }
}

impl Ord for RiskCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for RiskCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knowledge base row: guidance for one (drug, gene, phenotype)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugGeneInteraction {
    pub drug: String,
    pub gene: String,
    pub phenotype: MetabolizerPhenotype,
    pub risk: RiskCategory,
    pub recommendation: String,
    pub mechanism: String,
    /// CPIC evidence level ("A", "B", ...)
    #[serde(default)]
    pub evidence_level: String,
    #[serde(default)]
    pub guideline_url: Option<String>,
}

/// Machine-readable warning codes attached to drug results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    UnknownDrug,
    UnknownInteraction,
    UnknownGene,
    NoDetectedVariants,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisWarning {
    pub code: WarningCode,
    pub message: String,
}

impl AnalysisWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Per-gene contribution to a drug result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneAssessment {
    pub gene: String,
    pub phenotype: MetabolizerPhenotype,
    pub activity_score: f64,
    pub risk: RiskCategory,
    pub recommendation: String,
    pub mechanism: String,
    pub evidence_level: Option<String>,
    pub guideline_url: Option<String>,
    pub variants: Vec<DetectedAllele>,
}

/// Risk verdict for one requested drug
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugResult {
    pub drug: String,
    /// Most severe gene, None for drugs missing from the knowledge base
    pub gene: Option<String>,
    pub genes: Vec<GeneAssessment>,
    pub phenotype: Option<MetabolizerPhenotype>,
    pub risk: RiskCategory,
    pub recommendation: String,
    pub explanation: String,
    pub activity_score: Option<f64>,
    pub evidence_level: Option<String>,
    pub guideline_url: Option<String>,
    pub variants: Vec<DetectedAllele>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Outcome of one analysis request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub analysis_id: uuid::Uuid,
    pub analyzed_at: chrono::DateTime<chrono::Utc>,
    pub sample_id: String,
    pub samples_in_file: usize,
    pub total_variants: usize,
    pub resolved_variants: usize,
    pub parse_time_ms: Option<f64>,
    pub risk_counts: std::collections::BTreeMap<RiskCategory, usize>,
    pub results: Vec<DrugResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zygosity_patterns() {
        assert_eq!(GenotypeCall::new(Some(0), Some(0), false).zygosity(), Zygosity::HomozygousReference);
        assert_eq!(GenotypeCall::new(Some(0), Some(1), false).zygosity(), Zygosity::Heterozygous);
        assert_eq!(GenotypeCall::new(Some(1), Some(0), true).zygosity(), Zygosity::Heterozygous);
        assert_eq!(GenotypeCall::new(Some(1), Some(1), true).zygosity(), Zygosity::HomozygousAlternate);
        assert_eq!(GenotypeCall::new(Some(1), Some(2), false).zygosity(), Zygosity::HomozygousAlternate);
        assert_eq!(GenotypeCall::no_call().zygosity(), Zygosity::NoCall);
        // Half-missing call with one ALT copy still carries signal
        assert_eq!(GenotypeCall::new(None, Some(1), false).zygosity(), Zygosity::Heterozygous);
    }

    #[test]
    fn test_genotype_display() {
        assert_eq!(GenotypeCall::new(Some(0), Some(1), false).to_string(), "0/1");
        assert_eq!(GenotypeCall::new(Some(1), Some(1), true).to_string(), "1|1");
        assert_eq!(GenotypeCall::no_call().to_string(), "./.");
    }

    #[test]
    fn test_function_scores() {
        assert_eq!(FunctionCategory::Normal.activity_score(), 1.0);
        assert_eq!(FunctionCategory::Decreased.activity_score(), 0.5);
        assert_eq!(FunctionCategory::NoFunction.activity_score(), 0.0);
        assert_eq!(FunctionCategory::Increased.activity_score(), 1.5);
    }

    #[test]
    fn test_risk_severity_order() {
        let mut risks = RiskCategory::ALL.to_vec();
        risks.sort_by(|a, b| b.cmp(a));
        assert_eq!(
            risks,
            vec![
                RiskCategory::Toxic,
                RiskCategory::Ineffective,
                RiskCategory::AdjustDosage,
                RiskCategory::Unknown,
                RiskCategory::Safe,
            ]
        );

        assert_eq!(RiskCategory::ALL.iter().max(), Some(&RiskCategory::Toxic));
        assert!(RiskCategory::Unknown > RiskCategory::Safe);
        assert!(RiskCategory::Ineffective > RiskCategory::AdjustDosage);

        // Count maps list categories mildest first
        let counts: std::collections::BTreeMap<RiskCategory, usize> =
            RiskCategory::ALL.iter().map(|r| (*r, 0)).collect();
        assert_eq!(counts.keys().next(), Some(&RiskCategory::Safe));
        assert_eq!(counts.keys().last(), Some(&RiskCategory::Toxic));
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&RiskCategory::AdjustDosage).unwrap(), "\"Adjust Dosage\"");
        assert_eq!(
            serde_json::to_string(&MetabolizerPhenotype::UltraRapid).unwrap(),
            "\"Ultra-rapid Metabolizer\""
        );
        assert_eq!(serde_json::to_string(&FunctionCategory::NoFunction).unwrap(), "\"no_function\"");
    }
}
