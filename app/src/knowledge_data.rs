// ==============================================================================
// knowledge_data.rs - Built-in CPIC Dataset
// ==============================================================================
// Description: Star-allele function tables, rsID fallback map and CPIC-aligned
//              drug-gene-phenotype guidance used by KnowledgeBase::cpic()
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Sources:
// - CPIC guidelines: https://cpicpgx.org/guidelines/
// - PharmVar allele function: https://www.pharmvar.org/
// ==============================================================================

use crate::models::FunctionCategory::{self, Decreased, Increased, NoFunction, Normal};
use crate::models::MetabolizerPhenotype::{self, Intermediate, Poor, UltraRapid};
use crate::models::RiskCategory::{self, AdjustDosage, Ineffective, Safe, Toxic};

// "Extensive" is the older CPIC term for a normal metabolizer
use crate::models::MetabolizerPhenotype::Normal as Extensive;

/// One static interaction row
pub(crate) struct InteractionRow {
    pub drug: &'static str,
    pub gene: &'static str,
    pub phenotype: MetabolizerPhenotype,
    pub risk: RiskCategory,
    pub recommendation: &'static str,
    pub mechanism: &'static str,
    pub evidence_level: &'static str,
    pub guideline_url: Option<&'static str>,
}

const fn row(
    drug: &'static str,
    gene: &'static str,
    phenotype: MetabolizerPhenotype,
    risk: RiskCategory,
    recommendation: &'static str,
    mechanism: &'static str,
    evidence_level: &'static str,
) -> InteractionRow {
    InteractionRow {
        drug,
        gene,
        phenotype,
        risk,
        recommendation,
        mechanism,
        evidence_level,
        guideline_url: None,
    }
}

const fn row_with_url(
    drug: &'static str,
    gene: &'static str,
    phenotype: MetabolizerPhenotype,
    risk: RiskCategory,
    recommendation: &'static str,
    mechanism: &'static str,
    evidence_level: &'static str,
    guideline_url: &'static str,
) -> InteractionRow {
    InteractionRow {
        guideline_url: Some(guideline_url),
        ..row(drug, gene, phenotype, risk, recommendation, mechanism, evidence_level)
    }
}

/// Star allele -> function category, per gene
pub(crate) const ALLELE_FUNCTIONS: &[(&str, &[(&str, FunctionCategory)])] = &[
    (
        "CYP2D6",
        &[
            ("*1", Normal),
            ("*2", Normal),
            ("*3", NoFunction),
            ("*4", NoFunction),
            ("*5", NoFunction),
            ("*6", NoFunction),
            ("*9", Decreased),
            ("*10", Decreased),
            ("*17", Decreased),
            ("*29", Decreased),
            ("*41", Decreased),
        ],
    ),
    (
        "CYP2C19",
        &[
            ("*1", Normal),
            ("*2", NoFunction),
            ("*3", NoFunction),
            ("*4", NoFunction),
            ("*17", Increased),
        ],
    ),
    (
        "CYP2C9",
        &[
            ("*1", Normal),
            ("*2", Decreased),
            ("*3", NoFunction),
            ("*5", Decreased),
            ("*6", NoFunction),
            ("*8", Decreased),
            ("*11", Decreased),
        ],
    ),
    (
        "SLCO1B1",
        &[
            ("*1", Normal),
            ("*5", Decreased),
            ("*15", Decreased),
            ("*17", Decreased),
        ],
    ),
    (
        "TPMT",
        &[
            ("*1", Normal),
            ("*2", NoFunction),
            ("*3A", NoFunction),
            ("*3B", NoFunction),
            ("*3C", NoFunction),
        ],
    ),
    (
        "DPYD",
        &[
            ("*1", Normal),
            ("*2A", NoFunction),
            ("*13", NoFunction),
            ("c.2846A>T", Decreased),
            ("c.1236G>A/HapB3", Decreased),
        ],
    ),
];

/// rsID -> (gene, star allele) for files without GENE/STAR annotations
pub(crate) const RSID_ALLELES: &[(&str, &str, &str)] = &[
    // CYP2D6
    ("rs3892097", "CYP2D6", "*4"),
    ("rs5030655", "CYP2D6", "*6"),
    ("rs1065852", "CYP2D6", "*10"),
    ("rs28371706", "CYP2D6", "*17"),
    ("rs16947", "CYP2D6", "*2"),
    ("rs28371725", "CYP2D6", "*41"),
    // CYP2C19
    ("rs4244285", "CYP2C19", "*2"),
    ("rs4986893", "CYP2C19", "*3"),
    ("rs12248560", "CYP2C19", "*17"),
    // CYP2C9
    ("rs1799853", "CYP2C9", "*2"),
    ("rs1057910", "CYP2C9", "*3"),
    // SLCO1B1
    ("rs4149056", "SLCO1B1", "*5"),
    // TPMT
    ("rs1800462", "TPMT", "*2"),
    ("rs1800460", "TPMT", "*3B"),
    ("rs1142345", "TPMT", "*3C"),
    // DPYD
    ("rs3918290", "DPYD", "*2A"),
    ("rs55886062", "DPYD", "*13"),
    ("rs67376798", "DPYD", "c.2846A>T"),
];

/// Drug-gene-phenotype guidance, in table order (drives per-drug gene order)
pub(crate) const INTERACTIONS: &[InteractionRow] = &[
    // ── CYP2D6 ──────────────────────────────────────────────────────────
    row_with_url("codeine", "CYP2D6", UltraRapid, Toxic,
        "AVOID codeine. Use alternative analgesic not metabolized by CYP2D6 (e.g., morphine, non-opioids).",
        "CYP2D6 ultra-rapid metabolizers convert codeine to morphine at extremely high rates, leading to potentially fatal respiratory depression.",
        "A", "https://cpicpgx.org/guidelines/guideline-for-codeine-and-cyp2d6/"),
    row("codeine", "CYP2D6", Extensive, Safe,
        "Use codeine per standard dosing guidelines.",
        "Normal CYP2D6 activity produces expected morphine levels from codeine.",
        "A"),
    row("codeine", "CYP2D6", Intermediate, AdjustDosage,
        "Use codeine with caution at reduced dose, or consider alternative analgesic.",
        "Reduced CYP2D6 activity leads to lower morphine formation; analgesic effect may be diminished.",
        "A"),
    row("codeine", "CYP2D6", Poor, Ineffective,
        "AVOID codeine. Use alternative analgesic. Codeine will provide insufficient pain relief.",
        "CYP2D6 poor metabolizers cannot convert codeine to its active metabolite morphine, rendering it ineffective.",
        "A"),

    row("tramadol", "CYP2D6", UltraRapid, Toxic,
        "AVOID tramadol. Risk of respiratory depression and seizures.",
        "Ultra-rapid CYP2D6 metabolism converts tramadol to O-desmethyltramadol at dangerously high rates.",
        "A"),
    row("tramadol", "CYP2D6", Extensive, Safe,
        "Use tramadol per standard dosing.",
        "Normal CYP2D6 metabolism produces expected levels of active metabolite.",
        "A"),
    row("tramadol", "CYP2D6", Intermediate, AdjustDosage,
        "Use tramadol with caution; consider lower dose or alternative.",
        "Intermediate CYP2D6 activity may reduce active metabolite formation.",
        "A"),
    row("tramadol", "CYP2D6", Poor, Ineffective,
        "AVOID tramadol. Consider alternative analgesic.",
        "Poor CYP2D6 metabolism prevents formation of the active O-desmethyltramadol metabolite.",
        "A"),

    row("tamoxifen", "CYP2D6", UltraRapid, Safe,
        "Use tamoxifen per standard dosing.",
        "Adequate endoxifen formation with ultra-rapid CYP2D6 metabolism.",
        "A"),
    row("tamoxifen", "CYP2D6", Extensive, Safe,
        "Use tamoxifen per standard dosing (20 mg/day).",
        "Normal CYP2D6 converts tamoxifen to endoxifen at therapeutic levels.",
        "A"),
    row("tamoxifen", "CYP2D6", Intermediate, AdjustDosage,
        "Consider higher dose (40 mg/day) or alternative (aromatase inhibitor if post-menopausal).",
        "Reduced CYP2D6 activity decreases endoxifen formation, possibly lowering efficacy for breast cancer treatment.",
        "A"),
    row("tamoxifen", "CYP2D6", Poor, Ineffective,
        "AVOID tamoxifen. Use aromatase inhibitor (if post-menopausal) or alternative endocrine therapy.",
        "CYP2D6 poor metabolizers produce subtherapeutic endoxifen levels, compromising tamoxifen's anti-cancer efficacy.",
        "A"),

    // ── CYP2C19 ─────────────────────────────────────────────────────────
    row("clopidogrel", "CYP2C19", UltraRapid, Safe,
        "Use clopidogrel per standard dosing.",
        "Ultra-rapid CYP2C19 metabolism provides enhanced activation of clopidogrel to its active thiol metabolite.",
        "A"),
    row("clopidogrel", "CYP2C19", Extensive, Safe,
        "Use clopidogrel per standard dosing (75 mg/day).",
        "Normal CYP2C19 function activates clopidogrel adequately for anti-platelet effect.",
        "A"),
    row("clopidogrel", "CYP2C19", Intermediate, AdjustDosage,
        "Consider alternative antiplatelet (prasugrel or ticagrelor) if undergoing PCI.",
        "Reduced CYP2C19 function decreases clopidogrel bioactivation, increasing risk of cardiovascular events.",
        "A"),
    row("clopidogrel", "CYP2C19", Poor, Ineffective,
        "Use ALTERNATIVE antiplatelet agent (prasugrel or ticagrelor). Clopidogrel will not provide adequate platelet inhibition.",
        "CYP2C19 poor metabolizers cannot bioactivate clopidogrel, leading to treatment failure and increased thrombotic risk.",
        "A"),

    row("omeprazole", "CYP2C19", UltraRapid, Ineffective,
        "Increase dose to 2-3× standard or use alternative PPI (rabeprazole).",
        "Ultra-rapid CYP2C19 metabolism clears omeprazole too quickly for adequate acid suppression.",
        "A"),
    row("omeprazole", "CYP2C19", Extensive, Safe,
        "Use omeprazole per standard dosing (20 mg/day).",
        "Normal CYP2C19 activity provides expected omeprazole pharmacokinetics.",
        "A"),
    row("omeprazole", "CYP2C19", Intermediate, Safe,
        "Use omeprazole per standard dosing. Slightly elevated drug levels are clinically beneficial.",
        "Intermediate CYP2C19 metabolism results in higher omeprazole exposure, which may improve acid suppression.",
        "A"),
    row("omeprazole", "CYP2C19", Poor, AdjustDosage,
        "Consider 50% dose reduction. Monitor for adverse effects.",
        "CYP2C19 poor metabolizers have markedly elevated omeprazole exposure (up to 10×), increasing risk of adverse effects.",
        "A"),

    row("escitalopram", "CYP2C19", UltraRapid, Ineffective,
        "Consider alternative SSRI not metabolized by CYP2C19 or increase dose with monitoring.",
        "Ultra-rapid CYP2C19 metabolism may result in subtherapeutic escitalopram levels.",
        "A"),
    row("escitalopram", "CYP2C19", Extensive, Safe,
        "Use escitalopram per standard dosing (10-20 mg/day).",
        "Normal CYP2C19 metabolism provides expected escitalopram exposure.",
        "A"),
    row("escitalopram", "CYP2C19", Intermediate, Safe,
        "Use escitalopram per standard dosing.",
        "Intermediate CYP2C19 metabolism has modest impact on escitalopram levels.",
        "A"),
    row("escitalopram", "CYP2C19", Poor, AdjustDosage,
        "Reduce dose by 50%. Consider alternative SSRI if adverse effects occur.",
        "CYP2C19 poor metabolizers have significantly elevated escitalopram plasma concentrations, increasing side-effect risk.",
        "A"),

    row("voriconazole", "CYP2C19", UltraRapid, Ineffective,
        "Use alternative antifungal agent or increase dose with therapeutic drug monitoring.",
        "Ultra-rapid CYP2C19 metabolism clears voriconazole too rapidly for adequate antifungal activity.",
        "A"),
    row("voriconazole", "CYP2C19", Extensive, Safe,
        "Use voriconazole per standard dosing.",
        "Normal CYP2C19 function provides expected voriconazole pharmacokinetics.",
        "A"),
    row("voriconazole", "CYP2C19", Intermediate, Safe,
        "Use voriconazole per standard dosing.",
        "Intermediate CYP2C19 metabolism has minimal clinical impact on voriconazole levels.",
        "A"),
    row("voriconazole", "CYP2C19", Poor, Toxic,
        "Reduce dose by 50% or use alternative antifungal. Monitor trough levels closely.",
        "CYP2C19 poor metabolizers have dramatically elevated voriconazole exposure, risking hepatotoxicity and visual disturbances.",
        "A"),

    // ── CYP2C9 ──────────────────────────────────────────────────────────
    row_with_url("warfarin", "CYP2C9", Extensive, Safe,
        "Use standard warfarin dosing algorithm with INR monitoring.",
        "Normal CYP2C9 metabolism clears S-warfarin at expected rates.",
        "A", "https://cpicpgx.org/guidelines/guideline-for-warfarin-and-cyp2c9-and-vkorc1/"),
    row("warfarin", "CYP2C9", Intermediate, AdjustDosage,
        "Reduce initial dose by 25-50%. Increase INR monitoring frequency.",
        "Reduced CYP2C9 function decreases S-warfarin clearance, increasing bleeding risk at standard doses.",
        "A"),
    row("warfarin", "CYP2C9", Poor, Toxic,
        "Reduce initial dose by 50-80%. Use frequent INR monitoring. Consider alternative anticoagulant (DOAC).",
        "CYP2C9 poor metabolizers accumulate S-warfarin to dangerously high levels, causing severe bleeding risk.",
        "A"),

    row("celecoxib", "CYP2C9", Extensive, Safe,
        "Use celecoxib per standard dosing.",
        "Normal CYP2C9 metabolism provides expected celecoxib clearance.",
        "A"),
    row("celecoxib", "CYP2C9", Intermediate, AdjustDosage,
        "Reduce starting dose by 50%. Use lowest effective dose.",
        "Intermediate CYP2C9 metabolism results in elevated celecoxib exposure.",
        "A"),
    row("celecoxib", "CYP2C9", Poor, Toxic,
        "Reduce dose by 75% or avoid celecoxib. Use alternative NSAID or analgesic.",
        "CYP2C9 poor metabolizers have significantly impaired celecoxib clearance, increasing GI and cardiovascular toxicity risk.",
        "A"),

    row("phenytoin", "CYP2C9", Extensive, Safe,
        "Use phenytoin per standard dosing with therapeutic drug monitoring.",
        "Normal CYP2C9 function provides expected phenytoin pharmacokinetics.",
        "A"),
    row("phenytoin", "CYP2C9", Intermediate, AdjustDosage,
        "Reduce dose by 25%. Monitor phenytoin levels closely.",
        "Reduced CYP2C9 activity leads to higher phenytoin levels and narrower therapeutic window.",
        "A"),
    row("phenytoin", "CYP2C9", Poor, Toxic,
        "Reduce dose by 50% or use alternative antiepileptic. Monitor drug levels closely.",
        "CYP2C9 poor metabolizers accumulate phenytoin, risking CNS toxicity (ataxia, nystagmus, seizures).",
        "A"),

    // ── SLCO1B1 ─────────────────────────────────────────────────────────
    row_with_url("simvastatin", "SLCO1B1", Extensive, Safe,
        "Use simvastatin per standard dosing (up to 40 mg/day).",
        "Normal SLCO1B1 transporter function provides adequate hepatic uptake of simvastatin acid.",
        "A", "https://cpicpgx.org/guidelines/guideline-for-simvastatin-and-slco1b1/"),
    row("simvastatin", "SLCO1B1", Intermediate, AdjustDosage,
        "Limit simvastatin to ≤20 mg/day or use alternative statin (rosuvastatin/pravastatin).",
        "Reduced SLCO1B1 function increases systemic simvastatin acid exposure, raising myopathy risk (OR ~2.6 per *5 allele).",
        "A"),
    row("simvastatin", "SLCO1B1", Poor, Toxic,
        "AVOID simvastatin. Use alternative statin (rosuvastatin or pravastatin at lowest effective dose).",
        "SLCO1B1 poor function causes dramatically elevated simvastatin acid levels, with ~18× increased myopathy risk including rhabdomyolysis.",
        "A"),

    row("atorvastatin", "SLCO1B1", Extensive, Safe,
        "Use atorvastatin per standard dosing.",
        "Normal SLCO1B1 function provides expected hepatic uptake of atorvastatin.",
        "B"),
    row("atorvastatin", "SLCO1B1", Intermediate, AdjustDosage,
        "Use lower dose atorvastatin or consider pravastatin/rosuvastatin.",
        "Reduced SLCO1B1 function modestly increases atorvastatin systemic exposure.",
        "B"),
    row("atorvastatin", "SLCO1B1", Poor, AdjustDosage,
        "Use lowest effective dose or switch to pravastatin/rosuvastatin. Monitor for muscle symptoms.",
        "Poor SLCO1B1 function significantly increases atorvastatin exposure and myopathy risk.",
        "B"),

    // ── TPMT ────────────────────────────────────────────────────────────
    row_with_url("azathioprine", "TPMT", Extensive, Safe,
        "Use azathioprine per standard dosing (2-3 mg/kg/day).",
        "Normal TPMT activity provides expected thiopurine metabolism and safe thioguanine nucleotide (TGN) levels.",
        "A", "https://cpicpgx.org/guidelines/guideline-for-thiopurines-and-tpmt-and-nudt15/"),
    row("azathioprine", "TPMT", Intermediate, AdjustDosage,
        "Reduce dose to 30-70% of standard. Monitor CBC weekly for first months.",
        "Intermediate TPMT activity causes higher TGN accumulation, increasing myelosuppression risk.",
        "A"),
    row("azathioprine", "TPMT", Poor, Toxic,
        "Reduce dose to 10% of standard or AVOID. Use alternative immunosuppressant. Mandatory CBC monitoring.",
        "TPMT-deficient patients accumulate lethal TGN concentrations, causing severe/fatal myelosuppression (pancytopenia).",
        "A"),

    row("mercaptopurine", "TPMT", Extensive, Safe,
        "Use mercaptopurine per protocol dosing.",
        "Normal TPMT activity provides safe thiopurine metabolism.",
        "A"),
    row("mercaptopurine", "TPMT", Intermediate, AdjustDosage,
        "Reduce dose to 30-70% of standard. Monitor CBC closely.",
        "Intermediate TPMT activity increases TGN accumulation and myelosuppression risk.",
        "A"),
    row("mercaptopurine", "TPMT", Poor, Toxic,
        "Reduce dose to 10% of standard or AVOID. Mandatory intensive CBC monitoring.",
        "TPMT deficiency causes dangerous TGN accumulation and life-threatening myelotoxicity.",
        "A"),

    // ── DPYD ────────────────────────────────────────────────────────────
    row_with_url("fluorouracil", "DPYD", Extensive, Safe,
        "Use 5-fluorouracil per standard dosing.",
        "Normal DPD enzyme activity provides expected fluorouracil catabolism.",
        "A", "https://cpicpgx.org/guidelines/guideline-for-fluoropyrimidines-and-dpyd/"),
    row("fluorouracil", "DPYD", Intermediate, AdjustDosage,
        "Reduce initial dose by 50%. Titrate based on toxicity and efficacy.",
        "Reduced DPD activity impairs fluorouracil catabolism, increasing exposure and toxicity risk (mucositis, myelosuppression).",
        "A"),
    row("fluorouracil", "DPYD", Poor, Toxic,
        "AVOID fluorouracil and all fluoropyrimidines. Use alternative chemotherapy.",
        "DPD-deficient patients cannot catabolize fluorouracil, resulting in severe/fatal toxicity (mucositis, neutropenia, neurotoxicity).",
        "A"),

    row("capecitabine", "DPYD", Extensive, Safe,
        "Use capecitabine per standard dosing.",
        "Normal DPD activity provides expected capecitabine/fluorouracil metabolism.",
        "A"),
    row("capecitabine", "DPYD", Intermediate, AdjustDosage,
        "Reduce initial dose by 50%. Monitor closely for toxicity.",
        "Reduced DPD activity impairs fluoropyrimidine catabolism, increasing toxicity risk.",
        "A"),
    row("capecitabine", "DPYD", Poor, Toxic,
        "AVOID capecitabine. Use alternative chemotherapy regimen.",
        "DPD deficiency causes life-threatening fluoropyrimidine toxicity.",
        "A"),
];
