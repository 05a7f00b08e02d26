// ==============================================================================
// main.rs - Pharmacogenomic Processor CLI
// ==============================================================================
// Description: Command-line entry point: analyze a VCF against a drug list,
//              or list the drugs and genes the knowledge base covers
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgx_processor::{parse_drug_list, Analyzer, KnowledgeBase, VcfParser};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Alternative knowledge base JSON (defaults to the built-in CPIC tables)
    #[arg(long, env = "PGX_KNOWLEDGE_BASE", global = true)]
    knowledge_base: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess drug risks for one sample of a VCF (.vcf, .vcf.gz, .vcf.bgz)
    Analyze {
        /// Path to the variant file
        #[arg(long)]
        vcf: PathBuf,

        /// Comma-separated drug names (e.g. "codeine,warfarin")
        #[arg(long)]
        drugs: String,

        /// Sample ID to analyze (defaults to the first sample)
        #[arg(long)]
        sample: Option<String>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// List drugs covered by the knowledge base
    Drugs,

    /// List genes covered by the knowledge base
    Genes,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgx_processor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let kb = match &args.knowledge_base {
        Some(path) => KnowledgeBase::from_json_path(path)
            .with_context(|| format!("Failed to load knowledge base {}", path.display()))?,
        None => KnowledgeBase::cpic(),
    };

    match args.command {
        Command::Analyze {
            vcf,
            drugs,
            sample,
            pretty,
        } => {
            let drugs = parse_drug_list(&drugs);
            if drugs.is_empty() {
                anyhow::bail!("--drugs must name at least one drug");
            }

            let started = Instant::now();
            let file = VcfParser::parse_path(&vcf)
                .with_context(|| format!("Failed to parse VCF file {}", vcf.display()))?;
            let parse_time_ms = started.elapsed().as_secs_f64() * 1000.0;

            let result = Analyzer::new(&kb)
                .analyze(&file, sample.as_deref(), &drugs, Some(parse_time_ms))
                .context("Analysis failed")?;

            info!("Analysis {} complete", result.analysis_id);

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
        }
        Command::Drugs => {
            for drug in kb.drugs() {
                println!("{drug}");
            }
        }
        Command::Genes => {
            for gene in kb.genes() {
                println!("{gene}");
            }
        }
    }

    Ok(())
}
