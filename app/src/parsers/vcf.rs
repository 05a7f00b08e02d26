// ==============================================================================
// parsers/vcf.rs - VCF file parser
// ==============================================================================
// Description: Reads plain, gzip and BGZF compressed VCF files into the
//              in-memory VariantFile model with per-sample genotype calls
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// References:
// - VCF 4.2 Spec: https://samtools.github.io/hts-specs/VCFv4.2.pdf
// - noodles-vcf: https://docs.rs/noodles-vcf/0.81.0/noodles_vcf/
// - noodles-bgzf: https://docs.rs/noodles-bgzf/0.43.0/noodles_bgzf/
// ==============================================================================

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use noodles_bgzf as bgzf;
use noodles_vcf as vcf;
use thiserror::Error;
use tracing::{debug, info};
use vcf::variant::record::samples::keys::key;
use vcf::variant::record::samples::series::value::genotype::Phasing;
use vcf::variant::record::Ids;
use vcf::variant::record_buf::info::field::value::Array;
use vcf::variant::record_buf::info::field::Value as InfoValue;
use vcf::variant::record_buf::samples::sample::Value as SampleValue;

use crate::models::{GenotypeCall, VariantFile, VariantRecord};

/// Fixed columns before FORMAT: CHROM POS ID REF ALT QUAL FILTER INFO
const FIXED_COLUMNS: usize = 8;
const FORMAT_COLUMN: usize = 8;

/// noodles requires a file format line; files without one are read as 4.2
const DEFAULT_FILE_FORMAT_LINE: &str = "##fileformat=VCFv4.2";

/// gzip member magic number
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// VCF parsing errors
#[derive(Error, Debug)]
pub enum VcfParseError {
    #[error("VCF content is empty")]
    Empty,

    #[error("Line {line}: data line found before the #CHROM header line")]
    MissingHeader { line: usize },

    #[error("Malformed VCF header: {0}")]
    MalformedHeader(String),

    #[error("Line {line}: expected {expected} tab-delimited columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid {field} value '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: invalid record: {source}")]
    InvalidRecord {
        line: usize,
        source: std::io::Error,
    },

    #[error("Line {line}: invalid genotype '{value}' for sample {sample} (expected a diploid call)")]
    InvalidGenotype {
        line: usize,
        sample: String,
        value: String,
    },

    #[error("Line {line}: FORMAT column has no GT key")]
    MissingGenotypeField { line: usize },

    #[error("Line {line}: text is not valid UTF-8")]
    InvalidEncoding { line: usize },

    #[error("Decompressed VCF exceeds {limit} bytes")]
    DecompressedTooLarge { limit: u64 },

    #[error("Failed to decompress VCF stream: {0}")]
    Decompression(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compression handling, chosen from the filename suffix only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    /// Gzip (possibly multi-member, which includes BGZF named .gz)
    Gzip,
    /// BGZF blocks (.bgz); plain gzip under this suffix is still accepted
    Bgzf,
}

impl Compression {
    pub fn from_filename(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        if name.ends_with(".bgz") {
            Compression::Bgzf
        } else if name.ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

/// VCF parser for a single upload or file
///
/// Parsing is fail-fast: the first malformed line aborts the whole file.
#[derive(Debug, Clone, Copy)]
pub struct VcfParser {
    compression: Compression,
    max_decompressed_size: Option<u64>,
}

impl Default for VcfParser {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            max_decompressed_size: None,
        }
    }
}

impl VcfParser {
    /// Plain-text parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser whose decompression is chosen from a filename hint
    pub fn for_filename(name: &str) -> Self {
        Self::new().with_compression(Compression::from_filename(name))
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Cap on the decoded text size; unbounded by default
    pub fn with_max_decompressed_size(mut self, limit: u64) -> Self {
        self.max_decompressed_size = Some(limit);
        self
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn max_decompressed_size(&self) -> Option<u64> {
        self.max_decompressed_size
    }

    /// Parse an in-memory upload
    ///
    /// # Example
    /// ```
    /// use pgx_processor::parsers::VcfParser;
    ///
    /// let vcf = b"##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
    ///             22\t42130692\trs3892097\tG\tA\t.\tPASS\t.\tGT\t1/1\n";
    /// let file = VcfParser::for_filename("patient.vcf").parse_bytes(vcf).unwrap();
    /// assert_eq!(file.samples, vec!["S1"]);
    /// assert_eq!(file.records[0].genotypes[0].to_string(), "1/1");
    /// ```
    pub fn parse_bytes(&self, data: &[u8]) -> Result<VariantFile, VcfParseError> {
        if data.is_empty() {
            return Err(VcfParseError::Empty);
        }
        self.parse_reader(data)
    }

    /// Parse a VCF file from disk (.vcf, .vcf.gz or .vcf.bgz)
    pub fn parse_path(path: impl AsRef<Path>) -> Result<VariantFile, VcfParseError> {
        let path = path.as_ref();
        let parser = Self::for_filename(&path.to_string_lossy());
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(VcfParseError::Empty);
        }
        parser.parse_reader(file)
    }

    /// Parse from any byte source, decompressing according to `self.compression`
    pub fn parse_reader<R: Read>(&self, inner: R) -> Result<VariantFile, VcfParseError> {
        // One byte past the limit is enough to detect an overflow
        let cap = self
            .max_decompressed_size
            .map_or(u64::MAX, |limit| limit.saturating_add(1));
        let mut inner = BufReader::new(inner);

        match self.compression {
            Compression::None => self.read_vcf(inner.take(cap)),
            Compression::Gzip => self.read_vcf(BufReader::new(MultiGzDecoder::new(inner).take(cap))),
            Compression::Bgzf => {
                if is_bgzf_block(inner.fill_buf()?) {
                    self.read_vcf(bgzf::io::Reader::new(inner).take(cap))
                } else {
                    debug!("No BGZF block header, decoding .bgz upload as plain gzip");
                    self.read_vcf(BufReader::new(MultiGzDecoder::new(inner).take(cap)))
                }
            }
        }
    }

    fn read_vcf<B: BufRead>(&self, reader: B) -> Result<VariantFile, VcfParseError> {
        let mut lines = LineReader::new(reader, self);
        let mut file = VariantFile::default();
        let mut header_text = String::new();
        let mut saw_content = false;

        let mut decoder = loop {
            let Some((line_number, line)) = lines.next_line()? else {
                return Err(if saw_content {
                    VcfParseError::MalformedHeader("no #CHROM header line found".to_string())
                } else {
                    VcfParseError::Empty
                });
            };
            if line.trim().is_empty() {
                continue;
            }
            saw_content = true;

            if let Some(meta) = line.strip_prefix("##") {
                if let Some(version) = meta.strip_prefix("fileformat=") {
                    file.file_format = Some(version.trim().to_string());
                }
                header_text.push_str(line);
                header_text.push('\n');
            } else if line.starts_with("#CHROM") {
                header_text.push_str(line);
                header_text.push('\n');
                break RecordDecoder::from_header(&header_text, line, file.file_format.is_some())?;
            } else if !line.starts_with('#') {
                return Err(VcfParseError::MissingHeader { line: line_number });
            }
        };

        debug!(
            "VCF header: {} columns, {} samples",
            decoder.columns,
            decoder.sample_names.len()
        );

        while let Some((line_number, line)) = lines.next_line()? {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            file.records.push(decoder.decode(line, line_number)?);
        }
        file.samples = decoder.sample_names;

        info!(
            "Parsed VCF: {} records, {} samples (format: {})",
            file.records.len(),
            file.samples.len(),
            file.file_format.as_deref().unwrap_or("unspecified")
        );

        Ok(file)
    }
}

/// BGZF blocks are gzip members whose extra field starts with the `BC` subfield
fn is_bgzf_block(head: &[u8]) -> bool {
    const FEXTRA: u8 = 0x04;
    head.len() >= 14 && head[..2] == GZIP_MAGIC && head[3] & FEXTRA != 0 && &head[12..14] == b"BC"
}

/// Numbered text lines over the decoded stream
///
/// Read errors come from the decoder; bad UTF-8 and an exhausted size cap are
/// reported separately.
struct LineReader<B> {
    inner: B,
    buf: Vec<u8>,
    line_number: usize,
    consumed: u64,
    compressed: bool,
    limit: Option<u64>,
}

impl<B: BufRead> LineReader<B> {
    fn new(inner: B, parser: &VcfParser) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            line_number: 0,
            consumed: 0,
            compressed: parser.compression.is_compressed(),
            limit: parser.max_decompressed_size,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, &str)>, VcfParseError> {
        self.buf.clear();
        let read = self.inner.read_until(b'\n', &mut self.buf).map_err(|e| {
            if self.compressed {
                VcfParseError::Decompression(e.to_string())
            } else {
                VcfParseError::Io(e)
            }
        })?;
        if read == 0 {
            return Ok(None);
        }

        self.consumed += read as u64;
        if let Some(limit) = self.limit.filter(|&limit| self.consumed > limit) {
            return Err(VcfParseError::DecompressedTooLarge { limit });
        }
        self.line_number += 1;

        let line = std::str::from_utf8(&self.buf).map_err(|_| VcfParseError::InvalidEncoding {
            line: self.line_number,
        })?;
        Ok(Some((self.line_number, line.trim_end_matches(['\n', '\r']))))
    }
}

/// Column layout and noodles header shared by every data line
struct RecordDecoder {
    header: vcf::Header,
    columns: usize,
    sample_names: Vec<String>,
    record: vcf::variant::RecordBuf,
}

impl RecordDecoder {
    fn from_header(
        header_text: &str,
        column_line: &str,
        has_file_format: bool,
    ) -> Result<Self, VcfParseError> {
        let columns = header_columns(column_line)?;

        let parsed = if has_file_format {
            header_text.parse::<vcf::Header>()
        } else {
            format!("{DEFAULT_FILE_FORMAT_LINE}\n{header_text}").parse::<vcf::Header>()
        };
        let header = parsed.map_err(|e| VcfParseError::MalformedHeader(e.to_string()))?;
        let sample_names = header.sample_names().iter().cloned().collect();

        Ok(Self {
            header,
            columns,
            sample_names,
            record: vcf::variant::RecordBuf::default(),
        })
    }

    fn decode(&mut self, line: &str, line_number: usize) -> Result<VariantRecord, VcfParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != self.columns {
            return Err(VcfParseError::ColumnCount {
                line: line_number,
                expected: self.columns,
                found: fields.len(),
            });
        }

        // Each validated line goes through noodles on its own
        vcf::io::Reader::new(line.as_bytes())
            .read_record_buf(&self.header, &mut self.record)
            .map_err(|source| VcfParseError::InvalidRecord {
                line: line_number,
                source,
            })?;
        let record = &self.record;

        let position = record
            .variant_start()
            .map(|p| p.get() as u64)
            .ok_or_else(|| VcfParseError::InvalidField {
                line: line_number,
                field: "POS",
                value: fields[1].to_string(),
            })?;

        let id = record
            .ids()
            .iter()
            .next()
            .map(|id| id.to_string())
            .unwrap_or_else(|| VariantRecord::UNKNOWN_ID.to_string());

        let alt_alleles: Vec<String> = record.alternate_bases().as_ref().to_vec();

        let info: HashMap<String, String> = record
            .info()
            .as_ref()
            .iter()
            .map(|(key, value)| {
                let rendered = value.as_ref().map(render_info_value).unwrap_or_default();
                (key.to_string(), rendered)
            })
            .collect();

        let genotypes = if self.sample_names.is_empty() {
            Vec::new()
        } else {
            let gt_index = fields[FORMAT_COLUMN]
                .split(':')
                .position(|k| k == key::GENOTYPE)
                .ok_or(VcfParseError::MissingGenotypeField { line: line_number })?;
            let samples = record.samples();

            self.sample_names
                .iter()
                .enumerate()
                .map(|(i, sample_name)| {
                    let raw = fields[FORMAT_COLUMN + 1 + i]
                        .split(':')
                        .nth(gt_index)
                        .unwrap_or(".");
                    let sample = samples.get_index(i);
                    let value = sample
                        .as_ref()
                        .and_then(|sample| sample.get(key::GENOTYPE))
                        .flatten();

                    genotype_call(raw, value, alt_alleles.len()).ok_or_else(|| {
                        VcfParseError::InvalidGenotype {
                            line: line_number,
                            sample: sample_name.clone(),
                            value: raw.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(VariantRecord {
            chromosome: record.reference_sequence_name().to_string(),
            position,
            id,
            ref_allele: record.reference_bases().to_string(),
            alt_alleles,
            info,
            genotypes,
        })
    }
}

/// Count the `#CHROM` columns; FORMAT must follow INFO when samples are present
fn header_columns(line: &str) -> Result<usize, VcfParseError> {
    let columns: Vec<&str> = line.split('\t').collect();

    if columns.len() < FIXED_COLUMNS {
        return Err(VcfParseError::MalformedHeader(format!(
            "expected at least {} columns, found {}",
            FIXED_COLUMNS,
            columns.len()
        )));
    }

    if columns.len() > FIXED_COLUMNS && columns[FORMAT_COLUMN] != "FORMAT" {
        return Err(VcfParseError::MalformedHeader(format!(
            "column 9 must be FORMAT when samples are present, found '{}'",
            columns[FORMAT_COLUMN]
        )));
    }

    Ok(columns.len())
}

/// INFO values back to their VCF text; flags render empty
fn render_info_value(value: &InfoValue) -> String {
    fn join<T: ToString>(values: &[Option<T>]) -> String {
        values
            .iter()
            .map(|v| v.as_ref().map_or_else(|| ".".to_string(), T::to_string))
            .collect::<Vec<_>>()
            .join(",")
    }

    match value {
        InfoValue::Integer(n) => n.to_string(),
        InfoValue::Float(n) => n.to_string(),
        InfoValue::Flag => String::new(),
        InfoValue::Character(c) => c.to_string(),
        InfoValue::String(s) => s.clone(),
        InfoValue::Array(Array::Integer(values)) => join(values),
        InfoValue::Array(Array::Float(values)) => join(values),
        InfoValue::Array(Array::Character(values)) => join(values),
        InfoValue::Array(Array::String(values)) => join(values),
    }
}

/// Convert a decoded GT value into a diploid call
///
/// `raw` is the sample's GT text. A bare "." is a missing diploid call;
/// haploid/polyploid calls and allele indices past the ALT list are rejected.
fn genotype_call(raw: &str, value: Option<&SampleValue>, alt_count: usize) -> Option<GenotypeCall> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "." {
        return Some(GenotypeCall::no_call());
    }

    let Some(SampleValue::Genotype(genotype)) = value else {
        return None;
    };
    let [first, second] = genotype.as_ref() else {
        return None;
    };

    Some(GenotypeCall::new(
        allele_index(first.position(), alt_count)?,
        allele_index(second.position(), alt_count)?,
        second.phasing() == Phasing::Phased,
    ))
}

fn allele_index(position: Option<usize>, alt_count: usize) -> Option<Option<u32>> {
    match position {
        None => Some(None),
        Some(index) if index <= alt_count => u32::try_from(index).ok().map(Some),
        Some(_) => None,
    }
}
