//! Binary-vs-text heuristics and text decoding.

use crate::syntax::LanguageDetector;

const MAX_NULL_RATIO: f64 = 0.1;
const MIN_PRINTABLE_RATIO: f64 = 0.8;

/// Byte statistics over a content sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub null_ratio: f64,
    pub printable_ratio: f64,
}

impl SampleStats {
    pub fn of(sample: &[u8]) -> Self {
        if sample.is_empty() {
            return Self {
                null_ratio: 0.0,
                printable_ratio: 1.0,
            };
        }

        let nulls = sample.iter().filter(|&&b| b == 0).count();
        let printable = sample.iter().filter(|&&b| is_printable(b)).count();
        let total = sample.len() as f64;

        Self {
            null_ratio: nulls as f64 / total,
            printable_ratio: printable as f64 / total,
        }
    }

    pub fn looks_binary(&self) -> bool {
        self.null_ratio > MAX_NULL_RATIO || self.printable_ratio < MIN_PRINTABLE_RATIO
    }
}

/// Printable ASCII or one of tab, line feed, carriage return
pub fn is_printable(byte: u8) -> bool {
    (32..=126).contains(&byte) || matches!(byte, b'\t' | b'\n' | b'\r')
}

/// Outcome of content classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Binary,
    Text { language: String },
}

/// Decide how a file should be presented.
///
/// Content that fails the byte heuristic is binary outright; otherwise the
/// detector gets the final say, and a file no language is found for stays
/// binary.
pub fn classify(filename: &str, sample: &[u8], detector: &dyn LanguageDetector) -> Classification {
    let stats = SampleStats::of(sample);
    if stats.looks_binary() {
        tracing::debug!(
            null_ratio = stats.null_ratio,
            printable_ratio = stats.printable_ratio,
            "classified as binary"
        );
        return Classification::Binary;
    }

    let text = String::from_utf8_lossy(sample);
    match detector.detect_language(filename, &text) {
        Some(language) => Classification::Text { language },
        None => Classification::Binary,
    }
}

/// Lossily decode bytes and split them into lines.
///
/// Line terminators (`\n` or `\r\n`) are dropped and a trailing terminator
/// does not produce an extra empty line. Always yields at least one line.
pub fn decode_lines(data: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(data);
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
