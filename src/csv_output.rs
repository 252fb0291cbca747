//! Results CSV: one row per measured sample
//!
//! Columns are `impl,variant,run,duration_ms`. The run index restarts at 0 for
//! each (implementation, variant) pair and rows keep measurement order.

use crate::error::{BenchError, Result};

const HEADER: &str = "impl,variant,run,duration_ms";

/// CSV record for a single measured run
#[derive(Debug, Clone, PartialEq)]
pub struct CsvSample {
    pub implementation: String,
    pub variant: String,
    pub run: usize,
    pub duration_ms: f64,
}

/// Results CSV formatter and parser
#[derive(Debug, Default)]
pub struct ResultsCsv {
    samples: Vec<CsvSample>,
}

impl ResultsCsv {
    /// Create an empty results table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every sample of one implementation/variant, numbering runs from 0
    pub fn add_samples(&mut self, implementation: &str, variant: &str, durations: &[f64]) {
        for (run, &duration_ms) in durations.iter().enumerate() {
            self.samples.push(CsvSample {
                implementation: implementation.to_string(),
                variant: variant.to_string(),
                run,
                duration_ms,
            });
        }
    }

    pub fn samples(&self) -> &[CsvSample] {
        &self.samples
    }

    /// Ordered durations for one implementation/variant pair
    pub fn durations(&self, implementation: &str, variant: &str) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| s.implementation == implementation && s.variant == variant)
            .map(|s| s.duration_ms)
            .collect()
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Split one CSV line, honouring quoted fields
    fn split_record(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        fields.push(current);
        fields
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(HEADER);
        output.push('\n');

        for sample in &self.samples {
            output.push_str(&Self::escape_field(&sample.implementation));
            output.push(',');
            output.push_str(&Self::escape_field(&sample.variant));
            output.push(',');
            output.push_str(&sample.run.to_string());
            output.push(',');
            output.push_str(&format!("{:?}", sample.duration_ms));
            output.push('\n');
        }

        output
    }

    /// Parse a results CSV produced by `to_csv`
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().enumerate();

        match lines.next() {
            Some((_, header)) if header.trim() == HEADER => {}
            Some((_, header)) => {
                return Err(BenchError::MalformedInput(format!(
                    "unexpected CSV header '{}', expected '{}'",
                    header.trim(),
                    HEADER
                )))
            }
            None => {
                return Err(BenchError::MalformedInput(
                    "empty results CSV".to_string(),
                ))
            }
        }

        let mut samples = Vec::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let fields = Self::split_record(line);
            if fields.len() != 4 {
                return Err(BenchError::MalformedInput(format!(
                    "line {}: expected 4 fields, got {}",
                    line_no,
                    fields.len()
                )));
            }

            let run = fields[2].trim().parse::<usize>().map_err(|e| {
                BenchError::MalformedInput(format!("line {}: bad run index: {}", line_no, e))
            })?;
            let duration_ms = fields[3].trim().parse::<f64>().map_err(|e| {
                BenchError::MalformedInput(format!("line {}: bad duration: {}", line_no, e))
            })?;

            samples.push(CsvSample {
                implementation: fields[0].clone(),
                variant: fields[1].clone(),
                run,
                duration_ms,
            });
        }

        Ok(Self { samples })
    }
}
