use comfy_table::{Cell, Table};
use jobset_api::{validate_with, ListError, ValidateOptions, ValidationError};
use serde::Serialize;
use std::path::Path;

use crate::config::OutputFormat;
use crate::manifest::{read_manifest, BuildError, Built};

/// One line of the diagnostic report
#[derive(Debug, Serialize, PartialEq)]
pub struct Finding {
    /// Index in the list, `None` for a single JobSet
    pub item: Option<usize>,
    pub stage: &'static str,
    pub kind: &'static str,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub valid: bool,
    pub checked: usize,
    pub findings: Vec<Finding>,
}

impl Finding {
    fn new(item: Option<usize>, stage: &'static str, error: &ValidationError) -> Self {
        Finding {
            item,
            stage,
            kind: error.kind(),
            path: error.path().to_string(),
            message: error.to_string(),
        }
    }
}

/// Construct and validate every resource in `built`, collecting all findings.
pub fn check(built: Result<Built, BuildError>, options: &ValidateOptions) -> Report {
    let mut findings = Vec::new();
    let checked = match built {
        Ok(Built::JobSet(js)) => {
            if let Err(violations) = validate_with(&js, options) {
                findings.extend(violations.iter().map(|e| Finding::new(None, "validate", e)));
            }
            1
        }
        Ok(Built::List(list)) => {
            for (index, js) in list.items().enumerate() {
                if let Err(violations) = validate_with(js, options) {
                    findings.extend(
                        violations
                            .iter()
                            .map(|e| Finding::new(Some(index), "validate", e)),
                    );
                }
            }
            list.len()
        }
        Err(BuildError::JobSet(error)) => {
            findings.push(Finding::new(None, "construct", &error));
            1
        }
        Err(BuildError::List(ListError::Envelope(error))) => {
            findings.push(Finding::new(None, "construct", &error));
            0
        }
        Err(BuildError::List(error)) => {
            for failure in error.failures() {
                findings.push(Finding::new(Some(failure.index), "construct", &failure.error));
            }
            // Items that did construct still get validated
            let mut survivors = 0;
            for (index, js) in error.valid_items() {
                survivors += 1;
                if let Err(violations) = validate_with(js, options) {
                    findings.extend(
                        violations
                            .iter()
                            .map(|e| Finding::new(Some(index), "validate", e)),
                    );
                }
            }
            survivors + error.failures().len()
        }
    };

    // Keep list findings in item order; construct failures and violations interleave
    findings.sort_by_key(|f| f.item);

    Report {
        valid: findings.is_empty(),
        checked,
        findings,
    }
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::to_value(report)?;
            Ok(colored_json::to_colored_json_auto(&value)?)
        }
        OutputFormat::Table => {
            if report.valid {
                return Ok(format!("{} resource(s) valid.", report.checked));
            }
            let mut table = Table::new();
            table.set_header(vec!["Item", "Stage", "Kind", "Path", "Message"]);
            for finding in &report.findings {
                let item = finding
                    .item
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(item),
                    Cell::new(finding.stage),
                    Cell::new(finding.kind),
                    Cell::new(&finding.path),
                    Cell::new(&finding.message),
                ]);
            }
            Ok(format!(
                "{} finding(s) in {} resource(s)\n{}",
                report.findings.len(),
                report.checked,
                table
            ))
        }
    }
}

/// Returns whether the file was valid.
pub fn handle_validate(
    file: &Path,
    format: OutputFormat,
    options: &ValidateOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    let manifest = read_manifest(file)?;
    let report = check(manifest.build(), options);
    tracing::info!(
        file = %file.display(),
        checked = report.checked,
        findings = report.findings.len(),
        "validated manifest"
    );
    println!("{}", render(&report, format)?);
    Ok(report.valid)
}
