// src/report.rs

//! Turns orchestrator output into text for the user: the flash message
//! shown after a batch and one line per history record.

use std::fmt;

use serde_json::Value;

use crate::core::catalog;
use crate::core::models::{BatchOutcome, Operation, OutcomeRecord};

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

impl fmt::Display for FlashLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashLevel::Success => write!(f, "OK"),
            FlashLevel::Warning => write!(f, "WARN"),
            FlashLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    /// Three-way summary of a batch: everything completed, some failed, or
    /// everything failed.
    pub fn for_batch(batch: &BatchOutcome) -> Self {
        let tally = &batch.aggregate;
        let total = tally.total();
        if tally.all_succeeded() {
            Self {
                level: FlashLevel::Success,
                text: format!("All {} operation(s) completed for {}.", total, batch.target),
            }
        } else if tally.is_partial() {
            Self {
                level: FlashLevel::Warning,
                text: format!(
                    "{} of {} operation(s) completed for {}, {} failed.",
                    tally.succeeded_count, total, batch.target, tally.failed_count
                ),
            }
        } else {
            Self { level: FlashLevel::Error, text: format!("All operations failed for {}.", batch.target) }
        }
    }
}

impl fmt::Display for FlashMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}

/// Short description of what a record produced.
///
/// Only decides rendering: a record whose diagnostic came back negative
/// without an error message shows "No data" even though its lifecycle
/// status is `success`.
pub fn result_summary(record: &OutcomeRecord) -> String {
    let has_data = record.result_data.is_some();
    match record.operation {
        Operation::Ping if record.success => {
            if let Some(latency) = record.latency_ms.filter(|l| *l > 0.0) {
                return format!("{:.2} ms", latency);
            }
        }
        Operation::PortScan if has_data => return "Scan completed".to_string(),
        Operation::DnsLookup if has_data => return "DNS records retrieved".to_string(),
        Operation::HttpHeaders if has_data => {
            let status = record
                .result_data
                .as_ref()
                .and_then(|d| d.get("status"))
                .map(|s| match s {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "N/A".to_string());
            return format!("Status: {}", status);
        }
        _ => {}
    }

    if record.error_message.is_empty() { "No data".to_string() } else { record.error_message.clone() }
}

/// One history line: time, target, operation, status and summary.
pub fn record_line(record: &OutcomeRecord) -> String {
    format!(
        "{}  {:<30} {:<13} {:<11} {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
        record.target,
        catalog::detail(record.operation).title,
        record.status,
        result_summary(record)
    )
}
