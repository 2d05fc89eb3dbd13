// src/core/validator.rs

use std::str::FromStr;

use tracing::debug;

use crate::core::error::ValidationError;
use crate::core::models::{Operation, OperationRequest};

/// Port list used when the user leaves the field blank.
pub const DEFAULT_PORTS: &str = "80,443,22,21,25";

/// Normalizes a raw target into a bare host or IP.
///
/// Surrounding whitespace is trimmed, a leading `http://` or `https://` is
/// removed and anything from the first `/` on is dropped.
///
/// # Errors
/// `ValidationError::EmptyInput` if nothing is left after trimming.
pub fn validate_target(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);

    let host = without_scheme.split('/').next().unwrap_or_default();
    debug!(raw, host, "Target normalized.");
    Ok(host.to_string())
}

/// Checks a comma-separated port list.
///
/// Blank input yields `default`. Otherwise every token must parse as an
/// integer in 1..=65535; the original string (trimmed, not expanded) is
/// returned on success.
pub fn validate_ports(raw: &str, default: &str) -> Result<String, ValidationError> {
    let ports = raw.trim();
    if ports.is_empty() {
        return Ok(default.to_string());
    }

    for token in ports.split(',').map(str::trim) {
        match token.parse::<u32>() {
            Ok(port) if (1..=65535).contains(&port) => {}
            _ => return Err(ValidationError::InvalidPort(token.to_string())),
        }
    }
    Ok(ports.to_string())
}

/// Maps operation names (`ping`, `port_scan`, ...) to [`Operation`]s.
pub fn parse_operations<S: AsRef<str>>(names: &[S]) -> Result<Vec<Operation>, ValidationError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref().trim();
            Operation::from_str(name).map_err(|_| ValidationError::UnknownOperation(name.to_string()))
        })
        .collect()
}

/// Validates a whole submission and expands it into one request per operation.
///
/// Duplicate operations are collapsed, keeping the first occurrence, so the
/// resulting order is the order the user asked for. Only the port scan request
/// carries the port list.
pub fn validate_batch(
    raw_target: &str,
    operations: &[Operation],
    raw_ports: Option<&str>,
    default_ports: &str,
) -> Result<Vec<OperationRequest>, ValidationError> {
    let target = validate_target(raw_target)?;
    if operations.is_empty() {
        return Err(ValidationError::NoOperations);
    }
    let ports = validate_ports(raw_ports.unwrap_or_default(), default_ports)?;

    let mut seen = Vec::with_capacity(operations.len());
    for op in operations {
        if !seen.contains(op) {
            seen.push(*op);
        }
    }

    Ok(seen
        .into_iter()
        .map(|operation| OperationRequest {
            target: target.clone(),
            operation,
            ports: (operation == Operation::PortScan).then(|| ports.clone()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_path() {
        assert_eq!(validate_target("https://example.com/login?next=/").unwrap(), "example.com");
        assert_eq!(validate_target("http://10.0.0.1").unwrap(), "10.0.0.1");
        assert_eq!(validate_target("  example.org/a/b  ").unwrap(), "example.org");
    }

    #[test]
    fn scheme_match_is_case_sensitive() {
        assert_eq!(validate_target("HTTP://example.com").unwrap(), "HTTP:");
    }

    #[test]
    fn blank_target_is_rejected() {
        assert_eq!(validate_target(""), Err(ValidationError::EmptyInput));
        assert_eq!(validate_target(" \t\n"), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn blank_ports_fall_back_to_default() {
        assert_eq!(validate_ports("", DEFAULT_PORTS).unwrap(), DEFAULT_PORTS);
        assert_eq!(validate_ports("   ", "22").unwrap(), "22");
    }

    #[test]
    fn ports_are_range_checked() {
        assert_eq!(validate_ports("70000", DEFAULT_PORTS), Err(ValidationError::InvalidPort("70000".into())));
        assert_eq!(validate_ports("0", DEFAULT_PORTS), Err(ValidationError::InvalidPort("0".into())));
        assert_eq!(validate_ports("80,http", DEFAULT_PORTS), Err(ValidationError::InvalidPort("http".into())));
        assert_eq!(validate_ports("80,", DEFAULT_PORTS), Err(ValidationError::InvalidPort("".into())));
    }

    #[test]
    fn valid_ports_keep_original_spelling() {
        assert_eq!(validate_ports("80, 443", DEFAULT_PORTS).unwrap(), "80, 443");
        assert_eq!(validate_ports("1,65535", DEFAULT_PORTS).unwrap(), "1,65535");
    }

    #[test]
    fn parses_operation_names() {
        let ops = parse_operations(&["ping", " dns_lookup "]).unwrap();
        assert_eq!(ops, vec![Operation::Ping, Operation::DnsLookup]);
        assert_eq!(parse_operations(&["whois"]), Err(ValidationError::UnknownOperation("whois".into())));
    }

    #[test]
    fn batch_keeps_order_and_attaches_ports_to_scan_only() {
        let ops = [Operation::PortScan, Operation::Ping, Operation::PortScan];
        let requests = validate_batch("https://example.com/", &ops, Some("22"), DEFAULT_PORTS).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].operation, Operation::PortScan);
        assert_eq!(requests[0].ports.as_deref(), Some("22"));
        assert_eq!(requests[1].operation, Operation::Ping);
        assert_eq!(requests[1].ports, None);
        assert!(requests.iter().all(|r| r.target == "example.com"));
    }

    #[test]
    fn batch_requires_an_operation() {
        assert_eq!(validate_batch("example.com", &[], None, DEFAULT_PORTS), Err(ValidationError::NoOperations));
    }

    #[test]
    fn batch_rejects_bad_ports_even_without_scan() {
        let result = validate_batch("example.com", &[Operation::Ping], Some("99999"), DEFAULT_PORTS);
        assert_eq!(result, Err(ValidationError::InvalidPort("99999".into())));
    }
}
