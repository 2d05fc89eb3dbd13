//! Static catalog of the operations the remote task API offers.
//! Each entry ties an [`Operation`] to the endpoint that runs it and to the
//! human-readable text shown next to it. Keeping this data-driven means adding
//! an operation is a one-entry change here plus a payload shape in `models`.

use crate::core::models::Operation;

/// Everything known about one operation.
#[derive(Debug)]
pub struct OperationDetail {
    pub operation: Operation,
    /// Path segment under the API base, e.g. `port-scan`.
    pub endpoint: &'static str,
    /// Short title for listings.
    pub title: &'static str,
    /// One-line explanation of what the remote side does.
    pub description: &'static str,
}

static PING: OperationDetail = OperationDetail {
    operation: Operation::Ping,
    endpoint: "ping",
    title: "Ping",
    description: "Check host availability and measure round-trip latency.",
};

static PORT_SCAN: OperationDetail = OperationDetail {
    operation: Operation::PortScan,
    endpoint: "port-scan",
    title: "Port Scan",
    description: "Scan the given TCP ports for open services.",
};

static DNS_LOOKUP: OperationDetail = OperationDetail {
    operation: Operation::DnsLookup,
    endpoint: "dns-lookup",
    title: "DNS Lookup",
    description: "Retrieve the DNS records published for the domain.",
};

static HTTP_HEADERS: OperationDetail = OperationDetail {
    operation: Operation::HttpHeaders,
    endpoint: "http-headers",
    title: "HTTP Headers",
    description: "Fetch the HTTP response status and headers.",
};

static OPERATIONS: &[&OperationDetail] = &[&PING, &PORT_SCAN, &DNS_LOOKUP, &HTTP_HEADERS];

/// Looks up the catalog entry for an operation.
pub fn detail(operation: Operation) -> &'static OperationDetail {
    match operation {
        Operation::Ping => &PING,
        Operation::PortScan => &PORT_SCAN,
        Operation::DnsLookup => &DNS_LOOKUP,
        Operation::HttpHeaders => &HTTP_HEADERS,
    }
}

/// All catalog entries in display order.
pub fn all() -> &'static [&'static OperationDetail] {
    OPERATIONS
}
