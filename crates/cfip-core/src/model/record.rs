//! Discovered IP records and their ordering

use super::LineType;
use std::cmp::Ordering;
use std::fmt;

/// One discovered address and the line it was listed under
///
/// Identity is the serialized `address#line_type` string: two records are the
/// same record iff those strings are equal. Addresses are not canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpRecord {
    address: String,
    line_type: LineType,
}

impl IpRecord {
    /// Create a new record
    pub fn new(address: impl Into<String>, line_type: LineType) -> Self {
        Self {
            address: address.into(),
            line_type,
        }
    }

    /// The textual IP literal
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The line this address was listed under
    pub fn line_type(&self) -> &LineType {
        &self.line_type
    }

    /// The `address#line_type` form used as identity and as the output line
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Whether the address should be published as an AAAA record
    pub fn is_ipv6(&self) -> bool {
        self.address.contains(':')
    }

    /// Compare by line rank, then address, then the line token itself.
    ///
    /// The final tie-break only matters for two unrecognized lines sharing an
    /// address; it keeps the order total so aggregation is input-order free.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.line_type
            .rank()
            .cmp(&other.line_type.rank())
            .then_with(|| AddressKey::of(&self.address).cmp(&AddressKey::of(&other.address)))
            .then_with(|| self.line_type.as_str().cmp(other.line_type.as_str()))
    }
}

impl fmt::Display for IpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.line_type)
    }
}

/// Secondary sort key derived from the shape of an address
///
/// Dotted addresses that split into exactly four integers compare numerically.
/// Everything else (IPv6, malformed dotted input) compares as a plain string
/// and sorts after all numeric keys of the same line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum AddressKey<'a> {
    Dotted([u32; 4]),
    Text(&'a str),
}

impl<'a> AddressKey<'a> {
    pub(crate) fn of(address: &'a str) -> Self {
        if address.contains('.') {
            if let Some(octets) = parse_dotted(address) {
                return AddressKey::Dotted(octets);
            }
        }
        AddressKey::Text(address)
    }
}

fn parse_dotted(address: &str) -> Option<[u32; 4]> {
    let mut octets = [0u32; 4];
    let mut parts = address.split('.');
    for slot in octets.iter_mut() {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}
