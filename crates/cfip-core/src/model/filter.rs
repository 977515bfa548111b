//! Line type filter built from the `include_lines` setting

use super::LineType;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Separators accepted between tokens: commas, semicolons and whitespace
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\s]+").expect("separator pattern is valid"));

/// Set of allowed line types, or the "allow all" sentinel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LineTypeFilter {
    /// Every line type passes
    #[default]
    All,
    /// Only the listed line types pass
    Only(HashSet<LineType>),
}

impl LineTypeFilter {
    /// Build a filter from an explicit set. An empty set means "allow all".
    pub fn only(lines: impl IntoIterator<Item = LineType>) -> Self {
        let lines: HashSet<LineType> = lines.into_iter().collect();
        if lines.is_empty() {
            LineTypeFilter::All
        } else {
            LineTypeFilter::Only(lines)
        }
    }

    /// Parse an `include_lines` setting.
    ///
    /// Tokens are split on commas, semicolons and whitespace. The four Chinese
    /// carrier names are accepted as-is and any casing of `ipv6` folds to
    /// `IPV6`. Unknown tokens are logged and dropped; if nothing valid remains
    /// the filter allows everything.
    pub fn parse(setting: &str) -> Self {
        let mut lines = HashSet::new();

        for token in SEPARATORS.split(setting).map(str::trim).filter(|t| !t.is_empty()) {
            match canonical_line(token) {
                Some(line) => {
                    lines.insert(line);
                }
                None => {
                    tracing::warn!("Unknown line type '{}' in include_lines, ignoring", token);
                }
            }
        }

        Self::only(lines)
    }

    /// Whether records of this line type should be kept
    pub fn allows(&self, line_type: &LineType) -> bool {
        match self {
            LineTypeFilter::All => true,
            LineTypeFilter::Only(lines) => lines.contains(line_type),
        }
    }

    /// Whether this is the "allow all" sentinel
    pub fn is_all(&self) -> bool {
        matches!(self, LineTypeFilter::All)
    }

    /// Allowed tokens in rank order, for logging
    pub fn describe(&self) -> String {
        match self {
            LineTypeFilter::All => "all".to_string(),
            LineTypeFilter::Only(lines) => {
                let mut lines: Vec<&LineType> = lines.iter().collect();
                lines.sort_by_key(|l| l.rank());
                lines
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    }
}

fn canonical_line(token: &str) -> Option<LineType> {
    if token.eq_ignore_ascii_case("ipv6") {
        return Some(LineType::Ipv6);
    }
    match LineType::from_token(token) {
        LineType::Other(_) => None,
        known => Some(known),
    }
}
