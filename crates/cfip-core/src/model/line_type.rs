// # Line Type
//
// Network carrier/path classification attached to a discovered IP.
//
// Pages label each row with a short token. The five known tokens map to
// dedicated variants; anything else is kept verbatim in `Other` so that it
// round-trips into the output files unchanged.

use std::fmt;

/// Rank given to line types outside the known set
pub const OTHER_RANK: u8 = 99;

/// Carrier/path classification of an IP
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineType {
    /// 电信
    Telecom,
    /// 联通
    Unicom,
    /// 移动
    Mobile,
    /// 多线
    Multi,
    /// IPV6
    Ipv6,
    /// Any unrecognized token, stored exactly as it appeared
    Other(String),
}

impl LineType {
    /// Classify a token taken from a page.
    ///
    /// Matching is exact: `IPv6` on a page is not the same line as `IPV6`.
    /// Alias folding only happens when parsing the include list.
    pub fn from_token(token: &str) -> Self {
        match token {
            "电信" => LineType::Telecom,
            "联通" => LineType::Unicom,
            "移动" => LineType::Mobile,
            "多线" => LineType::Multi,
            "IPV6" => LineType::Ipv6,
            other => LineType::Other(other.to_string()),
        }
    }

    /// The literal token, as written to output files
    pub fn as_str(&self) -> &str {
        match self {
            LineType::Telecom => "电信",
            LineType::Unicom => "联通",
            LineType::Mobile => "移动",
            LineType::Multi => "多线",
            LineType::Ipv6 => "IPV6",
            LineType::Other(token) => token,
        }
    }

    /// Position in the fixed output order
    pub fn rank(&self) -> u8 {
        match self {
            LineType::Telecom => 1,
            LineType::Unicom => 2,
            LineType::Mobile => 3,
            LineType::Multi => 4,
            LineType::Ipv6 => 5,
            LineType::Other(_) => OTHER_RANK,
        }
    }

    /// Short token used in the DNS record name for this line
    pub fn subdomain(&self) -> String {
        match self {
            LineType::Telecom => "CT".to_string(),
            LineType::Unicom => "CU".to_string(),
            LineType::Mobile => "CM".to_string(),
            LineType::Multi => "multi".to_string(),
            LineType::Ipv6 => "ipv6".to_string(),
            LineType::Other(token) => token.to_lowercase(),
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_round_trip() {
        for token in ["电信", "联通", "移动", "多线", "IPV6"] {
            let line = LineType::from_token(token);
            assert!(!matches!(line, LineType::Other(_)), "{token} should be known");
            assert_eq!(line.as_str(), token);
        }
    }

    #[test]
    fn unknown_token_is_kept_verbatim() {
        let line = LineType::from_token("IPv6");
        assert_eq!(line, LineType::Other("IPv6".to_string()));
        assert_eq!(line.to_string(), "IPv6");
        assert_eq!(line.rank(), OTHER_RANK);
    }

    #[test]
    fn ranks_follow_fixed_order() {
        let ranks: Vec<u8> = ["电信", "联通", "移动", "多线", "IPV6", "广电"]
            .iter()
            .map(|t| LineType::from_token(t).rank())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 99]);
    }

    #[test]
    fn subdomain_mapping() {
        assert_eq!(LineType::Telecom.subdomain(), "CT");
        assert_eq!(LineType::Unicom.subdomain(), "CU");
        assert_eq!(LineType::Mobile.subdomain(), "CM");
        assert_eq!(LineType::Multi.subdomain(), "multi");
        assert_eq!(LineType::Ipv6.subdomain(), "ipv6");
        assert_eq!(LineType::from_token("HKBN").subdomain(), "hkbn");
    }
}
