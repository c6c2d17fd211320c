//! Query string parameters

use serde::Deserialize;

/// Page size when `limit` is absent or not a number
pub const DEFAULT_LIMIT: u64 = 20;

/// `?limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
}

impl ListQuery {
    /// Effective limit: `None` means unbounded (`limit=0`)
    pub fn limit(&self) -> Option<u64> {
        parse_limit(self.limit.as_deref())
    }
}

pub fn parse_limit(raw: Option<&str>) -> Option<u64> {
    match raw.map(|value| value.trim().parse::<u64>()) {
        Some(Ok(0)) => None,
        Some(Ok(n)) => Some(n),
        None | Some(Err(_)) => Some(DEFAULT_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_rules() {
        assert_eq!(parse_limit(None), Some(20));
        assert_eq!(parse_limit(Some("")), Some(20));
        assert_eq!(parse_limit(Some("abc")), Some(20));
        assert_eq!(parse_limit(Some("-3")), Some(20));
        assert_eq!(parse_limit(Some("0")), None);
        assert_eq!(parse_limit(Some("5")), Some(5));
    }
}
