use super::text_binding;
use crate::database::Database;
use crate::error::Result;
use crate::schema::{FieldBinding, Record};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Language block risk databases are queried in
pub const RISK_LANGUAGE: &str = "CN";

/// Address risk record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskInfo {
    /// Risk score; 0 when the stored value is not an integer
    pub score: i64,
    /// Observed behaviour
    pub behavior: String,
    /// ISO 3166-1 alpha-2 code
    pub country_code: String,
}

fn parse_score(value: &str) -> i64 {
    value.parse().unwrap_or_else(|_| {
        if !value.is_empty() {
            trace!(value, "non-numeric risk score, using 0");
        }
        0
    })
}

impl Record for RiskInfo {
    fn bindings() -> &'static [FieldBinding<Self>] {
        const BINDINGS: &[FieldBinding<RiskInfo>] = &[
            FieldBinding::new("score", |r, v| r.score = parse_score(v)),
            text_binding!(RiskInfo, behavior),
            text_binding!(RiskInfo, country_code),
        ];
        BINDINGS
    }
}

impl Database<RiskInfo> {
    /// Risk record of `addr`, read from the [`RISK_LANGUAGE`] block
    pub fn find_risk(&self, addr: &str) -> Result<RiskInfo> {
        self.find_typed(addr, RISK_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("87"), 87);
        assert_eq!(parse_score("-3"), -3);
        assert_eq!(parse_score("high"), 0);
        assert_eq!(parse_score(""), 0);
    }
}
