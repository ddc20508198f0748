use crate::error::SignalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange-listed symbol, trimmed and upper-cased (`tcs.ns` -> `TCS.NS`).
///
/// Limited to `A-Z 0-9 . ^ = -`, which covers suffixed listings (`TCS.NS`),
/// indices (`^GSPC`) and futures (`CL=F`). The symbol is placed in upstream URL
/// paths as-is, so nothing that could start a new segment or query survives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    pub fn parse(raw: &str) -> Result<Self, SignalError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() || !normalized.chars().all(is_symbol_char) {
            return Err(SignalError::InvalidTicker(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-')
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TickerSymbol {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = SignalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TickerSymbol> for String {
    fn from(value: TickerSymbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let t = TickerSymbol::parse("  tcs.ns ").unwrap();
        assert_eq!(t.as_str(), "TCS.NS");
    }

    #[test]
    fn rejects_empty_and_inner_whitespace() {
        assert!(TickerSymbol::parse("   ").is_err());
        assert!(TickerSymbol::parse("AC ME").is_err());
    }

    #[test]
    fn accepts_index_and_futures_symbols() {
        assert_eq!(TickerSymbol::parse("^gspc").unwrap().as_str(), "^GSPC");
        assert_eq!(TickerSymbol::parse("cl=f").unwrap().as_str(), "CL=F");
        assert_eq!(TickerSymbol::parse("BRK-B").unwrap().as_str(), "BRK-B");
    }

    #[test]
    fn rejects_path_characters() {
        for raw in [
            "A/B",
            "acme/../../v7/finance/quote?symbols=x",
            "X?modules=assetProfile",
            "..%2F",
            "ACME#frag",
            "ACME&crumb=x",
            "AÇME",
        ] {
            assert!(
                matches!(TickerSymbol::parse(raw), Err(SignalError::InvalidTicker(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn deserialize_goes_through_parse() {
        let t: TickerSymbol = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(t.as_str(), "MSFT");
        assert!(serde_json::from_str::<TickerSymbol>("\"a/b\"").is_err());
    }
}
