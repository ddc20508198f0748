use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Hold,
    Avoid,
}

impl Action {
    /// Case-insensitive match against `buy`, `hold` and `avoid`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "hold" => Some(Self::Hold),
            "avoid" => Some(Self::Avoid),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Avoid => "avoid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentDecision {
    pub asset: String,
    pub action: Action,
    pub confidence: f64,
    pub allocation_pct: Option<f64>,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub reasoning: String,
    pub investment_decisions: Vec<InvestmentDecision>,
}

/// Soft inconsistencies that pass validation but are worth surfacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseWarning {
    EmptyReasoning,
    AllocationOnAvoid { asset: String },
}

impl fmt::Display for ResponseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReasoning => f.write_str("reasoning is empty"),
            Self::AllocationOnAvoid { asset } => {
                write!(f, "{asset}: action is avoid but allocation_pct is set")
            }
        }
    }
}

impl InferenceResponse {
    pub fn warnings(&self) -> Vec<ResponseWarning> {
        let mut out = Vec::new();
        if self.reasoning.trim().is_empty() {
            out.push(ResponseWarning::EmptyReasoning);
        }
        for decision in &self.investment_decisions {
            if decision.action == Action::Avoid && decision.allocation_pct.is_some() {
                out.push(ResponseWarning::AllocationOnAvoid {
                    asset: decision.asset.clone(),
                });
            }
        }
        out
    }
}
