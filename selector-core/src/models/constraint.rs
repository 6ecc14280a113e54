use serde::{Deserialize, Serialize};
use serde_json::Value;

const REQUIRES: &str = "requires";

/// A cross-tree dependency written as `"<feature> requires <feature>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTreeConstraint {
    pub feature: String,
    pub requires: String,
}

impl CrossTreeConstraint {
    /// Parse `"A requires B"`. Any other form is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let (feature, required) = text.split_once(REQUIRES)?;
        let (feature, required) = (feature.trim(), required.trim());
        if feature.is_empty() || required.is_empty() {
            return None;
        }
        Some(Self {
            feature: feature.to_string(),
            requires: required.to_string(),
        })
    }

    /// Propositional form, e.g. `A → B`.
    pub fn to_logic(&self) -> String {
        format!("{} → {}", self.feature, self.requires)
    }
}

/// Translate every constraint that parses. Non-string and unrecognised
/// entries are skipped; the raw list stays available to callers.
pub fn translate_constraints(constraints: &[Value]) -> Vec<String> {
    constraints
        .iter()
        .filter_map(|constraint| {
            let parsed = constraint.as_str().and_then(CrossTreeConstraint::parse);
            if parsed.is_none() {
                tracing::debug!(%constraint, "Skipping unrecognised cross-tree constraint");
            }
            parsed
        })
        .map(|constraint| constraint.to_logic())
        .collect()
}
