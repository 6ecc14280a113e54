use serde::{Deserialize, Serialize};

/// Natural-language statement to translate into propositional logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub prompt: String,
}

/// Translator reply. The service answers with either a bare string or `{ "logic": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslateResponse {
    Text(String),
    Structured { logic: String },
}

impl TranslateResponse {
    pub fn logic(&self) -> &str {
        match self {
            Self::Text(logic) | Self::Structured { logic } => logic,
        }
    }

    pub fn into_logic(self) -> String {
        match self {
            Self::Text(logic) | Self::Structured { logic } => logic,
        }
    }
}
