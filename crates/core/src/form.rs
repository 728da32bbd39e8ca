//! Product forms: the fixed packaging variants one item is counted and produced in.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A physical packaging/serving variant of one item.
///
/// The set is fixed: every count, production entry and policy row is keyed by
/// (item, form). The shop counts bulk tubs plus two retail container sizes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Tub,
    Pint,
    Quart,
}

impl Form {
    /// All forms in canonical display order.
    pub const ALL: [Form; 3] = [Form::Tub, Form::Pint, Form::Quart];

    pub fn as_str(&self) -> &'static str {
        match self {
            Form::Tub => "tub",
            Form::Pint => "pint",
            Form::Quart => "quart",
        }
    }
}

impl core::fmt::Display for Form {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Form {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tub" => Ok(Form::Tub),
            "pint" => Ok(Form::Pint),
            "quart" => Ok(Form::Quart),
            other => Err(DomainError::validation(format!(
                "unknown form: {other} (expected tub, pint or quart)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_forms_case_insensitively() {
        assert_eq!("tub".parse::<Form>().unwrap(), Form::Tub);
        assert_eq!(" Pint ".parse::<Form>().unwrap(), Form::Pint);
        assert_eq!("QUART".parse::<Form>().unwrap(), Form::Quart);
    }

    #[test]
    fn rejects_unknown_form() {
        let err = "gallon".parse::<Form>().unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("gallon")),
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Form::Quart).unwrap(), "\"quart\"");
    }
}
