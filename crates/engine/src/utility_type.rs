//! Utility kinds an entry can be logged against, and the per-deployment set
//! of labels clients may use for them.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityType {
    Electricity,
    Fuel,
    Water,
}

impl UtilityType {
    /// Canonical label, used for storage and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Fuel => "fuel",
            Self::Water => "water",
        }
    }

    /// Maps any known label, including the `power` alias, to a type.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "electricity" | "power" => Some(Self::Electricity),
            "fuel" => Some(Self::Fuel),
            "water" => Some(Self::Water),
            _ => None,
        }
    }
}

impl core::fmt::Display for UtilityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UtilityType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_label(value)
            .ok_or_else(|| EngineError::CorruptedRow(format!("invalid utility type: {value}")))
    }
}

/// Labels accepted for the `type` field in this deployment.
///
/// Labels are matched exactly and in the configured order; the error message
/// lists them the same way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSet {
    labels: Vec<(String, UtilityType)>,
}

impl TypeSet {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> ResultEngine<Self> {
        if labels.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one utility type label is required".to_string(),
            ));
        }

        let mut out = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref().trim();
            let kind = UtilityType::from_label(label).ok_or_else(|| {
                EngineError::InvalidConfig(format!("unknown utility type label: {label}"))
            })?;
            if out.iter().any(|(l, _)| l == label) {
                continue;
            }
            out.push((label.to_string(), kind));
        }

        Ok(Self { labels: out })
    }

    /// Resolves a client supplied label, reporting failures against `field`.
    pub fn parse(&self, field: &'static str, label: &str) -> Result<UtilityType, ValidationError> {
        self.labels
            .iter()
            .find_map(|(l, kind)| (l == label).then_some(*kind))
            .ok_or_else(|| ValidationError::new(field, format!("Type must be one of: {self}")))
    }
}

impl Default for TypeSet {
    fn default() -> Self {
        Self {
            labels: vec![
                ("electricity".to_string(), UtilityType::Electricity),
                ("water".to_string(), UtilityType::Water),
                ("fuel".to_string(), UtilityType::Fuel),
            ],
        }
    }
}

impl core::fmt::Display for TypeSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let labels: Vec<&str> = self.labels.iter().map(|(l, _)| l.as_str()).collect();
        f.write_str(&labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_rejects_power() {
        let types = TypeSet::default();
        assert_eq!(types.parse("type", "water"), Ok(UtilityType::Water));
        let err = types.parse("type", "power").unwrap_err();
        assert_eq!(err.message, "Type must be one of: electricity, water, fuel");
    }

    #[test]
    fn power_deployment_maps_to_electricity() {
        let types = TypeSet::new(&["power", "water", "fuel"]).unwrap();
        assert_eq!(types.parse("type", "power"), Ok(UtilityType::Electricity));
        assert!(types.parse("type", "electricity").is_err());
    }

    #[test]
    fn unknown_label_is_a_config_error() {
        assert!(matches!(
            TypeSet::new(&["gas"]),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            TypeSet::new::<&str>(&[]),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn canonical_labels_sort_by_name() {
        let mut kinds = vec![UtilityType::Water, UtilityType::Electricity, UtilityType::Fuel];
        kinds.sort();
        let labels: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }
}
