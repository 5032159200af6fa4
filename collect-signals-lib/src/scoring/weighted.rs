use super::Scorer;
use crate::Result;
use crate::signals::{NAMESPACE_SEPARATOR, Record};
use compact_str::CompactString;
use ohno::bail;
use serde::{Deserialize, Serialize};

/// One numeric field feeding the weighted score.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringInput {
    /// Column name of the field, `namespace.field`.
    pub field: CompactString,

    /// Relative importance. A negative weight means larger values lower the score.
    pub weight: f64,

    /// Value at which the field's contribution saturates.
    pub threshold: f64,
}

/// Scoring settings from the `[scoring]` configuration table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Scorer name, also the default score column name.
    #[serde(default = "default_name")]
    pub name: CompactString,

    /// Overrides the score column name.
    #[serde(default)]
    pub column: Option<CompactString>,

    #[serde(default)]
    pub inputs: Vec<ScoringInput>,
}

const fn default_enabled() -> bool {
    true
}

fn default_name() -> CompactString {
    CompactString::const_new("default_score")
}

impl ScoringConfig {
    /// Name of the output column holding the score.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// Weighted, threshold-normalised combination of numeric fields.
///
/// Each input contributes `|weight| * ln(1 + v) / ln(1 + max(v, t))`, or one minus
/// that ratio for a negative weight. The ratio rises with `v` and stays at 1 from the
/// threshold on. The sum is divided by the total absolute
/// weight, so scores fall in `0..=1`. Unset and non-numeric fields contribute nothing.
#[derive(Debug, Clone)]
pub struct WeightedScorer {
    name: CompactString,
    inputs: Vec<ScoringInput>,
    total_weight: f64,
}

impl WeightedScorer {
    pub fn new(name: impl Into<CompactString>, inputs: Vec<ScoringInput>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            bail!("scorer name must not be empty");
        }

        if inputs.is_empty() {
            bail!("scorer '{name}' has no inputs");
        }

        for input in &inputs {
            if !input.field.contains(NAMESPACE_SEPARATOR) {
                bail!("scoring input '{}' must be of the form 'namespace.field'", input.field);
            }

            if !input.weight.is_finite() || input.weight == 0.0 {
                bail!("scoring input '{}' needs a finite, non-zero weight", input.field);
            }

            if !input.threshold.is_finite() || input.threshold <= 0.0 {
                bail!("scoring input '{}' needs a positive threshold", input.field);
            }
        }

        let total_weight = inputs.iter().map(|i| i.weight.abs()).sum();
        Ok(Self {
            name,
            inputs,
            total_weight,
        })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::new(config.name.clone(), config.inputs.clone())
    }

    #[must_use]
    pub fn inputs(&self) -> &[ScoringInput] {
        &self.inputs
    }
}

impl Scorer for WeightedScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, record: &Record) -> f64 {
        let sum: f64 = self
            .inputs
            .iter()
            .filter_map(|input| {
                let value = record.value(&input.field)?.as_f64()?;
                let ratio = normalize(value, input.threshold);
                Some(if input.weight < 0.0 {
                    input.weight.abs() * (1.0 - ratio)
                } else {
                    input.weight * ratio
                })
            })
            .sum();

        sum / self.total_weight
    }
}

fn normalize(value: f64, threshold: f64) -> f64 {
    let value = value.max(0.0);
    let denominator = value.max(threshold).ln_1p();
    if denominator == 0.0 {
        return 0.0;
    }
    value.ln_1p() / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{FieldDef, FieldKind, SignalSet};

    const FIELDS: &[FieldDef] = &[FieldDef::new("stars", FieldKind::Int), FieldDef::new("age", FieldKind::Int)];

    fn input(field: &str, weight: f64, threshold: f64) -> ScoringInput {
        ScoringInput {
            field: field.into(),
            weight,
            threshold,
        }
    }

    fn record(stars: Option<i64>, age: Option<i64>) -> Record {
        let set = SignalSet::empty("repo", FIELDS)
            .with("stars", stars)
            .unwrap()
            .with("age", age)
            .unwrap();
        Record::new("https://github.com/owner/repo".parse().unwrap(), vec![set])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_saturates_at_threshold() {
        let scorer = WeightedScorer::new("s", vec![input("repo.stars", 1.0, 100.0)]).unwrap();
        assert!(approx(scorer.score(&record(Some(100), None)), 1.0));
        assert!(approx(scorer.score(&record(Some(5000), None)), 1.0));
        assert!(approx(scorer.score(&record(Some(0), None)), 0.0));

        let partial = scorer.score(&record(Some(10), None));
        assert!(approx(partial, 11.0_f64.ln() / 101.0_f64.ln()));
    }

    #[test]
    fn test_score_never_drops_as_value_grows() {
        let scorer = WeightedScorer::new("s", vec![input("repo.stars", 1.0, 100.0)]).unwrap();
        let scores: Vec<f64> = [0, 1, 50, 99, 100, 101, 1000, 5000]
            .into_iter()
            .map(|stars| scorer.score(&record(Some(stars), None)))
            .collect();

        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
        assert!(approx(scores[scores.len() - 1], 1.0));
    }

    #[test]
    fn test_weights_are_normalised() {
        let scorer = WeightedScorer::new("s", vec![input("repo.stars", 3.0, 100.0), input("repo.age", 1.0, 10.0)]).unwrap();
        assert!(approx(scorer.score(&record(Some(100), Some(0))), 0.75));
    }

    #[test]
    fn test_negative_weight_inverts() {
        let scorer = WeightedScorer::new("s", vec![input("repo.age", -1.0, 10.0)]).unwrap();
        assert!(approx(scorer.score(&record(None, Some(0))), 1.0));
        assert!(approx(scorer.score(&record(None, Some(10))), 0.0));
    }

    #[test]
    fn test_unset_and_unknown_fields_contribute_nothing() {
        let scorer = WeightedScorer::new("s", vec![input("repo.stars", 1.0, 100.0), input("other.thing", 1.0, 10.0)]).unwrap();
        assert!(approx(scorer.score(&record(None, None)), 0.0));
        assert!(approx(scorer.score(&record(Some(100), None)), 0.5));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let _ = WeightedScorer::new("s", Vec::new()).unwrap_err();
        let _ = WeightedScorer::new("", vec![input("repo.stars", 1.0, 1.0)]).unwrap_err();
        let _ = WeightedScorer::new("s", vec![input("stars", 1.0, 1.0)]).unwrap_err();
        let _ = WeightedScorer::new("s", vec![input("repo.stars", 0.0, 1.0)]).unwrap_err();
        let _ = WeightedScorer::new("s", vec![input("repo.stars", 1.0, 0.0)]).unwrap_err();
        let _ = WeightedScorer::new("s", vec![input("repo.stars", f64::NAN, 1.0)]).unwrap_err();
    }

    #[test]
    fn test_column_name() {
        let mut config = ScoringConfig {
            enabled: true,
            name: "default_score".into(),
            column: None,
            inputs: Vec::new(),
        };
        assert_eq!(config.column_name(), "default_score");
        config.column = Some("criticality".into());
        assert_eq!(config.column_name(), "criticality");
    }
}
