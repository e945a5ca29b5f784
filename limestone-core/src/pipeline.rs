//! Fitted preprocessing pipeline model.
//!
//! A serde description of the exported, already-fitted preprocessing
//! pipeline: named steps, the column transformer with one branch per
//! [`FeatureGroup`], and the fitted parameters needed to invert it. The
//! translator never sees this structure directly; it only depends on the
//! narrow [`TransformerHandle`] trait.

use crate::error::LimestoneError;
use crate::features::FeatureGroup;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only access to the fitted transform parameters the translator needs.
///
/// Shared read-only across gateway worker threads.
pub trait TransformerHandle: Send + Sync {
    /// Fitted scaler of a feature group's branch, if that branch has one.
    fn scaler(&self, group: FeatureGroup) -> Option<&StandardScaler>;

    /// Original feature and category behind an encoded column such as
    /// `JOB_Office`. `None` if the fitted encoder never emits that column.
    fn encoded_column(&self, column: &str) -> Option<(&str, &str)>;
}

/// Per-feature standardization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, LimestoneError> {
        if mean.len() != scale.len() {
            return Err(LimestoneError::invalid_input(format!(
                "scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        Ok(Self { mean, scale })
    }

    pub fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    /// Forward standardization: `(x - mean) / scale`.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, LimestoneError> {
        self.check_row(row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    /// Inverse standardization: `t * scale + mean`.
    pub fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>, LimestoneError> {
        self.check_row(row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(t, (mean, scale))| t * scale + mean)
            .collect())
    }

    fn check_row(&self, row: &[f64]) -> Result<(), LimestoneError> {
        if self.mean.len() != self.scale.len() {
            return Err(LimestoneError::invalid_input(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if row.len() != self.n_features_in() {
            return Err(LimestoneError::invalid_input(format!(
                "row has {} values, scaler expects {}",
                row.len(),
                self.n_features_in()
            )));
        }
        Ok(())
    }
}

/// One-hot encoder with per-feature category lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Categories seen during fitting, one list per input feature.
    pub categories: Vec<Vec<String>>,
    /// Category dropped for each input feature, if any.
    #[serde(default)]
    pub drop: Option<Vec<String>>,
}

impl OneHotEncoder {
    /// Encoded column names (`<feature>_<category>`), skipping dropped categories.
    pub fn feature_names_out(&self, inputs: &[String]) -> Result<Vec<String>, LimestoneError> {
        if inputs.len() != self.categories.len() {
            return Err(LimestoneError::invalid_input(format!(
                "encoder fitted on {} features, got {}",
                self.categories.len(),
                inputs.len()
            )));
        }
        let mut names = Vec::new();
        for (i, (feature, categories)) in inputs.iter().zip(&self.categories).enumerate() {
            let dropped = self.drop.as_ref().and_then(|d| d.get(i));
            names.extend(
                categories
                    .iter()
                    .filter(|c| Some(*c) != dropped)
                    .map(|c| format!("{feature}_{c}")),
            );
        }
        Ok(names)
    }

    /// Inverse of [`feature_names_out`](Self::feature_names_out) for a single
    /// column. Dropped categories have no column and never decode.
    pub fn decode_column<'a>(
        &'a self,
        inputs: &'a [String],
        column: &str,
    ) -> Option<(&'a str, &'a str)> {
        inputs
            .iter()
            .zip(&self.categories)
            .enumerate()
            .find_map(|(i, (feature, categories))| {
                let category = column.strip_prefix(feature.as_str())?.strip_prefix('_')?;
                let dropped = self.drop.as_ref().and_then(|d| d.get(i));
                categories
                    .iter()
                    .find(|c| c.as_str() == category && Some(*c) != dropped)
                    .map(|c| (feature.as_str(), c.as_str()))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Iterative,
    MostFrequent,
    Constant,
}

/// Missing-value imputer. Does not change column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    pub strategy: ImputeStrategy,
    #[serde(default)]
    pub fill_value: Option<String>,
}

/// Opaque fitted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    pub class_name: String,
}

/// A single fitted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineStep {
    Pipeline(Pipeline),
    ColumnTransformer(ColumnTransformer),
    Imputer(Imputer),
    /// `log1p`; output columns gain a `_log` suffix.
    LogTransform,
    StandardScaler(StandardScaler),
    OneHotEncoder(OneHotEncoder),
    Estimator(Estimator),
}

impl PipelineStep {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineStep::Pipeline(_) => "pipeline",
            PipelineStep::ColumnTransformer(_) => "column_transformer",
            PipelineStep::Imputer(_) => "imputer",
            PipelineStep::LogTransform => "log_transform",
            PipelineStep::StandardScaler(_) => "standard_scaler",
            PipelineStep::OneHotEncoder(_) => "one_hot_encoder",
            PipelineStep::Estimator(_) => "estimator",
        }
    }

    /// Output column names given the step's input column names.
    pub fn feature_names_out(&self, inputs: Vec<String>) -> Result<Vec<String>, LimestoneError> {
        match self {
            PipelineStep::Pipeline(p) => p.feature_names_out(inputs),
            PipelineStep::ColumnTransformer(ct) => ct.feature_names_out(),
            PipelineStep::LogTransform => {
                Ok(inputs.into_iter().map(|f| format!("{f}_log")).collect())
            }
            PipelineStep::OneHotEncoder(enc) => enc.feature_names_out(&inputs),
            PipelineStep::Imputer(_) | PipelineStep::StandardScaler(_) | PipelineStep::Estimator(_) => {
                Ok(inputs)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedStep {
    pub name: String,
    pub step: PipelineStep,
}

/// Ordered sequence of named steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub steps: Vec<NamedStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(mut self, name: impl Into<String>, step: PipelineStep) -> Self {
        self.steps.push(NamedStep {
            name: name.into(),
            step,
        });
        self
    }

    pub fn named_step(&self, name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.step)
    }

    pub fn from_json_str(json: &str) -> Result<Self, LimestoneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, LimestoneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn feature_names_out(&self, inputs: Vec<String>) -> Result<Vec<String>, LimestoneError> {
        self.steps
            .iter()
            .try_fold(inputs, |names, s| s.step.feature_names_out(names))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTransformer {
    pub name: String,
    pub transformer: PipelineStep,
    pub columns: Vec<String>,
}

/// Applies one transformer per column subset and concatenates the outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<NamedTransformer>,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    pub fn add_transformer(
        mut self,
        name: impl Into<String>,
        transformer: PipelineStep,
        columns: Vec<String>,
    ) -> Self {
        self.transformers.push(NamedTransformer {
            name: name.into(),
            transformer,
            columns,
        });
        self
    }

    pub fn named_transformer(&self, name: &str) -> Option<&PipelineStep> {
        self.transformers
            .iter()
            .find(|t| t.name == name)
            .map(|t| &t.transformer)
    }

    /// Full transformed column list, e.g. `num_log_iter__LOAN_log`, `cat__JOB_Office`.
    pub fn feature_names_out(&self) -> Result<Vec<String>, LimestoneError> {
        let mut names = Vec::new();
        for t in &self.transformers {
            let out = t.transformer.feature_names_out(t.columns.clone())?;
            names.extend(out.into_iter().map(|n| format!("{}__{}", t.name, n)));
        }
        Ok(names)
    }
}

impl TransformerHandle for ColumnTransformer {
    fn scaler(&self, group: FeatureGroup) -> Option<&StandardScaler> {
        match self.named_transformer(group.key())? {
            PipelineStep::Pipeline(p) => match p.named_step("scaler")? {
                PipelineStep::StandardScaler(s) => Some(s),
                _ => None,
            },
            PipelineStep::StandardScaler(s) => Some(s),
            _ => None,
        }
    }

    fn encoded_column(&self, column: &str) -> Option<(&str, &str)> {
        let branch = self
            .transformers
            .iter()
            .find(|t| t.name == FeatureGroup::Categorical.key())?;
        let encoder = match &branch.transformer {
            PipelineStep::Pipeline(p) => p.steps.iter().find_map(|s| match &s.step {
                PipelineStep::OneHotEncoder(enc) => Some(enc),
                _ => None,
            })?,
            PipelineStep::OneHotEncoder(enc) => enc,
            _ => return None,
        };
        encoder.decode_column(&branch.columns, column)
    }
}

/// Locate the column transformer at `preprocessor` → `preprocessor`.
///
/// Any other shape is a configuration error: translating against the wrong
/// structure would mistranslate every condition.
pub fn resolve_column_transformer(pipeline: &Pipeline) -> Result<&ColumnTransformer, LimestoneError> {
    let outer = pipeline
        .named_step("preprocessor")
        .ok_or_else(|| LimestoneError::config("pipeline has no 'preprocessor' step"))?;
    let PipelineStep::Pipeline(inner) = outer else {
        return Err(LimestoneError::config(format!(
            "'preprocessor' step is a {}, expected a pipeline",
            outer.kind()
        )));
    };
    match inner.named_step("preprocessor") {
        Some(PipelineStep::ColumnTransformer(ct)) => Ok(ct),
        Some(other) => Err(LimestoneError::config(format!(
            "expected a column transformer at preprocessor.preprocessor, found {}",
            other.kind()
        ))),
        None => Err(LimestoneError::config(
            "preprocessor pipeline has no 'preprocessor' step",
        )),
    }
}
