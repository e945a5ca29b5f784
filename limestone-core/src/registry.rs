//! Named store of fitted pipelines.

use crate::config::PipelineStoreConfig;
use crate::error::LimestoneError;
use crate::pipeline::Pipeline;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fitted pipelines keyed by short name (`rf`, `knn`, ...).
#[derive(Debug, Clone, Default)]
pub struct PipelineRegistry {
    pipelines: BTreeMap<String, Pipeline>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export file name for a pipeline.
    pub fn file_name(name: &str) -> String {
        format!("full_pipeline_{name}.json")
    }

    pub fn path_for(dir: &Path, name: &str) -> PathBuf {
        dir.join(Self::file_name(name))
    }

    /// Load every configured pipeline. Any missing or unreadable export fails
    /// the whole load.
    pub fn load(config: &PipelineStoreConfig) -> Result<Self, LimestoneError> {
        let mut registry = Self::new();
        for name in &config.names {
            let path = Self::path_for(&config.dir, name);
            let pipeline = Pipeline::load(&path).map_err(|e| {
                LimestoneError::config(format!(
                    "failed to load pipeline '{}' from {}: {}",
                    name,
                    path.display(),
                    e
                ))
            })?;
            registry.insert(name.clone(), pipeline);
        }
        tracing::info!(
            count = registry.len(),
            dir = %config.dir.display(),
            "Loaded fitted pipelines"
        );
        Ok(registry)
    }

    pub fn insert(&mut self, name: impl Into<String>, pipeline: Pipeline) {
        self.pipelines.insert(name.into(), pipeline);
    }

    pub fn get(&self, name: &str) -> Result<&Pipeline, LimestoneError> {
        self.pipelines
            .get(name)
            .ok_or_else(|| LimestoneError::pipeline_not_found(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.pipelines.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Estimator, PipelineStep};

    fn write_pipeline(dir: &Path, name: &str) {
        let pipeline = Pipeline::new().add_step(
            "model",
            PipelineStep::Estimator(Estimator {
                class_name: "DecisionTreeClassifier".into(),
            }),
        );
        std::fs::write(
            PipelineRegistry::path_for(dir, name),
            serde_json::to_string(&pipeline).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_configured_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), "dt");
        write_pipeline(dir.path(), "rf");
        let config = PipelineStoreConfig {
            dir: dir.path().to_path_buf(),
            names: vec!["rf".into(), "dt".into()],
        };
        let registry = PipelineRegistry::load(&config).unwrap();
        assert_eq!(registry.names(), vec!["dt", "rf"]);
        assert!(registry.get("rf").is_ok());
        assert!(matches!(
            registry.get("svm"),
            Err(LimestoneError::PipelineNotFound(_))
        ));
    }

    #[test]
    fn test_missing_export_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), "rf");
        let config = PipelineStoreConfig {
            dir: dir.path().to_path_buf(),
            names: vec!["rf".into(), "knn".into()],
        };
        let err = PipelineRegistry::load(&config).unwrap_err();
        assert!(err.to_string().contains("knn"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(PipelineRegistry::file_name("gb"), "full_pipeline_gb.json");
    }
}
