//! Subcommand handlers.

use crate::{Commands, ConfigAction};
use limestone_core::config::{load_config, workspace_config_path};
use limestone_core::gateway::{GatewayState, run_gateway};
use limestone_core::pipeline::resolve_column_transformer;
use limestone_core::{
    ExplanationItem, LimestoneConfig, Pipeline, PipelineRegistry, translate_explanation,
};
use std::io::Read;
use std::path::Path;

pub(crate) async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Translate {
            pipeline,
            input,
            json,
        } => handle_translate(&pipeline, input.as_deref(), json, workspace),
        Commands::Features { pipeline } => handle_features(&pipeline),
        Commands::Serve {
            host,
            port,
            pipelines_dir,
        } => handle_serve(host, port, pipelines_dir, workspace).await,
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load_workspace_config(workspace: &Path) -> anyhow::Result<LimestoneConfig> {
    load_config(Some(workspace), None).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

fn read_explanation(input: Option<&Path>) -> anyhow::Result<Vec<ExplanationItem>> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&content)?)
}

fn render_text(items: &[ExplanationItem]) -> String {
    let mut out = String::from("Translated LIME Explanation:\n");
    for item in items {
        out.push_str(&format!("  ('{}', {:.4})\n", item.condition, item.weight));
    }
    out
}

fn translate_file(
    pipeline_path: &Path,
    explanation: &[ExplanationItem],
    config: &LimestoneConfig,
) -> anyhow::Result<Vec<ExplanationItem>> {
    let pipeline = Pipeline::load(pipeline_path)?;
    tracing::debug!(
        pipeline = %pipeline_path.display(),
        conditions = explanation.len(),
        "Translating explanation"
    );
    Ok(translate_explanation(explanation, &pipeline, &config.features)?)
}

fn handle_translate(
    pipeline_path: &Path,
    input: Option<&Path>,
    json: bool,
    workspace: &Path,
) -> anyhow::Result<()> {
    let config = load_workspace_config(workspace)?;
    let explanation = read_explanation(input)?;
    let translated = translate_file(pipeline_path, &explanation, &config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&translated)?);
    } else {
        print!("{}", render_text(&translated));
    }
    Ok(())
}

fn handle_features(pipeline_path: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::load(pipeline_path)?;
    let names = resolve_column_transformer(&pipeline)?.feature_names_out()?;
    for (i, name) in names.iter().enumerate() {
        println!("{:>3}  {}", i, name);
    }
    Ok(())
}

async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    pipelines_dir: Option<std::path::PathBuf>,
    workspace: &Path,
) -> anyhow::Result<()> {
    let mut config = load_workspace_config(workspace)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = pipelines_dir {
        config.pipelines.dir = dir;
    }
    if config.pipelines.dir.is_relative() {
        config.pipelines.dir = workspace.join(&config.pipelines.dir);
    }
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        dir = %config.pipelines.dir.display(),
        "Starting gateway"
    );

    let registry = PipelineRegistry::load(&config.pipelines)?;
    let state = GatewayState::new(config.server, config.features, registry).shared();
    run_gateway(state).await?;
    Ok(())
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let toml_str = toml::to_string_pretty(&LimestoneConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            tracing::info!(path = %config_path.display(), "Wrote default configuration");
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_workspace_config(workspace)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const PIPELINE: &str = r#"{
        "steps": [
            {"name": "preprocessor", "step": {"kind": "pipeline", "steps": [
                {"name": "preprocessor", "step": {"kind": "column_transformer", "transformers": [
                    {"name": "num_mode", "columns": ["DELINQ", "DEROG", "NINQ", "CLNO"], "transformer": {"kind": "pipeline", "steps": [
                        {"name": "imputer", "step": {"kind": "imputer", "strategy": "most_frequent"}},
                        {"name": "scaler", "step": {"kind": "standard_scaler", "mean": [0.5, 0.2, 1.0, 20.0], "scale": [1.0, 1.0, 2.0, 10.0]}}
                    ]}},
                    {"name": "cat", "columns": ["JOB"], "transformer": {"kind": "pipeline", "steps": [
                        {"name": "imputer", "step": {"kind": "imputer", "strategy": "constant", "fill_value": "Other"}},
                        {"name": "onehot", "step": {"kind": "one_hot_encoder", "categories": [["Office", "Other"]], "drop": ["Other"]}}
                    ]}}
                ]}}
            ]}},
            {"name": "model", "step": {"kind": "estimator", "class_name": "GradientBoostingClassifier"}}
        ]
    }"#;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_translate_file() {
        let dir = TempDir::new().unwrap();
        let pipeline = write(dir.path(), "full_pipeline_gb.json", PIPELINE);
        let input = write(
            dir.path(),
            "explanation.json",
            r#"[["num_mode__NINQ > 1.00", 0.2], ["cat__JOB_Office <= 0.00", 0.1]]"#,
        );

        let explanation = read_explanation(Some(&input)).unwrap();
        let out = translate_file(&pipeline, &explanation, &LimestoneConfig::default()).unwrap();
        assert_eq!(
            out,
            vec![
                ExplanationItem::new("NINQ > 3.00", 0.2),
                ExplanationItem::new("JOB is not Office", 0.1),
            ]
        );
    }

    #[test]
    fn test_translate_file_rejects_flat_pipeline() {
        let dir = TempDir::new().unwrap();
        let pipeline = write(
            dir.path(),
            "flat.json",
            r#"{"steps": [{"name": "model", "step": {"kind": "estimator", "class_name": "SVC"}}]}"#,
        );
        let explanation = vec![ExplanationItem::new("num_mode__NINQ > 1.00", 0.2)];
        let err = translate_file(&pipeline, &explanation, &LimestoneConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&[ExplanationItem::new("JOB is Office", -0.123456)]);
        assert_eq!(
            text,
            "Translated LIME Explanation:\n  ('JOB is Office', -0.1235)\n"
        );
    }

    #[tokio::test]
    async fn test_config_init_then_show() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();

        let init = Commands::Config {
            action: ConfigAction::Init,
        };
        handle_command(init, workspace).await.unwrap();
        assert!(workspace_config_path(workspace).exists());

        let show = Commands::Config {
            action: ConfigAction::Show,
        };
        assert!(handle_command(show, workspace).await.is_ok());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_init_logs_written_path() {
        let dir = TempDir::new().unwrap();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            handle_config(ConfigAction::Init, dir.path()).unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Wrote default configuration"));
        assert!(output.contains("config.toml"));
    }

    #[tokio::test]
    async fn test_features_command() {
        let dir = TempDir::new().unwrap();
        let pipeline = write(dir.path(), "full_pipeline_gb.json", PIPELINE);
        let cmd = Commands::Features { pipeline };
        assert!(handle_command(cmd, dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_fails_without_exports() {
        let dir = TempDir::new().unwrap();
        let cmd = Commands::Serve {
            host: None,
            port: Some(0),
            pipelines_dir: Some(dir.path().join("missing")),
        };
        let err = handle_command(cmd, dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("failed to load pipeline"));
    }
}
