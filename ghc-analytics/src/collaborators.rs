//! External collaborators
//!
//! Ingestion, template generation and the consistency audit live outside
//! this crate. The API only needs them to run to completion (or fail), so
//! they sit behind the [`Collaborators`] trait. [`CommandCollaborators`]
//! runs a configured external command for each one.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, info};

/// Source kinds accepted by `POST /api/v1/ingest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestKind {
    Docs,
    Templates,
    Har,
}

impl IngestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestKind::Docs => "docs",
            IngestKind::Templates => "templates",
            IngestKind::Har => "har",
        }
    }
}

impl fmt::Display for IngestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "docs" => Ok(IngestKind::Docs),
            "templates" => Ok(IngestKind::Templates),
            "har" => Ok(IngestKind::Har),
            other => Err(format!("kind must be one of docs|templates|har, got '{}'", other)),
        }
    }
}

/// Arguments of one template-generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub kind: String,
    pub source_db: PathBuf,
    pub out_dir: PathBuf,
    pub analytics_db: PathBuf,
    pub params: BTreeMap<String, serde_json::Value>,
}

/// Arguments of one consistency audit
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRequest {
    pub enterprise_db: PathBuf,
    pub production_db: PathBuf,
    pub analytics_db: PathBuf,
    pub base_paths: Vec<PathBuf>,
    pub patterns: Vec<String>,
    pub regenerate: bool,
    pub reingest: bool,
}

/// The external ingestion, generation and audit functions
#[async_trait]
pub trait Collaborators: Send + Sync {
    async fn ingest_documentation(&self, workspace: &Path) -> Result<()>;

    async fn ingest_templates(&self, workspace: &Path) -> Result<()>;

    async fn ingest_har_entries(&self, workspace: &Path) -> Result<()>;

    /// Render templates; returns the paths written
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<PathBuf>>;

    async fn run_audit(&self, request: &AuditRequest) -> Result<()>;

    /// Dispatch an ingestion by kind
    async fn ingest(&self, kind: IngestKind, workspace: &Path) -> Result<()> {
        match kind {
            IngestKind::Docs => self.ingest_documentation(workspace).await,
            IngestKind::Templates => self.ingest_templates(workspace).await,
            IngestKind::Har => self.ingest_har_entries(workspace).await,
        }
    }
}

/// Commands for each collaborator: program followed by fixed arguments
///
/// ```toml
/// [collaborators]
/// ingest_docs = ["python", "scripts/ingest_documentation.py"]
/// generate = ["python", "-m", "template_engine.generate"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollaboratorCommands {
    #[serde(default)]
    pub ingest_docs: Option<Vec<String>>,
    #[serde(default)]
    pub ingest_templates: Option<Vec<String>>,
    #[serde(default)]
    pub ingest_har: Option<Vec<String>>,
    #[serde(default)]
    pub generate: Option<Vec<String>>,
    #[serde(default)]
    pub audit: Option<Vec<String>>,
}

/// Runs collaborators as external processes
///
/// Each invocation appends its arguments as flags (`--workspace`,
/// `--source-db`, ...), exports `GH_COPILOT_WORKSPACE` and
/// `GH_COPILOT_ANALYTICS_DB`, and fails on a non-zero exit with the
/// process's stderr in the error. `generate` reads one written path per
/// stdout line.
#[derive(Debug, Clone)]
pub struct CommandCollaborators {
    commands: CollaboratorCommands,
    workspace: PathBuf,
    analytics_db: PathBuf,
}

impl CommandCollaborators {
    pub fn new(commands: CollaboratorCommands, workspace: PathBuf, analytics_db: PathBuf) -> Self {
        Self {
            commands,
            workspace,
            analytics_db,
        }
    }

    async fn run(&self, name: &str, command: Option<&Vec<String>>, args: Vec<String>) -> Result<String> {
        let command = command
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("No command configured for collaborator '{}'", name))?;

        let (program, fixed_args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Empty command for collaborator '{}'", name))?;

        debug!("Running collaborator {}: {} {:?} {:?}", name, program, fixed_args, args);

        let output = Command::new(program)
            .args(fixed_args)
            .args(&args)
            .env("GH_COPILOT_WORKSPACE", &self.workspace)
            .env("GH_COPILOT_ANALYTICS_DB", &self.analytics_db)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to start collaborator '{}' ({})", name, program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Collaborator '{}' exited with {}: {}",
                name,
                output.status,
                stderr.trim()
            );
        }

        info!("Collaborator {} completed", name);
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn workspace_args(workspace: &Path) -> Vec<String> {
        vec!["--workspace".to_string(), workspace.display().to_string()]
    }
}

#[async_trait]
impl Collaborators for CommandCollaborators {
    async fn ingest_documentation(&self, workspace: &Path) -> Result<()> {
        self.run("ingest_docs", self.commands.ingest_docs.as_ref(), Self::workspace_args(workspace))
            .await
            .map(|_| ())
    }

    async fn ingest_templates(&self, workspace: &Path) -> Result<()> {
        self.run(
            "ingest_templates",
            self.commands.ingest_templates.as_ref(),
            Self::workspace_args(workspace),
        )
        .await
        .map(|_| ())
    }

    async fn ingest_har_entries(&self, workspace: &Path) -> Result<()> {
        self.run("ingest_har", self.commands.ingest_har.as_ref(), Self::workspace_args(workspace))
            .await
            .map(|_| ())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<PathBuf>> {
        let mut args = vec![
            "--kind".to_string(),
            request.kind.clone(),
            "--source-db".to_string(),
            request.source_db.display().to_string(),
            "--out-dir".to_string(),
            request.out_dir.display().to_string(),
            "--analytics-db".to_string(),
            request.analytics_db.display().to_string(),
        ];
        for (key, value) in &request.params {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            args.push("--param".to_string());
            args.push(format!("{}={}", key, value));
        }

        let stdout = self.run("generate", self.commands.generate.as_ref(), args).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    async fn run_audit(&self, request: &AuditRequest) -> Result<()> {
        let mut args = vec![
            "--enterprise-db".to_string(),
            request.enterprise_db.display().to_string(),
            "--production-db".to_string(),
            request.production_db.display().to_string(),
            "--analytics-db".to_string(),
            request.analytics_db.display().to_string(),
        ];
        for base in &request.base_paths {
            args.push("--base-path".to_string());
            args.push(base.display().to_string());
        }
        for pattern in &request.patterns {
            args.push("--pattern".to_string());
            args.push(pattern.clone());
        }
        if request.regenerate {
            args.push("--regenerate".to_string());
        }
        if request.reingest {
            args.push("--reingest".to_string());
        }

        self.run("audit", self.commands.audit.as_ref(), args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collaborators(commands: CollaboratorCommands) -> CommandCollaborators {
        CommandCollaborators::new(commands, PathBuf::from("."), PathBuf::from("analytics.db"))
    }

    fn generate_request() -> GenerateRequest {
        GenerateRequest {
            kind: "docs".to_string(),
            source_db: PathBuf::from("databases/documentation.db"),
            out_dir: PathBuf::from("generated/docs"),
            analytics_db: PathBuf::from("analytics.db"),
            params: BTreeMap::new(),
        }
    }

    #[test]
    fn test_ingest_kind_parse() {
        assert_eq!("har".parse::<IngestKind>().unwrap(), IngestKind::Har);
        assert!("html".parse::<IngestKind>().is_err());
        assert!("Docs".parse::<IngestKind>().is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_collaborator_fails() {
        let c = collaborators(CollaboratorCommands::default());
        let err = c.ingest(IngestKind::Docs, Path::new(".")).await.unwrap_err();
        assert!(err.to_string().contains("ingest_docs"), "{}", err);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command() {
        let c = collaborators(CollaboratorCommands {
            ingest_har: Some(vec!["true".to_string()]),
            ..Default::default()
        });
        assert!(c.ingest(IngestKind::Har, Path::new(".")).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_stderr() {
        let c = collaborators(CollaboratorCommands {
            ingest_templates: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo template store locked >&2; exit 3".to_string(),
            ]),
            ..Default::default()
        });
        let err = c.ingest(IngestKind::Templates, Path::new(".")).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("template store locked"), "{}", message);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_reads_paths_from_stdout() {
        // Extra flags land in $0.. of the inline script and are ignored
        let c = collaborators(CollaboratorCommands {
            generate: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf 'generated/docs/a.md\\n\\ngenerated/docs/b.md\\n'".to_string(),
            ]),
            ..Default::default()
        });
        let written = c.generate(&generate_request()).await.unwrap();
        assert_eq!(
            written,
            vec![
                PathBuf::from("generated/docs/a.md"),
                PathBuf::from("generated/docs/b.md")
            ]
        );
    }
}
