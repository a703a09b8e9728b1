use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::EvalConfig;
use crate::model::Approach;

#[derive(Parser, Debug)]
#[command(
    name = "mapeval",
    version,
    about = "Score automated API field mappings against hand-curated ground truth"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record which source documents exist for every API.
    Inventory(InventoryArgs),
    /// Build per-API comparison documents from the source documents.
    Compare(CompareArgs),
    /// Print confusion-matrix tables from the comparison documents.
    Metrics(MetricsArgs),
    /// Check comparison documents for structural defects.
    Validate(ValidateArgs),
    /// Write one all-API report per approach.
    Approaches(ApproachesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,

    #[arg(long, env = "MAPEVAL_CONFIG")]
    pub config: Option<PathBuf>,
}

impl WorkspaceArgs {
    pub fn load_config(&self) -> Result<EvalConfig> {
        EvalConfig::load(self.config.as_deref(), &self.base_dir)
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "api")]
    pub apis: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long)]
    pub comparison_dir: Option<PathBuf>,

    #[arg(long = "approach", value_enum)]
    pub approaches: Vec<Approach>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long)]
    pub comparison_dir: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ApproachesArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long)]
    pub comparison_dir: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};
    use crate::model::Approach;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn metrics_accepts_repeated_approach_filters() {
        let cli = Cli::try_parse_from([
            "mapeval",
            "metrics",
            "--base-dir",
            "/data",
            "--approach",
            "enhanced-rag",
            "--approach",
            "complete-arch",
            "--json",
        ])
        .expect("metrics arguments should parse");

        let Commands::Metrics(args) = cli.command else {
            panic!("expected metrics command");
        };
        assert_eq!(
            args.approaches,
            vec![Approach::EnhancedRag, Approach::CompleteArch]
        );
        assert!(args.json);
        assert_eq!(args.workspace.base_dir, std::path::PathBuf::from("/data"));
    }
}
