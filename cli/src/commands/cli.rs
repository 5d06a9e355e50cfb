use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use taskpilot_core::config::AppConfig;
use taskpilot_core::executor::OutputFormat;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskpilot", version, about = "Run natural-language browser tasks through a local model")]
pub struct Args {
    /// Config file (default: ~/.taskpilot/config.toml, then ./taskpilot.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the `[agent]`, `[retry]` and `[monitor]` config.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct AgentOverrides {
    /// Ollama model name
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Additional attempts after a failed agent run
    #[arg(long)]
    pub retries: Option<u32>,

    /// Write metrics JSON here after the run
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,
}

impl AgentOverrides {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(model) = &self.model {
            cfg.agent.model_name = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            cfg.agent.ollama_url = url.clone();
        }
        if self.headed {
            cfg.agent.headless = false;
        }
        if let Some(retries) = self.retries {
            cfg.retry.retries = retries;
        }
        if let Some(path) = &self.metrics_out {
            cfg.monitor.enabled = true;
            cfg.monitor.export_path = Some(path.to_string_lossy().to_string());
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Instruction for the agent. Omit when using --template.
    pub description: Option<String>,

    /// Build the instruction from a named template instead
    #[arg(long, conflicts_with = "description")]
    pub template: Option<String>,

    /// Template variable (KEY=VALUE). Can be specified multiple times.
    #[arg(long = "var", action = clap::ArgAction::Append)]
    pub vars: Vec<String>,

    /// Extra template library (JSON) merged over the built-in catalog
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Per-task timeout in seconds (default from config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print progress events as they happen
    #[arg(long)]
    pub stream: bool,

    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    #[command(flatten)]
    pub agent: AgentOverrides,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    /// File with one instruction per line (blank lines and `#` comments skipped)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Instruction to run. Can be specified multiple times.
    #[arg(long = "task", action = clap::ArgAction::Append)]
    pub tasks: Vec<String>,

    /// Number of independent browser agents (default from config)
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Per-task timeout in seconds (default from config)
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    #[command(flatten)]
    pub agent: AgentOverrides,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateArgs {
    /// Extra template library (JSON) merged over the built-in catalog
    #[arg(long, global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub action: TemplateAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplateAction {
    /// List available templates
    List,
    /// Show one template and its variables
    Show { name: String },
    /// Render a template
    Render {
        name: String,
        #[arg(long = "var", action = clap::ArgAction::Append)]
        vars: Vec<String>,
    },
    /// Render several templates joined by a space
    Compose {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long = "var", action = clap::ArgAction::Append)]
        vars: Vec<String>,
    },
    /// Print the library as JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single task
    Run(RunArgs),
    /// Run many tasks across parallel agents
    Batch(BatchArgs),
    /// Inspect and render task templates
    Template(TemplateArgs),
}
