use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use super::run::RunCommand;
use crate::app::App;
use crate::config::{clamp_history_window, Config};
use crate::llm::ModelId;
use crate::LogTarget;

/// mdchat - chat with an LLM from your terminal, replies rendered as markdown
#[derive(Parser, Debug)]
#[command(
    name = "mdchat",
    version,
    about = "Chat with an LLM from your terminal, replies rendered as markdown",
    long_about = r#"mdchat keeps a short conversation with a chat-completion endpoint and renders
the assistant's replies as markdown with highlighted code blocks.

Examples:
  mdchat                                  # Start the interactive chat panel
  mdchat run "explain ownership in rust"  # Send a single prompt
  echo "hello" | mdchat run --raw         # Read the prompt from stdin"#
)]
pub struct Cli {
    /// Chat-completion endpoint URL
    #[arg(long = "endpoint", global = true)]
    pub endpoint: Option<String>,

    /// Model to request
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<ModelId>,

    /// Number of previous turns included in each prompt (0-20)
    #[arg(short = 'w', long = "history-window", global = true, allow_negative_numbers = true)]
    pub history_window: Option<i64>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single prompt non-interactively
    Run(RunCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let (mut config, load_report) = Config::init().await?;
        self.apply_overrides(&mut config);

        let log_target = match self.command {
            Some(Commands::Run(_)) => LogTarget::Stderr,
            None => LogTarget::File(config.data_dir.join("mdchat.log")),
        };
        crate::init_logging(self.debug, &log_target)?;
        load_report.log();

        if self.debug {
            debug!("Debug logging enabled");
        }
        debug!(
            "Configuration initialized: endpoint {}, model {}, history window {}",
            config.endpoint, config.model, config.history_window
        );

        match self.command {
            Some(Commands::Run(run_cmd)) => run_cmd.execute(&config).await,
            None => {
                let result = App::run_interactive(config).await;
                info!("Application finished");
                result
            }
        }
    }

    /// Command-line flags take precedence over files and the environment
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(window) = self.history_window {
            config.history_window = clamp_history_window(window);
        }
    }
}
