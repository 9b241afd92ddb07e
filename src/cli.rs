//! Clap adapter for confmerge.
//!
//! Compiled only with the `clap` Cargo feature (on by default). [`MergeArgs`]
//! can be flattened into any clap `Parser`; [`MergeArgs::action`] and
//! [`MergeArgs::overrides`] bridge the parsed flags to the framework-free
//! [`MergeAction`] and the settings override layer.

use clap::{Args, Subcommand};

use crate::types::MergeAction;

/// Arguments for the merge command line.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     merge: MergeArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Upstream base config (overrides `base_config_path`).
    #[arg(long, global = true, value_name = "PATH")]
    pub base: Option<String>,

    /// Your modified config (overrides `mod_config_path`).
    #[arg(long = "mod", global = true, value_name = "PATH")]
    pub mod_path: Option<String>,

    /// Do not copy the mod file before writing (overrides `backup_before_merge`).
    #[arg(long, global = true)]
    pub no_backup: bool,

    /// Ignore `CONFMERGE__*` environment variables.
    #[arg(long, global = true)]
    pub no_env: bool,

    #[command(subcommand)]
    pub command: Option<MergeCommand>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum MergeCommand {
    /// Show which sections change and by how much.
    Preview,
    /// Print the full merged configuration.
    Show,
    /// Write the merged configuration back to the mod file.
    Apply {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Print a commented settings file template.
    Template,
}

impl MergeArgs {
    /// Bare `confmerge` and `confmerge preview` both map to
    /// [`MergeAction::Preview`].
    pub fn action(&self) -> MergeAction {
        match self.command {
            None | Some(MergeCommand::Preview) => MergeAction::Preview,
            Some(MergeCommand::Show) => MergeAction::Show,
            Some(MergeCommand::Apply { yes }) => MergeAction::Apply { assume_yes: yes },
            Some(MergeCommand::Template) => MergeAction::Template,
        }
    }

    /// Settings keys set on the command line, for the highest-priority layer.
    pub fn overrides(&self) -> Vec<(String, toml::Value)> {
        let mut overrides = Vec::new();
        if let Some(base) = &self.base {
            overrides.push(("base_config_path".into(), toml::Value::String(base.clone())));
        }
        if let Some(path) = &self.mod_path {
            overrides.push(("mod_config_path".into(), toml::Value::String(path.clone())));
        }
        if self.no_backup {
            overrides.push(("backup_before_merge".into(), toml::Value::Boolean(false)));
        }
        overrides
    }
}
