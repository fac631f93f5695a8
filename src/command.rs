//! Capture completion scripts printed by locally installed tools.

use crate::error::{Error, ExecutionError, IoResultExt, Result};
use crate::utils::{discard, part_path, promote};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// A program that prints its own completion script on stdout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name, looked up on `PATH`
    pub program: String,
    /// Fixed arguments, e.g. `["--completions", "zsh"]`
    pub args: Vec<String>,
    /// File name inside the output directory, e.g. `_just`
    pub output: String,
}

impl CommandSpec {
    /// Convenience constructor
    pub fn new(program: &str, args: &[&str], output: &str) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            output: output.to_string(),
        }
    }

    /// The full command line, for logging
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the program with stdout redirected to `{output_dir}/{output}`
    ///
    /// stderr is inherited from this process. The output file only appears
    /// once the program has exited successfully.
    ///
    /// # Errors
    ///
    /// [`Error::Execution`] if the program is not on `PATH`, cannot be
    /// started, or exits unsuccessfully.
    pub async fn run(&self, output_dir: &Path) -> Result<PathBuf> {
        let binary = which::which(&self.program).map_err(|_| ExecutionError::NotFound {
            program: self.program.clone(),
        })?;

        let target = output_dir.join(&self.output);
        let part = part_path(&target);
        let stdout = std::fs::File::create(&part).at_path(&part)?;

        let status = Command::new(&binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await;

        let status = match status {
            Ok(status) => status,
            Err(source) => {
                discard(&part).await;
                return Err(Error::Execution(ExecutionError::Spawn {
                    program: self.program.clone(),
                    source,
                }));
            }
        };

        if !status.success() {
            discard(&part).await;
            return Err(Error::Execution(ExecutionError::ExitStatus {
                program: self.program.clone(),
                code: status.code(),
            }));
        }

        if let Err(e) = promote(&part, &target).await {
            discard(&part).await;
            return Err(e);
        }

        info!(command = %self.command_line(), ?target, "captured completion script");
        Ok(target)
    }
}
