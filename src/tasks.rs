//! The compiled-in list of completion sources.

use crate::command::CommandSpec;
use crate::direct::RawDownload;
use std::fmt;

/// Repositories whose release archives carry a zsh completion
const RELEASE_REPOS: &[&str] = &[
    "sharkdp/bat",
    "sharkdp/fd",
    "charmbracelet/glow",
    "sharkdp/hyperfine",
    "lsd-rs/lsd",
    "BurntSushi/ripgrep",
    "watchexec/watchexec",
    "ducaale/xh",
    "ajeetdsouza/zoxide",
];

/// Every source to sync, grouped by kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskList {
    /// `owner/name` repositories fetched from their latest release
    pub releases: Vec<String>,
    /// Files downloaded verbatim
    pub raw_downloads: Vec<RawDownload>,
    /// Local programs that print their own completion
    pub commands: Vec<CommandSpec>,
}

impl TaskList {
    /// The built-in task list
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            releases: RELEASE_REPOS.iter().map(|r| (*r).to_string()).collect(),
            raw_downloads: Vec::new(),
            commands: vec![
                CommandSpec::new("just", &["--completions", "zsh"], "_just"),
                CommandSpec::new(
                    "zellij",
                    &["setup", "--generate-completion", "zsh"],
                    "_zellij",
                ),
            ],
        }
    }

    /// Flatten into individual jobs
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.releases
            .iter()
            .cloned()
            .map(Task::Release)
            .chain(self.raw_downloads.iter().cloned().map(Task::Raw))
            .chain(self.commands.iter().cloned().map(Task::Command))
            .collect()
    }

    /// Total number of jobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len() + self.raw_downloads.len() + self.commands.len()
    }

    /// Whether there is nothing to do
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One independent unit of work
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// Fetch the latest release archive and extract its completions
    Release(String),
    /// Download a single file
    Raw(RawDownload),
    /// Run a local program and capture its stdout
    Command(CommandSpec),
}

impl Task {
    /// Short kind name, used as a log field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Release(_) => "release",
            Task::Raw(_) => "raw",
            Task::Command(_) => "command",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Release(repo) => write!(f, "{repo}"),
            Task::Raw(download) => write!(f, "{} -> {}", download.url, download.filename),
            Task::Command(spec) => write!(f, "{} > {}", spec.command_line(), spec.output),
        }
    }
}
