//! Release asset naming.
//!
//! Most projects publish `{program}-{tag}-x86_64-unknown-linux-musl.tar.gz`.
//! The ones that don't are listed in [`SPECIAL_CASES`]; adding a tool with an
//! unusual asset name means adding a row there.

/// Platform suffix shared by the musl builds
const MUSL_TRIPLE: &str = "x86_64-unknown-linux-musl";

/// How a repository names its Linux release archive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetNaming {
    /// `{program}-{tag}-x86_64-unknown-linux-musl.tar.gz`
    Default,
    /// `{program}{suffix}`; the tag does not appear in the name
    Unversioned {
        /// Everything after the program name, e.g. `_Linux_x86_64.tar.gz`
        suffix: &'static str,
    },
    /// `{program}-{version}-x86_64-unknown-linux-musl.{extension}` where
    /// `version` is the tag with its leading `v` removed
    StripV {
        /// Archive extension, e.g. `tar.xz`
        extension: &'static str,
    },
}

/// Repositories whose assets don't follow [`AssetNaming::Default`]
pub const SPECIAL_CASES: &[(&str, AssetNaming)] = &[
    (
        "charmbracelet/glow",
        AssetNaming::Unversioned {
            suffix: "_Linux_x86_64.tar.gz",
        },
    ),
    (
        "watchexec/watchexec",
        AssetNaming::StripV {
            extension: "tar.xz",
        },
    ),
    (
        "ajeetdsouza/zoxide",
        AssetNaming::StripV {
            extension: "tar.gz",
        },
    ),
];

impl AssetNaming {
    /// Look up the naming strategy for `repo`
    #[must_use]
    pub fn for_repo(repo: &str) -> Self {
        SPECIAL_CASES
            .iter()
            .find(|(name, _)| *name == repo)
            .map_or(AssetNaming::Default, |(_, naming)| *naming)
    }

    /// Render the archive filename for `program` at release `tag`
    #[must_use]
    pub fn render(&self, program: &str, tag: &str) -> String {
        match self {
            AssetNaming::Default => format!("{program}-{tag}-{MUSL_TRIPLE}.tar.gz"),
            AssetNaming::Unversioned { suffix } => format!("{program}{suffix}"),
            AssetNaming::StripV { extension } => {
                let version = tag.trim_start_matches('v');
                format!("{program}-{version}-{MUSL_TRIPLE}.{extension}")
            }
        }
    }
}

/// Short program name: the last path segment of `owner/name`
#[must_use]
pub fn program_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}

/// Archive filename for the release `tag` of `repo`
#[must_use]
pub fn asset_name(repo: &str, tag: &str) -> String {
    AssetNaming::for_repo(repo).render(program_name(repo), tag)
}
