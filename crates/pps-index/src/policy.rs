use regex::Regex;
use std::sync::OnceLock;

use pps_backend::ComputationBackend;

/// Distributions served from the PyTorch index instead of PyPI.
pub const PYTORCH_DISTRIBUTIONS: &[&str] = &["torch", "torchvision", "torchaudio", "torchtext"];

/// pip subcommands whose behavior the shim changes.
pub const PATCHED_SUB_CMDS: &[&str] = &["install", "uninstall"];

pub const SELF_DISTRIBUTION: &str = "pytorch-pip-shim";

pub const INDEX_BASE_URL: &str = "https://download.pytorch.org/whl/";

#[must_use]
pub fn canonicalize_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

#[must_use]
pub fn is_pytorch_distribution(name: &str) -> bool {
    let name = canonicalize_name(name);
    PYTORCH_DISTRIBUTIONS.contains(&name.as_str())
}

/// Find-links page listing the wheels for `backend`.
///
/// Stable releases of every backend share one page; nightlies are split per
/// backend.
#[must_use]
pub fn index_url(backend: &ComputationBackend, nightly: bool) -> String {
    if nightly {
        format!("{INDEX_BASE_URL}nightly/{backend}/torch_nightly.html")
    } else {
        format!("{INDEX_BASE_URL}torch_stable.html")
    }
}

fn local_label_pattern() -> &'static Regex {
    static LOCAL_LABEL: OnceLock<Regex> = OnceLock::new();
    LOCAL_LABEL.get_or_init(|| {
        Regex::new(r"[+](cpu|cu[0-9]+)$").expect("Invalid local label regex")
    })
}

fn link_backend_pattern() -> &'static Regex {
    static LINK_BACKEND: OnceLock<Regex> = OnceLock::new();
    LINK_BACKEND.get_or_init(|| {
        Regex::new(r"^/whl/(?P<backend>cpu|cu[0-9]+)/").expect("Invalid link backend regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub version: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Local version label, e.g. `cu111` for `1.8.0+cu111`.
    #[must_use]
    pub fn local_version(&self) -> Option<&str> {
        self.version.split_once('+').map(|(_, local)| local)
    }
}

/// Decisions the install flow delegates to the shim, given the selected
/// backend and whether pre-releases were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPolicy {
    backend: ComputationBackend,
    nightly: bool,
}

impl InstallPolicy {
    #[must_use]
    pub fn new(backend: ComputationBackend, nightly: bool) -> Self {
        Self { backend, nightly }
    }

    #[must_use]
    pub fn backend(&self) -> &ComputationBackend {
        &self.backend
    }

    #[must_use]
    pub fn nightly(&self) -> bool {
        self.nightly
    }

    #[must_use]
    pub fn index_url(&self) -> String {
        index_url(&self.backend, self.nightly)
    }

    /// Index to search instead of the configured ones, or `None` to leave the
    /// lookup of `project` alone.
    #[must_use]
    pub fn search_index_for(&self, project: &str) -> Option<String> {
        is_pytorch_distribution(project).then(|| self.index_url())
    }

    /// Stable index pages link wheels as `/whl/<backend>/torch-1.8.0-...whl`
    /// without a local label in the version. Carry the backend over from the
    /// path so candidates can be told apart.
    #[must_use]
    pub fn annotate_version(&self, version: &str, link_path: &str) -> String {
        if local_label_pattern().is_match(version) {
            return version.to_string();
        }

        match link_backend_pattern().captures(link_path) {
            Some(captures) => format!("{version}+{}", &captures["backend"]),
            None => version.to_string(),
        }
    }

    /// Drop PyTorch candidates built for a different backend.
    pub fn select_candidates<I>(&self, candidates: I) -> Vec<Candidate>
    where
        I: IntoIterator<Item = Candidate>,
    {
        candidates
            .into_iter()
            .filter(|candidate| {
                let keep = !is_pytorch_distribution(&candidate.name)
                    || candidate
                        .local_version()
                        .is_none_or(|local| self.backend == local.to_lowercase());
                if !keep {
                    log::debug!(
                        "Skipping {} {} for backend {}",
                        candidate.name,
                        candidate.version,
                        self.backend
                    );
                }
                keep
            })
            .collect()
    }

    /// Uninstalling the shim itself must take the stanza out of pip first,
    /// otherwise pip keeps importing a package that no longer exists.
    #[must_use]
    pub fn removes_shim_on_uninstall(project: &str) -> bool {
        canonicalize_name(project) == SELF_DISTRIBUTION
    }
}
