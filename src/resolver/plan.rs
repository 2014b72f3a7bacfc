//! Install plan consumed by the build invoker

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Binaries that share one destination directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationGroup {
    /// Directory the binaries are written to
    pub install_dir: PathBuf,

    /// Import paths of the binary packages in this group, sorted
    pub packages: Vec<String>,

    /// Target arguments for the build invocation of this group
    pub targets: Vec<String>,
}

/// Where every binary of a request is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPlan {
    /// All binaries go to one directory; built with the original target expression
    Shared(DestinationGroup),

    /// Binaries go to several directories; built once per group
    PerPackage(Vec<DestinationGroup>),
}

impl InstallPlan {
    /// Build a plan from destination groups keyed by directory
    ///
    /// A single group keeps `original_targets` so the toolchain sees exactly
    /// the request it would have seen without relocation.
    pub fn from_groups(groups: BTreeMap<PathBuf, Vec<String>>, original_targets: &[String]) -> Self {
        let mut groups: Vec<DestinationGroup> = groups
            .into_iter()
            .map(|(install_dir, mut packages)| {
                packages.sort();
                packages.dedup();
                DestinationGroup {
                    install_dir,
                    targets: packages.clone(),
                    packages,
                }
            })
            .collect();

        if groups.len() == 1 {
            let mut group = groups.remove(0);
            group.targets = original_targets.to_vec();
            return Self::Shared(group);
        }

        Self::PerPackage(groups)
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    /// Groups in invocation order
    pub fn groups(&self) -> &[DestinationGroup] {
        match self {
            Self::Shared(group) => std::slice::from_ref(group),
            Self::PerPackage(groups) => groups,
        }
    }

    /// Every destination directory, in invocation order
    pub fn install_dirs(&self) -> impl Iterator<Item = &Path> {
        self.groups().iter().map(|g| g.install_dir.as_path())
    }
}
