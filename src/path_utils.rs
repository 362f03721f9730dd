use std::path::{Component, Path, PathBuf};

use crate::asset_ref::AssetRef;
use crate::cli::UnrootedPolicy;
use crate::error::{Error, Result};

/// Expands a leading `~` and canonicalizes the path.
pub fn get_path(path: &str) -> std::io::Result<PathBuf> {
    let expanded = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            let home = dirs::home_dir().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not determine home directory",
                )
            })?;

            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(path),
    };

    expanded.canonicalize()
}

/// Translates between logical asset identifiers and physical file paths.
///
/// An identifier whose first segment equals the logical root maps onto
/// `project_dir/logical_root`; anything else is handled by the
/// [`UnrootedPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    project_dir: PathBuf,
    logical_root: String,
    unrooted: UnrootedPolicy,
}

impl PathMapping {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        logical_root: &str,
        unrooted: UnrootedPolicy,
    ) -> Result<PathMapping> {
        let is_single_segment = matches!(
            Path::new(logical_root).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );

        if !is_single_segment || logical_root.contains(['/', '\\']) {
            return Err(Error::InvalidLogicalRoot(logical_root.to_owned()));
        }

        Ok(PathMapping {
            project_dir: project_dir.into(),
            logical_root: logical_root.to_owned(),
            unrooted,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn logical_root(&self) -> &str {
        &self.logical_root
    }

    /// The physical directory the logical root stands for.
    pub fn physical_root(&self) -> PathBuf {
        self.project_dir.join(&self.logical_root)
    }

    pub fn to_physical(&self, asset: &AssetRef) -> Option<PathBuf> {
        if asset.root_segment() == self.logical_root {
            return match asset.strip_root() {
                None => Some(self.physical_root()),
                Some(rest) if is_relative_descent(rest) => Some(self.physical_root().join(rest)),
                Some(_) => None,
            };
        }

        match self.unrooted {
            UnrootedPolicy::Reject => None,
            UnrootedPolicy::Passthrough if is_relative_descent(asset.as_str()) => {
                Some(self.project_dir.join(asset.as_str()))
            }
            UnrootedPolicy::Passthrough => None,
        }
    }

    /// Inverse of [`PathMapping::to_physical`] for paths under the project.
    pub fn to_logical(&self, path: &Path) -> Option<AssetRef> {
        let relative = path.strip_prefix(&self.project_dir).ok()?;

        let segments = relative
            .components()
            .map(|component| match component {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        AssetRef::new(&segments.join("/"))
    }
}

/// True when `relative` only descends: no root, prefix, `.` or `..` parts.
fn is_relative_descent(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}
