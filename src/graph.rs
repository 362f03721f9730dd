use std::path::{Path, PathBuf};

use crate::asset_ref::AssetRef;
use crate::utils::file_size;

/// Source of asset structure and dependency information.
pub trait AssetGraph {
    fn is_folder(&self, asset: &AssetRef) -> bool;

    /// Every asset contained anywhere under `folder`, subfolders included.
    fn list_members(&self, folder: &AssetRef) -> Vec<AssetRef>;

    /// Transitive dependencies of `asset`, including `asset` itself.
    fn dependencies(&self, asset: &AssetRef) -> Vec<AssetRef>;

    /// `None` when the identifier has no physical counterpart.
    fn resolve_physical_path(&self, asset: &AssetRef) -> Option<PathBuf>;

    fn file_size(&self, path: &Path) -> Option<u64> {
        file_size(path)
    }
}
