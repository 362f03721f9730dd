use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::{debug, info, warn};
use rayon::prelude::*;
use regex::{bytes, Regex};
use walkdir::{DirEntry, WalkDir};

use crate::asset_ref::AssetRef;
use crate::error::{Error, Result};
use crate::graph::AssetGraph;
use crate::path_utils::PathMapping;

const META_EXTENSION: &str = "meta";
const YAML_HEADER: &[u8] = b"%YAML";
const PACKAGES_DIR: &str = "Packages";

/// Asset graph of a project on disk.
///
/// Identity comes from the `guid:` line of each `.meta` side file, edges
/// from the `guid:` references inside text-serialized assets.
#[derive(Debug)]
pub struct ProjectAssetGraph {
    mapping: PathMapping,
    guids: HashMap<String, AssetRef>,
    assets: HashMap<AssetRef, String>,
    references: HashMap<AssetRef, Vec<AssetRef>>,
}

impl ProjectAssetGraph {
    /// Indexes the logical root folder and, when present, `Packages/`.
    pub fn open(mapping: PathMapping, spinner: &ProgressBar) -> Result<ProjectAssetGraph> {
        if !mapping.project_dir().is_dir() {
            return Err(Error::ProjectNotFound(mapping.project_dir().to_path_buf()));
        }

        let physical_root = mapping.physical_root();
        if !physical_root.is_dir() {
            return Err(Error::MissingLogicalRoot {
                root: mapping.logical_root().to_owned(),
                path: physical_root,
            });
        }

        let mut scan_roots = vec![physical_root];
        let packages = mapping.project_dir().join(PACKAGES_DIR);
        if packages.is_dir() && mapping.logical_root() != PACKAGES_DIR {
            scan_roots.push(packages);
        }

        spinner.set_message("Walking project");
        let mut files = Vec::new();
        for root in &scan_roots {
            files.extend(walk_files(root));
        }

        let (metas, assets): (Vec<PathBuf>, Vec<PathBuf>) =
            files.into_iter().partition(|path| is_meta(path));

        spinner.set_message(format!("Reading {} meta files", metas.len()));
        let guid_pattern = Regex::new(r"(?m)^guid:\s*([0-9a-fA-F]{32})\s*$")?;

        let identities = metas
            .par_iter()
            .filter_map(|meta| {
                let asset = mapping.to_logical(&meta.with_extension(""))?;
                let text = std::fs::read_to_string(meta)
                    .map_err(|e| warn!("Could not read {}: {e}", meta.display()))
                    .ok()?;
                let guid = guid_pattern.captures(&text)?.get(1)?.as_str().to_ascii_lowercase();

                Some((guid, asset))
            })
            .collect::<Vec<_>>();

        let mut guids = HashMap::with_capacity(identities.len());
        let mut by_asset = HashMap::with_capacity(identities.len());
        for (guid, asset) in identities {
            if let Some(previous) = guids.insert(guid.clone(), asset.clone()) {
                warn!("GUID {guid} is claimed by both {previous} and {asset}");
            }
            by_asset.insert(asset, guid);
        }

        spinner.set_message(format!("Scanning {} assets for references", assets.len()));
        let reference_pattern = bytes::Regex::new(r"guid:\s*([0-9a-fA-F]{32})")?;

        let references = assets
            .par_iter()
            .filter_map(|path| {
                let asset = mapping.to_logical(path)?;
                let content = read_yaml(path)?;

                let mut seen = HashSet::new();
                let direct = reference_pattern
                    .captures_iter(&content)
                    .filter_map(|captures| {
                        let guid = std::str::from_utf8(captures.get(1)?.as_bytes())
                            .ok()?
                            .to_ascii_lowercase();
                        guids.get(&guid).cloned()
                    })
                    .filter(|dependency| *dependency != asset && seen.insert(dependency.clone()))
                    .collect::<Vec<_>>();

                (!direct.is_empty()).then_some((asset, direct))
            })
            .collect::<HashMap<_, _>>();

        spinner.finish_and_clear();
        info!(
            "Indexed {} assets with {} referencing others",
            guids.len(),
            references.len()
        );

        Ok(ProjectAssetGraph {
            mapping,
            guids,
            assets: by_asset,
            references,
        })
    }

    pub fn mapping(&self) -> &PathMapping {
        &self.mapping
    }

    pub fn guid_of(&self, asset: &AssetRef) -> Option<&str> {
        self.assets.get(asset).map(String::as_str)
    }

    pub fn asset_for_guid(&self, guid: &str) -> Option<&AssetRef> {
        self.guids.get(&guid.to_ascii_lowercase())
    }
}

impl AssetGraph for ProjectAssetGraph {
    fn is_folder(&self, asset: &AssetRef) -> bool {
        self.resolve_physical_path(asset)
            .is_some_and(|path| path.is_dir())
    }

    fn list_members(&self, folder: &AssetRef) -> Vec<AssetRef> {
        let Some(physical) = self.resolve_physical_path(folder) else {
            return Vec::new();
        };

        let mut members = WalkDir::new(physical)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry))
            .filter_map(|entry| {
                entry
                    .map_err(|e| warn!("Skipping unreadable entry under {folder}: {e}"))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file() && !is_meta(entry.path()))
            .filter_map(|entry| self.mapping.to_logical(entry.path()))
            .collect::<Vec<_>>();

        members.sort();
        members
    }

    fn dependencies(&self, asset: &AssetRef) -> Vec<AssetRef> {
        let mut closure = vec![asset.clone()];
        let mut visited = HashSet::from([asset.clone()]);
        let mut next = 0;

        while let Some(current) = closure.get(next) {
            if let Some(direct) = self.references.get(current) {
                let unvisited = direct
                    .iter()
                    .filter(|dependency| visited.insert((*dependency).clone()))
                    .cloned()
                    .collect::<Vec<_>>();
                closure.extend(unvisited);
            }
            next += 1;
        }

        debug!("{asset} depends on {} assets", closure.len() - 1);
        closure
    }

    fn resolve_physical_path(&self, asset: &AssetRef) -> Option<PathBuf> {
        self.mapping.to_physical(asset)
    }
}

/// Regular files under `root`, skipping hidden and `~`-suffixed entries.
///
/// Unreadable entries are logged and left out of the index.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!("Skipping unreadable entry under {}: {e}", root.display()))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name.ends_with('~'))
}

fn is_meta(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == META_EXTENSION)
}

/// Full content of `path` when it is a text-serialized asset.
fn read_yaml(path: &Path) -> Option<Vec<u8>> {
    let mut file = File::open(path)
        .map_err(|e| warn!("Could not open {}: {e}", path.display()))
        .ok()?;

    let mut header = [0u8; YAML_HEADER.len()];
    file.read_exact(&mut header).ok()?;
    if header != YAML_HEADER {
        return None;
    }

    let mut content = header.to_vec();
    file.read_to_end(&mut content)
        .map_err(|e| warn!("Could not read {}: {e}", path.display()))
        .ok()?;

    Some(content)
}

#[cfg(test)]
pub mod fixture {
    use std::path::Path;

    /// Writes `rel` under `project` plus its `.meta` side file carrying `guid`.
    pub fn write_asset(project: &Path, rel: &str, guid: &str, content: &[u8]) {
        let path = project.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        std::fs::write(
            project.join(format!("{rel}.meta")),
            format!(
                "fileFormatVersion: 2\nguid: {guid}\nNativeFormatImporter:\n  mainObjectFileID: 0\n"
            ),
        )
        .unwrap();
    }

    /// A YAML asset body referencing every GUID in `references`.
    pub fn yaml_referencing(references: &[&str]) -> Vec<u8> {
        let mut body = String::from(
            "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!21 &2100000\nMaterial:\n",
        );
        for guid in references {
            body.push_str(&format!("  - m_Texture: {{fileID: 2800000, guid: {guid}, type: 3}}\n"));
        }
        body.into_bytes()
    }

    pub const HERO: &str = "0000000000000000000000000000a001";
    pub const WOOD_MAT: &str = "0000000000000000000000000000a002";
    pub const WOOD_PNG: &str = "0000000000000000000000000000a003";
    pub const CUP: &str = "0000000000000000000000000000a004";
    pub const SETTINGS: &str = "0000000000000000000000000000a005";

    /// hero.prefab -> wood.mat -> wood.png, plus Props/Small/cup.prefab -> wood.png.
    pub fn sample_project(project: &Path) {
        write_asset(project, "Assets/hero.prefab", HERO, &yaml_referencing(&[WOOD_MAT]));
        write_asset(project, "Assets/Shared/wood.mat", WOOD_MAT, &yaml_referencing(&[WOOD_PNG]));
        write_asset(project, "Assets/Shared/wood.png", WOOD_PNG, &[0x89; 4096]);
        write_asset(project, "Assets/Props/Small/cup.prefab", CUP, &yaml_referencing(&[WOOD_PNG]));
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::fixture::*;
    use super::*;
    use crate::cli::UnrootedPolicy;
    use crate::sizer::compute_total_size;

    fn open(project: &Path) -> ProjectAssetGraph {
        let mapping = PathMapping::new(project, "Assets", UnrootedPolicy::Reject).unwrap();
        ProjectAssetGraph::open(mapping, &ProgressBar::hidden()).unwrap()
    }

    fn asset(identifier: &str) -> AssetRef {
        AssetRef::new(identifier).unwrap()
    }

    #[test]
    fn indexes_guids_from_meta_files() {
        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        let graph = open(dir.path());

        assert_eq!(graph.guid_of(&asset("Assets/Shared/wood.png")), Some(WOOD_PNG));
        assert_eq!(
            graph.asset_for_guid(&HERO.to_uppercase()),
            Some(&asset("Assets/hero.prefab"))
        );
    }

    #[test]
    fn dependencies_are_transitive_and_include_self() {
        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        let graph = open(dir.path());

        assert_eq!(
            graph.dependencies(&asset("Assets/hero.prefab")),
            vec![
                asset("Assets/hero.prefab"),
                asset("Assets/Shared/wood.mat"),
                asset("Assets/Shared/wood.png"),
            ]
        );
        assert_eq!(
            graph.dependencies(&asset("Assets/Shared/wood.png")),
            vec![asset("Assets/Shared/wood.png")]
        );
    }

    #[test]
    fn reference_cycles_terminate() {
        let dir = tempfile::tempdir().unwrap();
        let a = "00000000000000000000000000000b01";
        let b = "00000000000000000000000000000b02";
        write_asset(dir.path(), "Assets/a.asset", a, &yaml_referencing(&[b]));
        write_asset(dir.path(), "Assets/b.asset", b, &yaml_referencing(&[a, a]));
        let graph = open(dir.path());

        assert_eq!(
            graph.dependencies(&asset("Assets/b.asset")),
            vec![asset("Assets/b.asset"), asset("Assets/a.asset")]
        );
    }

    #[test]
    fn unknown_guids_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(
            dir.path(),
            "Assets/orphan.mat",
            WOOD_MAT,
            &yaml_referencing(&["ffffffffffffffffffffffffffffffff"]),
        );
        let graph = open(dir.path());

        assert_eq!(
            graph.dependencies(&asset("Assets/orphan.mat")),
            vec![asset("Assets/orphan.mat")]
        );
    }

    #[test]
    fn members_skip_meta_and_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        std::fs::write(dir.path().join("Assets/Props/.DS_Store"), b"junk").unwrap();
        std::fs::create_dir_all(dir.path().join("Assets/Props/Backup~")).unwrap();
        std::fs::write(dir.path().join("Assets/Props/Backup~/old.prefab"), b"old").unwrap();
        let graph = open(dir.path());

        assert!(graph.is_folder(&asset("Assets/Props")));
        assert!(!graph.is_folder(&asset("Assets/hero.prefab")));
        assert_eq!(
            graph.list_members(&asset("Assets/Props")),
            vec![asset("Assets/Props/Small/cup.prefab")]
        );
    }

    #[test]
    fn sizes_a_project_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        let graph = open(dir.path());

        let on_disk = |rel: &str| std::fs::metadata(dir.path().join(rel)).unwrap().len();
        let hero = on_disk("Assets/hero.prefab");
        let mat = on_disk("Assets/Shared/wood.mat");
        let cup = on_disk("Assets/Props/Small/cup.prefab");

        let result = compute_total_size(
            &graph,
            &[AssetRef::new("Assets/hero.prefab"), AssetRef::new("Assets/Props")],
        );

        assert_eq!(result.bytes, hero + mat + cup + 4096);
        assert_eq!(result.files, 4);
        assert_eq!(result.missing, 0);
    }

    #[test]
    fn deleted_dependency_weighs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        let graph = open(dir.path());
        std::fs::remove_file(dir.path().join("Assets/Shared/wood.png")).unwrap();

        let result = compute_total_size(&graph, &[AssetRef::new("Assets/hero.prefab")]);

        assert_eq!(result.files, 2);
        assert_eq!(result.missing, 1);
    }

    #[test]
    fn packages_resolve_only_with_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let icon = "00000000000000000000000000000c01";
        write_asset(dir.path(), "Packages/com.example.ui/icon.png", icon, &[1; 10]);
        write_asset(dir.path(), "Assets/menu.prefab", HERO, &yaml_referencing(&[icon]));

        let rejecting = open(dir.path());
        let result = compute_total_size(&rejecting, &[AssetRef::new("Assets/menu.prefab")]);
        assert_eq!(result.missing, 1);

        let mapping = PathMapping::new(dir.path(), "Assets", UnrootedPolicy::Passthrough).unwrap();
        let passing = ProjectAssetGraph::open(mapping, &ProgressBar::hidden()).unwrap();
        let result = compute_total_size(&passing, &[AssetRef::new("Assets/menu.prefab")]);
        assert_eq!(result.missing, 0);
        assert_eq!(result.files, 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        sample_project(dir.path());
        let locked = dir.path().join("Assets/Locked");
        write_asset(
            dir.path(),
            "Assets/Locked/secret.prefab",
            "00000000000000000000000000000d01",
            b"%YAML 1.1\n",
        );
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let mapping = PathMapping::new(dir.path(), "Assets", UnrootedPolicy::Reject).unwrap();
        let opened = ProjectAssetGraph::open(mapping, &ProgressBar::hidden());

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let graph = opened.unwrap();
        assert_eq!(graph.guid_of(&asset("Assets/hero.prefab")), Some(HERO));
        assert_eq!(graph.dependencies(&asset("Assets/hero.prefab")).len(), 3);
    }

    #[test]
    fn missing_logical_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = PathMapping::new(dir.path(), "Assets", UnrootedPolicy::Reject).unwrap();

        assert_matches!(
            ProjectAssetGraph::open(mapping, &ProgressBar::hidden()),
            Err(Error::MissingLogicalRoot { root, .. }) if root == "Assets"
        );
    }
}
