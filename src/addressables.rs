use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::asset_ref::AssetRef;
use crate::error::Result;
use crate::project::ProjectAssetGraph;

const SETTINGS_DIR: &str = "AddressableAssetsData";
const SETTINGS_FILE: &str = "AddressableAssetSettings.asset";
const GROUPS_DIR: &str = "AssetGroups";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressableEntry {
    pub guid: String,
    pub address: String,
    pub group: String,
    pub labels: Vec<String>,
}

impl fmt::Display for AddressableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in {}", self.address, self.group)?;

        if !self.labels.is_empty() {
            write!(f, " [{}]", self.labels.join(", "))?;
        }

        Ok(())
    }
}

/// Catalog of assets registered as addressable entries.
pub trait AddressableRegistry {
    fn find_entry(&self, asset: &AssetRef) -> Option<&AddressableEntry>;
}

/// Whether `asset` has an entry; `false` when no registry is loaded.
pub fn is_addressable_member<R>(registry: Option<&R>, asset: &AssetRef) -> bool
where
    R: AddressableRegistry + ?Sized,
{
    registry.is_some_and(|registry| registry.find_entry(asset).is_some())
}

/// Addressable configuration read from a project's settings folder.
#[derive(Debug, Default)]
pub struct AddressableSettings {
    entries: HashMap<AssetRef, AddressableEntry>,
    unresolved: Vec<AddressableEntry>,
}

impl AddressableSettings {
    pub fn new(
        entries: impl IntoIterator<Item = (AssetRef, AddressableEntry)>,
    ) -> AddressableSettings {
        AddressableSettings {
            entries: entries.into_iter().collect(),
            unresolved: Vec::new(),
        }
    }

    /// `Ok(None)` when the project has no addressable settings asset.
    pub fn load(graph: &ProjectAssetGraph) -> Result<Option<AddressableSettings>> {
        let settings_dir = graph.mapping().physical_root().join(SETTINGS_DIR);

        if !settings_dir.join(SETTINGS_FILE).is_file() {
            debug!("No addressable settings under {}", settings_dir.display());
            return Ok(None);
        }

        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        let groups_dir = settings_dir.join(GROUPS_DIR);

        if groups_dir.is_dir() {
            let parser = GroupParser::new()?;

            let group_files = WalkDir::new(&groups_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| {
                    entry
                        .map_err(|e| warn!("Skipping unreadable group entry: {e}"))
                        .ok()
                })
                .filter(|entry| is_group_file(entry.path()));

            for group_file in group_files {
                let text = match std::fs::read_to_string(group_file.path()) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Skipping group {}: {e}", group_file.path().display());
                        continue;
                    }
                };
                for parsed in parser.parse(&text) {
                    match graph.asset_for_guid(&parsed.guid) {
                        Some(asset) => resolved.push((asset.clone(), parsed)),
                        None => {
                            debug!("Addressable entry {} has no asset in the project", parsed.guid);
                            unresolved.push(parsed);
                        }
                    }
                }
            }
        }

        debug!("Loaded addressable settings from {}", settings_dir.display());

        Ok(Some(AddressableSettings {
            unresolved,
            ..AddressableSettings::new(resolved)
        }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose GUID matches no asset in the project.
    pub fn unresolved(&self) -> &[AddressableEntry] {
        &self.unresolved
    }
}

impl AddressableRegistry for AddressableSettings {
    fn find_entry(&self, asset: &AssetRef) -> Option<&AddressableEntry> {
        self.entries.get(asset)
    }
}

fn is_group_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "asset")
}

/// Line-based reader for the `m_SerializeEntries` list of a group asset.
struct GroupParser {
    group_name: Regex,
    entry_start: Regex,
    address: Regex,
    labels: Regex,
    list_item: Regex,
}

impl GroupParser {
    fn new() -> Result<GroupParser> {
        Ok(GroupParser {
            group_name: Regex::new(r"^\s*m_GroupName:\s*(.*?)\s*$")?,
            entry_start: Regex::new(r"^(\s*)-\s+m_GUID:\s*([0-9a-fA-F]{32})\s*$")?,
            address: Regex::new(r"^\s+m_Address:\s*(.*?)\s*$")?,
            labels: Regex::new(r"^\s+m_SerializedLabels:\s*(.*?)\s*$")?,
            list_item: Regex::new(r"^\s*-\s+(.*?)\s*$")?,
        })
    }

    fn parse(&self, text: &str) -> Vec<AddressableEntry> {
        let mut group = String::new();
        let mut entries = Vec::new();
        let mut current: Option<(usize, AddressableEntry)> = None;
        let mut in_labels = false;

        for line in text.lines() {
            if let Some(captures) = self.entry_start.captures(line) {
                entries.extend(current.take().map(|(_, entry)| entry));
                in_labels = false;
                current = Some((
                    captures[1].len(),
                    AddressableEntry {
                        guid: captures[2].to_ascii_lowercase(),
                        ..AddressableEntry::default()
                    },
                ));
                continue;
            }

            let Some((indent, entry)) = current.as_mut() else {
                if let Some(captures) = self.group_name.captures(line) {
                    group = captures[1].to_owned();
                }
                continue;
            };

            if in_labels {
                if let Some(captures) = self.list_item.captures(line) {
                    entry.labels.push(captures[1].to_owned());
                    continue;
                }
                in_labels = false;
            }

            if let Some(captures) = self.address.captures(line) {
                entry.address = captures[1].to_owned();
            } else if let Some(captures) = self.labels.captures(line) {
                let inline = captures[1].trim_start_matches('[').trim_end_matches(']');
                entry.labels.extend(
                    inline
                        .split(',')
                        .map(str::trim)
                        .filter(|label| !label.is_empty())
                        .map(str::to_owned),
                );
                in_labels = captures[1].is_empty();
            } else if line.len() - line.trim_start().len() <= *indent && !line.trim().is_empty() {
                entries.extend(current.take().map(|(_, entry)| entry));
            }
        }

        entries.extend(current.map(|(_, entry)| entry));

        for entry in &mut entries {
            entry.group.clone_from(&group);
        }

        entries
    }
}
