use std::fmt;

/// Logical identifier of an asset or folder, e.g. `Assets/Textures/hero.png`.
///
/// Always forward-slash separated, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetRef(String);

impl AssetRef {
    /// Normalizes `identifier`; an empty identifier is a null entry.
    pub fn new(identifier: &str) -> Option<AssetRef> {
        let normalized = identifier.replace('\\', "/");
        let normalized = normalized.trim_end_matches('/');

        if normalized.is_empty() {
            return None;
        }

        Some(AssetRef(normalized.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first path segment, i.e. the namespace the identifier lives in.
    pub fn root_segment(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// Everything after the first segment, `None` for a bare root.
    pub fn strip_root(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, rest)| rest)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
