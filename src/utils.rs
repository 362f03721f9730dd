use std::fmt;
use std::path::Path;

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Byte length of the file at `path`, `None` when there is no file there.
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// Scales `bytes` through B, KB, MB and GB and renders at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    // Rounded to the rendered precision, so 1048575 shows as "1 MB".
    while (value * 100.0).round() / 100.0 >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');

    format!("{rendered} {}", UNITS[unit])
}

/// Total size of a dependency set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeResult {
    pub bytes: u64,
    /// Entries that had a backing file.
    pub files: usize,
    /// Entries without a backing file; they weigh nothing.
    pub missing: usize,
}

impl SizeResult {
    pub fn human(&self) -> String {
        format_bytes(self.bytes)
    }
}

impl fmt::Display for SizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.human())
    }
}
