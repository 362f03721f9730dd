use std::collections::BTreeSet;

use indicatif::ProgressBar;
use log::{debug, trace};

use crate::asset_ref::AssetRef;
use crate::graph::AssetGraph;
use crate::utils::SizeResult;

pub type DependencySet = BTreeSet<AssetRef>;

/// Total byte size of the unique dependency closure of `roots`.
///
/// `None` roots are skipped. Folder roots contribute the closures of every
/// asset under them but never weigh anything themselves.
pub fn compute_total_size<G>(graph: &G, roots: &[Option<AssetRef>]) -> SizeResult
where
    G: AssetGraph + ?Sized,
{
    compute_total_size_with_progress(graph, roots, &ProgressBar::hidden())
}

pub fn compute_total_size_with_progress<G>(
    graph: &G,
    roots: &[Option<AssetRef>],
    progress_bar: &ProgressBar,
) -> SizeResult
where
    G: AssetGraph + ?Sized,
{
    let seen = collect_dependencies(graph, roots);
    progress_bar.set_length(seen.len() as u64);

    let mut result = SizeResult::default();

    for dependency in &seen {
        progress_bar.set_message(dependency.to_string());

        match graph
            .resolve_physical_path(dependency)
            .and_then(|path| graph.file_size(&path))
        {
            Some(size) => {
                trace!("{dependency}: {size} bytes");
                result.bytes += size;
                result.files += 1;
            }
            None => {
                debug!("{dependency} has no backing file");
                result.missing += 1;
            }
        }

        progress_bar.inc(1);
    }

    progress_bar.finish_and_clear();

    result
}

/// Deduplicated union of the dependency closures of `roots`.
pub fn collect_dependencies<G>(graph: &G, roots: &[Option<AssetRef>]) -> DependencySet
where
    G: AssetGraph + ?Sized,
{
    let mut seen = DependencySet::new();

    for root in roots.iter().flatten() {
        if graph.is_folder(root) {
            let members = graph.list_members(root);
            debug!("Folder {root} has {} members", members.len());

            for member in &members {
                seen.extend(graph.dependencies(member));
            }
        } else {
            seen.extend(graph.dependencies(root));
        }
    }

    seen
}
