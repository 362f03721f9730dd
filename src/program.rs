use std::path::PathBuf;

use indicatif::ProgressBar;
use log::{info, warn};
use rayon::ThreadPoolBuilder;

use crate::addressables::{
    is_addressable_member, AddressableEntry, AddressableRegistry, AddressableSettings,
};
use crate::asset_ref::AssetRef;
use crate::cli::{Cli, Tab};
use crate::error::{Error, Result};
use crate::graph::AssetGraph;
use crate::path_utils::{get_path, PathMapping};
use crate::progress_bar::{create_index_spinner, create_size_bar};
use crate::project::ProjectAssetGraph;
use crate::sizer::compute_total_size_with_progress;
use crate::utils::SizeResult;

/// Outcome of measuring one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: &'static str,
    pub result: SizeResult,
    /// Selected assets left out of the total.
    pub skipped: Vec<AssetRef>,
    /// Addressable entries of the counted assets.
    pub entries: Vec<(AssetRef, AddressableEntry)>,
}

pub fn run(cli: Cli) -> Result<()> {
    ThreadPoolBuilder::new()
        .num_threads(cli.threads.map(|t| t.get()).unwrap_or_else(num_cpus::get))
        .build_global()?;

    let project =
        get_path(&cli.project).map_err(|_| Error::ProjectNotFound(PathBuf::from(&cli.project)))?;
    let mapping = PathMapping::new(project, &cli.logical_root, cli.unrooted)?;

    let spinner = create_index_spinner(!cli.no_progress)?;
    let graph = ProjectAssetGraph::open(mapping, &spinner)?;

    let roots = resolve_roots(&graph, cli.tab.roots());
    let size_bar = create_size_bar(!cli.no_progress)?;
    let report = measure(&graph, &cli.tab, &roots, &size_bar)?;

    for asset in &report.skipped {
        match graph.guid_of(asset) {
            Some(guid) => warn!("{asset} ({guid}) is not an addressable entry, skipping"),
            None => warn!("{asset} is not an addressable entry, skipping"),
        }
    }

    if report.result.missing > 0 {
        info!(
            "{} dependencies had no backing file and were not counted",
            report.result.missing
        );
    }

    println!("{}: {}", report.title, report.result);

    for (asset, entry) in &report.entries {
        println!("  {asset}: {entry}");
    }

    Ok(())
}

/// Sizes `roots` the way the selected tab asks for.
pub fn measure(
    graph: &ProjectAssetGraph,
    tab: &Tab,
    roots: &[Option<AssetRef>],
    progress_bar: &ProgressBar,
) -> Result<Report> {
    match tab {
        Tab::Assets { .. } => Ok(Report {
            title: "Total Asset Size",
            result: compute_total_size_with_progress(graph, roots, progress_bar),
            skipped: Vec::new(),
            entries: Vec::new(),
        }),
        Tab::Addressables { .. } => {
            let settings = AddressableSettings::load(graph)?;
            match &settings {
                None => warn!("No addressable settings found in the project"),
                Some(settings) if settings.is_empty() => {
                    warn!("Addressable settings have no resolvable entries")
                }
                Some(settings) => info!(
                    "{} addressable entries, {} without a project asset",
                    settings.len(),
                    settings.unresolved().len()
                ),
            }

            let (members, skipped): (Vec<&AssetRef>, Vec<&AssetRef>) = roots
                .iter()
                .flatten()
                .partition(|root| is_addressable_member(settings.as_ref(), root));

            let entries = members
                .iter()
                .filter_map(|asset| {
                    let entry = settings.as_ref()?.find_entry(asset)?;
                    Some(((*asset).clone(), entry.clone()))
                })
                .collect();
            let members = members.into_iter().cloned().map(Some).collect::<Vec<_>>();

            Ok(Report {
                title: "Total Addressable Asset Size",
                result: compute_total_size_with_progress(graph, &members, progress_bar),
                skipped: skipped.into_iter().cloned().collect(),
                entries,
            })
        }
    }
}

/// Turns command line arguments into selection entries.
///
/// An argument naming an existing file or folder under the project is
/// translated to its logical identifier. Relative arguments are tried
/// against the current directory, the project directory and the logical
/// root folder, in that order. Anything else is taken as an identifier.
pub fn resolve_roots(graph: &ProjectAssetGraph, args: &[String]) -> Vec<Option<AssetRef>> {
    let mapping = graph.mapping();
    let bases = [
        PathBuf::new(),
        mapping.project_dir().to_path_buf(),
        mapping.physical_root(),
    ];

    args.iter()
        .map(|arg| {
            let root = bases
                .iter()
                .filter(|_| !arg.is_empty())
                .filter_map(|base| base.join(arg).canonicalize().ok())
                .find_map(|path| mapping.to_logical(&path))
                .or_else(|| AssetRef::new(arg));

            if let Some(root) = &root {
                if graph.resolve_physical_path(root).is_none() {
                    warn!(
                        "{root} is outside {}/ and will not be counted",
                        mapping.logical_root()
                    );
                }
            }

            root
        })
        .collect()
}
