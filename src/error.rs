use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("Logical root {root:?} has no folder at {path}")]
    MissingLogicalRoot { root: String, path: PathBuf },

    #[error("Invalid logical root: {0:?}")]
    InvalidLogicalRoot(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to create progress bar: {0}")]
    Progress(#[from] indicatif::style::TemplateError),
}

pub type Result<T> = std::result::Result<T, Error>;
