// src/progress.rs

//! Progress reporting for long-running operations
//!
//! The scanner, packer, extractor, and status engine all report through the
//! same narrow interface: `(current, total, message)`. Observers are purely
//! observational - absence means "do not report", and no reference is
//! retained beyond the call that triggered it.
//!
//! Any `Fn(usize, usize, Option<&str>)` closure is an observer, so the CLI
//! can drive an indicatif bar and tests can capture events into a Vec.

/// Observer invoked as work progresses.
///
/// `Sync` because the CPU-bound stages may report from worker threads.
pub trait ProgressObserver: Sync {
    fn update(&self, current: usize, total: usize, message: Option<&str>);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize, Option<&str>) + Sync,
{
    fn update(&self, current: usize, total: usize, message: Option<&str>) {
        self(current, total, message)
    }
}

/// Report to an optional observer.
#[inline]
pub fn emit(
    progress: Option<&dyn ProgressObserver>,
    current: usize,
    total: usize,
    message: Option<&str>,
) {
    if let Some(observer) = progress {
        observer.update(current, total, message);
    }
}

/// Truncate a path for display in a progress message.
///
/// Keeps the trailing 40 characters - the filename end is the informative
/// part - and cuts on a char boundary, since package paths may contain
/// multibyte names.
pub(crate) fn display_path(path: &str) -> &str {
    match path.char_indices().nth_back(39) {
        Some((idx, _)) => &path[idx..],
        None => path,
    }
}
