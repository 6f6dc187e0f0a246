//! Archive file path layout
//!
//! Archives live under a fixed venue hierarchy:
//! `<root>/cryptofuture/dydx/margin_interest/<lowercase ticker>.csv`

use std::path::{Path, PathBuf};

/// Relative directory under the data root holding the per-market archives
const ARCHIVE_SUBDIR: [&str; 3] = ["cryptofuture", "dydx", "margin_interest"];

/// Compose the archive path for `ticker` under `root`
///
/// The ticker is lowercased for the file name and sanitized against path
/// traversal: `/`, `\`, `:` become `_` and `..` becomes `__`.
pub fn archive_path(root: &Path, ticker: &str) -> PathBuf {
    let file = format!("{}.csv", sanitize_ticker(ticker).to_lowercase());
    let mut path = root.to_path_buf();
    for part in ARCHIVE_SUBDIR {
        path.push(part);
    }
    path.push(file);
    path
}

/// Sanitize a ticker for filesystem safety
fn sanitize_ticker(name: &str) -> String {
    name.replace("..", "__").replace(['/', '\\', ':'], "_")
}
