//! Card image downloads.
//!
//! [`CardDownloader`] writes a candidate's image to disk and remembers where
//! it put it, so the same card requested again in one session is linked
//! instead of fetched.

mod error;
mod filename;
mod resolver;

pub use error::DownloadError;
pub use filename::{make_safe_path, FilenameFormat, DEFAULT_FILENAME_FORMAT};
pub use resolver::{CardDownloader, DownloadJob, DownloadOutcome};
