//! Graph algorithms that read through the public element API.

mod path_finder;

pub use path_finder::{FindPathOptions, Path, ProgressCallback};
