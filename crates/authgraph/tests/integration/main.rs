//! Integration tests driving a whole `Graph` through its public API.

mod common;
mod delete_test;
mod graph_test;
mod hidden_test;
mod metadata_test;
mod path_finder_test;
mod streaming_test;
mod update_test;
