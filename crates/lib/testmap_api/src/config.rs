//! API server configuration.

use std::path::PathBuf;

/// Configuration for the API server, resolved by the server binary from its
/// command line and environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Root of the automated test sources to index.
    pub test_directory: Option<PathBuf>,
    /// Extension of test source files, without the dot.
    pub test_file_extension: String,
    /// JSON array of issue reports for the mapping experiment.
    pub experiment_file: PathBuf,
}
