//! Coqui installer library.
//!
//! This crate provides the core functionality for bootstrapping Coqui on a
//! Linux or macOS host: reconciling PHP, Composer and git, fetching the Coqui
//! checkout and publishing its launcher. It is used by the `coqui-installer`
//! CLI binary and can be consumed programmatically for testing.
//!
//! # Modules
//!
//! - [`bin_dir`] - Search-path directory selection for executables
//! - [`cli`] - Command-line argument definitions
//! - [`config_file`] - Create-only default configuration
//! - [`confirm`] - Confirmation prompts and the non-interactive policy
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - HTTP downloads
//! - [`error`] - Semantic error types with recovery hints
//! - [`exec`] - External command execution
//! - [`integrity`] - SHA-384 verification of downloaded installers
//! - [`launcher`] - `coqui` launcher publication
//! - [`output`] - Operator-facing progress output
//! - [`package_manager`] - System package manager adapters
//! - [`pipeline`] - Install stage orchestration
//! - [`platform`] - Host detection
//! - [`privilege`] - Root and `sudo` handling
//! - [`reconcile`] - Dependency probe-and-install state machine
//! - [`repository`] - Cloning and updating the Coqui checkout
//! - [`requirement`] - Declarative dependency requirements
//! - [`run_config`] - Immutable run configuration
//! - [`version`] - `major.minor` version parsing

pub mod bin_dir;
pub mod cli;
pub mod config_file;
pub mod confirm;
pub mod dirs;
pub mod download;
pub mod error;
pub mod exec;
pub mod integrity;
pub mod launcher;
pub mod output;
pub mod package_manager;
pub mod pipeline;
pub mod platform;
pub mod privilege;
pub mod reconcile;
pub mod repository;
pub mod requirement;
pub mod run_config;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod version;
