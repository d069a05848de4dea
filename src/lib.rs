//! Up/Down Maker - main library
//!
//! - **bin_common**: shared helpers for the binaries (CLI, banners, timings)
//! - **maker_engine**: the engine itself (re-exported from the workspace)

pub use maker_engine;

pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, CliArgs, ConfigType};
    pub use runner::{print_banner, print_shutdown, RunConfig};
}
