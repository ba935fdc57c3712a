//! Version information.

/// Package version from Cargo.toml, published as `plugin_info{version}`.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
