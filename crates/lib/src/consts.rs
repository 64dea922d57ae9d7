/// Application name, used for data/cache directory names.
pub const APP_NAME: &str = "envpin";

/// Default descriptor file name, looked up in the current directory.
pub const DESCRIPTOR_FILENAME: &str = "envpin.lua";

/// Length of the truncated hashes used in store paths.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Default Rust distribution server.
pub const DEFAULT_DIST_SERVER: &str = "https://static.rust-lang.org";

/// Marker file written once a store entry is complete.
pub const COMPLETE_MARKER: &str = ".envpin-complete";

/// Name of the output link created in the project root after a build.
pub const RESULT_LINK: &str = "result";

/// Value of `SOURCE_DATE_EPOCH` for builds: 1980-01-01T00:00:00Z (ZIP epoch).
pub const SOURCE_DATE_EPOCH: &str = "315532800";
