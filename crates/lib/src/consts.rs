//! Shared constants.

/// Length of the truncated hex digest used for node fingerprints.
pub const FINGERPRINT_LEN: usize = 20;

/// Application styles live under this directory of the input tree.
pub const APP_STYLES_DIR: &str = "app/styles";

/// Add-on styles are collected from this directory of the input tree.
pub const ADDON_TREE_DIR: &str = "addon-tree-output";

/// Sub-target used when the app output is a single path.
pub const DEFAULT_SUB_TARGET: &str = "app";

/// Separator placed between concatenated fragments.
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Annotation of the top-level node returned for the styles phase.
pub const PACKAGED_STYLES_ANNOTATION: &str = "Packaged Styles";
