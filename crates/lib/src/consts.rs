//! Crate-wide constants.

/// Application name, used for configuration directories.
pub const APP_NAME: &str = "devinit";

/// Name of the manifest file staged and committed in the context directory.
pub const DEVFILE_NAME: &str = "devfile.yaml";

/// Name of the registry configured when no preference file exists.
pub const DEFAULT_REGISTRY_NAME: &str = "DefaultDevfileRegistry";

/// URL of the registry configured when no preference file exists.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.devfile.io";

/// Environment variable overriding the preference file location.
pub const PREFERENCE_ENV: &str = "DEVINIT_PREFERENCE";

/// Maximum length of a component name (DNS-1123 label).
pub const MAX_NAME_LEN: usize = 63;

/// Value reported when a devfile declares neither a project type nor a language.
pub const NOT_AVAILABLE: &str = "Not available";
