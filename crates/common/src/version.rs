use serde::{Deserialize, Serialize};

/// Build metadata captured by `build.rs` at compile time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildInfo {
    pub build_profile: String,
    pub build_target: String,
    pub build_timestamp: String,
    pub version: String,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        build_profile: env!("BUILD_PROFILE").to_string(),
        build_target: env!("BUILD_TARGET").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        version: env!("REPO_VERSION").to_string(),
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}, built {})",
            self.version, self.build_profile, self.build_target, self.build_timestamp
        )
    }
}
