use serde::Serialize;

/// Build metadata, fixed at compile time by `build.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Revision")]
    pub revision: String,
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Built By")]
    pub build_user: String,
    #[serde(rename = "Build Date")]
    pub build_date: String,
    #[serde(rename = "Rust Version")]
    pub rust_version: String,
}

impl BuildInfo {
    pub fn from_build_env() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            revision: env!("USER_API_REVISION").to_string(),
            branch: env!("USER_API_BRANCH").to_string(),
            build_user: env!("USER_API_BUILD_USER").to_string(),
            build_date: env!("USER_API_BUILD_DATE").to_string(),
            rust_version: env!("USER_API_RUSTC_VERSION").to_string(),
        }
    }
}
