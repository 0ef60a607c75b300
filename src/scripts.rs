//! Catalogue of the provisioning scripts the plan refers to. The script
//! bodies live in the scripts directory and are executed by the external
//! orchestrator, never by this crate.

use std::path::{Path, PathBuf};

pub const PROVISION: &str = "provision.sh";
pub const SERVE: &str = "serve.sh";
pub const SERVE_HHVM: &str = "serve-hhvm.sh";
pub const CREATE_MYSQL: &str = "create-mysql.sh";
pub const CREATE_POSTGRES: &str = "create-postgres.sh";
pub const BLACKFIRE: &str = "blackfire.sh";

/// Resolve a script name against the configured scripts directory.
pub fn path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}
