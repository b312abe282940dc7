//! Layered configuration.
//!
//! Configuration is merged field-by-field from these tiers, lowest first:
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `$CWD/taskdeck/config.yaml`
//! 3. **User** - `~/.taskdeck/config.yaml`
//! 4. **Environment** - variables listed below
//!
//! CLI flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TASKDECK_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `TASKDECK_DB_PATH` - Database path
//! - `TASKDECK_HOST`, `TASKDECK_PORT` - Listen address
//! - `TASKDECK_PROJECT_DELETE_POLICY` - keep, nullify, cascade or restrict
//! - `AI_INTEGRATIONS_OPENAI_API_KEY`, `AI_INTEGRATIONS_OPENAI_BASE_URL` - Assistant endpoint
//! - `TASKDECK_AI_MODEL` - Assistant model
//! - `TASKDECK_USER_DIR`, `TASKDECK_PROJECT_DIR` - Tier directories

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, apply_overrides};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
