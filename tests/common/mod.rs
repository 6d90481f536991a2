//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use noet_refs::{
    codec::MdMetadataCodec,
    config::RefConfig,
    provider::MemoryVault,
    scheduler::ManualClock,
    service::ReferenceService,
};
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Build an in-memory vault from `(path, markdown)` pairs, deriving metadata with the markdown
/// codec the way a host would.
#[allow(dead_code)]
pub fn md_vault(files: &[(&str, &str)]) -> Arc<MemoryVault> {
    let codec = MdMetadataCodec::new();
    let vault = MemoryVault::new();
    for (path, text) in files {
        vault.insert(codec.extract(path, text), Some(text.to_string()));
    }
    Arc::new(vault)
}

/// A service over `vault` driven by a manual clock.
#[allow(dead_code)]
pub fn manual_service(
    vault: Arc<MemoryVault>,
    config: RefConfig,
) -> (ReferenceService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let service = ReferenceService::new(config, vault.clone(), vault)
        .unwrap()
        .with_clock(clock.clone());
    (service, clock)
}

/// Write `(relative path, content)` pairs below a fresh `vault/` directory.
#[allow(dead_code)]
pub fn write_vault(temp_dir: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = temp_dir.path().join("vault");
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }
    root
}
