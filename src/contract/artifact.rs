//! Loading deployment artifacts from disk.
//!
//! The deployment step writes two files per contract into one directory:
//! `<Name>-address.json` and `<Name>.json` (the compiler artifact).

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ArtifactConfig;
use crate::contract::descriptor::ContractDescriptor;
use crate::error::{SessionError, SessionResult};

/// Paths of the address file and ABI file for `name` under `dir`.
pub fn artifact_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}-address.json", name)),
        dir.join(format!("{}.json", name)),
    )
}

fn read(path: &Path) -> SessionResult<String> {
    fs::read_to_string(path)
        .map_err(|e| SessionError::Artifact(format!("cannot read {}: {}", path.display(), e)))
}

/// Load the descriptor described by `config`.
pub fn load_descriptor(config: &ArtifactConfig) -> SessionResult<ContractDescriptor> {
    let (address_path, abi_path) = artifact_paths(Path::new(&config.dir), &config.contract_name);
    let descriptor = ContractDescriptor::from_json(&read(&address_path)?, &read(&abi_path)?)?;

    tracing::info!(
        contract = %config.contract_name,
        address = %descriptor.address(),
        functions = descriptor.abi().functions().count(),
        "Contract artifacts loaded"
    );
    Ok(descriptor)
}
