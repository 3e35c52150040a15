use std::fs;
use std::io::Write;
use std::path::Path;

use regex::Regex;

use super::MigrateError;

/// `provider.tf` written into every merged directory.
pub const PINNED_PROVIDER: &str = r#"
terraform {
    required_providers {
        datadog = {
            source = "DataDog/datadog"
            version = "= 3.34.0"
        }
    }
}"#;

/// Recursively copies `src` into `dest` (merging into existing
/// directories) and then deletes `src`.
pub fn copy_and_remove(src: &Path, dest: &Path) -> Result<(), MigrateError> {
    tracing::debug!(src = %src.display(), dest = %dest.display(), "copying directory");
    copy_dir_all(src, dest)?;
    tracing::debug!(src = %src.display(), "deleting directory");
    fs::remove_dir_all(src).map_err(MigrateError::io(src))
}

fn copy_dir_all(src: &Path, dest: &Path) -> Result<(), MigrateError> {
    fs::create_dir_all(dest).map_err(MigrateError::io(dest))?;
    for entry in fs::read_dir(src).map_err(MigrateError::io(src))? {
        let entry = entry.map_err(MigrateError::io(src))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry.file_type().map_err(MigrateError::io(&from))?.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(MigrateError::io(&from))?;
        }
    }
    Ok(())
}

/// Appends the `.tf` file at `from` to `to`. Returns `false` when `from`
/// does not exist.
pub fn append_tf(from: &Path, to: &Path) -> Result<bool, MigrateError> {
    if !from.is_file() {
        return Ok(false);
    }
    tracing::info!(from = %from.display(), to = %to.display(), "combining tf files");
    let content = fs::read(from).map_err(MigrateError::io(from))?;
    let mut target = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(to)
        .map_err(MigrateError::io(to))?;
    target.write_all(&content).map_err(MigrateError::io(to))?;
    Ok(true)
}

/// Deletes the top-level `resource "<type>" "<name>" { ... }` block for
/// `address` from a `.tf` file. Returns whether anything was removed.
pub fn remove_resource_block(tf_file: &Path, address: &str) -> Result<bool, MigrateError> {
    let (resource_type, resource_name) = address
        .split_once('.')
        .ok_or_else(|| MigrateError::Address(address.to_string()))?;

    let pattern = format!(
        r#"(?s)resource "{}" "{}" \{{\n .*?\n\}}"#,
        regex::escape(resource_type),
        regex::escape(resource_name)
    );
    let block = Regex::new(&pattern).map_err(|_| MigrateError::Address(address.to_string()))?;

    let content = fs::read_to_string(tf_file).map_err(MigrateError::io(tf_file))?;
    if !block.is_match(&content) {
        return Ok(false);
    }
    tracing::debug!(address, file = %tf_file.display(), "removing resource block");
    let rewritten = block.replace_all(&content, "");
    fs::write(tf_file, rewritten.as_bytes()).map_err(MigrateError::io(tf_file))?;
    Ok(true)
}

pub fn pin_provider(provider_tf: &Path) -> Result<(), MigrateError> {
    fs::write(provider_tf, PINNED_PROVIDER).map_err(MigrateError::io(provider_tf))
}
