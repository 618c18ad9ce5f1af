//! Preference management commands (show, set, init)

use super::HostContext;
use colored::*;
use huff_core::{ConversionEngine, HuffError, PREFERENCE_KEYS, PreferenceStore, Result, StoredPreferences};
use std::path::PathBuf;
use tracing::debug;

/// Print the effective preferences as JSON
pub async fn show_command(config_path: Option<PathBuf>) -> Result<()> {
    let host = HostContext::load(config_path)?;
    let prefs = host.preferences().await?;
    debug!("Preferences read from {}", host.store.path().display());

    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

/// Set one preference key
pub async fn set_command(key: String, value: String, config_path: Option<PathBuf>) -> Result<()> {
    let host = HostContext::load(config_path)?;

    let mut update = StoredPreferences::default();
    if let Err(e) = update.set_key(&key, &value) {
        eprintln!("Known keys: {}", PREFERENCE_KEYS.join(", "));
        return Err(e);
    }
    host.store.set(update).await?;

    println!("{} {} = {}", "Saved".green(), key, value);
    Ok(())
}

/// Seed `customMappings` from the engine's default mapping table
pub async fn init_command(force: bool, config_path: Option<PathBuf>) -> Result<()> {
    let host = HostContext::load(config_path)?;
    let current = host.store.get().await?;

    if !force
        && current
            .custom_mappings
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty())
    {
        println!(
            "{}",
            "Custom mappings already set; use --force to overwrite".yellow()
        );
        return Ok(());
    }

    let mapping = host.engine.default_mapping().await.map_err(|e| {
        HuffError::engine_error(format!("Cannot read the engine's default mapping: {e}"))
    })?;
    host.store
        .set(StoredPreferences {
            custom_mappings: Some(mapping),
            ..Default::default()
        })
        .await?;

    println!(
        "{} custom mappings in {}",
        "Seeded".green(),
        host.store.path().display()
    );
    Ok(())
}
