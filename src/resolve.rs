//! Driver resolution.
//!
//! Each channel section may name several engine sections; resolution walks
//! the fixed candidate order and binds the channel to the first driver
//! whose section is present. This is a first-match policy: later sections
//! are ignored entirely, they are never parsed or validated.
//!
//! A section that is present but malformed fails resolution for the whole
//! channel instead of being skipped. Silently falling through to the next
//! candidate would make a typo in the intended driver's section look like
//! "not configured" and bind the channel to a different engine.

use crate::config::EngineConfig;
use crate::driver::{DRIVER_ORDER, Driver};
use crate::error::{ChannelError, ChannelResult};
use std::collections::BTreeMap;

/// Pick the engine configuration for a channel.
///
/// Returns `Ok(None)` when no candidate driver has a section, in which
/// case the channel contributes nothing to the registry.
pub fn resolve_engine(
    channel: &str,
    engines: &BTreeMap<String, serde_json::Value>,
) -> ChannelResult<Option<(Driver, EngineConfig)>> {
    for driver in DRIVER_ORDER {
        let Some(raw) = engines.get(driver.as_str()) else {
            continue;
        };
        let engine = EngineConfig::from_value(driver, raw.clone())
            .map_err(|e| ChannelError::configuration(channel, driver, e.to_string()))?;
        return Ok(Some((driver, engine)));
    }
    Ok(None)
}
