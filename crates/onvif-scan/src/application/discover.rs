//! Discovery run and result rendering.

use std::future::Future;
use std::time::Duration;

use onvif_core::discovery::{Discovery, DiscoveryError};
use onvif_core::Device;
use tracing::info;

/// Runs discovery for `duration`, ending early when `stop` resolves.
///
/// Devices come back sorted by service address so repeated runs print in the
/// same order.
///
/// # Errors
///
/// Propagates [`DiscoveryError`] from the engine.
pub async fn discover_devices<F>(
    discovery: &Discovery,
    duration: Duration,
    stop: F,
) -> Result<Vec<Device>, DiscoveryError>
where
    F: Future<Output = ()>,
{
    info!("probing for {} for {duration:?}", discovery.config().probe_types);
    let mut devices = discovery.discover_until(duration, stop).await?;
    devices.sort_by(|a, b| a.service_address().cmp(b.service_address()));
    info!("{} device(s) found", devices.len());
    Ok(devices)
}

/// Plain-text listing, one device per line.
pub fn render_table(devices: &[Device]) -> String {
    if devices.is_empty() {
        return "no devices found\n".to_string();
    }
    let name_width = devices
        .iter()
        .map(|d| d.name().chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let mut out = format!("{:<name_width$}  {:<40}  ID\n", "NAME", "SERVICE ADDRESS");
    for device in devices {
        out.push_str(&format!(
            "{:<name_width$}  {:<40}  {}\n",
            device.name(),
            device.service_address(),
            device.id()
        ));
    }
    out
}

/// JSON array of devices.
///
/// # Errors
///
/// Returns the serializer error; not expected for plain strings.
pub fn render_json(devices: &[Device]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(devices)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
