use candle_core::Device;
use tracing::{info, warn};

use super::error::EmbeddingError;

/// Env var overriding device selection (`auto`, `cpu`, `cuda`, `cuda:N`, `metal`).
pub const ENV_DEVICE: &str = "DUET_DEVICE";

/// Selects the compute device.
///
/// With `DUET_DEVICE` unset (or `auto`) the first GPU backend compiled in is tried,
/// falling back to CPU. An explicit GPU choice that cannot be opened is an error.
pub fn select_device() -> Result<Device, EmbeddingError> {
    let preference = std::env::var(ENV_DEVICE)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "auto".to_string());

    match preference.as_str() {
        "auto" => Ok(auto_device()),
        "cpu" => {
            info!("CPU device forced by {}", ENV_DEVICE);
            Ok(Device::Cpu)
        }
        "metal" => Device::new_metal(0).map_err(|e| EmbeddingError::DeviceUnavailable {
            device: "metal".to_string(),
            reason: e.to_string(),
        }),
        other => {
            let ordinal = parse_cuda_ordinal(other).ok_or_else(|| EmbeddingError::InvalidConfig {
                reason: format!("unknown {ENV_DEVICE} value '{other}'"),
            })?;
            Device::new_cuda(ordinal).map_err(|e| EmbeddingError::DeviceUnavailable {
                device: format!("cuda:{ordinal}"),
                reason: e.to_string(),
            })
        }
    }
}

fn parse_cuda_ordinal(value: &str) -> Option<usize> {
    match value.strip_prefix("cuda") {
        Some("") => Some(0),
        Some(rest) => rest.strip_prefix(':')?.parse().ok(),
        None => None,
    }
}

fn auto_device() -> Device {
    let mut failures: Vec<String> = Vec::new();

    if cfg!(feature = "cuda") {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU acceleration");
                return device;
            }
            Err(e) => {
                warn!(error = %e, "CUDA device unavailable");
                failures.push(format!("cuda failed: {e}"));
            }
        }
    }

    if cfg!(feature = "metal") {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU acceleration");
                return device;
            }
            Err(e) => {
                warn!(error = %e, "Metal device unavailable");
                failures.push(format!("metal failed: {e}"));
            }
        }
    }

    let reason = if !cfg!(any(feature = "metal", feature = "cuda")) {
        "no GPU backend compiled".to_string()
    } else {
        failures.join("; ")
    };

    warn!(reason = %reason, "Falling back to CPU device");
    Device::Cpu
}

/// Short device name reported by `/healthz`.
pub fn device_label(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}
