use std::path::PathBuf;
use std::time::Duration;

/// 10 MiB, the largest image accepted by default.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_PREDICTOR_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory holding per-request artifacts. Created on first use.
    pub artifact_dir: PathBuf,

    /// Upper bound on the size of an uploaded image, in bytes
    pub max_upload_bytes: usize,

    /// How long a single predictor run may take before it is killed
    pub predictor_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            artifact_dir: std::env::temp_dir().join("verdict-artifacts"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            predictor_timeout: DEFAULT_PREDICTOR_TIMEOUT,
        }
    }
}
