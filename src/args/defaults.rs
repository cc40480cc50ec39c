/// Config files picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["probe-runner.toml", "probe-runner.json"];

pub(super) const DEFAULT_DURATION: &str = "10s";
pub(super) const DEFAULT_REPORT_INTERVAL: &str = "1s";
pub(super) const DEFAULT_GRACEFUL_TIMEOUT: &str = "5000ms";
/// 64 KiB buffer for the byte-copy probe.
pub(super) const DEFAULT_PAYLOAD_BYTES: &str = "65536";
