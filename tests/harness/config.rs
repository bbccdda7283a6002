use std::io::Write;

use tempfile::NamedTempFile;

/// Smallest config that validates: only the venue URL is required.
pub const MINIMAL: &str = "[venue]\napi_url = \"https://venue.test/api\"\n";

/// A config touching every section.
pub const FULL: &str = r#"
trading_mode = "simulation"

[markets]
allowlist = ["m1", "m2"]
top_n = 5
poll_interval_secs = 2

[venue]
api_url = "https://venue.test/api"
timeout_ms = 8000

[logging]
level = "debug"
format = "json"

[detector]
baseline_window_secs = 900
min_samples = 12
z_threshold = 2.5
cooldown_secs = 60

[strategy]
take_profit_bps = 50
stop_loss_bps = 30
time_stop_min = 5
min_impact_per_volume = 0.004

[sizing]
mode = "fixed"
order_size_default = 20

[risk]
max_position_per_market = 200
max_global_exposure = 1000
max_daily_loss = 75
max_orders_per_minute = 10

[execution]
retry_attempts = 4
retry_backoff_ms = 250

[signer]
backend = "local"

[kill_switch]
file = "/tmp/fadebot-test-kill"

[alerts]
throttle_secs = 5
batch_size = 3
min_level = "warning"
"#;

/// Write `contents` to a temporary `.toml` file that lives as long as the
/// returned handle.
pub fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("fadebot-test-")
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}
