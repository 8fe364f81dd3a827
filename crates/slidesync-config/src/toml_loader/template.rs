//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# slidesync configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# host = "0.0.0.0"
# port = 3000
# idle_timeout_secs = 60     # 5-3600, silent connections are dropped
# outbound_buffer = 64       # 1-4096 queued messages per connection

[presentation]
# Slide ids that start playing as soon as they become current.
# Single ids ("31") or inclusive ranges ("3-6").
autoplay = ["1", "3-6", "28-29", "31"]

[client]
# url = "ws://127.0.0.1:3000"
# heartbeat_interval_secs = 25   # 1-300, below server.idle_timeout_secs
# connect_timeout_secs = 10      # 1-120
# reconnect_delay_ms = 500       # 10-60000
# max_reconnect_delay_ms = 30000 # >= reconnect_delay_ms, <= 600000

[logging]
# level = "info"   # trace, debug, info, warn, error
"##
}
