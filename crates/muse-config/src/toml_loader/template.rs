//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# Muse Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[api]
# api_key = "..."                  # takes precedence over api_key_env
# api_key_env = "GEMINI_API_KEY"
# base_url = "https://generativelanguage.googleapis.com/v1beta"
# connect_timeout_secs = 10        # 1-120
# request_timeout_secs = 300       # 10-3600

[chat]
# default_model = "flash"          # flash | flash-lite | pro
# default_system_instruction = "You are a helpful, knowledgeable assistant. Answer clearly and concisely."
# code_system_instruction = "You are an expert software engineer. ..."
# preserve_partial_on_failure = false

[image]
# model = "imagen-4.0-generate-001"
# aspect_ratio = "1:1"             # 1:1 | 3:4 | 4:3 | 9:16 | 16:9

[video]
# model = "veo-3.0-generate-001"
# aspect_ratio = "16:9"            # 16:9 | 9:16
# poll_interval_secs = 5           # 1-60
# max_polls = 60                   # 1-720

[retry]
# max_retries = 3                  # 0-10, quota errors on one-shot calls only
# base_delay_ms = 2000             # 0-60000, retry n waits n * base_delay_ms

[logging]
# level = "info"                   # trace | debug | info | warn | error
"##
}
