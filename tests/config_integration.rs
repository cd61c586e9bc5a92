use serial_test::serial;
use std::env;
use std::io::Write;

use stream_chat::Error;
use stream_chat::config::AppConfig;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("CHAT_ENDPOINT__URL");
        env::remove_var("CHAT_UI__TYPING_LABEL");
        env::remove_var("CHAT_LOGGING__JSON");
        env::remove_var("CHAT_API_URL");
        env::remove_var("CONFIG_FILE");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["stream-chat"]).expect("Failed to load config");
    assert_eq!(config.endpoint.url, "http://127.0.0.1:5000/chat");
    assert_eq!(config.ui.typing_label, "Bot is typing...");
    assert_eq!(config.ui.user_label, "You");
    assert_eq!(config.ui.bot_label, "Bot");
    assert!(!config.logging.json);
    assert_eq!(config.logging.filter, "info");
    assert_eq!(
        config.endpoint_url().unwrap().as_str(),
        "http://127.0.0.1:5000/chat"
    );
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_ENDPOINT__URL", "http://chat.internal:8080/chat");
        env::set_var("CHAT_LOGGING__JSON", "true");
    }

    let config = AppConfig::load_from_args(["stream-chat"]).expect("Failed to load config");
    assert_eq!(config.endpoint.url, "http://chat.internal:8080/chat");
    assert!(config.logging.json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    write!(
        file,
        r#"
endpoint:
  url: http://localhost:7070/chat
ui:
  typing_label: "Thinking..."
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let config = AppConfig::load_from_args(["stream-chat", "--config", &path])
        .expect("Failed to load config from file");
    assert_eq!(config.endpoint.url, "http://localhost:7070/chat");
    assert_eq!(config.ui.typing_label, "Thinking...");
    // Unset keys keep their defaults.
    assert_eq!(config.ui.bot_label, "Bot");
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_ENDPOINT__URL", "http://from-env/chat");
        env::set_var("CHAT_UI__TYPING_LABEL", "env label");
    }

    let config = AppConfig::load_from_args([
        "stream-chat",
        "--endpoint",
        "http://from-cli/chat",
        "--typing-label",
        "cli label",
    ])
    .expect("Failed to load config");
    assert_eq!(config.endpoint.url, "http://from-cli/chat");
    assert_eq!(config.ui.typing_label, "cli label");

    clear_env_vars();
}

#[test]
#[serial]
fn test_log_json_flag() {
    clear_env_vars();

    let config =
        AppConfig::load_from_args(["stream-chat", "--log-json"]).expect("Failed to load config");
    assert!(config.logging.json);

    unsafe {
        env::set_var("CHAT_LOGGING__JSON", "true");
    }
    let config = AppConfig::load_from_args(["stream-chat", "--log-json", "false"])
        .expect("Failed to load config");
    assert!(!config.logging.json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_endpoint_is_rejected() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["stream-chat", "--endpoint", "not a url"]);
    assert!(matches!(result, Err(Error::InvalidUrl(_))));
}

#[test]
#[serial]
fn test_missing_config_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["stream-chat", "--config", "/nonexistent/chat.yaml"]);
    assert!(matches!(result, Err(Error::Config(_))));
}
