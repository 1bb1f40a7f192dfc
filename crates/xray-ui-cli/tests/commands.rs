use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

use xray_ui_core::{FileStore, PanelStore};

/// Runs the binary against a database folder of its own.
fn xray_ui(db_folder: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_xray-ui"));
    cmd.env_remove("XRAY_UI_CONFIG")
        .env_remove("XRAY_UI_LOG_LEVEL")
        .env_remove("XRAY_UI_DEBUG")
        .env("XRAY_UI_DB_FOLDER", db_folder)
        .env("XRAY_UI_BIN_FOLDER", db_folder.join("bin"));
    cmd
}

fn open_db(db_folder: &Path) -> FileStore {
    FileStore::open(db_folder.join("xray-ui.json")).expect("open db")
}

#[test]
fn version_flag_prints_version() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .arg("-v")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_prints_usage_without_storage() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .arg("upgrade")
        .assert()
        .success()
        .stdout(
            contains("run")
                .and(contains("v2-ui"))
                .and(contains("setting"))
                .and(contains("geoip")),
        );

    assert!(!home.path().join("xray-ui.json").exists());
}

#[test]
fn setting_show_prints_defaults() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .args(["setting", "-show"])
        .assert()
        .success()
        .stdout(
            contains("username: admin")
                .and(contains("port: 54321"))
                .and(contains("path: /")),
        );
}

#[test]
fn setting_port_and_username_keeps_password() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .args(["setting", "-port", "8443", "-username", "root"])
        .assert()
        .success()
        .stdout(contains("set port 8443 success"));

    let store = open_db(home.path());
    assert_eq!(store.port().unwrap(), 8443);
    let user = store.first_user().unwrap();
    assert_eq!(user.username, "root");
    assert_eq!(user.password, "admin");
}

#[test]
fn setting_reset_restores_defaults() {
    let home = TempDir::new().expect("home");
    {
        let mut store = open_db(home.path());
        store.set_port(9000).unwrap();
        store.set_base_path("/secret/").unwrap();
    }

    xray_ui(home.path())
        .args(["setting", "--reset", "--port", "1234"])
        .assert()
        .success()
        .stdout(contains("reset setting success"));

    let store = open_db(home.path());
    assert_eq!(store.port().unwrap(), 54321);
    assert_eq!(store.base_path().unwrap(), "/");
}

#[test]
fn legacy_bot_flags_are_accepted() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .args([
            "setting",
            "-tgbottoken",
            "123:abc",
            "-tgbotchatid",
            "42",
            "-enabletgbot",
        ])
        .assert()
        .success();

    let settings = open_db(home.path()).settings().unwrap();
    assert_eq!(settings.tgbot_token, "123:abc");
    assert_eq!(settings.tgbot_chat_id, 42);
    assert!(settings.tgbot_enabled);
}

#[test]
fn zero_port_leaves_port_and_still_shows() {
    let home = TempDir::new().expect("home");
    open_db(home.path()).set_port(9000).unwrap();

    xray_ui(home.path())
        .args(["setting", "-port", "0", "-show"])
        .assert()
        .success()
        .stdout(contains("port: 9000").and(contains("set port").not()));

    assert_eq!(open_db(home.path()).port().unwrap(), 9000);
}

#[test]
fn password_may_start_with_dash() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .args(["setting", "-password", "-s3cret"])
        .assert()
        .success();

    let user = open_db(home.path()).first_user().unwrap();
    assert_eq!(user.username, "admin");
    assert_eq!(user.password, "-s3cret");
}

#[test]
fn missing_v2ui_database_fails() {
    let home = TempDir::new().expect("home");
    let missing = home.path().join("v2-ui.db");
    xray_ui(home.path())
        .args(["v2-ui", "-db"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn unknown_log_level_is_fatal_for_run() {
    let home = TempDir::new().expect("home");
    xray_ui(home.path())
        .env("XRAY_UI_LOG_LEVEL", "verbose")
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("unknown log level"));
}

#[test]
fn start_failure_is_logged_once() {
    let home = TempDir::new().expect("home");
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = taken.local_addr().expect("addr").port();
    {
        let mut store = open_db(home.path());
        store.set_listen("127.0.0.1").unwrap();
        store.set_port(port).unwrap();
    }

    let output = xray_ui(home.path())
        .env_remove("RUST_LOG")
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("failed to bind"))
        .get_output()
        .clone();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Failed to start panel").count(), 1);
}
