//! The `setting` action: reset, partial updates, show, bot settings.
//!
//! Every field is written on its own. A failing write is reported and the
//! remaining fields are still attempted.

use tracing::{debug, info};

use xray_ui_core::PanelStore;

use super::Report;

/// Panel fields to change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingUpdate {
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub listen: Option<String>,
    pub path: Option<String>,
}

impl SettingUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Notification bot fields to change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotUpdate {
    pub token: Option<String>,
    pub schedule: Option<String>,
    pub chat_id: Option<i64>,
    pub enabled: Option<bool>,
}

impl BotUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything one `setting` invocation asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingPlan {
    /// Restore defaults instead of applying `fields`.
    pub reset: bool,
    pub fields: SettingUpdate,
    pub show: bool,
    pub bot: BotUpdate,
}

/// Runs a whole plan: reset or field updates, then show, then bot updates.
pub fn apply<S: PanelStore>(store: &mut S, plan: &SettingPlan) -> Report {
    let mut report = Report::new();

    if plan.reset {
        if !plan.fields.is_empty() {
            debug!("Reset requested, ignoring individual field flags");
        }
        reset(store, &mut report);
    } else {
        update_settings(store, &plan.fields, &mut report);
    }

    if plan.show {
        show(&*store, &mut report);
    }

    if !plan.bot.is_empty() {
        update_bot(store, &plan.bot, &mut report);
    }

    report
}

/// Restores every panel setting to its default.
pub fn reset<S: PanelStore>(store: &mut S, report: &mut Report) {
    match store.reset_settings() {
        Ok(()) => report.note("reset setting success"),
        Err(e) => report.fail(format!("reset setting failed: {e}")),
    }
}

/// Writes each supplied field in order: port, credentials, listen, path.
pub fn update_settings<S: PanelStore>(
    store: &mut S,
    update: &SettingUpdate,
    report: &mut Report,
) {
    if let Some(port) = update.port {
        match store.set_port(port) {
            Ok(()) => report.note(format!("set port {port} success")),
            Err(e) => report.fail(format!("set port failed: {e}")),
        }
    }

    if update.username.is_some() || update.password.is_some() {
        let username = update.username.as_deref();
        let password = update.password.as_deref();
        match store.update_first_user(username, password) {
            Ok(()) => report.note("set username and password success"),
            Err(e) => report.fail(format!("set username and password failed: {e}")),
        }
    }

    if let Some(listen) = &update.listen {
        match store.set_listen(listen) {
            Ok(()) => report.note(format!("set listen {listen} success")),
            Err(e) => report.fail(format!("set listen failed: {e}")),
        }
    }

    if let Some(path) = &update.path {
        match store.set_base_path(path) {
            Ok(()) => report.note(format!("set path {path} success")),
            Err(e) => report.fail(format!("set path failed: {e}")),
        }
    }
}

/// Reports the current port, base path, login and geo data version.
///
/// Fields that cannot be read are reported and skipped.
pub fn show<S: PanelStore>(store: &S, report: &mut Report) {
    let port = store
        .port()
        .map_err(|e| report.fail(format!("get current port failed: {e}")))
        .ok();
    let path = store
        .base_path()
        .map_err(|e| report.fail(format!("get current path failed: {e}")))
        .ok();
    let user = store
        .first_user()
        .map_err(|e| report.fail(format!("get current user info failed: {e}")))
        .ok();

    if user.as_ref().is_some_and(|u| u.is_incomplete()) {
        report.note("current username or password is empty");
    }

    report.note("Current panel settings:");
    if let Some(user) = user {
        report.note(format!("username: {}", user.username));
        report.note(format!("password: {}", user.password));
    }
    if let Some(port) = port {
        report.note(format!("port: {port}"));
    }
    if let Some(path) = path {
        report.note(format!("path: {path}"));
    }

    match store.geo_version() {
        Ok(Some(version)) => report.note(format!(
            "geo data: {} (updated {})",
            version.tag,
            version.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )),
        Ok(None) => report.note("geo data: not installed"),
        Err(e) => report.fail(format!("get geo data version failed: {e}")),
    }
}

/// Writes bot fields in order: token, schedule, chat id, then the enabled
/// flag if it differs from the stored one.
pub fn update_bot<S: PanelStore>(store: &mut S, update: &BotUpdate, report: &mut Report) {
    if let Some(token) = &update.token {
        match store.set_tgbot_token(token) {
            Ok(()) => report.note("set bot token success"),
            Err(e) => report.fail(format!("set bot token failed: {e}")),
        }
    }

    if let Some(schedule) = &update.schedule {
        match store.set_tgbot_runtime(schedule) {
            Ok(()) => report.note(format!("set bot schedule {schedule} success")),
            Err(e) => report.fail(format!("set bot schedule failed: {e}")),
        }
    }

    if let Some(chat_id) = update.chat_id {
        match store.set_tgbot_chat_id(chat_id) {
            Ok(()) => report.note(format!("set bot chat id {chat_id} success")),
            Err(e) => report.fail(format!("set bot chat id failed: {e}")),
        }
    }

    if let Some(enabled) = update.enabled {
        let current = match store.tgbot_enabled() {
            Ok(current) => current,
            Err(e) => {
                report.fail(format!("get bot status failed: {e}"));
                return;
            }
        };
        info!(current, requested = enabled, "Bot notification status");
        if current == enabled {
            return;
        }
        match store.set_tgbot_enabled(enabled) {
            Ok(()) => report.note(format!("set bot enabled {enabled} success")),
            Err(e) => report.fail(format!("set bot enabled failed: {e}")),
        }
    }
}
