use anyhow::{Result, bail};

use super::{AppConfig, OAuthAppConfig};

const MIN_ADMIN_PASSWORD_LEN: usize = 8;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.general.frontend_url.trim().is_empty() {
        errors.push("general.frontend_url must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.admin_email.trim().is_empty() || !auth.admin_email.contains('@') {
            errors.push("auth.admin_email must be a valid email address".to_string());
        }

        if auth.admin_password.len() < MIN_ADMIN_PASSWORD_LEN {
            errors.push(format!(
                "auth.admin_password must be at least {MIN_ADMIN_PASSWORD_LEN} characters"
            ));
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.access_ttl_secs == 0 {
            errors.push("auth.access_ttl_secs must be > 0".to_string());
        }

        if auth.refresh_ttl_secs <= auth.access_ttl_secs {
            errors.push(
                "auth.refresh_ttl_secs must be greater than auth.access_ttl_secs".to_string(),
            );
        }
    }

    if cfg.mail.from.trim().is_empty() {
        errors.push("mail.from must not be empty".to_string());
    }

    if cfg.mail.queue_capacity == 0 {
        errors.push("mail.queue_capacity must be > 0".to_string());
    }

    if cfg.mail.enqueue_timeout_ms == 0 {
        errors.push("mail.enqueue_timeout_ms must be > 0".to_string());
    }

    let providers = [
        ("google", cfg.oauth.google.as_ref()),
        ("github", cfg.oauth.github.as_ref()),
        ("facebook", cfg.oauth.facebook.as_ref()),
        ("twitter", cfg.oauth.twitter.as_ref()),
        ("linkedin", cfg.oauth.linkedin.as_ref()),
    ];
    for (name, app) in providers {
        if let Some(app) = app {
            validate_oauth_app(name, app, &mut errors);
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

fn validate_oauth_app(name: &str, app: &OAuthAppConfig, errors: &mut Vec<String>) {
    if app.client_id.trim().is_empty() {
        errors.push(format!("oauth.{name}.client_id must not be empty"));
    }
    if app.client_secret.trim().is_empty() {
        errors.push(format!("oauth.{name}.client_secret must not be empty"));
    }
    if !app.callback_url.starts_with("http://") && !app.callback_url.starts_with("https://") {
        errors.push(format!("oauth.{name}.callback_url must be an http(s) URL"));
    }
}
