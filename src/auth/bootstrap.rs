use anyhow::Context;
use chrono::Utc;
use sea_orm::Set;

use super::password::hash_password;
use crate::{
    config::AuthConfig,
    db::dao::DaoBase,
    db::entities::{role, user},
    services::{ServiceContext, context::commit},
    validation::normalize_email,
};

pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

/// Creates the configured admin account with a manage-all role on first
/// start. Does nothing once the account exists.
pub async fn seed_admin(services: &ServiceContext, cfg: &AuthConfig) -> anyhow::Result<()> {
    let daos = services.daos();
    let email = normalize_email(&cfg.admin_email);
    if let Some(existing) = daos.user().find_by_email(&email).await? {
        tracing::info!(user_id = %existing.id, "admin user already present");
        return Ok(());
    }

    let hash = hash_password(&cfg.admin_password).context("hashing admin password")?;
    let existing_role = daos.role().find_by_name(SUPER_ADMIN_ROLE).await?;

    let txn = services.begin().await.context("starting admin seed")?;
    let role = match existing_role {
        Some(role) => role,
        None => daos
            .role()
            .create_on(
                &txn,
                role::ActiveModel {
                    name: Set(SUPER_ADMIN_ROLE.to_string()),
                    is_manage_all: Set(true),
                    guard_name: Set(None),
                    ..Default::default()
                },
            )
            .await
            .context("creating super admin role")?,
    };
    let admin = daos
        .user()
        .create_on(
            &txn,
            user::ActiveModel {
                name: Set(cfg.admin_name.clone()),
                email: Set(email),
                password_hash: Set(Some(hash)),
                email_verified_at: Set(Some(Utc::now().fixed_offset())),
                status: Set(true),
                ..Default::default()
            },
        )
        .await
        .context("creating admin user")?;
    daos.assignment()
        .replace_on(&txn, admin.id, role.id)
        .await
        .context("assigning super admin role")?;
    commit(txn).await.context("committing admin seed")?;

    tracing::info!(user_id = %admin.id, role_id = %role.id, "seeded admin user");
    Ok(())
}
