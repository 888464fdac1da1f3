use std::collections::BTreeMap;

use anyhow::anyhow;
use tracing::{debug, info};

use candor_db::models::{NewUserRow, UserRow};
use candor_db::{Connection, users};
use candor_types::api::{Page, ProfileChanges, RegisterRequest};
use candor_types::models::{Role, User};

use crate::Tracker;
use crate::authz;
use crate::error::{CoreError, Result};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(CoreError::validation("Invalid email address"))
    }
}

fn validate_full_name(full_name: &str) -> Result<()> {
    if full_name.trim().is_empty() {
        return Err(CoreError::validation("Full name must not be empty"));
    }
    Ok(())
}

fn ensure_email_free(conn: &Connection, email: &str) -> Result<()> {
    if users::user_by_email(conn, email)?.is_some() {
        return Err(CoreError::validation("Email already registered"));
    }
    Ok(())
}

fn load_user(conn: &Connection, id: i64) -> Result<User> {
    users::user_by_id(conn, id)?
        .map(UserRow::into_user)
        .ok_or_else(|| CoreError::not_found("User not found"))
}

impl Tracker {
    /// Create an account. The password has already been checked with
    /// [`validate_password`] and hashed by the caller.
    pub fn register(&self, req: &RegisterRequest, hashed_password: &str) -> Result<User> {
        validate_email(&req.email)?;
        validate_full_name(&req.full_name)?;

        let user = self.db.transaction(|tx| {
            ensure_email_free(tx, &req.email)?;

            // Only a MANAGER may sit above another user.
            if let Some(manager_id) = req.manager_id {
                let is_manager = users::user_by_id(tx, manager_id)?
                    .is_some_and(|m| m.role == Role::Manager);
                if !is_manager {
                    return Err(CoreError::validation("Invalid manager ID"));
                }
            }

            let id = users::insert_user(
                tx,
                &NewUserRow {
                    email: &req.email,
                    full_name: req.full_name.trim(),
                    hashed_password,
                    role: req.role,
                    manager_id: req.manager_id,
                },
            )?;
            load_user(tx, id)
        })?;

        info!(user = user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Resolve a token subject to an active account.
    pub fn actor_by_email(&self, email: &str) -> Result<User> {
        let user = self
            .db
            .get_user_by_email(email)?
            .map(UserRow::into_user)
            .ok_or(CoreError::Unauthenticated)?;

        if !user.is_active {
            return Err(CoreError::validation("Inactive user"));
        }
        Ok(user)
    }

    pub fn update_profile(&self, actor: &User, changes: ProfileChanges) -> Result<User> {
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if let Some(full_name) = &changes.full_name {
            validate_full_name(full_name)?;
        }

        self.db.transaction(|tx| {
            if let Some(email) = changes.email.as_deref().filter(|e| *e != actor.email) {
                ensure_email_free(tx, email)?;
            }
            users::update_profile(tx, actor.id, &changes)?;
            load_user(tx, actor.id)
        })
    }

    pub fn list_managers(&self, page: Page) -> Result<Vec<User>> {
        Ok(self
            .db
            .with_conn(|conn| users::managers(conn, page.skip, page.clamped_limit()))?)
    }

    /// Users the actor is allowed to see.
    ///
    /// Managers get their direct reports. Employees get themselves, their
    /// manager and everyone who has given them feedback.
    pub fn visible_users(&self, actor: &User, page: Page) -> Result<Vec<User>> {
        match actor.role {
            Role::Manager => Ok(self.db.with_conn(|conn| {
                users::employees_of(conn, actor.id, page.skip, page.clamped_limit())
            })?),
            Role::Employee => {
                let found = self.db.with_conn(|conn| {
                    let mut found = BTreeMap::new();
                    found.insert(actor.id, actor.clone());
                    if let Some(manager_id) = actor.manager_id {
                        let manager = users::user_by_id(conn, manager_id)?
                            .ok_or_else(|| anyhow!("manager {manager_id} of user {} missing", actor.id))?;
                        found.insert(manager_id, manager.into_user());
                    }
                    for giver in users::feedback_givers_to(conn, actor.id)? {
                        found.entry(giver.id).or_insert(giver);
                    }
                    Ok(found)
                })?;

                Ok(found
                    .into_values()
                    .skip(page.skip as usize)
                    .take(page.clamped_limit() as usize)
                    .collect())
            }
        }
    }

    pub fn get_user(&self, actor: &User, user_id: i64) -> Result<User> {
        let (target, gave_feedback) = self.db.with_conn(|conn| {
            let target = users::user_by_id(conn, user_id)?.map(UserRow::into_user);
            let gave = users::has_given_feedback(conn, user_id, actor.id)?;
            Ok((target, gave))
        })?;

        let target = target.ok_or_else(|| CoreError::not_found("User not found"))?;
        authz::authorize_user_view(actor, &target, gave_feedback)?;
        debug!(actor = actor.id, target = target.id, "user view allowed");
        Ok(target)
    }
}
