use anyhow::Result;
use rusqlite::{Connection, Row, params};

use candor_types::api::ProfileChanges;
use candor_types::models::{Role, User};

use crate::models::{NewUserRow, UserRow, parse_enum};
use crate::{Database, OptionalExt};

const USER_COLUMNS: &str =
    "id, email, full_name, hashed_password, role, is_active, manager_id";

impl Database {
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_id(conn, id))
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        hashed_password: row.get(3)?,
        role: parse_enum(4, row.get(4)?)?,
        is_active: row.get(5)?,
        manager_id: row.get(6)?,
    })
}

fn collect_users(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(args, map_user)?
        .map(|r| r.map(UserRow::into_user))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_user(conn: &Connection, user: &NewUserRow<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (email, full_name, hashed_password, role, manager_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.email,
            user.full_name,
            user.hashed_password,
            user.role.as_str(),
            user.manager_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        map_user,
    )
    .optional()
}

pub fn user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        [email],
        map_user,
    )
    .optional()
}

/// Direct reports of `manager_id`, ordered by id.
pub fn employees_of(conn: &Connection, manager_id: i64, skip: u32, limit: u32) -> Result<Vec<User>> {
    collect_users(
        conn,
        &format!(
            "SELECT {USER_COLUMNS} FROM users WHERE manager_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"
        ),
        params![manager_id, limit, skip],
    )
}

pub fn count_employees_of(conn: &Connection, manager_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM users WHERE manager_id = ?1",
        [manager_id],
        |row| row.get(0),
    )?)
}

pub fn managers(conn: &Connection, skip: u32, limit: u32) -> Result<Vec<User>> {
    collect_users(
        conn,
        &format!("SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"),
        params![Role::Manager.as_str(), limit, skip],
    )
}

/// Everyone who has ever occupied the giver slot on feedback received by
/// `receiver_id`.
pub fn feedback_givers_to(conn: &Connection, receiver_id: i64) -> Result<Vec<User>> {
    collect_users(
        conn,
        "SELECT u.id, u.email, u.full_name, u.hashed_password, u.role, u.is_active, u.manager_id
         FROM users u
         WHERE u.id IN (SELECT DISTINCT manager_id FROM feedback WHERE employee_id = ?1)
         ORDER BY u.id",
        [receiver_id],
    )
}

pub fn has_given_feedback(conn: &Connection, giver_id: i64, receiver_id: i64) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM feedback WHERE manager_id = ?1 AND employee_id = ?2)",
        [giver_id, receiver_id],
        |row| row.get(0),
    )?)
}

pub fn update_profile(conn: &Connection, id: i64, changes: &ProfileChanges) -> Result<()> {
    conn.execute(
        "UPDATE users SET
            email = COALESCE(?2, email),
            full_name = COALESCE(?3, full_name),
            hashed_password = COALESCE(?4, hashed_password)
         WHERE id = ?1",
        params![id, changes.email, changes.full_name, changes.password_hash],
    )?;
    Ok(())
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}
