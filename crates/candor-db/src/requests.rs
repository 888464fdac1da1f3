use anyhow::Result;
use rusqlite::{Connection, Row, params};

use candor_types::models::{FeedbackRequest, RequestStatus};

use crate::OptionalExt;
use crate::models::{parse_enum, parse_timestamp};

fn map_request(row: &Row<'_>) -> rusqlite::Result<FeedbackRequest> {
    Ok(FeedbackRequest {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        status: parse_enum(2, row.get(2)?)?,
        created_at: parse_timestamp(3, row.get(3)?)?,
    })
}

pub fn insert_request(conn: &Connection, employee_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO feedback_requests (employee_id, status) VALUES (?1, ?2)",
        params![employee_id, RequestStatus::Pending.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn request_by_id(conn: &Connection, id: i64) -> Result<Option<FeedbackRequest>> {
    conn.query_row(
        "SELECT id, employee_id, status, created_at FROM feedback_requests WHERE id = ?1",
        [id],
        map_request,
    )
    .optional()
}

pub fn requests_by_employee(
    conn: &Connection,
    employee_id: i64,
    skip: u32,
    limit: u32,
) -> Result<Vec<FeedbackRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_id, status, created_at
         FROM feedback_requests
         WHERE employee_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![employee_id, limit, skip], map_request)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Requests raised by the direct reports of `manager_id`.
pub fn requests_for_manager(
    conn: &Connection,
    manager_id: i64,
    skip: u32,
    limit: u32,
) -> Result<Vec<FeedbackRequest>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.employee_id, r.status, r.created_at
         FROM feedback_requests r
         JOIN users u ON u.id = r.employee_id
         WHERE u.manager_id = ?1
         ORDER BY r.created_at DESC, r.id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![manager_id, limit, skip], map_request)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Move a pending request raised by `employee_id` to completed.
///
/// The status check is part of the UPDATE, so a request completes at most
/// once even when two submissions cite it concurrently. Returns false when
/// the request is absent, belongs to someone else, or is already completed.
pub fn complete_pending(conn: &Connection, request_id: i64, employee_id: i64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE feedback_requests SET status = ?3
         WHERE id = ?1 AND employee_id = ?2 AND status = ?4",
        params![
            request_id,
            employee_id,
            RequestStatus::Completed.as_str(),
            RequestStatus::Pending.as_str()
        ],
    )?;
    Ok(updated == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::users::tests::add_user;
    use candor_types::models::Role;

    #[test]
    fn completes_only_once_and_only_for_owner() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let m = add_user(conn, "m@x.io", Role::Manager, None);
            let e = add_user(conn, "e@x.io", Role::Employee, Some(m));
            let other = add_user(conn, "o@x.io", Role::Employee, Some(m));
            let id = insert_request(conn, e)?;

            assert!(!complete_pending(conn, id, other)?);
            assert!(complete_pending(conn, id, e)?);
            assert!(!complete_pending(conn, id, e)?);
            assert_eq!(request_by_id(conn, id)?.unwrap().status, RequestStatus::Completed);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn manager_sees_requests_from_reports() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let m1 = add_user(conn, "m1@x.io", Role::Manager, None);
            let m2 = add_user(conn, "m2@x.io", Role::Manager, None);
            let e1 = add_user(conn, "e1@x.io", Role::Employee, Some(m1));
            let e2 = add_user(conn, "e2@x.io", Role::Employee, Some(m2));
            insert_request(conn, e1)?;
            insert_request(conn, e2)?;
            insert_request(conn, e1)?;

            let seen = requests_for_manager(conn, m1, 0, 100)?;
            assert_eq!(seen.len(), 2);
            assert!(seen.iter().all(|r| r.employee_id == e1));
            assert_eq!(requests_by_employee(conn, e2, 0, 100)?.len(), 1);
            Ok(())
        })
        .unwrap();
    }
}
