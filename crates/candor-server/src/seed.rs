//! Demo data for an empty database.

use tracing::info;

use candor_api::auth::hash_password;
use candor_core::Tracker;
use candor_db::users;
use candor_types::api::{NewFeedback, RegisterRequest};
use candor_types::models::{Role, Sentiment, User};

const DEMO_PASSWORD: &str = "password";

fn account(
    tracker: &Tracker,
    hash: &str,
    email: &str,
    full_name: &str,
    role: Role,
    manager: Option<&User>,
) -> anyhow::Result<User> {
    let req = RegisterRequest {
        email: email.to_string(),
        full_name: full_name.to_string(),
        password: DEMO_PASSWORD.to_string(),
        role,
        manager_id: manager.map(|m| m.id),
    };
    Ok(tracker.register(&req, hash)?)
}

fn review(
    employee: &User,
    content: &str,
    strengths: &str,
    areas_to_improve: &str,
    sentiment: Sentiment,
    is_anonymous: bool,
) -> NewFeedback {
    NewFeedback {
        employee_id: employee.id,
        content: content.to_string(),
        strengths: strengths.to_string(),
        areas_to_improve: areas_to_improve.to_string(),
        sentiment,
        is_anonymous,
        tags: Vec::new(),
        feedback_request_id: None,
    }
}

/// Seed two managers, three employees and three feedback records. Does
/// nothing unless the users table is empty. Returns whether it seeded.
pub fn seed(tracker: &Tracker) -> anyhow::Result<bool> {
    if tracker.db().with_conn(users::count_users)? > 0 {
        info!("Database already has users, skipping seed");
        return Ok(false);
    }

    let hash = hash_password(DEMO_PASSWORD)?;
    let john = account(tracker, &hash, "manager1@example.com", "John Manager", Role::Manager, None)?;
    let sarah = account(tracker, &hash, "manager2@example.com", "Sarah Director", Role::Manager, None)?;
    let alice = account(tracker, &hash, "employee1@example.com", "Alice Employee", Role::Employee, Some(&john))?;
    let bob = account(tracker, &hash, "employee2@example.com", "Bob Worker", Role::Employee, Some(&john))?;
    let charlie = account(tracker, &hash, "employee3@example.com", "Charlie Dev", Role::Employee, Some(&sarah))?;

    let for_alice = tracker.create_feedback(
        &john,
        review(
            &alice,
            "Overall great performer who consistently meets expectations.",
            "Clear communication and thorough documentation.",
            "More confidence when presenting ideas in larger meetings.",
            Sentiment::Positive,
            false,
        ),
    )?;
    tracker.acknowledge_feedback(&alice, for_alice.id)?;

    tracker.create_feedback(
        &john,
        review(
            &bob,
            "Good technical skills but needs to share knowledge more effectively.",
            "Consistently delivers high-quality code.",
            "Pair more often with junior team members.",
            Sentiment::Neutral,
            false,
        ),
    )?;

    let for_charlie = tracker.create_feedback(
        &sarah,
        review(
            &charlie,
            "Delivers on time but code quality needs improvement.",
            "Takes ownership and meets deadlines.",
            "Follow team standards and review PRs before submitting.",
            Sentiment::Negative,
            true,
        ),
    )?;
    tracker.acknowledge_feedback(&charlie, for_charlie.id)?;

    info!("Seeded demo accounts (password: {})", DEMO_PASSWORD);
    Ok(true)
}
