//! Database operations for in-app notifications.

use chrono::Utc;
use diesel::prelude::*;

use crate::models::{NewNotification, NotificationWithRequest};

/// Inserts one unread notification. No deduplication: two identical events
/// produce two rows.
pub fn notify(
    conn: &mut SqliteConnection,
    recipient_id: i32,
    about_request: Option<i32>,
    notification_kind: &str,
    notification_message: &str,
) -> Result<(), diesel::result::Error> {
    use crate::schema::notifications::dsl::*;

    diesel::insert_into(notifications)
        .values(&NewNotification {
            user_id: recipient_id,
            request_id: about_request,
            kind: notification_kind.to_string(),
            message: notification_message.to_string(),
            read: false,
            created_at: Utc::now().naive_utc(),
        })
        .execute(conn)?;
    Ok(())
}

/// Recent notifications for one user, newest first, with minimal context
/// from the linked request when there is one.
pub fn list_for_user(
    conn: &mut SqliteConnection,
    recipient_id: i32,
    limit: Option<i64>,
) -> Result<Vec<NotificationWithRequest>, diesel::result::Error> {
    use crate::schema::notifications;
    use crate::schema::requests;

    notifications::table
        .left_join(requests::table)
        .filter(notifications::user_id.eq(recipient_id))
        .order(notifications::created_at.desc())
        .limit(limit.unwrap_or(10).clamp(1, 100))
        .select((
            notifications::id,
            notifications::user_id,
            notifications::request_id,
            notifications::kind,
            notifications::message,
            notifications::read,
            notifications::created_at,
            requests::code.nullable(),
            requests::title.nullable(),
            requests::status.nullable(),
        ))
        .load::<NotificationWithRequest>(conn)
}

pub fn unread_count(
    conn: &mut SqliteConnection,
    recipient_id: i32,
) -> Result<i64, diesel::result::Error> {
    use crate::schema::notifications::dsl::*;
    notifications
        .filter(user_id.eq(recipient_id))
        .filter(read.eq(false))
        .count()
        .get_result(conn)
}

/// Marks one notification read. Scoped to the owner: marking someone else's
/// notification, or a missing one, is a silent no-op.
pub fn mark_read(
    conn: &mut SqliteConnection,
    notification_id: i32,
    recipient_id: i32,
) -> Result<(), diesel::result::Error> {
    use crate::schema::notifications::dsl::*;
    diesel::update(
        notifications
            .filter(id.eq(notification_id))
            .filter(user_id.eq(recipient_id)),
    )
    .set(read.eq(true))
    .execute(conn)?;
    Ok(())
}

pub fn mark_all_read(
    conn: &mut SqliteConnection,
    recipient_id: i32,
) -> Result<(), diesel::result::Error> {
    use crate::schema::notifications::dsl::*;
    diesel::update(notifications.filter(user_id.eq(recipient_id)))
        .set(read.eq(true))
        .execute(conn)?;
    Ok(())
}
