//! In-app notification endpoints.

use rocket::Route;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::auth::guards::AuthenticatedUser;
use crate::error::{ApiError, ApiResponse};
use crate::models::NotificationWithRequest;
use crate::orm::DbConn;
use crate::orm::notification::{list_for_user, mark_all_read, mark_read, unread_count};

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct UnreadCount {
    pub unread: i64,
}

/// Recent notifications for the caller, newest first. `limit` defaults
/// to 10.
#[get("/notifications?<limit>")]
pub async fn list(
    db: DbConn,
    auth: AuthenticatedUser,
    limit: Option<i64>,
) -> Result<Json<ApiResponse<Vec<NotificationWithRequest>>>, ApiError> {
    let user_id = auth.user.id;
    let listed = db
        .run(move |conn| list_for_user(conn, user_id, limit))
        .await?;
    Ok(ApiResponse::data(listed))
}

#[get("/notifications/unread-count")]
pub async fn unread(
    db: DbConn,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<UnreadCount>>, ApiError> {
    let user_id = auth.user.id;
    let count = db.run(move |conn| unread_count(conn, user_id)).await?;
    Ok(ApiResponse::data(UnreadCount { unread: count }))
}

/// Marks one notification read. Owner-scoped: someone else's notification id
/// is silently ignored.
#[patch("/notifications/<id>/read")]
pub async fn read_one(
    db: DbConn,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = auth.user.id;
    db.run(move |conn| mark_read(conn, id, user_id)).await?;
    Ok(ApiResponse::message("Notification marked as read"))
}

#[patch("/notifications/read-all")]
pub async fn read_all(
    db: DbConn,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = auth.user.id;
    db.run(move |conn| mark_all_read(conn, user_id)).await?;
    Ok(ApiResponse::message("All notifications marked as read"))
}

pub fn routes() -> Vec<Route> {
    routes![list, unread, read_one, read_all]
}
