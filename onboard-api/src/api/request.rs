//! Approval-request endpoints: submission, editing, resolution, lookups.

use rocket::Route;
use rocket::serde::json::Json;

use crate::auth::guards::AuthenticatedUser;
use crate::error::{ApiError, ApiResponse, PagedResponse};
use crate::models::{
    PublicUser, Request, RequestDetail, RequestInput, RequestStats, RequestType,
    RequestUpdateInput, RequestWithHistory, StatusChangeInput,
};
use crate::orm::DbConn;
use crate::orm::request::{
    RequestListParams, create_request, get_request_with_history, list_requests, request_stats,
    transition_request, update_request,
};
use crate::orm::request_type::list_active;
use crate::orm::user::list_approvers;

/// List Requests endpoint.
///
/// - **URL:** `/api/requests`
/// - **Method:** `GET`
/// - **Authentication:** Bearer token
///
/// Role-scoped: employees see their own submissions, approver roles see
/// requests assigned to them, admins see everything.
#[get("/requests?<status>&<page>&<limit>")]
pub async fn list(
    db: DbConn,
    auth: AuthenticatedUser,
    status: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<PagedResponse<RequestDetail>>, ApiError> {
    let params = RequestListParams { status, page, limit };
    let (rows, pagination) = db
        .run(move |conn| list_requests(conn, &auth.user, &params))
        .await?;
    Ok(PagedResponse::new(rows, pagination))
}

/// Create Request endpoint.
///
/// - **URL:** `/api/requests`
/// - **Method:** `POST`
/// - **Authentication:** Bearer token
///
/// The responsible user must be a manager-capable approver and the type must
/// be an active catalog entry.
#[post("/requests", data = "<input>")]
pub async fn create(
    db: DbConn,
    auth: AuthenticatedUser,
    input: Json<RequestInput>,
) -> Result<Json<ApiResponse<Request>>, ApiError> {
    let request = db
        .run(move |conn| create_request(conn, &auth.user, input.into_inner()))
        .await?;
    Ok(ApiResponse::with_message("Request created", request))
}

/// Request detail with the full audit trail, newest entry first. Visible to
/// admins and the two parties only.
#[get("/requests/<id>")]
pub async fn get(
    db: DbConn,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<ApiResponse<RequestWithHistory>>, ApiError> {
    let full = db
        .run(move |conn| get_request_with_history(conn, &auth.user, id))
        .await?;
    Ok(ApiResponse::data(full))
}

/// Edits a pending request. Requester-only; the audit trail records the
/// field diff.
#[put("/requests/<id>", data = "<changes>")]
pub async fn update(
    db: DbConn,
    auth: AuthenticatedUser,
    id: i32,
    changes: Json<RequestUpdateInput>,
) -> Result<Json<ApiResponse<Request>>, ApiError> {
    let request = db
        .run(move |conn| update_request(conn, &auth.user, id, changes.into_inner()))
        .await?;
    Ok(ApiResponse::with_message("Request updated", request))
}

/// Resolve Request endpoint.
///
/// - **URL:** `/api/requests/<id>/status`
/// - **Method:** `PATCH`
/// - **Authentication:** Bearer token; assigned responsible or manager role
#[patch("/requests/<id>/status", data = "<input>")]
pub async fn change_status(
    db: DbConn,
    auth: AuthenticatedUser,
    id: i32,
    input: Json<StatusChangeInput>,
) -> Result<Json<ApiResponse<Request>>, ApiError> {
    let request = db
        .run(move |conn| transition_request(conn, &auth.user, id, input.into_inner()))
        .await?;
    Ok(ApiResponse::with_message("Request status updated", request))
}

/// Active request-type catalog, for populating submission forms.
#[get("/requests/types")]
pub async fn types(
    db: DbConn,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<RequestType>>>, ApiError> {
    let listed = db.run(|conn| list_active(conn)).await?;
    Ok(ApiResponse::data(listed))
}

/// Users who can be assigned as responsible for a request.
#[get("/requests/approvers")]
pub async fn approvers(
    db: DbConn,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, ApiError> {
    let listed = db.run(|conn| list_approvers(conn)).await?;
    Ok(ApiResponse::data(listed.iter().map(|u| u.public()).collect()))
}

/// Per-status counts under the caller's scope.
#[get("/requests/stats")]
pub async fn stats(
    db: DbConn,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<RequestStats>>, ApiError> {
    let stats = db.run(move |conn| request_stats(conn, &auth.user)).await?;
    Ok(ApiResponse::data(stats))
}

pub fn routes() -> Vec<Route> {
    routes![list, create, get, update, change_status, types, approvers, stats]
}
