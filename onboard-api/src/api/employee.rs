//! Employee onboarding endpoints: CRUD, completion latches, dashboard
//! statistics, and the technical-onboarding calendar.

use rocket::Route;
use rocket::serde::json::Json;

use crate::auth::guards::{AuthenticatedUser, ManagerUser};
use crate::error::{ApiError, ApiResponse, PagedResponse};
use crate::models::{CalendarData, DashboardStats, Employee, EmployeeInput, EmployeeUpdate};
use crate::orm::DbConn;
use crate::orm::employee::{
    EmployeeListParams, complete_general, complete_technical, create_employee, dashboard_stats,
    delete_employee, get_employee, list_employees, technical_calendar, update_employee,
};

/// List Employees endpoint.
///
/// - **URL:** `/api/employees`
/// - **Method:** `GET`
/// - **Authentication:** Bearer token, manager role
///
/// Supports `status`, `search`, `sort_by`, `sort_dir`, `page`, and `limit`
/// query parameters.
#[get("/employees?<status>&<search>&<sort_by>&<sort_dir>&<page>&<limit>")]
pub async fn list(
    db: DbConn,
    _user: ManagerUser,
    status: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    sort_dir: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<PagedResponse<Employee>>, ApiError> {
    let params = EmployeeListParams {
        status,
        search,
        sort_by,
        sort_dir,
        page,
        limit,
    };
    let (rows, pagination) = db.run(move |conn| list_employees(conn, &params)).await?;
    Ok(PagedResponse::new(rows, pagination))
}

/// Create Employee endpoint.
///
/// - **URL:** `/api/employees`
/// - **Method:** `POST`
/// - **Authentication:** Bearer token, manager role
#[post("/employees", data = "<input>")]
pub async fn create(
    db: DbConn,
    _user: ManagerUser,
    input: Json<EmployeeInput>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let employee = db
        .run(move |conn| create_employee(conn, input.into_inner()))
        .await?;
    Ok(ApiResponse::with_message("Employee created", employee))
}

#[get("/employees/<id>")]
pub async fn get(
    db: DbConn,
    _user: ManagerUser,
    id: i32,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let employee = db
        .run(move |conn| get_employee(conn, id))
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(ApiResponse::data(employee))
}

/// Update Employee endpoint. Partial: omitted fields keep their value.
#[put("/employees/<id>", data = "<changes>")]
pub async fn update(
    db: DbConn,
    _user: ManagerUser,
    id: i32,
    changes: Json<EmployeeUpdate>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let employee = db
        .run(move |conn| update_employee(conn, id, changes.into_inner()))
        .await?;
    Ok(ApiResponse::with_message("Employee updated", employee))
}

#[delete("/employees/<id>")]
pub async fn delete(
    db: DbConn,
    _user: ManagerUser,
    id: i32,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    db.run(move |conn| delete_employee(conn, id)).await?;
    Ok(ApiResponse::message("Employee deleted"))
}

/// Marks general onboarding complete. One-way and idempotent.
#[patch("/employees/<id>/complete-general")]
pub async fn mark_general_complete(
    db: DbConn,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let employee = db.run(move |conn| complete_general(conn, id)).await?;
    Ok(ApiResponse::with_message(
        "General onboarding completed",
        employee,
    ))
}

/// Marks technical onboarding complete. One-way and idempotent.
#[patch("/employees/<id>/complete-technical")]
pub async fn mark_technical_complete(
    db: DbConn,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let employee = db.run(move |conn| complete_technical(conn, id)).await?;
    Ok(ApiResponse::with_message(
        "Technical onboarding completed",
        employee,
    ))
}

/// Dashboard Statistics endpoint.
///
/// - **URL:** `/api/employees/stats/dashboard`
/// - **Method:** `GET`
/// - **Authentication:** Bearer token
#[get("/employees/stats/dashboard")]
pub async fn stats(
    db: DbConn,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let stats = db.run(dashboard_stats).await?;
    Ok(ApiResponse::data(stats))
}

/// Technical-onboarding calendar, optionally narrowed to a year or a
/// year+month window.
#[get("/employees/calendar/technical?<year>&<month>")]
pub async fn calendar(
    db: DbConn,
    _user: AuthenticatedUser,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Json<ApiResponse<CalendarData>>, ApiError> {
    let data = db
        .run(move |conn| technical_calendar(conn, year, month))
        .await?;
    Ok(ApiResponse::data(data))
}

pub fn routes() -> Vec<Route> {
    routes![
        list,
        create,
        get,
        update,
        delete,
        mark_general_complete,
        mark_technical_complete,
        stats,
        calendar
    ]
}
