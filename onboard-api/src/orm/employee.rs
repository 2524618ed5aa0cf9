//! Database operations for employee onboarding records.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use diesel::prelude::*;

use crate::error::{ApiError, Pagination};
use crate::models::{
    AlertHistoryEntry, CalendarData, CalendarEntry, DashboardStats, Employee, EmployeeInput,
    EmployeeUpdate, NewEmployee,
};
use crate::orm::user::normalize_email;

/// Upcoming-onboarding window for the dashboard, in days.
const UPCOMING_WINDOW_DAYS: i64 = 14;
/// Reminder-alert window, in days.
const ALERT_WINDOW_DAYS: i64 = 7;

/// Listing filters. `None` fields apply no constraint.
#[derive(Debug, Default)]
pub struct EmployeeListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn get_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<Option<Employee>, diesel::result::Error> {
    use crate::schema::employees::dsl::*;
    employees
        .filter(id.eq(employee_id))
        .first::<Employee>(conn)
        .optional()
}

fn get_by_email(
    conn: &mut SqliteConnection,
    employee_email: &str,
) -> Result<Option<Employee>, diesel::result::Error> {
    use crate::schema::employees::dsl::*;
    employees
        .filter(email.eq(employee_email))
        .first::<Employee>(conn)
        .optional()
}

fn validate_dates(entry: NaiveDate, technical: Option<NaiveDate>) -> Result<(), ApiError> {
    if let Some(tech_date) = technical {
        if tech_date < entry {
            return Err(ApiError::validation(
                "technical onboarding date cannot be before the entry date",
            ));
        }
    }
    Ok(())
}

/// Creates an onboarding record. Both completion flags start false and no
/// alert has been sent.
pub fn create_employee(
    conn: &mut SqliteConnection,
    input: EmployeeInput,
) -> Result<Employee, ApiError> {
    use crate::schema::employees::dsl::*;

    if input.full_name.trim().is_empty() || input.email.trim().is_empty() {
        return Err(ApiError::validation("full_name and email are required"));
    }
    validate_dates(input.entry_date, input.technical_onboarding_date)?;

    let normalized = normalize_email(&input.email);
    if get_by_email(conn, &normalized)?.is_some() {
        return Err(ApiError::Conflict(
            "an employee with this email already exists".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let new_employee = NewEmployee {
        full_name: input.full_name.trim().to_string(),
        email: normalized,
        entry_date: input.entry_date,
        general_onboarding_complete: false,
        technical_onboarding_complete: false,
        technical_onboarding_date: input.technical_onboarding_date,
        technical_onboarding_type: input.technical_onboarding_type,
        position: input.position,
        department: input.department,
        notes: input.notes,
        alert_sent: false,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(employees)
        .values(&new_employee)
        .execute(conn)?;

    employees
        .order(id.desc())
        .first::<Employee>(conn)
        .map_err(Into::into)
}

/// Partially updates a record. `None` fields are left alone. An email change
/// is checked for uniqueness against other records, and the resulting
/// entry/technical date pair must stay consistent.
pub fn update_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
    mut changes: EmployeeUpdate,
) -> Result<Employee, ApiError> {
    use crate::schema::employees::dsl::*;

    let current = get_employee(conn, employee_id)?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    if let Some(new_name) = &changes.full_name {
        if new_name.trim().is_empty() {
            return Err(ApiError::validation("full_name cannot be empty"));
        }
    }

    if let Some(new_email) = &changes.email {
        let normalized = normalize_email(new_email);
        if normalized.is_empty() {
            return Err(ApiError::validation("email cannot be empty"));
        }
        if normalized != current.email {
            if get_by_email(conn, &normalized)?.is_some() {
                return Err(ApiError::Conflict(
                    "an employee with this email already exists".to_string(),
                ));
            }
        }
        changes.email = Some(normalized);
    }

    let effective_entry = changes.entry_date.unwrap_or(current.entry_date);
    let effective_tech = changes
        .technical_onboarding_date
        .or(current.technical_onboarding_date);
    validate_dates(effective_entry, effective_tech)?;

    diesel::update(employees.filter(id.eq(employee_id)))
        .set((&changes, updated_at.eq(Utc::now().naive_utc())))
        .execute(conn)?;

    get_employee(conn, employee_id)?
        .ok_or_else(|| ApiError::Internal("employee vanished during update".to_string()))
}

pub fn delete_employee(conn: &mut SqliteConnection, employee_id: i32) -> Result<(), ApiError> {
    use crate::schema::employees::dsl::*;
    let deleted = diesel::delete(employees.filter(id.eq(employee_id))).execute(conn)?;
    if deleted == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }
    Ok(())
}

type BoxedEmployeeQuery<'a> =
    crate::schema::employees::BoxedQuery<'a, diesel::sqlite::Sqlite>;

/// Applies the status and search filters. Called twice per listing, once for
/// the page and once for the count, because boxed queries cannot be cloned.
fn filtered_query<'a>(params: &'a EmployeeListParams) -> BoxedEmployeeQuery<'a> {
    use crate::schema::employees::dsl::*;

    let mut query = employees.into_boxed();

    match params.status.as_deref() {
        Some("pending") => {
            query = query.filter(
                general_onboarding_complete
                    .eq(false)
                    .or(technical_onboarding_complete.eq(false)),
            );
        }
        Some("completed") => {
            query = query
                .filter(general_onboarding_complete.eq(true))
                .filter(technical_onboarding_complete.eq(true));
        }
        Some("general-completed") => {
            query = query.filter(general_onboarding_complete.eq(true));
        }
        Some("technical-completed") => {
            query = query.filter(technical_onboarding_complete.eq(true));
        }
        Some("general-pending") => {
            query = query.filter(general_onboarding_complete.eq(false));
        }
        Some("technical-pending") => {
            query = query.filter(technical_onboarding_complete.eq(false));
        }
        // Unknown filter values apply no constraint.
        _ => {}
    }

    if let Some(term) = params.search.as_deref() {
        let term = term.trim();
        if !term.is_empty() {
            let pattern = format!("%{}%", term);
            query = query.filter(
                full_name
                    .like(pattern.clone())
                    .or(email.like(pattern.clone()))
                    .or(position.like(pattern.clone()))
                    .or(department.like(pattern)),
            );
        }
    }

    query
}

/// Lists records with filtering, search, whitelisted sorting, and pagination.
pub fn list_employees(
    conn: &mut SqliteConnection,
    params: &EmployeeListParams,
) -> Result<(Vec<Employee>, Pagination), ApiError> {
    use crate::schema::employees::dsl::*;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let total: i64 = filtered_query(params).count().get_result(conn)?;

    let mut query = filtered_query(params);

    let descending = matches!(params.sort_dir.as_deref(), Some("desc"));
    // Sort fields outside the whitelist fall back to entry date.
    query = match (params.sort_by.as_deref().unwrap_or("entry_date"), descending) {
        ("full_name", false) => query.order(full_name.asc()),
        ("full_name", true) => query.order(full_name.desc()),
        ("email", false) => query.order(email.asc()),
        ("email", true) => query.order(email.desc()),
        ("technical_onboarding_date", false) => query.order(technical_onboarding_date.asc()),
        ("technical_onboarding_date", true) => query.order(technical_onboarding_date.desc()),
        ("created_at", false) => query.order(created_at.asc()),
        ("created_at", true) => query.order(created_at.desc()),
        (_, false) => query.order(entry_date.asc()),
        (_, true) => query.order(entry_date.desc()),
    };

    let rows = query
        .limit(limit)
        .offset((page - 1) * limit)
        .load::<Employee>(conn)?;

    Ok((rows, Pagination::new(total, page, limit)))
}

/// Marks general onboarding complete. One-way latch, idempotent.
pub fn complete_general(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<Employee, ApiError> {
    use crate::schema::employees::dsl::*;

    let updated = diesel::update(employees.filter(id.eq(employee_id)))
        .set((
            general_onboarding_complete.eq(true),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }
    get_employee(conn, employee_id)?
        .ok_or_else(|| ApiError::Internal("employee vanished during update".to_string()))
}

/// Marks technical onboarding complete. One-way latch, idempotent.
pub fn complete_technical(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<Employee, ApiError> {
    use crate::schema::employees::dsl::*;

    let updated = diesel::update(employees.filter(id.eq(employee_id)))
        .set((
            technical_onboarding_complete.eq(true),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }
    get_employee(conn, employee_id)?
        .ok_or_else(|| ApiError::Internal("employee vanished during update".to_string()))
}

/// Aggregate onboarding counts for the dashboard.
pub fn dashboard_stats(conn: &mut SqliteConnection) -> Result<DashboardStats, ApiError> {
    use crate::schema::employees::dsl::*;

    let total: i64 = employees.count().get_result(conn)?;
    let general: i64 = employees
        .filter(general_onboarding_complete.eq(true))
        .count()
        .get_result(conn)?;
    let technical: i64 = employees
        .filter(technical_onboarding_complete.eq(true))
        .count()
        .get_result(conn)?;
    let both: i64 = employees
        .filter(general_onboarding_complete.eq(true))
        .filter(technical_onboarding_complete.eq(true))
        .count()
        .get_result(conn)?;
    let pending: i64 = employees
        .filter(
            general_onboarding_complete
                .eq(false)
                .or(technical_onboarding_complete.eq(false)),
        )
        .count()
        .get_result(conn)?;

    let today = Utc::now().date_naive();
    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);
    let upcoming: i64 = employees
        .filter(technical_onboarding_complete.eq(false))
        .filter(technical_onboarding_date.ge(today))
        .filter(technical_onboarding_date.le(horizon))
        .count()
        .get_result(conn)?;

    let percentage = if total == 0 {
        0
    } else {
        ((both as f64 / total as f64) * 100.0).round() as i64
    };

    Ok(DashboardStats {
        total_employees: total,
        general_completed: general,
        technical_completed: technical,
        both_completed: both,
        pending,
        upcoming_onboardings: upcoming,
        percentage_complete: percentage,
    })
}

/// Technical onboarding sessions grouped by ISO date. An optional year, or
/// year plus month, narrows the window.
pub fn technical_calendar(
    conn: &mut SqliteConnection,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<CalendarData, ApiError> {
    use crate::schema::employees::dsl::*;

    let mut query = employees
        .filter(technical_onboarding_date.is_not_null())
        .into_boxed();

    if let Some(y) = year {
        let (start, end) = match month {
            Some(m) => {
                let start = NaiveDate::from_ymd_opt(y, m, 1)
                    .ok_or_else(|| ApiError::validation("invalid year/month"))?;
                let end = if m == 12 {
                    NaiveDate::from_ymd_opt(y + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(y, m + 1, 1)
                }
                .ok_or_else(|| ApiError::validation("invalid year/month"))?;
                (start, end)
            }
            None => {
                let start = NaiveDate::from_ymd_opt(y, 1, 1)
                    .ok_or_else(|| ApiError::validation("invalid year"))?;
                let end = NaiveDate::from_ymd_opt(y + 1, 1, 1)
                    .ok_or_else(|| ApiError::validation("invalid year"))?;
                (start, end)
            }
        };
        query = query
            .filter(technical_onboarding_date.ge(start))
            .filter(technical_onboarding_date.lt(end));
    }

    let rows = query
        .select((
            id,
            full_name,
            email,
            technical_onboarding_date,
            technical_onboarding_type,
            technical_onboarding_complete,
        ))
        .order(technical_onboarding_date.asc())
        .load::<CalendarEntry>(conn)?;

    let total = rows.len() as i64;
    let mut days: BTreeMap<String, Vec<CalendarEntry>> = BTreeMap::new();
    for row in rows {
        if let Some(date) = row.technical_onboarding_date {
            days.entry(date.format("%Y-%m-%d").to_string())
                .or_default()
                .push(row);
        }
    }

    Ok(CalendarData { total, days })
}

/// Records whose technical onboarding falls within the next week and that
/// have not yet been reminded, date ascending.
pub fn alert_candidates(
    conn: &mut SqliteConnection,
) -> Result<Vec<Employee>, diesel::result::Error> {
    use crate::schema::employees::dsl::*;

    let today = Utc::now().date_naive();
    let horizon = today + Duration::days(ALERT_WINDOW_DAYS);

    employees
        .filter(technical_onboarding_complete.eq(false))
        .filter(alert_sent.eq(false))
        .filter(technical_onboarding_date.ge(today))
        .filter(technical_onboarding_date.le(horizon))
        .order(technical_onboarding_date.asc())
        .load::<Employee>(conn)
}

/// Latches the reminder flag after a successful send.
pub fn mark_alert_sent(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<(), diesel::result::Error> {
    use crate::schema::employees::dsl::*;
    let now = Utc::now().naive_utc();
    diesel::update(employees.filter(id.eq(employee_id)))
        .set((alert_sent.eq(true), alert_sent_at.eq(now), updated_at.eq(now)))
        .execute(conn)?;
    Ok(())
}

/// Re-arms the reminder for a record so the next sweep picks it up again.
pub fn reset_alert(conn: &mut SqliteConnection, employee_id: i32) -> Result<Employee, ApiError> {
    use crate::schema::employees::dsl::*;

    let updated = diesel::update(employees.filter(id.eq(employee_id)))
        .set((
            alert_sent.eq(false),
            alert_sent_at.eq(None::<chrono::NaiveDateTime>),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }
    get_employee(conn, employee_id)?
        .ok_or_else(|| ApiError::Internal("employee vanished during update".to_string()))
}

/// Paginated listing of reminders already sent, most recent first.
pub fn alert_history(
    conn: &mut SqliteConnection,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<(Vec<AlertHistoryEntry>, Pagination), ApiError> {
    use crate::schema::employees::dsl::*;

    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);

    let total: i64 = employees
        .filter(alert_sent.eq(true))
        .count()
        .get_result(conn)?;

    let rows = employees
        .filter(alert_sent.eq(true))
        .select((
            id,
            full_name,
            email,
            technical_onboarding_date,
            technical_onboarding_type,
            alert_sent_at,
            technical_onboarding_complete,
        ))
        .order(alert_sent_at.desc())
        .limit(limit)
        .offset((page - 1) * limit)
        .load::<AlertHistoryEntry>(conn)?;

    Ok((rows, Pagination::new(total, page, limit)))
}
