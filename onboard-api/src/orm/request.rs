//! The approval-request lifecycle engine.
//!
//! Every mutating operation runs inside one transaction and appends exactly
//! one history row, so the audit trail and the request row can never
//! disagree. Status logic delegates to [`RequestStatus::can_transition_to`];
//! nothing here hardcodes a second copy of the transition table.

use chrono::Utc;
use diesel::prelude::*;
use rand::Rng;
use std::collections::HashMap;

use crate::error::{ApiError, Pagination};
use crate::models::{
    HistoryEntryWithUser, NewHistoryEntry, NewRequest, Request, RequestDetail, RequestInput,
    RequestStats, RequestStatus, RequestUpdateInput, RequestWithHistory, StatusChangeInput, User,
};
use crate::orm::notification::notify;
use crate::orm::request_type::get_request_type;
use crate::orm::user::{get_user, list_approvers};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn base36_upper(mut n: i64) -> String {
    if n <= 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ascii")
}

/// Builds a display code: `REQ-<base36 millis>-<4 random alphanumerics>`,
/// all uppercase. Millisecond precision plus the random suffix makes
/// collisions vanishingly rare; the unique column catches the remainder.
pub fn generate_code() -> String {
    let millis = base36_upper(Utc::now().timestamp_millis());
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(4)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("REQ-{}-{}", millis, suffix)
}

pub fn get_request(
    conn: &mut SqliteConnection,
    req_id: i32,
) -> Result<Option<Request>, diesel::result::Error> {
    use crate::schema::requests::dsl::*;
    requests.filter(id.eq(req_id)).first::<Request>(conn).optional()
}

fn append_history(
    conn: &mut SqliteConnection,
    req_id: i32,
    actor_id: i32,
    history_action: &str,
    prior: Option<RequestStatus>,
    new: RequestStatus,
    history_comment: Option<String>,
) -> Result<(), diesel::result::Error> {
    use crate::schema::request_history::dsl::*;
    diesel::insert_into(request_history)
        .values(&NewHistoryEntry {
            request_id: req_id,
            user_id: actor_id,
            action: history_action.to_string(),
            prior_status: prior.map(|s| s.as_str().to_string()),
            new_status: new.as_str().to_string(),
            comment: history_comment,
            created_at: Utc::now().naive_utc(),
        })
        .execute(conn)?;
    Ok(())
}

/// Validates that `user_id` names an existing, manager-capable approver.
fn validated_responsible(conn: &mut SqliteConnection, user_id: i32) -> Result<User, ApiError> {
    let user = get_user(conn, user_id)?
        .ok_or_else(|| ApiError::validation("responsible user does not exist"))?;
    if !user.role().is_manager() {
        return Err(ApiError::validation(
            "responsible user cannot approve requests",
        ));
    }
    Ok(user)
}

fn validated_type(
    conn: &mut SqliteConnection,
    type_id: i32,
) -> Result<crate::models::RequestType, ApiError> {
    let rt = get_request_type(conn, type_id)?
        .ok_or_else(|| ApiError::validation("request type does not exist"))?;
    if !rt.active {
        return Err(ApiError::validation("request type is not active"));
    }
    Ok(rt)
}

/// Creates a request in `pending` state.
///
/// One transaction inserts the row, the `create` history entry, and the
/// notification fan-out: the responsible approver, the requester, and every
/// other manager-capable user.
pub fn create_request(
    conn: &mut SqliteConnection,
    actor: &User,
    input: RequestInput,
) -> Result<Request, ApiError> {
    use crate::schema::requests::dsl::*;

    if input.title.trim().is_empty() || input.description.trim().is_empty() {
        return Err(ApiError::validation("title and description are required"));
    }

    let responsible = validated_responsible(conn, input.responsible_id)?;
    validated_type(conn, input.request_type_id)?;

    conn.transaction::<Request, ApiError, _>(|conn| {
        let now = Utc::now().naive_utc();
        diesel::insert_into(requests)
            .values(&NewRequest {
                code: generate_code(),
                title: input.title.trim().to_string(),
                description: input.description.trim().to_string(),
                request_type_id: input.request_type_id,
                requester_id: actor.id,
                responsible_id: responsible.id,
                status: RequestStatus::Pending.as_str().to_string(),
                created_at: now,
                updated_at: now,
            })
            .execute(conn)?;

        let request = requests.order(id.desc()).first::<Request>(conn)?;

        append_history(
            conn,
            request.id,
            actor.id,
            "create",
            None,
            RequestStatus::Pending,
            Some("Request created".to_string()),
        )?;

        notify(
            conn,
            responsible.id,
            Some(request.id),
            "request_assigned",
            &format!("Request {} needs your approval: {}", request.code, request.title),
        )?;
        notify(
            conn,
            actor.id,
            Some(request.id),
            "request_created",
            &format!("Your request {} was submitted", request.code),
        )?;
        for manager in list_approvers(conn)? {
            if manager.id == responsible.id || manager.id == actor.id {
                continue;
            }
            notify(
                conn,
                manager.id,
                Some(request.id),
                "request_created",
                &format!("New request {} submitted by {}", request.code, actor.name),
            )?;
        }

        Ok(request)
    })
}

/// Human-readable summary of what an edit changed, for the audit trail.
fn diff_comment(
    conn: &mut SqliteConnection,
    current: &Request,
    changes: &RequestUpdateInput,
) -> Result<String, ApiError> {
    let mut parts = Vec::new();

    if let Some(new_title) = &changes.title {
        if new_title.trim() != current.title {
            parts.push(format!("Title: '{}' -> '{}'", current.title, new_title.trim()));
        }
    }
    if let Some(new_type) = changes.request_type_id {
        if new_type != current.request_type_id {
            let old_name = get_request_type(conn, current.request_type_id)?
                .map(|t| t.name)
                .unwrap_or_else(|| current.request_type_id.to_string());
            let new_name = get_request_type(conn, new_type)?
                .map(|t| t.name)
                .unwrap_or_else(|| new_type.to_string());
            parts.push(format!("Type: '{}' -> '{}'", old_name, new_name));
        }
    }
    if let Some(new_responsible) = changes.responsible_id {
        if new_responsible != current.responsible_id {
            let old_name = get_user(conn, current.responsible_id)?
                .map(|u| u.name)
                .unwrap_or_else(|| current.responsible_id.to_string());
            let new_name = get_user(conn, new_responsible)?
                .map(|u| u.name)
                .unwrap_or_else(|| new_responsible.to_string());
            parts.push(format!("Responsible: '{}' -> '{}'", old_name, new_name));
        }
    }
    if let Some(new_description) = &changes.description {
        let trimmed = new_description.trim();
        if !trimmed.is_empty() && trimmed != current.description {
            parts.push("Description modified".to_string());
        }
    }

    if parts.is_empty() {
        Ok("Edited without changes".to_string())
    } else {
        Ok(parts.join("; "))
    }
}

/// Edits a pending request. Only the original requester may edit, and only
/// while the request is still pending. The audit trail records a field-level
/// diff; no notifications are sent for edits.
pub fn update_request(
    conn: &mut SqliteConnection,
    actor: &User,
    req_id: i32,
    changes: RequestUpdateInput,
) -> Result<Request, ApiError> {
    use crate::schema::requests::dsl::*;

    let current = get_request(conn, req_id)?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    if current.requester_id != actor.id {
        return Err(ApiError::forbidden(
            "only the requester can edit this request",
        ));
    }
    if current.status() != RequestStatus::Pending {
        return Err(ApiError::InvalidState(
            "only pending requests can be edited".to_string(),
        ));
    }

    if let Some(new_title) = &changes.title {
        if new_title.trim().is_empty() {
            return Err(ApiError::validation("title cannot be empty"));
        }
    }
    if let Some(new_responsible) = changes.responsible_id {
        if new_responsible != current.responsible_id {
            validated_responsible(conn, new_responsible)?;
        }
    }
    if let Some(new_type) = changes.request_type_id {
        if new_type != current.request_type_id {
            validated_type(conn, new_type)?;
        }
    }

    let comment = diff_comment(conn, &current, &changes)?;

    conn.transaction::<Request, ApiError, _>(|conn| {
        diesel::update(requests.filter(id.eq(req_id)))
            .set((
                title.eq(changes
                    .title
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or(&current.title)
                    .to_string()),
                // An empty description keeps the prior text, like a missing one.
                description.eq(changes
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .unwrap_or(&current.description)
                    .to_string()),
                request_type_id.eq(changes.request_type_id.unwrap_or(current.request_type_id)),
                responsible_id.eq(changes.responsible_id.unwrap_or(current.responsible_id)),
                updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        append_history(
            conn,
            req_id,
            actor.id,
            "edit",
            Some(RequestStatus::Pending),
            RequestStatus::Pending,
            Some(comment),
        )?;

        get_request(conn, req_id)?
            .ok_or_else(|| ApiError::Internal("request vanished during update".to_string()))
    })
}

/// Resolves a pending request to `approved` or `rejected`.
///
/// The actor must be the assigned responsible or a manager-capable user.
/// The requester is told the outcome (with the reviewer's comment when one
/// was given); every other manager-capable user except the actor gets an
/// announcement.
pub fn transition_request(
    conn: &mut SqliteConnection,
    actor: &User,
    req_id: i32,
    input: StatusChangeInput,
) -> Result<Request, ApiError> {
    use crate::schema::requests::dsl::*;

    let current = get_request(conn, req_id)?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    if current.responsible_id != actor.id && !actor.role().is_manager() {
        return Err(ApiError::forbidden(
            "you are not allowed to resolve this request",
        ));
    }

    let prior = current.status();
    if !prior.can_transition_to(input.status) {
        return Err(ApiError::InvalidState(format!(
            "cannot move request from '{}' to '{}'",
            prior.as_str(),
            input.status.as_str()
        )));
    }

    conn.transaction::<Request, ApiError, _>(|conn| {
        diesel::update(requests.filter(id.eq(req_id)))
            .set((
                status.eq(input.status.as_str()),
                updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        append_history(
            conn,
            req_id,
            actor.id,
            input.status.as_str(),
            Some(prior),
            input.status,
            input.comment.clone(),
        )?;

        let verb = match input.status {
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Pending => unreachable!("transition table forbids pending"),
        };

        let mut requester_message =
            format!("Your request {} has been {}", current.code, verb);
        if let Some(comment) = input.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            requester_message.push_str(&format!(". Comment: {}", comment.trim()));
        }
        notify(
            conn,
            current.requester_id,
            Some(req_id),
            "status_change",
            &requester_message,
        )?;

        for manager in list_approvers(conn)? {
            if manager.id == actor.id || manager.id == current.requester_id {
                continue;
            }
            notify(
                conn,
                manager.id,
                Some(req_id),
                "status_change",
                &format!("Request {} was {} by {}", current.code, verb, actor.name),
            )?;
        }

        get_request(conn, req_id)?
            .ok_or_else(|| ApiError::Internal("request vanished during transition".to_string()))
    })
}

fn build_detail(conn: &mut SqliteConnection, request: Request) -> Result<RequestDetail, ApiError> {
    let type_name = get_request_type(conn, request.request_type_id)?
        .map(|t| t.name)
        .unwrap_or_else(|| "unknown".to_string());
    let requester = get_user(conn, request.requester_id)?
        .ok_or_else(|| ApiError::Internal("requester account missing".to_string()))?;
    let responsible = get_user(conn, request.responsible_id)?
        .ok_or_else(|| ApiError::Internal("responsible account missing".to_string()))?;
    Ok(RequestDetail {
        request,
        type_name,
        requester: requester.public(),
        responsible: responsible.public(),
    })
}

/// Audit trail for one request, newest entry first, with the acting user's
/// name and email joined in.
pub fn get_history(
    conn: &mut SqliteConnection,
    req_id: i32,
) -> Result<Vec<HistoryEntryWithUser>, diesel::result::Error> {
    use crate::schema::request_history;
    use crate::schema::users;

    request_history::table
        .inner_join(users::table)
        .filter(request_history::request_id.eq(req_id))
        .order((request_history::created_at.desc(), request_history::id.desc()))
        .select((
            request_history::id,
            request_history::request_id,
            request_history::user_id,
            request_history::action,
            request_history::prior_status,
            request_history::new_status,
            request_history::comment,
            request_history::created_at,
            users::name,
            users::email,
        ))
        .load::<HistoryEntryWithUser>(conn)
}

/// Full view of one request. Visible to admins, the requester, and the
/// responsible approver only.
pub fn get_request_with_history(
    conn: &mut SqliteConnection,
    viewer: &User,
    req_id: i32,
) -> Result<RequestWithHistory, ApiError> {
    let request = get_request(conn, req_id)?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let is_party = request.requester_id == viewer.id || request.responsible_id == viewer.id;
    if !is_party && viewer.role() != crate::models::Role::Admin {
        return Err(ApiError::forbidden(
            "you are not allowed to view this request",
        ));
    }

    let history = get_history(conn, req_id)?;
    Ok(RequestWithHistory {
        detail: build_detail(conn, request)?,
        history,
    })
}

/// Listing filters; scoping by role is applied on top.
#[derive(Debug, Default)]
pub struct RequestListParams {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

type BoxedRequestQuery<'a> = crate::schema::requests::BoxedQuery<'a, diesel::sqlite::Sqlite>;

/// Role scoping: employees see their own requests, approver roles see the
/// ones assigned to them, admins see everything.
fn scoped_query<'a>(actor: &User, status_filter: Option<&'a str>) -> BoxedRequestQuery<'a> {
    use crate::models::Role;
    use crate::schema::requests::dsl::*;

    let mut query = requests.into_boxed();
    query = match actor.role() {
        Role::Admin => query,
        Role::Hr | Role::TechLead => query.filter(responsible_id.eq(actor.id)),
        Role::Employee => query.filter(requester_id.eq(actor.id)),
    };
    if let Some(wanted) = status_filter {
        query = query.filter(status.eq(wanted));
    }
    query
}

/// Paginated, role-scoped listing, newest first, joined with type and user
/// projections.
pub fn list_requests(
    conn: &mut SqliteConnection,
    actor: &User,
    params: &RequestListParams,
) -> Result<(Vec<RequestDetail>, Pagination), ApiError> {
    use crate::schema::requests::dsl::*;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let status_filter = params.status.as_deref();

    let total: i64 = scoped_query(actor, status_filter)
        .count()
        .get_result(conn)?;

    let rows = scoped_query(actor, status_filter)
        .order(created_at.desc())
        .limit(limit)
        .offset((page - 1) * limit)
        .load::<Request>(conn)?;

    // Resolve names in bulk rather than per row.
    let mut user_ids: Vec<i32> = rows
        .iter()
        .flat_map(|r| [r.requester_id, r.responsible_id])
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users_by_id: HashMap<i32, User> = {
        use crate::schema::users::dsl as u;
        u::users
            .filter(u::id.eq_any(&user_ids))
            .load::<User>(conn)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect()
    };
    let types_by_id: HashMap<i32, String> = {
        use crate::schema::request_types::dsl as t;
        t::request_types
            .load::<crate::models::RequestType>(conn)?
            .into_iter()
            .map(|rt| (rt.id, rt.name))
            .collect()
    };

    let mut details = Vec::with_capacity(rows.len());
    for request in rows {
        let requester = users_by_id
            .get(&request.requester_id)
            .ok_or_else(|| ApiError::Internal("requester account missing".to_string()))?;
        let responsible = users_by_id
            .get(&request.responsible_id)
            .ok_or_else(|| ApiError::Internal("responsible account missing".to_string()))?;
        let type_name = types_by_id
            .get(&request.request_type_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        details.push(RequestDetail {
            type_name,
            requester: requester.public(),
            responsible: responsible.public(),
            request,
        });
    }

    Ok((details, Pagination::new(total, page, limit)))
}

/// Per-status counts under the same role scoping as the listing.
pub fn request_stats(conn: &mut SqliteConnection, actor: &User) -> Result<RequestStats, ApiError> {
    let pending: i64 = scoped_query(actor, Some("pending")).count().get_result(conn)?;
    let approved: i64 = scoped_query(actor, Some("approved")).count().get_result(conn)?;
    let rejected: i64 = scoped_query(actor, Some("rejected")).count().get_result(conn)?;
    Ok(RequestStats {
        pending,
        approved,
        rejected,
        total: pending + approved + rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegisterInput;
    use crate::orm::notification::{list_for_user, unread_count};
    use crate::orm::request_type::ensure_request_type;
    use crate::orm::testing::setup_test_db;
    use crate::orm::user::register_user;

    fn make_user(conn: &mut SqliteConnection, email: &str, role: &str) -> User {
        register_user(
            conn,
            RegisterInput {
                name: email.split('@').next().unwrap().to_string(),
                email: email.to_string(),
                password: "hunter22".to_string(),
                role: Some(role.to_string()),
            },
        )
        .unwrap()
    }

    struct Fixture {
        admin: User,
        hr: User,
        employee: User,
        type_id: i32,
    }

    fn fixture(conn: &mut SqliteConnection) -> Fixture {
        let admin = make_user(conn, "admin@x.com", "admin");
        let hr = make_user(conn, "hr@x.com", "hr");
        let employee = make_user(conn, "emp@x.com", "employee");
        let rt = ensure_request_type(conn, "Equipment", "Hardware").unwrap();
        Fixture {
            admin,
            hr,
            employee,
            type_id: rt.id,
        }
    }

    fn input(f: &Fixture) -> RequestInput {
        RequestInput {
            title: "New laptop".to_string(),
            description: "Dev machine".to_string(),
            request_type_id: f.type_id,
            responsible_id: f.hr.id,
        }
    }

    #[test]
    fn generated_codes_have_the_expected_shape() {
        let code = generate_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts[0], "REQ");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 4);
        assert_eq!(code, code.to_uppercase());
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(base36_upper(0), "0");
        assert_eq!(base36_upper(35), "Z");
        assert_eq!(base36_upper(36), "10");
    }

    #[test]
    fn create_writes_history_and_fans_out_notifications() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);

        let request = create_request(&mut conn, &f.employee, input(&f)).unwrap();
        assert_eq!(request.status(), RequestStatus::Pending);
        assert!(request.code.starts_with("REQ-"));

        let history = get_history(&mut conn, request.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "create");
        assert_eq!(history[0].prior_status, None);
        assert_eq!(history[0].new_status, "pending");
        assert_eq!(history[0].comment.as_deref(), Some("Request created"));

        // Responsible, requester, and the one other manager (admin).
        assert_eq!(unread_count(&mut conn, f.hr.id).unwrap(), 1);
        assert_eq!(unread_count(&mut conn, f.employee.id).unwrap(), 1);
        assert_eq!(unread_count(&mut conn, f.admin.id).unwrap(), 1);

        let assigned = list_for_user(&mut conn, f.hr.id, None).unwrap();
        assert_eq!(assigned[0].kind, "request_assigned");
        assert_eq!(assigned[0].request_code.as_deref(), Some(request.code.as_str()));
    }

    #[test]
    fn create_rejects_bad_responsible_and_inactive_type() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);

        let mut bad = input(&f);
        bad.responsible_id = f.employee.id;
        assert!(matches!(
            create_request(&mut conn, &f.employee, bad),
            Err(ApiError::Validation(_))
        ));

        let mut missing = input(&f);
        missing.responsible_id = 9999;
        assert!(matches!(
            create_request(&mut conn, &f.employee, missing),
            Err(ApiError::Validation(_))
        ));

        {
            use crate::schema::request_types::dsl::*;
            diesel::update(request_types.filter(id.eq(f.type_id)))
                .set(active.eq(false))
                .execute(&mut conn)
                .unwrap();
        }
        assert!(matches!(
            create_request(&mut conn, &f.employee, input(&f)),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn failed_create_leaves_no_rows_behind() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);

        let mut bad = input(&f);
        bad.responsible_id = f.employee.id;
        assert!(matches!(
            create_request(&mut conn, &f.employee, bad),
            Err(ApiError::Validation(_))
        ));

        let requests: i64 = {
            use crate::schema::requests::dsl::*;
            requests.count().get_result(&mut conn).unwrap()
        };
        let history: i64 = {
            use crate::schema::request_history::dsl::*;
            request_history.count().get_result(&mut conn).unwrap()
        };
        assert_eq!(requests, 0);
        assert_eq!(history, 0);
        assert_eq!(unread_count(&mut conn, f.hr.id).unwrap(), 0);
        assert_eq!(unread_count(&mut conn, f.admin.id).unwrap(), 0);
    }

    #[test]
    fn blank_description_edit_keeps_the_prior_text() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);
        let request = create_request(&mut conn, &f.employee, input(&f)).unwrap();

        let updated = update_request(
            &mut conn,
            &f.employee,
            request.id,
            RequestUpdateInput {
                title: None,
                description: Some("   ".to_string()),
                request_type_id: None,
                responsible_id: None,
            },
        )
        .unwrap();
        assert_eq!(updated.description, "Dev machine");

        let history = get_history(&mut conn, request.id).unwrap();
        assert_eq!(
            history[0].comment.as_deref(),
            Some("Edited without changes")
        );
    }

    #[test]
    fn edit_is_requester_only_and_records_a_diff() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);
        let request = create_request(&mut conn, &f.employee, input(&f)).unwrap();

        assert!(matches!(
            update_request(
                &mut conn,
                &f.hr,
                request.id,
                RequestUpdateInput {
                    title: Some("Hijacked".to_string()),
                    description: None,
                    request_type_id: None,
                    responsible_id: None,
                },
            ),
            Err(ApiError::Forbidden(_))
        ));

        let updated = update_request(
            &mut conn,
            &f.employee,
            request.id,
            RequestUpdateInput {
                title: Some("Bigger laptop".to_string()),
                description: Some("Dev machine with more RAM".to_string()),
                request_type_id: None,
                responsible_id: None,
            },
        )
        .unwrap();
        assert_eq!(updated.title, "Bigger laptop");

        let history = get_history(&mut conn, request.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, "edit");
        let comment = history[0].comment.as_deref().unwrap();
        assert!(comment.contains("Title: 'New laptop' -> 'Bigger laptop'"));
        assert!(comment.contains("Description modified"));

        // Edits are silent: nobody gains a notification beyond creation.
        assert_eq!(unread_count(&mut conn, f.hr.id).unwrap(), 1);

        let unchanged = update_request(
            &mut conn,
            &f.employee,
            request.id,
            RequestUpdateInput {
                title: None,
                description: None,
                request_type_id: None,
                responsible_id: None,
            },
        )
        .unwrap();
        assert_eq!(unchanged.title, "Bigger laptop");
        let history = get_history(&mut conn, request.id).unwrap();
        assert_eq!(
            history[0].comment.as_deref(),
            Some("Edited without changes")
        );
    }

    #[test]
    fn transition_enforces_actor_and_state_rules() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);
        let request = create_request(&mut conn, &f.employee, input(&f)).unwrap();

        // The requester (a plain employee) cannot resolve their own request.
        assert!(matches!(
            transition_request(
                &mut conn,
                &f.employee,
                request.id,
                StatusChangeInput {
                    status: RequestStatus::Approved,
                    comment: None,
                },
            ),
            Err(ApiError::Forbidden(_))
        ));

        let approved = transition_request(
            &mut conn,
            &f.hr,
            request.id,
            StatusChangeInput {
                status: RequestStatus::Approved,
                comment: Some("Budget confirmed".to_string()),
            },
        )
        .unwrap();
        assert_eq!(approved.status(), RequestStatus::Approved);

        let history = get_history(&mut conn, request.id).unwrap();
        assert_eq!(history[0].action, "approved");
        assert_eq!(history[0].prior_status.as_deref(), Some("pending"));
        assert_eq!(history[0].comment.as_deref(), Some("Budget confirmed"));

        let to_requester = list_for_user(&mut conn, f.employee.id, None).unwrap();
        assert!(to_requester[0].message.contains("approved"));
        assert!(to_requester[0].message.contains("Budget confirmed"));

        // A resolved request is frozen.
        assert!(matches!(
            transition_request(
                &mut conn,
                &f.admin,
                request.id,
                StatusChangeInput {
                    status: RequestStatus::Rejected,
                    comment: None,
                },
            ),
            Err(ApiError::InvalidState(_))
        ));

        // And can no longer be edited.
        assert!(matches!(
            update_request(
                &mut conn,
                &f.employee,
                request.id,
                RequestUpdateInput {
                    title: Some("Too late".to_string()),
                    description: None,
                    request_type_id: None,
                    responsible_id: None,
                },
            ),
            Err(ApiError::InvalidState(_))
        ));
    }

    #[test]
    fn transition_announcement_skips_the_actor() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);
        let request = create_request(&mut conn, &f.employee, input(&f)).unwrap();

        let hr_before = unread_count(&mut conn, f.hr.id).unwrap();
        transition_request(
            &mut conn,
            &f.hr,
            request.id,
            StatusChangeInput {
                status: RequestStatus::Rejected,
                comment: None,
            },
        )
        .unwrap();

        // The acting approver gets nothing new; the other manager does.
        assert_eq!(unread_count(&mut conn, f.hr.id).unwrap(), hr_before);
        assert_eq!(unread_count(&mut conn, f.admin.id).unwrap(), 2);
    }

    #[test]
    fn detail_view_is_limited_to_the_parties_and_admins() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);
        let outsider = make_user(&mut conn, "other@x.com", "employee");
        let request = create_request(&mut conn, &f.employee, input(&f)).unwrap();

        assert!(get_request_with_history(&mut conn, &f.employee, request.id).is_ok());
        assert!(get_request_with_history(&mut conn, &f.hr, request.id).is_ok());
        let full = get_request_with_history(&mut conn, &f.admin, request.id).unwrap();
        assert_eq!(full.detail.type_name, "Equipment");
        assert_eq!(full.detail.requester.email, "emp@x.com");
        assert_eq!(full.history.len(), 1);

        assert!(matches!(
            get_request_with_history(&mut conn, &outsider, request.id),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            get_request_with_history(&mut conn, &f.admin, 9999),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn listing_and_stats_are_role_scoped() {
        let mut conn = setup_test_db();
        let f = fixture(&mut conn);
        let other_employee = make_user(&mut conn, "other@x.com", "employee");

        let mine = create_request(&mut conn, &f.employee, input(&f)).unwrap();
        let theirs = create_request(&mut conn, &other_employee, input(&f)).unwrap();
        transition_request(
            &mut conn,
            &f.hr,
            theirs.id,
            StatusChangeInput {
                status: RequestStatus::Approved,
                comment: None,
            },
        )
        .unwrap();

        let (rows, pagination) =
            list_requests(&mut conn, &f.employee, &RequestListParams::default()).unwrap();
        assert_eq!(pagination.total, 1);
        assert_eq!(rows[0].request.id, mine.id);

        let (rows, _) =
            list_requests(&mut conn, &f.hr, &RequestListParams::default()).unwrap();
        assert_eq!(rows.len(), 2);

        let (rows, _) =
            list_requests(&mut conn, &f.admin, &RequestListParams::default()).unwrap();
        assert_eq!(rows.len(), 2);

        let (rows, _) = list_requests(
            &mut conn,
            &f.admin,
            &RequestListParams {
                status: Some("approved".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request.id, theirs.id);

        let stats = request_stats(&mut conn, &f.admin).unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.total, 2);

        let stats = request_stats(&mut conn, &f.employee).unwrap();
        assert_eq!(stats.total, 1);
    }
}
