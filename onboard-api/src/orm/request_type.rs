//! Database operations for the request-type catalog.

use diesel::prelude::*;

use crate::models::{NewRequestType, RequestType};

/// Active catalog entries, ordered by name. Inactive types stay in the table
/// so existing requests keep their label, but cannot be chosen for new ones.
pub fn list_active(conn: &mut SqliteConnection) -> Result<Vec<RequestType>, diesel::result::Error> {
    use crate::schema::request_types::dsl::*;
    request_types
        .filter(active.eq(true))
        .order(name.asc())
        .load::<RequestType>(conn)
}

pub fn get_request_type(
    conn: &mut SqliteConnection,
    type_id: i32,
) -> Result<Option<RequestType>, diesel::result::Error> {
    use crate::schema::request_types::dsl::*;
    request_types
        .filter(id.eq(type_id))
        .first::<RequestType>(conn)
        .optional()
}

/// Seeds a catalog entry if one with this name does not exist yet. Used by
/// the bootstrap fairing, so it must be idempotent across restarts.
pub fn ensure_request_type(
    conn: &mut SqliteConnection,
    type_name: &str,
    type_description: &str,
) -> Result<RequestType, diesel::result::Error> {
    use crate::schema::request_types::dsl::*;

    if let Some(existing) = request_types
        .filter(name.eq(type_name))
        .first::<RequestType>(conn)
        .optional()?
    {
        return Ok(existing);
    }

    diesel::insert_into(request_types)
        .values(&NewRequestType {
            name: type_name.to_string(),
            description: Some(type_description.to_string()),
            active: true,
        })
        .execute(conn)?;

    request_types.order(id.desc()).first::<RequestType>(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::setup_test_db;

    #[test]
    fn ensure_is_idempotent_and_list_orders_by_name() {
        let mut conn = setup_test_db();
        let first = ensure_request_type(&mut conn, "Equipment", "Hardware purchases").unwrap();
        let again = ensure_request_type(&mut conn, "Equipment", "Hardware purchases").unwrap();
        assert_eq!(first.id, again.id);

        ensure_request_type(&mut conn, "Access", "System access").unwrap();
        let listed = list_active(&mut conn).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Access");
    }

    #[test]
    fn inactive_types_are_hidden_from_the_catalog() {
        let mut conn = setup_test_db();
        let t = ensure_request_type(&mut conn, "Legacy", "Old process").unwrap();
        {
            use crate::schema::request_types::dsl::*;
            diesel::update(request_types.filter(id.eq(t.id)))
                .set(active.eq(false))
                .execute(&mut conn)
                .unwrap();
        }
        assert!(list_active(&mut conn).unwrap().is_empty());
        assert!(get_request_type(&mut conn, t.id).unwrap().is_some());
    }
}
