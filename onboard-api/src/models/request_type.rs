use diesel::{Identifiable, Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::request_types;

#[derive(Deserialize, Queryable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = request_types)]
#[ts(export)]
pub struct RequestType {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Insertable, Debug, Deserialize)]
#[diesel(table_name = request_types)]
pub struct NewRequestType {
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}
