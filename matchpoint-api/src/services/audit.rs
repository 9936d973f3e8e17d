//! Admin action audit trail. Recording failures are logged and
//! swallowed so they never fail the action itself.

use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::NewAuditLog;
use crate::schema::audit_logs;

pub fn record(conn: &mut PgConnection, action: &str, admin_name: &str, details: serde_json::Value) {
    let result = diesel::insert_into(audit_logs::table)
        .values(&NewAuditLog {
            action,
            admin_name,
            details,
        })
        .execute(conn);

    if let Err(e) = result {
        tracing::error!(action, admin_name, error = %e, "audit log insert failed");
    }
}
