// src/etl/normalizers/status.rs

use crate::etl::row::Row;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFlags {
    pub renew: bool,
    pub new_development: bool,
    pub is_finished: bool,
}

/// Derives the status flags.
///
/// `is_finished` is false only for an explicit `false`: a missing value counts
/// as finished. This is the opposite of the lift policy (missing means no
/// lift) and is kept that way because models trained on existing warehouses
/// depend on it.
pub fn status_flags(status: &Value, new_development_finished: &Value) -> StatusFlags {
    let status = status.as_str();

    StatusFlags {
        renew: status == Some("renew"),
        new_development: status == Some("newdevelopment"),
        is_finished: !matches!(new_development_finished, Value::Bool(false)),
    }
}

/// Replaces `status` and `newDevelopmentFinished` with the derived flags.
pub fn normalize_status(row: &mut Row) {
    let status = row.take("status");
    let finished = row.take("newDevelopmentFinished");
    let flags = status_flags(&status, &finished);

    row.set("renew", flags.renew);
    row.set("new_development", flags.new_development);
    row.set("isFinished", flags.is_finished);
}
