//! Shared rendering for entity lists.

use std::sync::Arc;

use serde_json::Value;
use tabled::Tabled;

use hearth_core::{EntityRecord, Snapshot};

use crate::error::CliError;
use crate::output;
use crate::session::Session;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Fav")]
    favorite: String,
    #[tabled(rename = "Attributes")]
    attributes: String,
}

impl EntityRow {
    fn new(record: &EntityRecord, color: bool) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name.clone(),
            kind: record.kind.to_string(),
            favorite: output::favorite_marker(record.is_favorite, color),
            attributes: attribute_summary(record),
        }
    }
}

/// One-line `key=value` summary of a record's attributes.
pub fn attribute_summary(record: &EntityRecord) -> String {
    output::key_value_line(&Value::Object(record.attributes.clone()))
}

pub fn render(session: &Session, records: &Snapshot) -> Result<String, CliError> {
    output::render_list(
        session.output,
        records.as_slice(),
        |r: &Arc<EntityRecord>| EntityRow::new(r, session.color),
        |r| r.id.to_string(),
    )
}
