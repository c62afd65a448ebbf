use crate::error::TribacError;
use crate::rules::schema::TablesDef;
use crate::rules::Tables;

const TABLES_JSON: &str = include_str!("../../../../rules/tables.json");

/// Load the tables compiled into the binary.
pub fn load_builtin() -> Result<Tables, TribacError> {
    let def: TablesDef = serde_json::from_str(TABLES_JSON)?;
    Tables::from_def(def)
}
