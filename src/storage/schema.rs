//! Database schema definitions
//!
//! Each row carries the whole entity as a JSON document plus the columns
//! needed for lookup and ordering. Timestamps are microseconds since epoch.

/// SQL to create the forms table
pub const CREATE_FORMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS forms (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

/// SQL to create the responses table
/// `form_id` is a weak reference: deleting a form leaves its responses
pub const CREATE_RESPONSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    id TEXT PRIMARY KEY,
    form_id TEXT NOT NULL,
    document TEXT NOT NULL,
    submitted_at INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_forms_updated ON forms(updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_responses_form ON responses(form_id)",
    "CREATE INDEX IF NOT EXISTS idx_responses_submitted ON responses(submitted_at)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_FORMS_TABLE, CREATE_RESPONSES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
