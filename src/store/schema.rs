// On-disk schema, kept compatible with databases created by earlier releases.
// `path` alone is the primary key: one row per path regardless of type.

pub const ASSETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
    path VARCHAR NOT NULL PRIMARY KEY,
    content VARCHAR,
    type VARCHAR,
    create_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    update_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(path)
)
"#;

pub const ASSETS_UPDATE_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS assets__update
    AFTER
    UPDATE
    ON assets
    FOR EACH ROW
BEGIN
    UPDATE assets SET update_at=CURRENT_TIMESTAMP WHERE path=OLD.path;
END
"#;

// Not read or written by the asset layer.
pub const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username TEXT,
    password TEXT,
    create_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    update_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Statements run, in order, when a store is opened
pub const MIGRATIONS: [&str; 3] = [ASSETS_TABLE, ASSETS_UPDATE_TRIGGER, USERS_TABLE];
