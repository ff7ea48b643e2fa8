use std::path::Path;

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::MigrationDefinition;
use tracing::debug;

/// Marker line opening the up section of a migration file.
pub const UP_MARKER: &str = "-- migrate:up";
/// Marker line opening the down section of a migration file.
pub const DOWN_MARKER: &str = "-- migrate:down";

/// Load migration definitions from a directory.
///
/// Migrations are named like:
/// - `20240101120000.sql`
/// - `20240101120000_create_users.sql`
///
/// Everything before the first `_` is the version, the rest becomes the
/// description. Non-`.sql` files are ignored and a missing directory yields
/// no migrations.
pub fn load_definitions_from_dir(dir: &Path) -> Result<Vec<MigrationDefinition>> {
    if !dir.exists() {
        debug!("Migrations directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut definitions = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if !path.is_file() || path.extension().map(|e| e != "sql").unwrap_or(true) {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MigratorError::Registry(format!("Invalid migration filename: {:?}", path)))?;

        let content = std::fs::read_to_string(&path)?;
        definitions.push(parse_migration(stem, &content)?);
    }

    debug!("Loaded {} migrations from {:?}", definitions.len(), dir);
    Ok(definitions)
}

/// Parse one migration file given its file stem and content.
pub fn parse_migration(stem: &str, content: &str) -> Result<MigrationDefinition> {
    let (version, description) = match stem.split_once('_') {
        Some((version, rest)) => (version, Some(rest.replace('_', " "))),
        None => (stem, None),
    };

    if version.trim().is_empty() {
        return Err(MigratorError::Registry(format!(
            "Migration filename must start with a version: {}",
            stem
        )));
    }

    let (up, down) = split_sections(content);

    let mut definition = MigrationDefinition::new(version, up);
    if let Some(down) = down {
        definition = definition.with_down(down);
    }
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        definition = definition.with_description(description);
    }
    Ok(definition)
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Up,
    Down,
}

/// Split file content into up and down SQL. A file without markers is all up.
fn split_sections(content: &str) -> (String, Option<String>) {
    let has_markers = content.lines().any(|l| is_marker(l, UP_MARKER) || is_marker(l, DOWN_MARKER));
    if !has_markers {
        return (content.trim().to_string(), None);
    }

    let mut up = Vec::new();
    let mut down = Vec::new();
    let mut section = Section::Header;

    for line in content.lines() {
        if is_marker(line, UP_MARKER) {
            section = Section::Up;
            continue;
        }
        if is_marker(line, DOWN_MARKER) {
            section = Section::Down;
            continue;
        }

        match section {
            Section::Up => up.push(line),
            Section::Down => down.push(line),
            Section::Header => {}
        }
    }

    let down = down.join("\n").trim().to_string();
    (
        up.join("\n").trim().to_string(),
        if down.is_empty() { None } else { Some(down) },
    )
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim().eq_ignore_ascii_case(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_core::migration::{Direction, Version};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(load_definitions_from_dir(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_from_nonexistent_dir() {
        let defs = load_definitions_from_dir(Path::new("/nonexistent/path")).unwrap();
        assert!(defs.is_empty());
    }

    #[test]
    fn test_load_ignores_non_sql() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("0001_migration.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("readme.txt"), "Not a migration").unwrap();
        fs::write(dir.path().join("backup.sql.bak"), "Backup").unwrap();

        let defs = load_definitions_from_dir(dir.path()).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].version, Version::new("0001"));
        assert_eq!(defs[0].description.as_deref(), Some("migration"));
    }

    #[test]
    fn test_parse_sections() {
        let content = "-- Migration 1\n\n-- migrate:up\nCREATE TABLE users (id INT);\n\n-- migrate:down\nDROP TABLE users;\n";
        let def = parse_migration("20240101000000_create_users", content).unwrap();

        assert_eq!(def.version, Version::new("20240101000000"));
        assert_eq!(def.description.as_deref(), Some("create users"));
        assert_eq!(def.up, "CREATE TABLE users (id INT);");
        assert_eq!(def.sql(Direction::Down), Some("DROP TABLE users;"));
    }

    #[test]
    fn test_parse_without_markers_is_up_only() {
        let def = parse_migration("0002", "SELECT 2;\n").unwrap();
        assert_eq!(def.up, "SELECT 2;");
        assert!(!def.is_reversible());
        assert!(def.description.is_none());
    }

    #[test]
    fn test_parse_blank_down_is_irreversible() {
        let content = "-- migrate:up\nSELECT 1;\n-- migrate:down\n    \n";
        let def = parse_migration("3", content).unwrap();
        assert!(!def.is_reversible());
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let content = "-- MIGRATE:UP\nSELECT 1;\n  -- Migrate:Down\nSELECT 0;";
        let def = parse_migration("4", content).unwrap();
        assert_eq!(def.up, "SELECT 1;");
        assert_eq!(def.down.as_deref(), Some("SELECT 0;"));
    }

    #[test]
    fn test_missing_version_rejected() {
        let err = parse_migration("_create_users", "SELECT 1;").unwrap_err();
        assert!(matches!(err, MigratorError::Registry(_)));
    }
}
