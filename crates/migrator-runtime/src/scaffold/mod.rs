//! Scaffolding of new migration files.

pub mod template;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use migrator_core::config::MigrationSetConfig;
use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::Version;

use crate::registry::{MigrationRegistry, DOWN_MARKER, UP_MARKER};
use crate::template_vars;

/// Timestamp layout of generated versions.
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Template used when a migration set configures none.
pub const DEFAULT_TEMPLATE: &str = "-- Migration {{version}}
-- Namespace: {{namespace}}

-- migrate:up
{{up}}

-- migrate:down
{{down}}
";

const DEFAULT_INDENT: usize = 4;

/// Values substituted into a migration template.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholders<'a> {
    pub namespace: &'a str,
    pub version: &'a str,
    pub up: Option<&'a str>,
    pub down: Option<&'a str>,
}

/// A migration file written by [`ScaffoldGenerator::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedMigration {
    pub version: Version,
    pub path: PathBuf,
}

/// Creates new migration files in a migration set's directory.
#[derive(Debug, Clone)]
pub struct ScaffoldGenerator {
    output_dir: PathBuf,
    namespace: String,
    indent: String,
}

impl ScaffoldGenerator {
    pub fn new(output_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            namespace: namespace.into(),
            indent: " ".repeat(DEFAULT_INDENT),
        }
    }

    pub fn from_config(config: &MigrationSetConfig) -> Self {
        Self::new(config.migrations_dir(), config.migrations_namespace())
    }

    /// Indent body placeholders by `width` spaces.
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// A version greater than everything in `registry`.
    pub fn next_version(&self, registry: &MigrationRegistry) -> Result<Version> {
        next_version_at(Utc::now(), registry.latest())
    }

    /// Substitute placeholders into `template`.
    ///
    /// Bodies are indented line by line; an absent body leaves its
    /// placeholder blank. Lines made only of spaces are emptied afterwards.
    pub fn render(&self, template: &str, placeholders: &Placeholders<'_>) -> String {
        let up = placeholders
            .up
            .map(|body| self.indent_body(body))
            .unwrap_or_default();
        let down = placeholders
            .down
            .map(|body| self.indent_body(body))
            .unwrap_or_default();

        let vars = template_vars!(
            "namespace" => placeholders.namespace,
            "version" => placeholders.version,
            "up" => up.as_str(),
            "down" => down.as_str(),
        );

        template::render(template, &vars)
            .split('\n')
            .map(|line| {
                if !line.is_empty() && line.bytes().all(|b| b == b' ') {
                    ""
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write a new migration file next to the ones in `registry`.
    pub fn generate(
        &self,
        registry: &MigrationRegistry,
        template: Option<&str>,
        up: Option<&str>,
        down: Option<&str>,
    ) -> Result<GeneratedMigration> {
        let version = self.next_version(registry)?;
        let content = self.render(
            template.unwrap_or(DEFAULT_TEMPLATE),
            &Placeholders {
                namespace: &self.namespace,
                version: version.as_str(),
                up,
                down,
            },
        );

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.sql", version));
        if path.exists() {
            return Err(MigratorError::InvalidState(format!(
                "Migration file {:?} already exists",
                path
            )));
        }
        std::fs::write(&path, content)?;

        info!("Generated new migration {} at {:?}", version, path);
        Ok(GeneratedMigration { version, path })
    }

    fn indent_body(&self, body: &str) -> String {
        body.split('\n')
            .map(|line| format!("{}{}", self.indent, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The timestamp version for `now`, bumped past `latest` when the clock has
/// not moved beyond it.
pub fn next_version_at(now: DateTime<Utc>, latest: Option<&Version>) -> Result<Version> {
    let candidate = Version::new(now.format(VERSION_FORMAT).to_string());

    match latest {
        Some(latest) if *latest >= candidate => latest
            .as_u64()
            .and_then(|n| n.checked_add(1))
            .map(|n| Version::new(n.to_string()))
            .ok_or_else(|| {
                MigratorError::InvalidState(format!(
                    "Cannot generate a version after {}",
                    latest
                ))
            }),
        _ => Ok(candidate),
    }
}

/// Whether `content` carries both section markers the registry loader reads.
pub fn has_section_markers(content: &str) -> bool {
    let lower = content.to_ascii_lowercase();
    lower.contains(UP_MARKER) && lower.contains(DOWN_MARKER)
}

/// Scaffold a migration into the set's directory.
///
/// Versions are picked against the files currently on disk. `template`
/// overrides the configured template file; with neither, the built-in
/// template is used.
pub fn scaffold_migration(
    config: &MigrationSetConfig,
    template: Option<&Path>,
    up: Option<&str>,
    down: Option<&str>,
) -> Result<GeneratedMigration> {
    let registry = MigrationRegistry::load_from_dir(&config.migrations_dir())?;

    let template = match template.or(config.template.as_deref()) {
        Some(path) => Some(load_template(path)?),
        None => None,
    };

    ScaffoldGenerator::from_config(config).generate(&registry, template.as_deref(), up, down)
}

/// Read a template file.
pub fn load_template(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MigratorError::Template(format!("Failed to read template {:?}: {}", path, e))
    })?;
    if !has_section_markers(&content) {
        warn!(
            "Template {:?} has no up/down markers; generated migrations will be all up",
            path
        );
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use migrator_core::migration::MigrationDefinition;
    use tempfile::TempDir;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_next_version_uses_timestamp() {
        let version = next_version_at(at(2024, 3, 5, 7, 8, 9), None).unwrap();
        assert_eq!(version.as_str(), "20240305070809");
    }

    #[test]
    fn test_next_version_is_greater_than_latest() {
        let now = at(2024, 1, 1, 0, 0, 0);

        let latest = Version::new("20240101000000");
        let next = next_version_at(now, Some(&latest)).unwrap();
        assert_eq!(next.as_str(), "20240101000001");
        assert!(next > latest);

        let future = Version::new("20990101000000");
        assert_eq!(
            next_version_at(now, Some(&future)).unwrap().as_str(),
            "20990101000001"
        );

        let older = Version::new("20230101000000");
        assert_eq!(
            next_version_at(now, Some(&older)).unwrap().as_str(),
            "20240101000000"
        );
    }

    #[test]
    fn test_next_version_after_non_numeric() {
        let latest = Version::new("zzz");
        let err = next_version_at(at(2024, 1, 1, 0, 0, 0), Some(&latest)).unwrap_err();
        assert!(matches!(err, MigratorError::InvalidState(_)));
    }

    #[test]
    fn test_render_indents_bodies() {
        let generator = ScaffoldGenerator::new("/tmp/unused", "app::migrations");
        let output = generator.render(
            DEFAULT_TEMPLATE,
            &Placeholders {
                namespace: generator.namespace(),
                version: "20240101000000",
                up: Some("CREATE TABLE a (id INT);\n\nCREATE INDEX a_id ON a (id);"),
                down: Some("DROP TABLE a;"),
            },
        );

        assert_eq!(
            output,
            "-- Migration 20240101000000\n\
             -- Namespace: app::migrations\n\
             \n\
             -- migrate:up\n    CREATE TABLE a (id INT);\n\n    CREATE INDEX a_id ON a (id);\n\
             \n\
             -- migrate:down\n    DROP TABLE a;\n"
        );
        assert!(has_section_markers(&output));
    }

    #[test]
    fn test_render_absent_bodies_are_blank() {
        let generator = ScaffoldGenerator::new("/tmp/unused", "ns");
        let output = generator.render(
            "{{up}}|{{down}}|{{unknown}}",
            &Placeholders {
                namespace: "ns",
                version: "1",
                up: None,
                down: None,
            },
        );
        assert_eq!(output, "||{{unknown}}");
    }

    #[test]
    fn test_render_blanks_space_only_lines() {
        let generator = ScaffoldGenerator::new("/tmp/unused", "ns").with_indent(2);
        let output = generator.render(
            "a\n   \n{{up}}",
            &Placeholders {
                up: Some("x\n\ny"),
                ..Default::default()
            },
        );
        assert_eq!(output, "a\n\n  x\n\n  y");
    }

    #[test]
    fn test_load_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.tpl");
        std::fs::write(&path, "{{up}}").unwrap();

        assert_eq!(load_template(&path).unwrap(), "{{up}}");
        assert!(matches!(
            load_template(&dir.path().join("missing.tpl")),
            Err(MigratorError::Template(_))
        ));
    }

    #[test]
    fn test_generate_round_trip() {
        let dir = TempDir::new().unwrap();
        let generator = ScaffoldGenerator::new(dir.path().join("Migrations"), "app::migrations");
        let template = "-- {{namespace}} {{version}}\n-- migrate:up\n{{up}}\n";

        let generated = generator
            .generate(&MigrationRegistry::new(), Some(template), Some("echo hello"), None)
            .unwrap();

        let written = std::fs::read_to_string(&generated.path).unwrap();
        let expected = template
            .replace("{{namespace}}", "app::migrations")
            .replace("{{version}}", generated.version.as_str())
            .replace("{{up}}", "    echo hello");
        assert_eq!(written, expected);
        assert_eq!(
            generated.path,
            dir.path()
                .join("Migrations")
                .join(format!("{}.sql", generated.version))
        );
    }

    #[test]
    fn test_generated_file_loads_into_registry() {
        let dir = TempDir::new().unwrap();
        let generator = ScaffoldGenerator::new(dir.path(), "ns");
        let existing = MigrationRegistry::from_definitions([MigrationDefinition::new(
            "20990101000000",
            "SELECT 1;",
        )])
        .unwrap();

        let generated = generator
            .generate(
                &existing,
                None,
                Some("CREATE TABLE a (id INT);"),
                Some("DROP TABLE a;"),
            )
            .unwrap();
        assert_eq!(generated.version.as_str(), "20990101000001");

        let registry = MigrationRegistry::load_from_dir(dir.path()).unwrap();
        let migration = registry.get(&generated.version).unwrap();
        assert_eq!(migration.up.trim(), "CREATE TABLE a (id INT);");
        assert_eq!(migration.down.as_deref().map(str::trim), Some("DROP TABLE a;"));
    }

    #[test]
    fn test_scaffold_migration_follows_files_on_disk() {
        let dir = TempDir::new().unwrap();
        let config = MigrationSetConfig::new("test", dir.path(), "app");
        let migrations = config.migrations_dir();
        std::fs::create_dir_all(&migrations).unwrap();
        std::fs::write(migrations.join("20990101000000.sql"), "SELECT 1;").unwrap();

        let generated = scaffold_migration(&config, None, Some("SELECT 2;"), None).unwrap();
        assert_eq!(generated.version.as_str(), "20990101000001");

        let content = std::fs::read_to_string(&generated.path).unwrap();
        assert!(content.starts_with("-- Migration 20990101000001\n-- Namespace: app::migrations"));
    }

    #[test]
    fn test_scaffold_migration_template_precedence() {
        let dir = TempDir::new().unwrap();
        let configured = dir.path().join("configured.tpl");
        let explicit = dir.path().join("explicit.tpl");
        std::fs::write(&configured, "configured {{up}}").unwrap();
        std::fs::write(&explicit, "explicit {{up}}").unwrap();

        let config = MigrationSetConfig::new("test", dir.path(), "app").with_template(&configured);

        let generated = scaffold_migration(&config, None, Some("a"), None).unwrap();
        assert_eq!(std::fs::read_to_string(&generated.path).unwrap(), "configured     a");

        let generated = scaffold_migration(&config, Some(&explicit), Some("b"), None).unwrap();
        assert_eq!(std::fs::read_to_string(&generated.path).unwrap(), "explicit     b");
    }
}
