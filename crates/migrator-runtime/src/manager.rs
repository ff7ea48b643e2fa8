use std::path::{Path, PathBuf};

use tracing::debug;

use migrator_core::config::{MigrationOwner, MigrationSetConfig};
use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{Alias, StepExecutor, VersionLedger};

use crate::db::Database;
use crate::engine::{MigrationEngine, MigrationOutcome, MigrationStatus, PgExecutor};
use crate::ledger::PgLedger;
use crate::registry::MigrationRegistry;
use crate::scaffold::{scaffold_migration, GeneratedMigration};

/// One configured migration set bound to its ledger and executor.
pub struct MigrationManager<L, E> {
    config: MigrationSetConfig,
    engine: MigrationEngine<L, E>,
}

impl MigrationManager<PgLedger, PgExecutor> {
    /// Bind a migration set to a PostgreSQL database, creating its ledger
    /// table if needed.
    pub async fn connect(database: &Database, config: MigrationSetConfig) -> Result<Self> {
        config.validate()?;

        let ledger = PgLedger::new(database.pool().clone(), config.table_name());
        ledger.init().await?;

        let mut executor =
            PgExecutor::new(database.pool().clone()).transactional(config.transactional);
        if let Some(timeout) = database.statement_timeout() {
            executor = executor.statement_timeout(timeout);
        }

        Self::with_backends(config, ledger, executor)
    }

    pub async fn create(
        database: &Database,
        name: &str,
        path: impl Into<PathBuf>,
        namespace: &str,
    ) -> Result<Self> {
        Self::connect(database, MigrationSetConfig::new(name, path, namespace)).await
    }

    pub async fn create_for_owner(database: &Database, owner: &impl MigrationOwner) -> Result<Self> {
        Self::connect(database, MigrationSetConfig::from_owner(owner)).await
    }
}

impl<L, E> MigrationManager<L, E>
where
    L: VersionLedger,
    E: StepExecutor,
{
    /// Build a manager over explicit backends.
    ///
    /// The migrations directory is created when missing and scanned into the
    /// registry.
    pub fn with_backends(config: MigrationSetConfig, ledger: L, executor: E) -> Result<Self> {
        config.validate()?;

        let dir = config.migrations_dir();
        std::fs::create_dir_all(&dir)?;
        let registry = MigrationRegistry::load_from_dir(&dir)?;
        debug!(
            "Migration set '{}' has {} migration(s) in {:?}",
            config.name,
            registry.len(),
            dir
        );

        Ok(Self {
            config,
            engine: MigrationEngine::new(registry, ledger, executor),
        })
    }

    pub fn config(&self) -> &MigrationSetConfig {
        &self.config
    }

    pub fn engine(&self) -> &MigrationEngine<L, E> {
        &self.engine
    }

    /// Ledger table name for an owner name.
    pub fn normalize_name(name: &str) -> String {
        migrator_core::migration::normalize_name(name)
    }

    /// The migrations directory. Fails if it has been removed.
    pub fn migration_directory(&self) -> Result<PathBuf> {
        let dir = self.config.migrations_dir();
        if !dir.is_dir() {
            return Err(MigratorError::Config(format!(
                "Migrations directory {:?} does not exist",
                dir
            )));
        }
        Ok(dir)
    }

    /// Rescan the migrations directory.
    pub fn reload(&mut self) -> Result<()> {
        let registry = MigrationRegistry::load_from_dir(&self.migration_directory()?)?;
        self.engine.replace_registry(registry);
        Ok(())
    }

    /// Migrate to the version `alias` resolves to.
    pub async fn migrate(&self, alias: &str, dry_run: bool) -> Result<MigrationOutcome> {
        self.engine.migrate(&Alias::parse(alias), dry_run).await
    }

    pub async fn status(&self) -> Result<MigrationStatus> {
        self.engine.status().await
    }

    /// Write the SQL that migrating to `alias` would run.
    pub async fn write_sql(&self, alias: &str, destination: &Path) -> Result<PathBuf> {
        self.engine
            .write_sql(&Alias::parse(alias), destination)
            .await
    }

    /// Scaffold a new migration file.
    ///
    /// `template` overrides the configured template file; with neither, the
    /// built-in template is used.
    pub fn generate(
        &mut self,
        template: Option<&Path>,
        up: Option<&str>,
        down: Option<&str>,
    ) -> Result<GeneratedMigration> {
        let generated = scaffold_migration(&self.config, template, up, down)?;
        self.reload()?;
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::testing::RecordingExecutor;
    use migrator_core::migration::Version;
    use tempfile::TempDir;

    type TestManager = MigrationManager<InMemoryLedger, RecordingExecutor>;

    fn manager(dir: &TempDir) -> TestManager {
        MigrationManager::with_backends(
            MigrationSetConfig::new("test", dir.path(), "app"),
            InMemoryLedger::new(),
            RecordingExecutor::new(),
        )
        .unwrap()
    }

    fn write_migration(dir: &TempDir, file: &str, content: &str) {
        std::fs::write(dir.path().join("Migrations").join(file), content).unwrap();
    }

    #[test]
    fn test_configuration() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        assert_eq!(manager.config().table_name(), "test_migrations");
        assert_eq!(manager.config().migrations_namespace(), "app::migrations");
        assert_eq!(
            manager.migration_directory().unwrap(),
            dir.path().join("Migrations")
        );
        assert!(dir.path().join("Migrations").is_dir());

        // the directory already exists the second time
        let again = self::manager(&dir);
        assert_eq!(again.engine().registry().len(), 0);
    }

    #[test]
    fn test_invalid_configuration() {
        let dir = TempDir::new().unwrap();
        let result = TestManager::with_backends(
            MigrationSetConfig::new("", dir.path(), "app"),
            InMemoryLedger::new(),
            RecordingExecutor::new(),
        );
        assert!(matches!(result, Err(MigratorError::Config(_))));
    }

    #[test]
    fn test_missing_migration_directory() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        std::fs::remove_dir(dir.path().join("Migrations")).unwrap();

        assert!(matches!(
            manager.migration_directory(),
            Err(MigratorError::Config(_))
        ));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(TestManager::normalize_name("testFooBar"), "test_foo_bar_migrations");
        assert_eq!(TestManager::normalize_name("AppBundle"), "app_migrations");
    }

    #[tokio::test]
    async fn test_loads_existing_migrations() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Migrations")).unwrap();
        write_migration(
            &dir,
            "1_create_users.sql",
            "-- migrate:up\nCREATE TABLE users (id INT);\n-- migrate:down\nDROP TABLE users;\n",
        );
        write_migration(&dir, "2.sql", "CREATE INDEX users_id ON users (id);\n");

        let manager = manager(&dir);
        let outcome = manager.migrate("latest", false).await.unwrap();
        assert_eq!(outcome.applied, 2);

        let status = manager.status().await.unwrap();
        assert_eq!(status.current, Some(Version::new("2")));
        assert!(status.pending.is_empty());

        let err = manager.migrate("foobar", false).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown version: foobar");

        // 2 has no down section
        let err = manager.migrate("first", false).await.unwrap_err();
        assert!(matches!(err, MigratorError::Irreversible(_)));
    }

    #[tokio::test]
    async fn test_generate_then_migrate() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);

        let generated = manager
            .generate(None, Some("CREATE TABLE a (id INT);"), Some("DROP TABLE a;"))
            .unwrap();
        assert!(generated.path.starts_with(dir.path().join("Migrations")));

        let content = std::fs::read_to_string(&generated.path).unwrap();
        assert!(content.contains("-- Namespace: app::migrations"));
        assert!(content.contains("    CREATE TABLE a (id INT);"));

        let status = manager.status().await.unwrap();
        assert_eq!(status.pending, vec![generated.version.clone()]);

        let outcome = manager.migrate("latest", false).await.unwrap();
        assert_eq!(outcome.applied, 1);

        let outcome = manager.migrate("first", false).await.unwrap();
        assert_eq!(outcome.applied, 1);
        assert!(manager.status().await.unwrap().current.is_none());
    }

    #[test]
    fn test_generate_versions_increase() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);

        let first = manager.generate(None, Some("SELECT 1;"), None).unwrap();
        let second = manager.generate(None, Some("SELECT 2;"), None).unwrap();

        assert!(second.version > first.version);
        assert_eq!(manager.engine().registry().len(), 2);
    }

    #[test]
    fn test_generate_with_configured_template() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("migration.tpl");
        std::fs::write(&template, "-- {{version}}\n-- migrate:up\n{{up}}\n-- migrate:down\n{{down}}\n")
            .unwrap();

        let mut manager = MigrationManager::with_backends(
            MigrationSetConfig::new("test", dir.path(), "app").with_template(&template),
            InMemoryLedger::new(),
            RecordingExecutor::new(),
        )
        .unwrap();

        let generated = manager.generate(None, Some("SELECT 1;"), None).unwrap();
        let content = std::fs::read_to_string(&generated.path).unwrap();
        assert_eq!(
            content,
            format!(
                "-- {}\n-- migrate:up\n    SELECT 1;\n-- migrate:down\n\n",
                generated.version
            )
        );
    }

    #[test]
    fn test_generate_sees_files_added_after_load() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);
        write_migration(&dir, "20990101000000.sql", "SELECT 1;");

        let generated = manager.generate(None, Some("SELECT 2;"), None).unwrap();
        assert_eq!(generated.version, Version::new("20990101000001"));
        assert_eq!(manager.engine().registry().len(), 2);
    }

    #[test]
    fn test_generate_with_missing_template() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);

        let err = manager
            .generate(Some(&dir.path().join("missing.tpl")), None, None)
            .unwrap_err();
        assert!(matches!(err, MigratorError::Template(_)));
    }

    #[tokio::test]
    async fn test_write_sql() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);
        manager
            .generate(None, Some("CREATE TABLE a (id INT);"), None)
            .unwrap();

        let target = dir.path().join("out.sql");
        let path = manager.write_sql("latest", &target).await.unwrap();

        assert_eq!(path, target);
        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.contains("CREATE TABLE a (id INT);"));
        assert!(manager.status().await.unwrap().current.is_none());
    }
}
