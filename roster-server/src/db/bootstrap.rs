//! Idempotent schema setup applied on every start.
//!
//! Scripts live under `db.bootstrap_path`, one directory per stage. Stages
//! run in the order of [`STAGES`], scripts within a stage by file name.

use std::fs;
use std::path::{Path, PathBuf};

use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, warn};

use shared::config::server::DatabaseConfig;

/// Stage directories under the bootstrap root, in execution order.
pub const STAGES: [&str; 2] = ["schema", "indexes"];

/// Failure while locating or applying bootstrap scripts.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// `db.bootstrap_path` is not a directory.
    #[error("database bootstrap directory does not exist: {0}")]
    MissingRoot(PathBuf),
    /// A stage directory is missing.
    #[error("database bootstrap stage '{stage}' missing at {path}")]
    MissingStage {
        /// Stage name from [`STAGES`].
        stage: &'static str,
        /// Expected directory.
        path: PathBuf,
    },
    /// A directory or script could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A script failed to execute.
    #[error("database error executing {path}: {source}")]
    Sql {
        /// Script that failed.
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
}

/// Apply every stage's scripts, each in its own transaction.
pub async fn run(pool: &PgPool, config: &DatabaseConfig) -> Result<(), BootstrapError> {
    let root = &config.bootstrap_path;
    if !root.is_dir() {
        return Err(BootstrapError::MissingRoot(root.clone()));
    }

    info!(path = %root.display(), "running database bootstrap");

    for stage in STAGES {
        let scripts = stage_scripts(root, stage)?;
        if scripts.is_empty() {
            debug!(stage, "no bootstrap scripts for stage");
            continue;
        }

        info!(stage, count = scripts.len(), "applying bootstrap scripts");
        for path in &scripts {
            apply_script(pool, path).await?;
        }
    }

    Ok(())
}

/// Round trip used at startup and by the readiness probe.
pub async fn ensure_liveness(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

fn stage_scripts(root: &Path, stage: &'static str) -> Result<Vec<PathBuf>, BootstrapError> {
    let dir = root.join(stage);
    if !dir.is_dir() {
        return Err(BootstrapError::MissingStage { stage, path: dir });
    }
    collect_sql_files(&dir)
}

fn collect_sql_files(dir: &Path) -> Result<Vec<PathBuf>, BootstrapError> {
    let io_error = |source| BootstrapError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut scripts = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()).map_err(io_error))
        .filter(|path| {
            path.as_ref().map_or(true, |path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    scripts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(scripts)
}

async fn apply_script(pool: &PgPool, path: &Path) -> Result<(), BootstrapError> {
    let sql = fs::read_to_string(path).map_err(|source| BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let sql = sql.trim();
    if sql.is_empty() {
        warn!(script = %path.display(), "skipping empty bootstrap script");
        return Ok(());
    }

    let sql_error = |source| BootstrapError::Sql {
        path: path.to_path_buf(),
        source,
    };

    info!(script = %path.display(), "executing bootstrap script");
    let mut transaction = pool.begin().await.map_err(sql_error)?;
    sqlx::raw_sql(sql)
        .execute(&mut *transaction)
        .await
        .map_err(sql_error)?;
    transaction.commit().await.map_err(sql_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn collects_sql_files_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("002_second.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("001_first.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("003_upper.SQL"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let names: Vec<String> = collect_sql_files(dir.path())
            .unwrap()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["001_first.sql", "002_second.sql", "003_upper.SQL"]);
    }

    #[test]
    fn shipped_scripts_cover_every_stage() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("db");
        for stage in STAGES {
            let files = stage_scripts(&root, stage).unwrap();
            assert!(!files.is_empty(), "stage {stage} has no scripts");
        }

        let schema = fs::read_to_string(root.join("schema/001_users.sql")).unwrap();
        assert!(schema.contains("UNIQUE (user_name)"));
    }

    #[test]
    fn missing_stage_is_reported() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("schema")).unwrap();

        assert!(matches!(
            stage_scripts(dir.path(), "indexes"),
            Err(BootstrapError::MissingStage { stage: "indexes", .. })
        ));
    }

    #[test]
    fn unreadable_directory_is_reported() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            collect_sql_files(&dir.path().join("absent")),
            Err(BootstrapError::Io { .. })
        ));
    }
}
