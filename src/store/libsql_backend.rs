//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Nested structures
//! (profiles, exercise lists) are stored as JSON text columns.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::onboarding::UserProfile;
use crate::store::migrations;
use crate::store::traits::Database;
use crate::workouts::{ExerciseSpec, SessionExercise, WorkoutSession, WorkoutTemplate};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn template_version(&self, id: &str) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT version FROM workout_templates WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("template_version: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row.get(0).map_err(|e| {
                DatabaseError::Query(format!("template_version row parse: {e}"))
            })?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("template_version: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<String, DatabaseError> {
    serde_json::to_string(value)
        .map_err(|e| DatabaseError::Serialization(format!("{what}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::Serialization(format!("{what}: {e}")))
}

const TEMPLATE_COLUMNS: &str =
    "id, user_id, name, description, is_ai_plan, exercises, version, created_at, updated_at";

fn row_to_template(row: &libsql::Row) -> Result<WorkoutTemplate, DatabaseError> {
    let parse = |e: libsql::Error| DatabaseError::Query(format!("template row parse: {e}"));

    let exercises_json: String = row.get(5).map_err(parse)?;
    let exercises: Vec<ExerciseSpec> = from_json(&exercises_json, "template exercises")?;
    let created_str: String = row.get(7).map_err(parse)?;
    let updated_str: String = row.get(8).map_err(parse)?;

    Ok(WorkoutTemplate {
        id: row.get(0).map_err(parse)?,
        user_id: row.get(1).map_err(parse)?,
        name: row.get(2).map_err(parse)?,
        description: row.get(3).map_err(parse)?,
        is_ai_plan: row.get::<i64>(4).map_err(parse)? != 0,
        exercises,
        version: row.get(6).map_err(parse)?,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

fn row_to_session(row: &libsql::Row) -> Result<WorkoutSession, DatabaseError> {
    let parse = |e: libsql::Error| DatabaseError::Query(format!("session row parse: {e}"));

    let completed_str: String = row.get(3).map_err(parse)?;
    let exercises_json: String = row.get(4).map_err(parse)?;
    let exercises: Vec<SessionExercise> = from_json(&exercises_json, "session exercises")?;

    Ok(WorkoutSession {
        id: row.get(0).map_err(parse)?,
        user_id: row.get(1).map_err(parse)?,
        template_id: row.get::<String>(2).ok(),
        completed_at: parse_datetime(&completed_str),
        exercises,
    })
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Profiles ────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT profile FROM user_profiles WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_profile row parse: {e}")))?;
                Ok(Some(from_json(&raw, "profile")?))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_profile: {e}"))),
        }
    }

    async fn save_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let json = to_json(profile, "profile")?;
        self.conn()
            .execute(
                "INSERT INTO user_profiles (user_id, profile, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET profile = excluded.profile,
                     updated_at = excluded.updated_at",
                params![user_id, json, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_profile: {e}")))?;

        debug!(user_id, "Profile saved");
        Ok(())
    }

    // ── Templates ───────────────────────────────────────────────────

    async fn get_template(&self, id: &str) -> Result<Option<WorkoutTemplate>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM workout_templates WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_template: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_template(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_template: {e}"))),
        }
    }

    async fn list_templates_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkoutTemplate>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {TEMPLATE_COLUMNS} FROM workout_templates
                     WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_templates_for_user: {e}")))?;

        let mut templates = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_templates_for_user: {e}")))?
        {
            templates.push(row_to_template(&row)?);
        }
        Ok(templates)
    }

    async fn save_template(
        &self,
        template: &WorkoutTemplate,
    ) -> Result<WorkoutTemplate, DatabaseError> {
        let now = Utc::now();
        let exercises = to_json(&template.exercises, "template exercises")?;
        let mut stored = template.clone();
        stored.version = template.version + 1;
        stored.updated_at = now;

        if template.version == 0 {
            self.conn()
                .execute(
                    &format!(
                        "INSERT INTO workout_templates ({TEMPLATE_COLUMNS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                    ),
                    params![
                        template.id.as_str(),
                        template.user_id.as_str(),
                        template.name.as_str(),
                        template.description.as_str(),
                        template.is_ai_plan as i64,
                        exercises,
                        stored.version,
                        template.created_at.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("save_template insert: {e}")))?;

            debug!(template_id = %template.id, user_id = %template.user_id, "Template created");
            return Ok(stored);
        }

        let updated = self
            .conn()
            .execute(
                "UPDATE workout_templates
                 SET name = ?1, description = ?2, is_ai_plan = ?3, exercises = ?4,
                     version = ?5, updated_at = ?6
                 WHERE id = ?7 AND version = ?8",
                params![
                    template.name.as_str(),
                    template.description.as_str(),
                    template.is_ai_plan as i64,
                    exercises,
                    stored.version,
                    now.to_rfc3339(),
                    template.id.as_str(),
                    template.version
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_template update: {e}")))?;

        if updated == 0 {
            return Err(match self.template_version(&template.id).await? {
                Some(_) => DatabaseError::Conflict {
                    entity: "workout_template".into(),
                    id: template.id.clone(),
                    expected: template.version,
                },
                None => DatabaseError::NotFound {
                    entity: "workout_template".into(),
                    id: template.id.clone(),
                },
            });
        }

        debug!(template_id = %template.id, version = stored.version, "Template updated");
        Ok(stored)
    }

    async fn delete_template(&self, id: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM workout_templates WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_template: {e}")))?;
        Ok(deleted > 0)
    }

    // ── Sessions ────────────────────────────────────────────────────

    async fn get_sessions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkoutSession>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, user_id, template_id, completed_at, exercises
                 FROM workout_sessions WHERE user_id = ?1
                 ORDER BY completed_at DESC",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_sessions_for_user: {e}")))?;

        let mut sessions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_sessions_for_user: {e}")))?
        {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }

    async fn save_session(&self, session: &WorkoutSession) -> Result<(), DatabaseError> {
        let exercises = to_json(&session.exercises, "session exercises")?;
        self.conn()
            .execute(
                "INSERT INTO workout_sessions (id, user_id, template_id, completed_at, exercises)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET template_id = excluded.template_id,
                     completed_at = excluded.completed_at, exercises = excluded.exercises",
                params![
                    session.id.as_str(),
                    session.user_id.as_str(),
                    session.template_id.clone(),
                    session.completed_at.to_rfc3339(),
                    exercises
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_session: {e}")))?;

        debug!(session_id = %session.id, user_id = %session.user_id, "Session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::workouts::PerformedSet;

    fn session(user_id: &str, template_id: &str, days_ago: i64) -> WorkoutSession {
        WorkoutSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            template_id: Some(template_id.into()),
            completed_at: Utc::now() - Duration::days(days_ago),
            exercises: vec![SessionExercise {
                id: "e1".into(),
                name: "Squat".into(),
                performed_sets: vec![PerformedSet::new("5", "225 lbs").with_rpe(8.0)],
            }],
        }
    }

    #[tokio::test]
    async fn profile_round_trips_and_upserts() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        assert!(db.get_profile("u1").await.unwrap().is_none());

        let mut profile = UserProfile {
            primary_goal: Some("strength".into()),
            ..Default::default()
        };
        db.save_profile("u1", &profile).await.unwrap();
        profile.primary_goal = Some("hypertrophy".into());
        db.save_profile("u1", &profile).await.unwrap();

        let stored = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(stored.primary_goal.as_deref(), Some("hypertrophy"));
    }

    #[tokio::test]
    async fn template_insert_then_versioned_update() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let template = WorkoutTemplate::new("u1", "Push")
            .with_exercise(ExerciseSpec::new("Bench Press").with_reps("8-10"));

        let v1 = db.save_template(&template).await.unwrap();
        assert_eq!(v1.version, 1);

        let mut edit = v1.clone();
        edit.name = "Push A".into();
        let v2 = db.save_template(&edit).await.unwrap();
        assert_eq!(v2.version, 2);

        let loaded = db.get_template(&template.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Push A");
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.exercises, template.exercises);
    }

    #[tokio::test]
    async fn stale_template_version_conflicts() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let v1 = db
            .save_template(&WorkoutTemplate::new("u1", "Pull"))
            .await
            .unwrap();
        db.save_template(&v1).await.unwrap();

        let err = db.save_template(&v1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict { expected: 1, .. }));
    }

    #[tokio::test]
    async fn updating_missing_template_is_not_found() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let mut ghost = WorkoutTemplate::new("u1", "Legs");
        ghost.version = 3;
        let err = db.save_template(&ghost).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn templates_are_listed_per_user_and_deletable() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let a = db.save_template(&WorkoutTemplate::new("u1", "Day 1")).await.unwrap();
        db.save_template(&WorkoutTemplate::new("u1", "Day 2")).await.unwrap();
        db.save_template(&WorkoutTemplate::new("u2", "Other")).await.unwrap();

        let names: Vec<String> = db
            .list_templates_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Day 1", "Day 2"]);

        assert!(db.delete_template(&a.id).await.unwrap());
        assert!(!db.delete_template(&a.id).await.unwrap());
        assert_eq!(db.list_templates_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sessions_come_back_newest_first() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let old = session("u1", "t1", 7);
        let recent = session("u1", "t1", 1);
        db.save_session(&old).await.unwrap();
        db.save_session(&recent).await.unwrap();
        db.save_session(&session("u2", "t1", 0)).await.unwrap();

        let sessions = db.get_sessions_for_user("u1").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, recent.id);
        assert_eq!(sessions[1].id, old.id);
        assert_eq!(sessions[0].exercises[0].performed_sets[0].rpe, Some(8.0));
    }

    #[tokio::test]
    async fn local_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("coach.db");

        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.save_profile("u1", &UserProfile {
                age: Some(34),
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let profile = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.age, Some(34));
    }

    #[test]
    fn parse_datetime_accepts_sqlite_format() {
        let dt = parse_datetime("2024-05-01 10:00:00");
        assert_eq!(dt.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(parse_datetime("garbage"), DateTime::<Utc>::MIN_UTC);
    }
}
