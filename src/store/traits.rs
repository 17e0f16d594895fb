//! `Database` trait: the narrow persistence contract the coach relies on.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::onboarding::UserProfile;
use crate::workouts::{WorkoutSession, WorkoutTemplate};

/// Backend-agnostic store for profiles, templates and sessions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Profiles ────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;

    /// Insert or replace the user's profile.
    async fn save_profile(&self, user_id: &str, profile: &UserProfile)
    -> Result<(), DatabaseError>;

    // ── Templates ───────────────────────────────────────────────────

    async fn get_template(&self, id: &str) -> Result<Option<WorkoutTemplate>, DatabaseError>;

    /// All templates owned by `user_id`, oldest first.
    async fn list_templates_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkoutTemplate>, DatabaseError>;

    /// Insert a template with `version == 0`, or update one whose stored
    /// version equals `template.version`. Returns the stored template with
    /// its bumped version; a stale version is `DatabaseError::Conflict`.
    async fn save_template(
        &self,
        template: &WorkoutTemplate,
    ) -> Result<WorkoutTemplate, DatabaseError>;

    /// Returns whether a template was deleted.
    async fn delete_template(&self, id: &str) -> Result<bool, DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    /// Every session logged by `user_id`, newest first.
    async fn get_sessions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkoutSession>, DatabaseError>;

    async fn save_session(&self, session: &WorkoutSession) -> Result<(), DatabaseError>;
}
