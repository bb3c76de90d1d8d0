//! Delivery preference reads and wholesale replacement.

use std::sync::Arc;

use tracing::info;

use herald_core::result::AppResult;
use herald_core::types::id::UserId;
use herald_database::PreferenceStore;
use herald_entity::notification::NotificationType;
use herald_entity::preference::PreferenceSummary;

/// Shared by the live dispatcher and the REST handlers.
#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
}

impl std::fmt::Debug for PreferenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceService").finish()
    }
}

impl PreferenceService {
    /// Creates a new preference service.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// The user's two-channel summary. No rows means everything is enabled.
    pub async fn get(&self, user_id: UserId) -> AppResult<PreferenceSummary> {
        let rows = self.store.list_for_user(user_id).await?;
        Ok(PreferenceSummary::from_rows(&rows))
    }

    /// Replaces every row for the user, then reads the result back.
    pub async fn replace(
        &self,
        user_id: UserId,
        preferences: PreferenceSummary,
    ) -> AppResult<PreferenceSummary> {
        self.store
            .replace_for_user(user_id, &preferences.to_rows())
            .await?;
        info!(
            user_id = %user_id,
            email = preferences.email_notifications,
            push = preferences.push_notifications,
            "Delivery preferences replaced"
        );
        self.get(user_id).await
    }

    /// Whether any enabled row covers `notification_type`.
    ///
    /// Users without rows have everything enabled.
    pub async fn has_preference_enabled(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> AppResult<bool> {
        let rows = self.store.list_for_user(user_id).await?;
        if rows.is_empty() {
            return Ok(true);
        }
        Ok(rows
            .iter()
            .any(|r| r.enabled && r.applies_to(notification_type.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use herald_database::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_defaults_to_enabled() {
        let service = PreferenceService::new(Arc::new(MemoryStore::new()));
        let user = UserId::new();
        assert_eq!(service.get(user).await.unwrap(), PreferenceSummary::default());
        assert!(
            service
                .has_preference_enabled(user, NotificationType::Mention)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        let service = PreferenceService::new(Arc::new(MemoryStore::new()));
        let user = UserId::new();
        let wanted = PreferenceSummary {
            email_notifications: false,
            push_notifications: true,
        };

        let first = service.replace(user, wanted).await.unwrap();
        let second = service.replace(user, wanted).await.unwrap();
        assert_eq!(first, wanted);
        assert_eq!(second, wanted);
    }

    #[tokio::test]
    async fn test_everything_disabled() {
        let service = PreferenceService::new(Arc::new(MemoryStore::new()));
        let user = UserId::new();
        let off = PreferenceSummary {
            email_notifications: false,
            push_notifications: false,
        };

        assert_eq!(service.replace(user, off).await.unwrap(), off);
        assert!(
            !service
                .has_preference_enabled(user, NotificationType::Comment)
                .await
                .unwrap()
        );
    }
}
