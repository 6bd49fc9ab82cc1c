//! User service - profile and account administration.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, Paginated, PaginationParams};
use domain::{User, UserStatus};

use crate::repository::UserRepository;

/// Longest accepted display name, in characters
const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Set or clear the display name. Blank names clear it.
    async fn update_display_name(&self, id: Uuid, display_name: Option<String>)
        -> AppResult<User>;

    /// List users, newest first
    async fn list_users(&self, params: &PaginationParams) -> AppResult<Paginated<User>>;

    /// Activate or suspend an account. Admins cannot change their own status.
    async fn set_status(&self, actor: Uuid, id: Uuid, status: UserStatus) -> AppResult<User>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: Option<String>,
    ) -> AppResult<User> {
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        if let Some(name) = &display_name {
            if name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
                return Err(AppError::validation(format!(
                    "Display name must be at most {} characters",
                    MAX_DISPLAY_NAME_LENGTH
                )));
            }
        }

        self.repo.update_display_name(id, display_name).await
    }

    async fn list_users(&self, params: &PaginationParams) -> AppResult<Paginated<User>> {
        let users = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(Paginated::new(users, params, total))
    }

    async fn set_status(&self, actor: Uuid, id: Uuid, status: UserStatus) -> AppResult<User> {
        if actor == id {
            return Err(AppError::bad_request("Cannot change your own account status"));
        }

        let user = self.repo.update_status(id, status).await?;
        tracing::info!(
            target: "security",
            actor = %actor,
            user_id = %id,
            status = %status,
            "Account status changed"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::MockUserRepository;
    use domain::UserRole;

    fn create_test_user(id: Uuid) -> User {
        User {
            id,
            email: "test@example.com".to_string(),
            password_hash: "hashed".to_string(),
            display_name: None,
            role: UserRole::Applicant,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserManager::new(Arc::new(repo));
        let result = service.get_user(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_blank_display_name_clears_it() {
        let id = Uuid::new_v4();
        let mut repo = MockUserRepository::new();
        repo.expect_update_display_name()
            .with(eq(id), eq(None::<String>))
            .returning(|id, _| Ok(create_test_user(id)));

        let service = UserManager::new(Arc::new(repo));
        service
            .update_display_name(id, Some("   ".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_display_name_is_trimmed() {
        let id = Uuid::new_v4();
        let mut repo = MockUserRepository::new();
        repo.expect_update_display_name()
            .with(eq(id), eq(Some("Ada".to_string())))
            .returning(|id, name| {
                let mut user = create_test_user(id);
                user.display_name = name;
                Ok(user)
            });

        let service = UserManager::new(Arc::new(repo));
        let user = service
            .update_display_name(id, Some("  Ada ".to_string()))
            .await
            .unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_overlong_display_name_rejected() {
        let mut repo = MockUserRepository::new();
        repo.expect_update_display_name().never();

        let service = UserManager::new(Arc::new(repo));
        let result = service
            .update_display_name(Uuid::new_v4(), Some("x".repeat(101)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_users_paginates() {
        let mut repo = MockUserRepository::new();
        repo.expect_list()
            .with(eq(20), eq(20))
            .returning(|_, _| Ok(vec![create_test_user(Uuid::new_v4())]));
        repo.expect_count().returning(|| Ok(21));

        let service = UserManager::new(Arc::new(repo));
        let page = service
            .list_users(&PaginationParams { page: 2, per_page: 20 })
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.total_pages, 2);
    }

    #[tokio::test]
    async fn test_admin_cannot_suspend_self() {
        let mut repo = MockUserRepository::new();
        repo.expect_update_status().never();

        let service = UserManager::new(Arc::new(repo));
        let id = Uuid::new_v4();
        let result = service.set_status(id, id, UserStatus::Suspended).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_set_status() {
        let target = Uuid::new_v4();
        let mut repo = MockUserRepository::new();
        repo.expect_update_status()
            .with(eq(target), eq(UserStatus::Suspended))
            .returning(|id, status| {
                let mut user = create_test_user(id);
                user.status = status;
                Ok(user)
            });

        let service = UserManager::new(Arc::new(repo));
        let user = service
            .set_status(Uuid::new_v4(), target, UserStatus::Suspended)
            .await
            .unwrap();
        assert_eq!(user.status, UserStatus::Suspended);
    }
}
