use std::sync::Arc;

use tracing::instrument;

use crate::{
    errors::ApiError,
    models::user::{NewUser, UserModel},
    services::hooks::{UserChange, UserObserver},
    store::{clause::Fragment, UserStore},
};

/// Validation, storage calls and change notification for users.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    observer: Arc<dyn UserObserver>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, observer: Arc<dyn UserObserver>) -> Self {
        Self { store, observer }
    }

    #[instrument(name = "Service: Create user", skip(self, user))]
    pub async fn create(&self, user: NewUser) -> Result<(), ApiError> {
        if user.email.is_empty() {
            tracing::warn!("Rejected user without email");
            return Err(ApiError::MissingEmail);
        }
        self.store.create_user(&user).await?;
        self.observer.users_changed(UserChange::Created);
        Ok(())
    }

    #[instrument(name = "Service: List users", skip(self, filter))]
    pub async fn list(&self, filter: Vec<Fragment>) -> Result<Vec<UserModel>, ApiError> {
        Ok(self.store.list_users(&filter).await?)
    }

    #[instrument(name = "Service: Update user", skip(self, assignments))]
    pub async fn update(&self, id: &str, assignments: Vec<Fragment>) -> Result<(), ApiError> {
        if assignments.is_empty() {
            return Err(ApiError::NoFieldsToUpdate);
        }
        let affected = self.store.update_user(id, &assignments).await?;
        if affected == 0 {
            tracing::warn!("No user to update");
            return Err(ApiError::NotFound);
        }
        self.observer.users_changed(UserChange::Updated);
        Ok(())
    }

    #[instrument(name = "Service: Delete user", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let affected = self.store.delete_user(id).await?;
        if affected == 0 {
            tracing::warn!("No user to delete");
            return Err(ApiError::NotFound);
        }
        self.observer.users_changed(UserChange::Deleted);
        Ok(())
    }
}
