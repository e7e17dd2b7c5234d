//! Registered-user table.

use std::sync::Arc;

use crate::database::{self, Storage, USERS_KEY};
use crate::error::{Error, Result};
use crate::user::{ADMIN_EMAIL, UserAccount};

#[derive(Clone)]
pub struct UserRepository {
    storage: Arc<dyn Storage>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Every registered account, in registration order.
    pub fn all(&self) -> Result<Vec<UserAccount>> {
        Ok(database::read_json(self.storage.as_ref(), USERS_KEY)?
            .unwrap_or_default())
    }

    fn save_all(&self, users: &[UserAccount]) -> Result<()> {
        Ok(database::write_json(self.storage.as_ref(), USERS_KEY, users)?)
    }

    /// Number of registered accounts.
    pub fn count(&self) -> Result<usize> {
        Ok(self.all()?.len())
    }

    /// Find account using exact `email` match.
    pub fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        Ok(self.all()?.into_iter().find(|u| u.email == email))
    }

    /// Find account using `id` field.
    pub fn find_by_id(&self, user_id: &str) -> Result<Option<UserAccount>> {
        Ok(self.all()?.into_iter().find(|u| u.id == user_id))
    }

    /// Append [`UserAccount`] to the table.
    ///
    /// Fails without writing anything when the email is reserved or taken.
    pub fn insert(&self, user: UserAccount) -> Result<()> {
        if user.email == ADMIN_EMAIL {
            return Err(Error::EmailReserved);
        }

        let mut users = self.all()?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(Error::EmailTaken);
        }

        users.push(user);
        self.save_all(&users)
    }

    /// Replace the account with the same `id` in place.
    pub fn update(&self, user: &UserAccount) -> Result<()> {
        let mut users = self.all()?;
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(Error::UserNotFound)?;
        *slot = user.clone();

        self.save_all(&users)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::database::MemoryStorage;
    use crate::user::UserBuilder;

    fn account(id: &str, email: &str) -> UserAccount {
        UserBuilder::new()
            .email(email)
            .password_hash("$argon2id$v=19$m=256,t=1,p=1$c2FsdA$aGFzaA")
            .name("Test")
            .build(id.into(), DateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_insert_and_find() {
        let repo = UserRepository::new(Arc::new(MemoryStorage::default()));

        repo.insert(account("1", "a@b.co")).unwrap();
        repo.insert(account("2", "c@d.co")).unwrap();

        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.find_by_email("c@d.co").unwrap().unwrap().id, "2");
        assert_eq!(repo.find_by_id("1").unwrap().unwrap().email, "a@b.co");
        // Case-sensitive.
        assert!(repo.find_by_email("A@b.co").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_never_mutates() {
        let repo = UserRepository::new(Arc::new(MemoryStorage::default()));
        repo.insert(account("1", "a@b.co")).unwrap();
        let before = repo.all().unwrap();

        let err = repo.insert(account("2", "a@b.co")).unwrap_err();
        assert!(matches!(err, Error::EmailTaken));
        assert_eq!(repo.all().unwrap(), before);

        let err = repo.insert(account("3", ADMIN_EMAIL)).unwrap_err();
        assert!(matches!(err, Error::EmailReserved));
        assert_eq!(repo.all().unwrap(), before);
    }

    #[test]
    fn test_update_unknown() {
        let repo = UserRepository::new(Arc::new(MemoryStorage::default()));
        let err = repo.update(&account("1", "a@b.co")).unwrap_err();
        assert!(matches!(err, Error::UserNotFound));
    }
}
