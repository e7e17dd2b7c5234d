//! Typed builder for UserAccount.

use chrono::{DateTime, Utc};

use crate::user::{Role, UserAccount};

/// [`UserAccount`] builder.
///
/// An account cannot be built without an email and a password hash.
#[derive(Debug, Clone)]
pub struct UserBuilder<Email, Password> {
    name: String,
    email: Email,
    password: Password,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            name: String::default(),
            email: Missing,
            password: Missing,
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Password> UserBuilder<Missing, Password> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Present<String>, Password> {
        UserBuilder {
            name: self.name,
            email: Present(email.into()),
            password: self.password,
        }
    }
}

impl<Email> UserBuilder<Email, Missing> {
    /// Set the already hashed password.
    pub fn password_hash(
        self,
        phc: impl Into<String>,
    ) -> UserBuilder<Email, Present<String>> {
        UserBuilder {
            name: self.name,
            email: self.email,
            password: Present(phc.into()),
        }
    }
}

impl<Email, Password> UserBuilder<Email, Password> {
    /// Update display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Finalize a `user` account with its generated identifier.
    pub fn build(self, id: String, created_at: DateTime<Utc>) -> UserAccount {
        let UserBuilder {
            name,
            email: Present(email),
            password: Present(password),
        } = self;

        UserAccount {
            id,
            name,
            email,
            password,
            role: Role::User,
            avatar: None,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let account = UserBuilder::new()
            .name("Jane")
            .password_hash("$argon2id$hash")
            .email("jane@unifyr.com")
            .build("1761825600000".into(), DateTime::UNIX_EPOCH);

        assert_eq!(account.email, "jane@unifyr.com");
        assert_eq!(account.name, "Jane");
        assert_eq!(account.role, Role::User);
        assert_eq!(account.avatar, None);
    }
}
