use std::sync::Arc;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::clock::Clock;
use crate::crypto::PasswordManager;
use crate::database::Storage;
use crate::error::{Error, Result};
use crate::profile::{Profile, ProfileRepository};
use crate::session::{Session, SessionRepository};
use crate::telemetry;
use crate::user::{
    ADMIN_EMAIL, ADMIN_ID, Role, UserAccount, UserBuilder, UserRepository,
};

/// Minimum length of any password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(custom(
        function = "crate::user::validate_email",
        message = "Please enter a valid email"
    ))]
    pub email: String,
    #[validate(length(
        min = 6,
        message = "Password must be at least 6 characters"
    ))]
    pub password: String,
    #[validate(must_match(
        other = "password",
        message = "Passwords do not match"
    ))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Credential validation and account lifecycle.
#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    profiles: ProfileRepository,
    sessions: SessionRepository,
    passwords: Arc<PasswordManager>,
    admin_hash: Arc<str>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a new [`AccountService`].
    ///
    /// `admin_hash` is the PHC string of the built-in administrator password.
    pub fn new(
        storage: Arc<dyn Storage>,
        sessions: SessionRepository,
        passwords: Arc<PasswordManager>,
        admin_hash: Arc<str>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&storage)),
            profiles: ProfileRepository::new(storage),
            sessions,
            passwords,
            admin_hash,
            clock,
        }
    }

    /// Registered-user table.
    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Check credentials and open a session.
    ///
    /// Unknown email and wrong password are reported the same way.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        if email == ADMIN_EMAIL
            && self.passwords.verify_password(password, &self.admin_hash)
        {
            let session = Session::admin();
            self.sessions.establish(session.clone())?;
            telemetry::record_auth_success(ADMIN_ID, Role::Admin.as_str());
            return Ok(session);
        }

        let Some(user) = self.users.find_by_email(email)? else {
            telemetry::record_auth_failure("unknown_email");
            return Err(Error::InvalidCredentials);
        };
        if !self.passwords.verify_password(password, &user.password) {
            telemetry::record_auth_failure("wrong_password");
            return Err(Error::InvalidCredentials);
        }

        let session = Session::from(&user);
        self.sessions.establish(session.clone())?;
        telemetry::record_auth_success(&user.id, user.role.as_str());
        Ok(session)
    }

    /// Create a `user` account and log it in.
    pub fn register(&self, form: RegisterForm) -> Result<Session> {
        form.validate()?;

        if form.email == ADMIN_EMAIL {
            return Err(Error::EmailReserved);
        }
        if self.users.find_by_email(&form.email)?.is_some() {
            return Err(Error::EmailTaken);
        }

        let hash = self.passwords.hash_password(&form.password)?;
        let user = UserBuilder::new()
            .name(form.name)
            .email(form.email)
            .password_hash(hash)
            .build(self.next_user_id()?, self.clock.now());

        self.users.insert(user.clone())?;
        telemetry::record_account_created(&user.id);

        let session = Session::from(&user);
        self.sessions.establish(session.clone())?;
        Ok(session)
    }

    /// Millisecond timestamp, moved forward until unused.
    fn next_user_id(&self) -> Result<String> {
        let users = self.users.all()?;
        let mut millis = self.clock.now_millis();
        while users.iter().any(|u| u.id == millis.to_string()) {
            millis += 1;
        }

        Ok(millis.to_string())
    }

    /// Replace the password of the logged-in account.
    pub fn change_password(&self, form: ChangePasswordForm) -> Result<()> {
        if form.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::WeakPassword {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }
        if form.new_password != form.confirm_password {
            return Err(Error::PasswordMismatch);
        }

        let session = self.sessions.require()?;
        let mut user = self
            .users
            .find_by_email(&session.email)?
            .ok_or(Error::UserNotFound)?;

        if !self
            .passwords
            .verify_password(&form.current_password, &user.password)
        {
            return Err(Error::IncorrectCurrentPassword);
        }

        user.password = self.passwords.hash_password(&form.new_password)?;
        self.users.update(&user)?;

        tracing::info!(user_id = user.id, "password changed");
        Ok(())
    }

    /// Close the current session. Idempotent.
    pub fn logout(&self) -> Result<()> {
        self.sessions.clear()
    }

    /// Profile of the logged-in account.
    pub fn profile(&self) -> Result<Profile> {
        let session = self.sessions.require()?;
        self.profiles.find_or_default(&session.name, &session.email)
    }

    /// Save the profile and propagate name and picture to the account.
    ///
    /// The administrator is never written to the user table.
    pub fn update_profile(&self, mut profile: Profile) -> Result<Session> {
        let mut session = self.sessions.require()?;
        profile.email.clone_from(&session.email);

        if profile.name.trim().is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add(
                "name",
                ValidationError::new("required")
                    .with_message("Name is required".into()),
            );
            return Err(Error::Validation(errors));
        }

        self.profiles.save(&session.email, &profile)?;

        let avatar = profile.profile_picture.map(String::from);
        let changed = profile.name != session.name || avatar != session.avatar;
        if changed && session.email != ADMIN_EMAIL {
            if let Some(mut user) = self.users.find_by_email(&session.email)? {
                user.name.clone_from(&profile.name);
                user.avatar.clone_from(&avatar);
                self.users.update(&user)?;
            }
        }

        session.name = profile.name;
        session.avatar = avatar;
        self.sessions.establish(session.clone())?;

        tracing::info!(user_id = session.id, "profile updated");
        Ok(session)
    }

    /// Change the role of a registered account. Admin only.
    ///
    /// A change to the caller's own account applies to its open session.
    pub fn set_role(&self, user_id: &str, role: Role) -> Result<UserAccount> {
        let session = self.sessions.require()?;
        if !session.is_admin() {
            return Err(Error::Forbidden);
        }

        let mut user =
            self.users.find_by_id(user_id)?.ok_or(Error::UserNotFound)?;
        user.role = role;
        self.users.update(&user)?;

        if user.id == session.id {
            self.sessions.establish(Session::from(&user))?;
        }

        tracing::info!(
            user_id,
            role = role.as_str(),
            admin_id = session.id,
            "role changed"
        );
        Ok(user)
    }

    /// Every registered account, optionally of one role. Admin only.
    pub fn list_users(&self, role: Option<Role>) -> Result<Vec<UserAccount>> {
        if !self.sessions.require()?.is_admin() {
            return Err(Error::Forbidden);
        }

        let mut users = self.users.all()?;
        if let Some(role) = role {
            users.retain(|u| u.role == role);
        }
        Ok(users)
    }

    /// Accept a reset request for any well-formed address.
    ///
    /// Whether the account exists is never revealed.
    pub fn request_password_reset(&self, email: &str) -> Result<()> {
        if let Err(err) = crate::user::validate_email(email) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "email",
                err.with_message("Please enter a valid email".into()),
            );
            return Err(Error::Validation(errors));
        }

        let known = self.users.find_by_email(email)?.is_some();
        tracing::info!(known, "password reset requested");
        Ok(())
    }
}
