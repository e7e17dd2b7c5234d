//! Per-user profile documents.
//!
//! A profile is display data only. It never takes part in authentication.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::database::{self, Storage, profile_key};
use crate::error::{Error, Result};

/// Largest accepted picture, in decoded bytes.
pub const MAX_AVATAR_SIZE: usize = 2 * 1024 * 1024;

/// Inline profile picture as a `data:image/...;base64,` URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Avatar(String);

impl Avatar {
    /// Validate a data URL.
    pub fn parse(data_url: impl Into<String>) -> Result<Self> {
        let data_url = data_url.into();
        let (header, payload) = data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or(Error::InvalidAvatar("not a data URL"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(Error::InvalidAvatar("payload must be base64"))?;

        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| Error::InvalidAvatar("payload must be base64"))?;

        Self::check(mime, bytes.len())?;
        Ok(Self(data_url))
    }

    /// Encode raw image bytes.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self> {
        Self::check(mime, bytes.len())?;
        Ok(Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes))))
    }

    /// Read a picture from disk, guessing its type from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let size = std::fs::metadata(path)
            .map_err(|err| Error::internal("cannot read picture", err))?
            .len();
        Self::check(
            mime.essence_str(),
            usize::try_from(size).unwrap_or(usize::MAX),
        )?;

        let bytes = std::fs::read(path)
            .map_err(|err| Error::internal("cannot read picture", err))?;

        Self::from_bytes(mime.essence_str(), &bytes)
    }

    fn check(mime: &str, size: usize) -> Result<()> {
        if !mime.starts_with("image/") {
            return Err(Error::InvalidAvatar("please upload an image file"));
        }
        if size > MAX_AVATAR_SIZE {
            return Err(Error::InvalidAvatar("file size must be less than 2MB"));
        }
        Ok(())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Avatar {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Avatar> for String {
    fn from(avatar: Avatar) -> Self {
        avatar.0
    }
}

/// Profile as saved under `profile_<email>`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub bio: String,
    pub profile_picture: Option<Avatar>,
}

#[derive(Clone)]
pub struct ProfileRepository {
    storage: Arc<dyn Storage>,
}

impl ProfileRepository {
    /// Create a new [`ProfileRepository`].
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored profile of `email`.
    pub fn find(&self, email: &str) -> Result<Option<Profile>> {
        Ok(database::read_json(self.storage.as_ref(), &profile_key(email))?)
    }

    /// Stored profile, or one seeded from the account's name and email.
    pub fn find_or_default(&self, name: &str, email: &str) -> Result<Profile> {
        Ok(self.find(email)?.unwrap_or_else(|| Profile {
            name: name.to_owned(),
            email: email.to_owned(),
            ..Default::default()
        }))
    }

    pub fn save(&self, email: &str, profile: &Profile) -> Result<()> {
        Ok(database::write_json(
            self.storage.as_ref(),
            &profile_key(email),
            profile,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStorage;

    #[test]
    fn test_avatar_parse() {
        let avatar = Avatar::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(avatar.as_str(), "data:image/png;base64,iVBORw0KGgo=");

        assert!(matches!(
            Avatar::parse("data:text/plain;base64,aGk="),
            Err(Error::InvalidAvatar(_))
        ));
        assert!(matches!(
            Avatar::parse("https://cdn/x.png"),
            Err(Error::InvalidAvatar(_))
        ));
        assert!(matches!(
            Avatar::parse("data:image/svg+xml,<svg/>"),
            Err(Error::InvalidAvatar(_))
        ));
    }

    #[test]
    fn test_avatar_size_cap() {
        assert!(Avatar::from_bytes("image/jpeg", &vec![0; MAX_AVATAR_SIZE]).is_ok());
        assert!(matches!(
            Avatar::from_bytes("image/jpeg", &vec![0; MAX_AVATAR_SIZE + 1]),
            Err(Error::InvalidAvatar(_))
        ));
    }

    #[test]
    fn test_avatar_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        let avatar = Avatar::from_file(&path).unwrap();
        assert_eq!(avatar.as_str(), "data:image/png;base64,iVBORw==");

        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hi").unwrap();
        assert!(Avatar::from_file(&path).is_err());
    }

    #[test]
    fn test_avatar_payload_must_decode() {
        assert!(matches!(
            Avatar::parse("data:image/png;base64,!!!!not*base64@@@@"),
            Err(Error::InvalidAvatar("payload must be base64"))
        ));

        let oversized = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(vec![0; MAX_AVATAR_SIZE + 1])
        );
        assert!(matches!(
            Avatar::parse(oversized),
            Err(Error::InvalidAvatar(_))
        ));
    }

    #[test]
    fn test_avatar_from_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_AVATAR_SIZE as u64 + 1).unwrap();

        assert!(matches!(
            Avatar::from_file(&path),
            Err(Error::InvalidAvatar("file size must be less than 2MB"))
        ));
    }

    #[test]
    fn test_repository() {
        let repo = ProfileRepository::new(Arc::new(MemoryStorage::default()));
        let seeded = repo.find_or_default("Jane", "jane@unifyr.com").unwrap();
        assert_eq!(seeded.name, "Jane");
        assert_eq!(seeded.city, "");

        let profile = Profile {
            city: "Lagos".into(),
            ..seeded
        };
        repo.save("jane@unifyr.com", &profile).unwrap();
        assert_eq!(repo.find("jane@unifyr.com").unwrap(), Some(profile));
        assert_eq!(repo.find("john@unifyr.com").unwrap(), None);
    }
}
