//! Unifyr is a multi-service marketplace core: accounts, order pricing,
//! order ledger and invoices over a local key-value store.

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod order;
pub mod profile;
pub mod session;
pub mod telemetry;
pub mod user;

use std::sync::Arc;

use clock::{Clock, SystemClock};
use config::Configuration;
use crypto::PasswordManager;
use database::{FileStorage, Storage};
use error::Result;
use order::{InvoiceRenderer, OrderLedger};
use session::{Session, SessionRepository};
use user::AccountService;

/// Composition root sharing state between services.
#[derive(Clone)]
pub struct Unifyr {
    pub config: Arc<Configuration>,
    sessions: SessionRepository,
    accounts: AccountService,
    orders: OrderLedger,
    invoices: InvoiceRenderer,
}

impl Unifyr {
    /// Wire every service over `storage`, restoring the stored session.
    pub fn start(
        config: Arc<Configuration>,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let passwords = Arc::new(PasswordManager::new(config.argon2.clone())?);
        // Only the hash of the admin password is kept around.
        let admin_hash: Arc<str> =
            passwords.ensure_hashed(&config.admin.password)?.into();

        let sessions = SessionRepository::load(Arc::clone(&storage))?;
        let accounts = AccountService::new(
            Arc::clone(&storage),
            sessions.clone(),
            passwords,
            admin_hash,
            Arc::clone(&clock),
        );

        if let Some(session) = sessions.current() {
            tracing::debug!(user_id = session.id, "session restored");
        }

        Ok(Self {
            orders: OrderLedger::new(storage, clock),
            invoices: InvoiceRenderer::new(&config),
            config,
            sessions,
            accounts,
        })
    }

    /// Read `config.yaml` and open the file storage it points to.
    pub fn initialize() -> std::result::Result<Self, Box<dyn std::error::Error>>
    {
        let config = Configuration::default().read()?;
        let storage = Arc::new(FileStorage::open(&config.storage.path)?);

        Ok(Self::start(config, storage, Arc::new(SystemClock))?)
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn orders(&self) -> &OrderLedger {
        &self.orders
    }

    pub fn invoices(&self) -> &InvoiceRenderer {
        &self.invoices
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.sessions.current()
    }

    /// Current session or [`error::Error::NotAuthenticated`].
    pub fn require_session(&self) -> Result<Session> {
        self.sessions.require()
    }

    pub fn logout(&self) -> Result<()> {
        self.accounts.logout()
    }

    /// A remote API rejected the bearer token: drop the session.
    pub fn unauthorized(&self) -> Result<()> {
        tracing::warn!("credentials rejected, closing session");
        self.sessions.clear()
    }
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::clock::{Clock, FixedClock};
    use crate::config::{self, Configuration};
    use crate::database::{MemoryStorage, Storage};
    use crate::Unifyr;

    /// 2025-10-30T12:00:00Z.
    pub const NOW: u64 = 1_761_825_600_000;

    /// Argon2 parameters fast enough for unit tests.
    pub fn cheap_argon2() -> config::Argon2 {
        config::Argon2 {
            memory_cost: 256,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }
    }

    pub fn config() -> Arc<Configuration> {
        let mut config = Configuration::default();
        config.argon2 = Some(cheap_argon2());
        Arc::new(config)
    }

    /// Instance over an empty in-memory storage, clock frozen at [`NOW`].
    pub fn unifyr() -> (Unifyr, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let app = restart(&storage, Arc::new(FixedClock::new(NOW)));
        (app, storage)
    }

    /// New instance over an existing storage.
    pub fn restart(storage: &Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Unifyr {
        Unifyr::start(config(), Arc::clone(storage), clock)
            .expect("test instance starts")
    }
}
