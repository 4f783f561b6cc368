use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "DRIVE_NOTES_PORT";
    pub const HOST: &str = "DRIVE_NOTES_HOST";
    /// `drive` (default) or `memory`
    pub const STORAGE: &str = "DRIVE_NOTES_STORAGE";
    pub const GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
    pub const GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
    pub const GOOGLE_REFRESH_TOKEN: &str = "GOOGLE_REFRESH_TOKEN";
    /// Service-account email. Detected only to explain why it is not used.
    pub const GOOGLE_CLIENT_EMAIL: &str = "GOOGLE_CLIENT_EMAIL";
    pub const GOOGLE_DRIVE_FOLDER_ID: &str = "GOOGLE_DRIVE_FOLDER_ID";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 9110;
    pub const HOST: &str = "127.0.0.1";
}

/// Where notes are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Drive,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "drive" | "" => Some(StorageBackend::Drive),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

/// OAuth client credentials plus the refresh token that keeps them usable
#[derive(Clone)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub folder_id: Option<String>,
    pub credentials: Option<DriveCredentials>,
    /// Set when only service-account credentials were found
    pub service_account_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty(env_vars::PORT) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("{} is not a valid port: {}, using {}", env_vars::PORT, raw, defaults::PORT);
                defaults::PORT
            }),
            None => defaults::PORT,
        };

        let storage = match non_empty(env_vars::STORAGE) {
            Some(raw) => StorageBackend::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown {} value: {}, using drive", env_vars::STORAGE, raw);
                StorageBackend::Drive
            }),
            None => StorageBackend::Drive,
        };

        let credentials = match (
            non_empty(env_vars::GOOGLE_CLIENT_ID),
            non_empty(env_vars::GOOGLE_CLIENT_SECRET),
            non_empty(env_vars::GOOGLE_REFRESH_TOKEN),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(DriveCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => None,
        };

        Self {
            host: non_empty(env_vars::HOST).unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            storage,
            folder_id: non_empty(env_vars::GOOGLE_DRIVE_FOLDER_ID),
            credentials,
            service_account_email: non_empty(env_vars::GOOGLE_CLIENT_EMAIL),
        }
    }

    /// Credentials for the Drive backend, with startup warnings about what is missing.
    pub fn drive_credentials(&self) -> Result<DriveCredentials, String> {
        if let Some(creds) = &self.credentials {
            return Ok(creds.clone());
        }

        if let Some(email) = &self.service_account_email {
            log::warn!(
                "Service account {} configured. Service accounts have no storage quota on personal drives; use OAuth instead.",
                email
            );
        }

        Err(format!(
            "MISSING CREDENTIALS: set {}, {} and {} (OAuth) to use Drive storage",
            env_vars::GOOGLE_CLIENT_ID,
            env_vars::GOOGLE_CLIENT_SECRET,
            env_vars::GOOGLE_REFRESH_TOKEN
        ))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
