use crate::errors::ServerError;

/// Application configuration, read from the environment once at startup and
/// handed to every collaborator explicitly. Nothing in here is looked up
/// again after boot.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Memcached addresses (`host:port`). `None` disables caching entirely.
    pub cache_memcached_servers: Option<Vec<String>>,
    /// TTL in seconds for cached note lists. 0 means no expiry.
    pub cache_default_timeout: u32,
    /// Page size N: how many of the most recent notes are shown and cached.
    pub notes_to_display: i64,
    pub static_hostname: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Config, ServerError> {
        let database_url = std::env::var("DATABASE_URL")?;
        let port = std::env::var("PORT")
            .unwrap_or("8080".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid port number");
        let cache_default_timeout = std::env::var("CACHE_DEFAULT_TIMEOUT")
            .unwrap_or("10".to_string())
            .parse::<u32>()
            .expect("CACHE_DEFAULT_TIMEOUT must be a positive integer");
        let notes_to_display = std::env::var("NOTES_TO_DISPLAY")
            .unwrap_or("20".to_string())
            .parse::<i64>()
            .expect("NOTES_TO_DISPLAY must be a positive integer");
        let cache_memcached_servers = std::env::var("CACHE_MEMCACHED_SERVERS")
            .ok()
            .map(|raw| split_servers(&raw))
            .filter(|servers| !servers.is_empty());
        let static_hostname = std::env::var("STATIC_HOSTNAME").ok();

        Ok(Config {
            database_url,
            port,
            cache_memcached_servers,
            cache_default_timeout,
            notes_to_display,
            static_hostname,
        })
    }

    /// Server identity shown next to each note: the configured override if
    /// any, otherwise the machine's actual host name.
    pub fn hostname(&self) -> String {
        match &self.static_hostname {
            Some(name) => name.clone(),
            None => gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }
}

fn split_servers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|addr| addr.trim())
        .filter(|addr| !addr.is_empty())
        .map(|addr| addr.to_string())
        .collect()
}
