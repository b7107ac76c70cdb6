//! Calorie Tracker
//!
//! A small personal-tracking backend:
//! - Email/password accounts (bcrypt) and Google OAuth login
//! - Stateless HS256 JWTs for every protected call
//! - Per-user calorie entries stored in Neo4j

pub mod api;
pub mod auth;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::api::handlers::ServerState;
use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::store::{MemoryStore, Neo4jStore, Store};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub auth: AuthConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    /// Origins allowed by CORS (credentials are allowed, so no wildcard)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allowed_origins: vec!["http://localhost:5174".into()],
        }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "calorie123".into(),
        }
    }
}

/// Authentication configuration.
///
/// ```yaml
/// auth:
///   jwt_secret: "change-me"
///   jwt_expiry_secs: 86400
///   frontend_url: "http://localhost:5174"
///   state_cookie:
///     domain: "api.example.com"
///   google:
///     client_id: "123.apps.googleusercontent.com"
///     client_secret: "..."
///     redirect_uri: "http://localhost:8080/auth/google/callback"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT signing secret (HS256). Required.
    pub jwt_secret: String,
    /// JWT token lifetime in seconds (default: 86400 = 24h)
    pub jwt_expiry_secs: u64,
    pub bcrypt_cost: u32,
    /// Where the OAuth callback redirects with `?token=`
    pub frontend_url: String,
    pub state_cookie: StateCookieConfig,
    /// Google login. None disables the OAuth routes.
    pub google: Option<GoogleConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_secs: 86400,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            frontend_url: "http://localhost:5174".into(),
            state_cookie: StateCookieConfig::default(),
            google: None,
        }
    }
}

/// Attributes of the `oauthstate` cookie
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateCookieConfig {
    /// `Domain` attribute; None makes a host-only cookie
    pub domain: Option<String>,
    pub max_age_secs: u64,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for StateCookieConfig {
    fn default() -> Self {
        Self {
            domain: None,
            max_age_secs: 7200,
            secure: false,
            http_only: false,
        }
    }
}

/// Google OAuth2 client configuration. Endpoints default to Google's.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    /// Space-separated scopes
    pub scopes: String,
    /// Timeout for each call to Google
    pub request_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:8080/auth/google/callback".into(),
            auth_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_endpoint: "https://oauth2.googleapis.com/token".into(),
            userinfo_endpoint: "https://www.googleapis.com/oauth2/v3/userinfo".into(),
            scopes: "openid email profile".into(),
            request_timeout_secs: 5,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub allowed_origins: Vec<String>,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub auth: AuthConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file falls
    /// back to env vars / defaults; a file that fails to parse is an error.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path)?;
        let mut auth = yaml.auth;

        if let Some(secret) = env_var("JWT_SECRET") {
            auth.jwt_secret = secret;
        }
        if let Some(url) = env_var("FRONTEND_URL") {
            auth.frontend_url = url;
        }
        if let Some(domain) = env_var("OAUTH_COOKIE_DOMAIN") {
            auth.state_cookie.domain = Some(domain);
        }

        let client_id = env_var("GOOGLE_CLIENT_ID");
        if client_id.is_some() || auth.google.is_some() {
            let mut google = auth.google.take().unwrap_or_default();
            if let Some(id) = client_id {
                google.client_id = id;
            }
            if let Some(secret) = env_var("GOOGLE_CLIENT_SECRET") {
                google.client_secret = secret;
            }
            if let Some(uri) = env_var("GOOGLE_REDIRECT_URI") {
                google.redirect_uri = uri;
            }
            // Without a client id Google login stays disabled
            if !google.client_id.is_empty() {
                auth.google = Some(google);
            }
        }

        Ok(Self {
            server_port: env_var("SERVER_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            allowed_origins: yaml.server.allowed_origins,
            neo4j_uri: env_var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: env_var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: env_var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            auth,
        })
    }

    /// Load and parse a YAML config file. Returns defaults when the file
    /// does not exist.
    fn load_yaml(yaml_path: Option<&Path>) -> Result<YamlConfig> {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                tracing::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                Ok(YamlConfig::default())
            }
        }
    }

    /// Startup preconditions
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must be set (auth.jwt_secret in config.yaml)");
        }
        if self.auth.jwt_expiry_secs == 0 {
            anyhow::bail!("auth.jwt_expiry_secs must be greater than zero");
        }
        if let Some(google) = &self.auth.google {
            if google.client_secret.is_empty() {
                anyhow::bail!("GOOGLE_CLIENT_SECRET must be set when Google login is enabled");
            }
        }
        Ok(())
    }
}

// ============================================================================
// Server
// ============================================================================

/// Connect the store, build the router and serve until Ctrl-C.
///
/// `in_memory` replaces Neo4j with a process-local store (data is lost on exit).
pub async fn start_server(config: Config, in_memory: bool) -> Result<()> {
    config.validate()?;

    let store: Arc<dyn Store> = if in_memory {
        tracing::warn!("Using in-memory store; data will not be persisted");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            Neo4jStore::new(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
                .await
                .context("Failed to connect to Neo4j")?,
        )
    };

    let state = Arc::new(ServerState::new(&config.auth, store)?);
    if state.google.is_none() {
        tracing::info!("Google login not configured; OAuth routes will answer 403");
    }

    let app = api::create_router(state, &config.allowed_origins);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Calorie tracker listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  port: 9090
  allowed_origins: ["https://app.example.com"]

neo4j:
  uri: bolt://db:7687
  user: admin
  password: secret

auth:
  jwt_secret: "super-secret-key-min-32-characters!"
  jwt_expiry_secs: 3600
  bcrypt_cost: 10
  frontend_url: "https://app.example.com"
  state_cookie:
    domain: "api.example.com"
    secure: true
  google:
    client_id: "123.apps.googleusercontent.com"
    client_secret: "secret123"
    redirect_uri: "https://api.example.com/auth/google/callback"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.allowed_origins, vec!["https://app.example.com"]);
        assert_eq!(config.neo4j.uri, "bolt://db:7687");

        let auth = config.auth;
        assert_eq!(auth.jwt_expiry_secs, 3600);
        assert_eq!(auth.bcrypt_cost, 10);
        assert_eq!(auth.state_cookie.domain.as_deref(), Some("api.example.com"));
        assert!(auth.state_cookie.secure);
        assert!(!auth.state_cookie.http_only);
        assert_eq!(auth.state_cookie.max_age_secs, 7200);

        let google = auth.google.unwrap();
        assert_eq!(google.client_id, "123.apps.googleusercontent.com");
        // Unset fields keep Google's endpoints
        assert_eq!(google.token_endpoint, "https://oauth2.googleapis.com/token");
        assert_eq!(google.scopes, "openid email profile");
        assert_eq!(google.request_timeout_secs, 5);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:5174"]);
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.user, "neo4j");
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.jwt_expiry_secs, 86400);
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert!(config.auth.google.is_none());
    }

    #[test]
    fn test_partial_auth_section() {
        let yaml = r#"
auth:
  jwt_secret: "min-32-chars-secret-key-for-test!"
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.auth.jwt_expiry_secs, 86400);
        assert_eq!(config.auth.frontend_url, "http://localhost:5174");
        assert!(config.auth.google.is_none());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_yaml_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 7000\nauth:\n  jwt_secret: file-secret"
        )
        .unwrap();

        let yaml = Config::load_yaml(Some(file.path())).unwrap();
        assert_eq!(yaml.server.port, 7000);
        assert_eq!(yaml.auth.jwt_secret, "file-secret");
    }

    #[test]
    fn test_load_yaml_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = Config::load_yaml(Some(&dir.path().join("nope.yaml"))).unwrap();
        assert_eq!(yaml.server.port, 8080);
    }

    #[test]
    fn test_load_yaml_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [not, a, map").unwrap();
        assert!(Config::load_yaml(Some(file.path())).is_err());
    }

    fn config_with(auth: AuthConfig) -> Config {
        Config {
            server_port: 8080,
            allowed_origins: vec![],
            neo4j_uri: "bolt://localhost:7687".into(),
            neo4j_user: "neo4j".into(),
            neo4j_password: "x".into(),
            auth,
        }
    }

    #[test]
    fn test_validate_requires_secret() {
        assert!(config_with(AuthConfig::default()).validate().is_err());

        let auth = AuthConfig {
            jwt_secret: "s".into(),
            ..AuthConfig::default()
        };
        assert!(config_with(auth).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_expiry() {
        let auth = AuthConfig {
            jwt_secret: "s".into(),
            jwt_expiry_secs: 0,
            ..AuthConfig::default()
        };
        assert!(config_with(auth).validate().is_err());
    }

    #[test]
    fn test_validate_requires_google_secret() {
        let auth = AuthConfig {
            jwt_secret: "s".into(),
            google: Some(GoogleConfig {
                client_id: "id".into(),
                ..GoogleConfig::default()
            }),
            ..AuthConfig::default()
        };
        assert!(config_with(auth).validate().is_err());
    }
}
