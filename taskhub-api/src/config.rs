/// Configuration management for the API server
///
/// Configuration is read from environment variables, with a `.env` file loaded
/// first when present.
///
/// # Environment Variables
///
/// | Variable | Default |
/// |---|---|
/// | `API_HOST` | `0.0.0.0` |
/// | `API_PORT` | `8080` |
/// | `API_PUBLIC_URL` | `http://localhost:8080` |
/// | `CORS_ORIGINS` | `*` (comma separated) |
/// | `PRODUCTION` | `false` |
/// | `DATABASE_URL` | required |
/// | `DATABASE_MAX_CONNECTIONS` | `10` |
/// | `JWT_SECRET` | required, at least 32 characters |
/// | `JWT_ACCESS_TTL_HOURS` | `24` |
/// | `REQUIRE_VERIFIED_LOGIN` | `false` |
/// | `MAIL_TRANSPORT` | `console` (`console` or `smtp`) |
/// | `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD` | port `587` |
/// | `MAIL_FROM` | `TaskHub <no-reply@localhost>` |
/// | `UPLOAD_DIR` | `uploads` |
/// | `UPLOAD_MAX_BYTES` | `5242880` |
/// | `LOG_FORMAT` | `pretty` (`pretty` or `json`) |
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use anyhow::Context;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub uploads: UploadConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Externally reachable base URL, used in emailed links and upload URIs
    pub public_url: String,

    /// Allowed CORS origins, `*` for any
    pub cors_origins: Vec<String>,

    /// Enables production-only headers (HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT and login configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in hours
    pub access_ttl_hours: i64,

    /// Reject logins of unverified accounts
    pub require_verified_login: bool,
}

/// Mail transport selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransport {
    Console,
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub from: String,
}

/// Profile image uploads
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploads are written to
    pub dir: String,

    /// Largest accepted upload
    pub max_bytes: usize,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(name, default)
        .parse::<T>()
        .with_context(|| format!("{} has an invalid value", name))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value doesn't parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = var_or("API_HOST", "0.0.0.0");
        let port: u16 = parse_var("API_PORT", "8080")?;
        let public_url = var_or("API_PUBLIC_URL", &format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();
        let cors_origins = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let production: bool = parse_var("PRODUCTION", "false")?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections: u32 = parse_var("DATABASE_MAX_CONNECTIONS", "10")?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let access_ttl_hours: i64 = parse_var("JWT_ACCESS_TTL_HOURS", "24")?;
        if access_ttl_hours <= 0 {
            anyhow::bail!("JWT_ACCESS_TTL_HOURS must be positive");
        }
        let require_verified_login: bool = parse_var("REQUIRE_VERIFIED_LOGIN", "false")?;

        let transport = match var_or("MAIL_TRANSPORT", "console")
            .to_ascii_lowercase()
            .as_str()
        {
            "console" => MailTransport::Console,
            "smtp" => MailTransport::Smtp {
                host: env::var("SMTP_HOST").map_err(|_| {
                    anyhow::anyhow!("SMTP_HOST is required when MAIL_TRANSPORT=smtp")
                })?,
                port: parse_var("SMTP_PORT", "587")?,
                username: optional_var("SMTP_USERNAME"),
                password: optional_var("SMTP_PASSWORD"),
            },
            other => anyhow::bail!(
                "MAIL_TRANSPORT must be 'console' or 'smtp', got '{}'",
                other
            ),
        };

        let log_format: LogFormat = var_or("LOG_FORMAT", "pretty").parse()?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                public_url,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_hours,
                require_verified_login,
            },
            mail: MailConfig {
                transport,
                from: var_or("MAIL_FROM", "TaskHub <no-reply@localhost>"),
            },
            uploads: UploadConfig {
                dir: var_or("UPLOAD_DIR", "uploads"),
                max_bytes: parse_var("UPLOAD_MAX_BYTES", "5242880")?,
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Public base URL of uploaded files
    pub fn uploads_url(&self) -> String {
        format!("{}/uploads", self.api.public_url)
    }

    /// Configuration for tests and local tooling
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.into(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                access_ttl_hours: 24,
                require_verified_login: false,
            },
            mail: MailConfig {
                transport: MailTransport::Console,
                from: "TaskHub <no-reply@localhost>".to_string(),
            },
            uploads: UploadConfig {
                dir: "uploads".to_string(),
                max_bytes: 5 * 1024 * 1024,
            },
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let config = Config::for_tests("postgresql://localhost/test");
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_uploads_url() {
        let config = Config::for_tests("postgresql://localhost/test");
        assert_eq!(config.uploads_url(), "http://localhost:8080/uploads");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
