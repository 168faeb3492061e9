use std::env;

/// Runtime configuration, read once at startup
///
/// Everything has a development default and can be overridden through the
/// environment, so the service runs out of the box against a local backend.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Base URL of the backend collaborator (search, prompts, exports)
    pub backend_url: String,

    /// Authorize endpoint of the OAuth identity provider
    pub oauth_authorize_url: String,

    /// OAuth client id registered with the provider
    pub oauth_client_id: String,

    /// Redirect URL the provider sends the user back to
    pub oauth_redirect_url: String,

    /// Scope identifier used when a page does not specify one
    pub default_scope: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "127.0.0.1:3000".to_string(),
            backend_url: "http://127.0.0.1:8080".to_string(),
            oauth_authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            oauth_client_id: "docassist-dev".to_string(),
            oauth_redirect_url: "http://127.0.0.1:3000/auth/callback".to_string(),
            default_scope: "001".to_string(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables
    ///
    /// Unset variables fall back to the development defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        AppConfig {
            bind_addr: env_or("DOCASSIST_ADDR", &defaults.bind_addr),
            backend_url: env_or("DOCASSIST_BACKEND_URL", &defaults.backend_url),
            oauth_authorize_url: env_or(
                "DOCASSIST_OAUTH_AUTHORIZE_URL",
                &defaults.oauth_authorize_url,
            ),
            oauth_client_id: env_or("DOCASSIST_OAUTH_CLIENT_ID", &defaults.oauth_client_id),
            oauth_redirect_url: env_or(
                "DOCASSIST_OAUTH_REDIRECT_URL",
                &defaults.oauth_redirect_url,
            ),
            default_scope: env_or("DOCASSIST_DEFAULT_SCOPE", &defaults.default_scope),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.default_scope, "001");
        assert!(config.backend_url.starts_with("http://"));
    }
}
