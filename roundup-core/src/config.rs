use roundup_common::{Result, RoundupError};

/// Environment variables the core consumes, per §6.
#[derive(Debug, Clone)]
pub struct Config {
    pub aws_sqs_url_to_signer: String,
    pub aws_sqs_url_from_signer: String,
    pub plaid_env: String,
    pub plaid_client_id: String,
    pub plaid_secret: String,
    pub signer_url: String,
    pub signer_public_key: String,
    pub server_private_key: String,
    pub server_kid: String,
    /// Directory holding the persisted `redb` database. Not part of
    /// spec.md's env var list (which names no storage path); an ambient
    /// addition defaulted so the binaries run out of the box.
    pub data_dir: String,
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| RoundupError::Config(format!("missing environment variable {key}")))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from the process environment, reading a
    /// local `.env` first if present (development convenience only;
    /// production environments set these directly).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            aws_sqs_url_to_signer: require_env("AWS_SQS_URL_TO_SIGNER")?,
            aws_sqs_url_from_signer: require_env("AWS_SQS_URL_FROM_SIGNER")?,
            plaid_env: require_env("PLAID_ENV")?,
            plaid_client_id: require_env("PLAID_CLIENTID")?,
            plaid_secret: require_env("PLAID_SECRET")?,
            signer_url: require_env("SIGNER_URL")?,
            signer_public_key: require_env("SIGNER_PUBLIC_KEY")?,
            server_private_key: require_env("SERVER_PRIVATE_KEY")?,
            server_kid: require_env("SERVER_KID")?,
            data_dir: env_or("ROUNDUP_DATA_DIR", "./data"),
        })
    }

    /// The aggregator's base URL, derived from `PLAID_ENV`.
    pub fn aggregator_base_url(&self) -> String {
        format!("https://{}.plaid.com", self.plaid_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_all_vars() {
        std::env::set_var("AWS_SQS_URL_TO_SIGNER", "https://sqs.example/to-signer");
        std::env::set_var("AWS_SQS_URL_FROM_SIGNER", "https://sqs.example/from-signer");
        std::env::set_var("PLAID_ENV", "sandbox");
        std::env::set_var("PLAID_CLIENTID", "client-id");
        std::env::set_var("PLAID_SECRET", "secret");
        std::env::set_var("SIGNER_URL", "https://signer.example");
        std::env::set_var("SIGNER_PUBLIC_KEY", "deadbeef");
        std::env::set_var("SERVER_PRIVATE_KEY", "deadbeef");
        std::env::set_var("SERVER_KID", "server");
    }

    #[test]
    fn loads_all_fields_when_present() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_all_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.plaid_env, "sandbox");
        assert_eq!(config.aggregator_base_url(), "https://sandbox.plaid.com");
    }

    #[test]
    fn fails_with_config_error_when_a_var_is_missing() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_all_vars();
        std::env::remove_var("SERVER_KID");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, RoundupError::Config(_)));
        std::env::set_var("SERVER_KID", "server");
    }
}
