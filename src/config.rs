use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub environment: String,
    pub enable_logging: bool,
    /// Intervalo entre verificações de atualização do service worker (minutos)
    pub update_check_minutes: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AppConfig {
    /// Carrega a configuração de variáveis de ambiente em tempo de compilação
    pub fn from_env() -> Self {
        Self {
            api_base_url: option_env!("API_BASE_URL")
                .unwrap_or("http://localhost:3001")
                .to_string(),
            environment: option_env!("ENVIRONMENT").unwrap_or("development").to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true")
                .parse()
                .unwrap_or(true),
            update_check_minutes: option_env!("UPDATE_CHECK_MINUTES")
                .unwrap_or("30")
                .parse()
                .unwrap_or(30),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base_url
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

// Configuração global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
