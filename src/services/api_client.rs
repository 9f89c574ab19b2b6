// ============================================================================
// API CLIENT - Somente comunicação HTTP (stateless)
// ============================================================================
// Despacha cada ação enfileirada para a rota fixa do seu tipo, com o corpo
// igual ao `data` persistido e o bearer token do login.
// ============================================================================

use gloo_net::http::Request;

use crate::models::sync::PendingAction;
use crate::services::sync_engine::ActionTransport;
use crate::utils::constants::{API_BASE, CHAVE_TOKEN};
use crate::utils::storage;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn token(&self) -> Result<String, String> {
        storage::load_raw(CHAVE_TOKEN).ok_or_else(|| "Token de acesso não encontrado".to_string())
    }
}

impl ActionTransport for ApiClient {
    async fn enviar(&self, acao: &PendingAction) -> Result<(), String> {
        let token = self.token()?;
        let url = format!("{}{}", self.base_url, acao.payload.kind().rota());
        let corpo = acao.payload.corpo()?;

        let response = Request::post(&url)
            .header("Authorization", &format!("Bearer {}", token))
            .json(&corpo)
            .map_err(|e| format!("Erro montando requisição: {}", e))?
            .send()
            .await
            .map_err(|e| format!("Erro de rede: {}", e))?;

        if response.ok() {
            Ok(())
        } else {
            let status = response.status();
            let texto = response
                .text()
                .await
                .unwrap_or_else(|_| "erro desconhecido".to_string());
            Err(format!("HTTP {}: {}", status, texto))
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
