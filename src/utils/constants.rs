/// URL base da API REST
/// Configurada em tempo de compilação:
/// - Desenvolvimento: http://localhost:3001 (padrão)
/// - Produção: via API_BASE_URL no .env
pub const API_BASE: &str = match option_env!("API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:3001",
};

/// Chave do localStorage com o token de acesso (gravado pelo fluxo de login)
pub const CHAVE_TOKEN: &str = "access_token";
