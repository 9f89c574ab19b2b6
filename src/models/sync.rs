// ============================================================================
// MODELO DE SINCRONIZAÇÃO OFFLINE
// ============================================================================
// Ações pendentes (ponto / documento / assinatura) enfileiradas enquanto o
// aparelho está sem conexão, mais os eventos observáveis do ciclo de sync.
// ============================================================================

use serde::{Deserialize, Serialize};

/// Teto de reenvios por ação; ao atingir, a ação sai da fila
pub const MAX_TENTATIVAS: usize = 3;

/// Localização capturada no registro de ponto (quando o aparelho permite)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Localizacao {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precisao: Option<f64>,
}

/// Corpo do registro de ponto eletrônico
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistroPonto {
    pub funcionario_id: i64,
    /// "entrada", "saida", "intervalo_inicio", "intervalo_fim"
    pub tipo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localizacao: Option<Localizacao>,
    /// ISO-8601, hora do aparelho no momento do registro
    pub timestamp: String,
}

/// Corpo do envio de documento pelo funcionário
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvioDocumento {
    pub documento_id: i64,
    pub nome: String,
    pub conteudo_base64: String,
    pub timestamp: String,
}

/// Corpo da assinatura de documento
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssinaturaDocumento {
    pub documento_id: i64,
    pub assinatura: String,
    pub data_assinatura: String,
}

/// Payload tipado por variante — o `type` persistido seleciona a rota fixa
/// do backend e o formato do corpo, nada de JSON opaco
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ActionPayload {
    Ponto(RegistroPonto),
    Documento(EnvioDocumento),
    Assinatura(AssinaturaDocumento),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Ponto,
    Documento,
    Assinatura,
}

impl ActionKind {
    /// Rota REST fixa para o tipo de ação
    pub fn rota(&self) -> &'static str {
        match self {
            ActionKind::Ponto => "/api/ponto-eletronico",
            ActionKind::Documento => "/api/documentos",
            ActionKind::Assinatura => "/api/assinaturas",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Ponto => "ponto",
            ActionKind::Documento => "documento",
            ActionKind::Assinatura => "assinatura",
        }
    }
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::Ponto(_) => ActionKind::Ponto,
            ActionPayload::Documento(_) => ActionKind::Documento,
            ActionPayload::Assinatura(_) => ActionKind::Assinatura,
        }
    }

    /// Somente o corpo (`data`) da ação, como vai no POST
    pub fn corpo(&self) -> Result<serde_json::Value, String> {
        let valor = match self {
            ActionPayload::Ponto(registro) => serde_json::to_value(registro),
            ActionPayload::Documento(envio) => serde_json::to_value(envio),
            ActionPayload::Assinatura(assinatura) => serde_json::to_value(assinatura),
        };
        valor.map_err(|e| format!("Erro serializando corpo da ação: {}", e))
    }
}

/// Ação aguardando transmissão ao backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: String,
    #[serde(flatten)]
    pub payload: ActionPayload,
    /// Momento de criação (epoch ms)
    pub timestamp: i64,
    #[serde(rename = "retryCount")]
    pub retry_count: usize,
}

impl PendingAction {
    pub fn new(payload: ActionPayload) -> Self {
        let agora = chrono::Utc::now().timestamp_millis();
        Self {
            id: format!("{}-{}", agora, uuid::Uuid::new_v4().simple()),
            payload,
            timestamp: agora,
            retry_count: 0,
        }
    }

    pub fn incrementar_tentativa(&mut self) {
        self.retry_count += 1;
    }

    /// Esgotou o teto de reenvios e deve sair da fila
    pub fn esgotada(&self) -> bool {
        self.retry_count >= MAX_TENTATIVAS
    }
}

/// Resultado de uma passada do motor de sincronização
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncReport {
    pub sucessos: usize,
    pub falhas: usize,
    pub descartadas: usize,
}

/// Tags de Background Sync registradas junto ao service worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundSyncKind {
    Aprovacoes,
    Assinaturas,
    Ponto,
}

impl BackgroundSyncKind {
    pub const TODAS: [BackgroundSyncKind; 3] = [
        BackgroundSyncKind::Aprovacoes,
        BackgroundSyncKind::Assinaturas,
        BackgroundSyncKind::Ponto,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            BackgroundSyncKind::Aprovacoes => "sync-aprovacoes",
            BackgroundSyncKind::Assinaturas => "sync-assinaturas",
            BackgroundSyncKind::Ponto => "sync-ponto",
        }
    }

    /// Chave do localStorage da fila em cache correspondente (só diagnóstico)
    pub fn chave_fila(&self) -> &'static str {
        match self {
            BackgroundSyncKind::Aprovacoes => "fila_aprovacoes",
            BackgroundSyncKind::Assinaturas => "fila_assinaturas_documentos",
            BackgroundSyncKind::Ponto => "fila_registros_ponto",
        }
    }

    /// Tipo de mensagem difundida pelo service worker
    pub fn from_message_type(tipo: &str) -> Option<Self> {
        match tipo {
            "SYNC_APROVACOES" => Some(BackgroundSyncKind::Aprovacoes),
            "SYNC_ASSINATURAS" => Some(BackgroundSyncKind::Assinaturas),
            "SYNC_PONTO" => Some(BackgroundSyncKind::Ponto),
            _ => None,
        }
    }
}

/// Eventos publicados no barramento para quem observa o ciclo de sync
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    Online,
    Offline,
    SincronizacaoConcluida { sucessos: usize },
    AcoesDescartadas { quantidade: usize },
    AtualizacaoDisponivel,
    SincronizacaoSolicitada(BackgroundSyncKind),
}
