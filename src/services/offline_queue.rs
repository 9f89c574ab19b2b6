// ============================================================================
// FILA OFFLINE - Armazenamento durável das ações pendentes
// ============================================================================
// A fila persistida em `offline-actions` é a única fonte de verdade do
// trabalho ainda não confirmado pelo backend. Sobrevive a reloads da página.
// ============================================================================

use std::cell::Cell;

use crate::models::sync::{ActionPayload, PendingAction};
use crate::utils::storage;

const CHAVE_FILA: &str = "offline-actions";
const CHAVE_DESCARTADAS: &str = "acoes-descartadas";
/// Registro de descarte é diagnóstico, não re-processável; mantém só as últimas
const LIMITE_DESCARTADAS: usize = 50;

/// Acesso chave-valor ao armazenamento local. Seam para testar a fila e o
/// motor fora do navegador.
pub trait ActionStore {
    fn read(&self, chave: &str) -> Option<String>;
    fn write(&self, chave: &str, valor: &str) -> Result<(), String>;
    fn remove(&self, chave: &str) -> Result<(), String>;
}

/// Implementação de produção sobre window.localStorage
pub struct LocalStorageStore;

impl ActionStore for LocalStorageStore {
    fn read(&self, chave: &str) -> Option<String> {
        storage::load_raw(chave)
    }

    fn write(&self, chave: &str, valor: &str) -> Result<(), String> {
        let st = storage::get_local_storage()
            .ok_or("Não foi possível acessar o localStorage")?;
        st.set_item(chave, valor)
            .map_err(|_| "Erro gravando no localStorage (quota?)".to_string())
    }

    fn remove(&self, chave: &str) -> Result<(), String> {
        storage::remove_from_storage(chave)
    }
}

/// Fila ordenada de ações aguardando transmissão
pub struct OfflineQueue<S: ActionStore> {
    store: S,
    pendentes: Cell<usize>,
}

impl<S: ActionStore> OfflineQueue<S> {
    pub fn new(store: S) -> Self {
        let fila = Self {
            store,
            pendentes: Cell::new(0),
        };
        fila.pendentes.set(fila.load().len());
        fila
    }

    /// Lê e desserializa a fila. Ausente ou malformada vira fila vazia —
    /// uma falha de parse descarta a fila inteira, não entradas individuais.
    pub fn load(&self) -> Vec<PendingAction> {
        match self.store.read(CHAVE_FILA) {
            Some(json) => match serde_json::from_str::<Vec<PendingAction>>(&json) {
                Ok(acoes) => acoes,
                Err(e) => {
                    log::warn!("⚠️ Fila offline malformada, descartando: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Sobrescreve a fila persistida. Falha de armazenamento (quota,
    /// serialização) só aparece no log; o chamador não vê erro.
    pub fn save(&self, acoes: &[PendingAction]) {
        self.pendentes.set(acoes.len());
        let json = match serde_json::to_string(acoes) {
            Ok(json) => json,
            Err(e) => {
                log::error!("❌ Erro serializando fila offline: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.write(CHAVE_FILA, &json) {
            log::error!("❌ Erro salvando fila offline: {}", e);
        }
    }

    /// Enfileira uma nova ação com id/timestamp frescos e zero tentativas
    pub fn add(&self, payload: ActionPayload) -> PendingAction {
        let acao = PendingAction::new(payload);
        let mut acoes = self.load();
        acoes.push(acao.clone());
        self.save(&acoes);
        log::info!(
            "📥 [Offline] Ação adicionada à fila: {} ({})",
            acao.payload.kind().as_str(),
            acao.id
        );
        acao
    }

    /// Contador em memória, atualizado a cada save
    pub fn pending_count(&self) -> usize {
        self.pendentes.get()
    }

    /// Anota ações que estouraram o teto de reenvios. Registro local com teto,
    /// para que o descarte não seja perda muda de dados.
    pub fn registrar_descartadas(&self, acoes: &[PendingAction]) {
        if acoes.is_empty() {
            return;
        }
        for acao in acoes {
            log::error!(
                "🗑️ [Sync] Ação descartada após {} tentativas: {} ({})",
                acao.retry_count,
                acao.payload.kind().as_str(),
                acao.id
            );
        }

        let mut registro = self.descartadas();
        registro.extend_from_slice(acoes);
        if registro.len() > LIMITE_DESCARTADAS {
            let excesso = registro.len() - LIMITE_DESCARTADAS;
            registro.drain(..excesso);
        }

        match serde_json::to_string(&registro) {
            Ok(json) => {
                if let Err(e) = self.store.write(CHAVE_DESCARTADAS, &json) {
                    log::error!("❌ Erro salvando registro de descartes: {}", e);
                }
            }
            Err(e) => log::error!("❌ Erro serializando registro de descartes: {}", e),
        }
    }

    /// Ações permanentemente descartadas (diagnóstico)
    pub fn descartadas(&self) -> Vec<PendingAction> {
        self.store
            .read(CHAVE_DESCARTADAS)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(CHAVE_FILA) {
            log::error!("❌ Erro limpando fila offline: {}", e);
        }
        self.pendentes.set(0);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::models::sync::{ActionPayload, AssinaturaDocumento, RegistroPonto};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Store em memória para os testes da fila e do motor
    pub struct MemoryStore {
        dados: RefCell<HashMap<String, String>>,
        pub falhar_escrita: Cell<bool>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                dados: RefCell::new(HashMap::new()),
                falhar_escrita: Cell::new(false),
            }
        }
    }

    impl ActionStore for MemoryStore {
        fn read(&self, chave: &str) -> Option<String> {
            self.dados.borrow().get(chave).cloned()
        }

        fn write(&self, chave: &str, valor: &str) -> Result<(), String> {
            if self.falhar_escrita.get() {
                return Err("quota excedida".to_string());
            }
            self.dados.borrow_mut().insert(chave.to_string(), valor.to_string());
            Ok(())
        }

        fn remove(&self, chave: &str) -> Result<(), String> {
            self.dados.borrow_mut().remove(chave);
            Ok(())
        }
    }

    pub fn payload_ponto(funcionario_id: i64) -> ActionPayload {
        ActionPayload::Ponto(RegistroPonto {
            funcionario_id,
            tipo: "entrada".to_string(),
            localizacao: None,
            timestamp: "2025-06-01T08:00:00.000Z".to_string(),
        })
    }

    pub fn payload_assinatura(documento_id: i64) -> ActionPayload {
        ActionPayload::Assinatura(AssinaturaDocumento {
            documento_id,
            assinatura: "data:image/png;base64,iVBOR".to_string(),
            data_assinatura: "2025-06-01T09:30:00.000Z".to_string(),
        })
    }

    #[test]
    fn add_persiste_e_atualiza_contador() {
        let fila = OfflineQueue::new(MemoryStore::new());
        assert_eq!(fila.pending_count(), 0);

        fila.add(payload_ponto(1));
        fila.add(payload_assinatura(2));

        assert_eq!(fila.pending_count(), 2);
        let acoes = fila.load();
        assert_eq!(acoes.len(), 2);
        assert_eq!(acoes[0].retry_count, 0);
        // FIFO: a primeira adicionada vem primeiro
        assert_eq!(acoes[0].payload, payload_ponto(1));
    }

    #[test]
    fn fila_malformada_vira_vazia() {
        let store = MemoryStore::new();
        store.write(CHAVE_FILA, "{nao é json válido").unwrap();
        let fila = OfflineQueue::new(store);
        assert!(fila.load().is_empty());
        assert_eq!(fila.pending_count(), 0);
    }

    #[test]
    fn falha_de_escrita_e_silenciosa() {
        let fila = OfflineQueue::new(MemoryStore::new());
        fila.add(payload_ponto(1));

        fila.store.falhar_escrita.set(true);
        // Não propaga erro nem entra em pânico
        fila.add(payload_ponto(2));

        fila.store.falhar_escrita.set(false);
        // A fila persistida ainda tem só a primeira ação
        assert_eq!(fila.load().len(), 1);
    }

    #[test]
    fn registro_de_descartes_respeita_o_teto() {
        let fila = OfflineQueue::new(MemoryStore::new());
        let mut lote = Vec::new();
        for i in 0..(LIMITE_DESCARTADAS + 10) {
            let mut acao = PendingAction::new(payload_ponto(i as i64));
            acao.retry_count = 3;
            lote.push(acao);
        }
        fila.registrar_descartadas(&lote);

        let registro = fila.descartadas();
        assert_eq!(registro.len(), LIMITE_DESCARTADAS);
        // Mantém as mais recentes
        assert_eq!(registro.last().unwrap().id, lote.last().unwrap().id);
    }

    #[test]
    fn clear_esvazia_fila_e_contador() {
        let fila = OfflineQueue::new(MemoryStore::new());
        fila.add(payload_ponto(1));
        fila.clear();
        assert!(fila.load().is_empty());
        assert_eq!(fila.pending_count(), 0);
    }
}
