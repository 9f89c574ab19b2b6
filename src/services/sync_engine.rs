// ============================================================================
// MOTOR DE SINCRONIZAÇÃO - Drena a fila offline contra o backend
// ============================================================================
// Passada única, sequencial, em ordem FIFO. Sem backoff entre tentativas:
// o que limita a frequência é o gatilho (transição online, clique manual ou
// callback de background sync do service worker).
// ============================================================================

use std::collections::HashSet;
use std::rc::Rc;

use crate::models::sync::{PendingAction, SyncEvent, SyncReport};
use crate::services::offline_queue::{ActionStore, OfflineQueue};
use crate::state::{EventBus, SyncStatusHandle};

/// Transmissão de uma ação ao backend. Seam para testes sem rede.
pub trait ActionTransport {
    async fn enviar(&self, acao: &PendingAction) -> Result<(), String>;
}

pub struct SyncEngine<S: ActionStore, T: ActionTransport> {
    fila: Rc<OfflineQueue<S>>,
    transporte: T,
    status: SyncStatusHandle,
    bus: Rc<EventBus<SyncEvent>>,
}

impl<S: ActionStore, T: ActionTransport> SyncEngine<S, T> {
    pub fn new(
        fila: Rc<OfflineQueue<S>>,
        transporte: T,
        status: SyncStatusHandle,
        bus: Rc<EventBus<SyncEvent>>,
    ) -> Self {
        Self {
            fila,
            transporte,
            status,
            bus,
        }
    }

    /// Processa a fila pendente: envia cada ação em sequência, remove as que
    /// o backend confirmou e re-persiste as sobreviventes. Offline ou fila
    /// vazia é no-op (fila e last_sync intocados).
    pub async fn processar_fila(&self) -> SyncReport {
        if !self.status.get_online() {
            log::info!("📴 [Sync] Sem conexão, aguardando...");
            return SyncReport::default();
        }

        let acoes = self.fila.load();
        if acoes.is_empty() {
            log::info!("📭 [Sync] Nenhuma ação pendente");
            return SyncReport::default();
        }

        // Single-flight: um clique manual não pode correr junto com o disparo
        // automático da transição online
        if !self.status.begin_sync() {
            log::warn!("⚠️ [Sync] Sincronização já em andamento, ignorando disparo");
            return SyncReport::default();
        }

        log::info!("🔄 [Sync] Processando fila: {} ações pendentes", acoes.len());

        // Ids do snapshot desta passada; o que entrar na fila durante os
        // awaits não está aqui e precisa sobreviver à re-persistência
        let ids_da_passada: HashSet<String> = acoes.iter().map(|a| a.id.clone()).collect();

        let mut report = SyncReport::default();
        let mut restantes: Vec<PendingAction> = Vec::new();
        let mut estouradas: Vec<PendingAction> = Vec::new();

        for mut acao in acoes {
            match self.transporte.enviar(&acao).await {
                Ok(()) => {
                    report.sucessos += 1;
                    log::info!(
                        "✅ [Sync] Ação processada: {} ({})",
                        acao.payload.kind().as_str(),
                        acao.id
                    );
                }
                Err(e) => {
                    acao.incrementar_tentativa();
                    log::warn!(
                        "⚠️ [Sync] Falha na ação {} (tentativa {}): {}",
                        acao.id,
                        acao.retry_count,
                        e
                    );
                    if acao.esgotada() {
                        report.descartadas += 1;
                        estouradas.push(acao);
                    } else {
                        report.falhas += 1;
                        restantes.push(acao);
                    }
                }
            }
        }

        // Ações enfileiradas no meio da passada (registrar_acao durante um
        // envio, por exemplo) ficam no fim da fila re-persistida
        for acao in self.fila.load() {
            if !ids_da_passada.contains(&acao.id) {
                restantes.push(acao);
            }
        }

        self.fila.save(&restantes);
        self.status.set_pending_actions(restantes.len());

        if !estouradas.is_empty() {
            self.fila.registrar_descartadas(&estouradas);
            self.bus.publish(&SyncEvent::AcoesDescartadas {
                quantidade: estouradas.len(),
            });
        }

        self.status
            .set_last_sync(Some(chrono::Utc::now().timestamp_millis()));
        self.status.end_sync();

        if report.sucessos > 0 {
            self.bus.publish(&SyncEvent::SincronizacaoConcluida {
                sucessos: report.sucessos,
            });
        }

        log::info!(
            "🏁 [Sync] Passada concluída: {} ok, {} para reenvio, {} descartadas",
            report.sucessos,
            report.falhas,
            report.descartadas
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sync::{ActionPayload, MAX_TENTATIVAS};
    use crate::services::offline_queue::tests::{payload_assinatura, payload_ponto, MemoryStore};
    use crate::views::sync_indicator::texto_toast_sucesso;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Transporte de mentira: falha para os ids listados, registra a ordem
    struct MockTransport {
        falhas: HashSet<String>,
        enviados: RefCell<Vec<String>>,
    }

    impl MockTransport {
        fn ok() -> Self {
            Self::falhando([])
        }

        fn falhando<const N: usize>(ids: [&str; N]) -> Self {
            Self {
                falhas: ids.iter().map(|s| s.to_string()).collect(),
                enviados: RefCell::new(Vec::new()),
            }
        }
    }

    impl ActionTransport for MockTransport {
        async fn enviar(&self, acao: &PendingAction) -> Result<(), String> {
            self.enviados.borrow_mut().push(acao.id.clone());
            if self.falhas.contains(&acao.id) {
                Err("HTTP 500: erro simulado".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn engine_com(
        acoes: Vec<PendingAction>,
        transporte: MockTransport,
    ) -> SyncEngine<MemoryStore, MockTransport> {
        let fila = Rc::new(OfflineQueue::new(MemoryStore::new()));
        fila.save(&acoes);
        let status = SyncStatusHandle::new();
        status.set_pending_actions(acoes.len());
        SyncEngine::new(fila, transporte, status, Rc::new(EventBus::new()))
    }

    fn acao(id: &str, payload: ActionPayload, retry_count: usize) -> PendingAction {
        let mut acao = PendingAction::new(payload);
        acao.id = id.to_string();
        acao.retry_count = retry_count;
        acao
    }

    #[test]
    fn fila_vazia_e_noop() {
        let engine = engine_com(Vec::new(), MockTransport::ok());
        let report = block_on(engine.processar_fila());
        assert_eq!(report, SyncReport::default());
        assert_eq!(engine.status.get_last_sync(), None);
        assert!(!engine.status.get_syncing());
    }

    #[test]
    fn offline_e_noop() {
        let engine = engine_com(vec![acao("1", payload_ponto(1), 0)], MockTransport::ok());
        engine.status.set_online(false);
        let report = block_on(engine.processar_fila());
        assert_eq!(report, SyncReport::default());
        assert_eq!(engine.fila.load().len(), 1);
        assert_eq!(engine.status.get_last_sync(), None);
    }

    #[test]
    fn sucesso_remove_so_a_acao_enviada() {
        let acoes = vec![
            acao("1", payload_ponto(1), 2),
            acao("2", payload_assinatura(9), 1),
        ];
        let engine = engine_com(acoes, MockTransport::falhando(["2"]));
        let report = block_on(engine.processar_fila());

        assert_eq!(report.sucessos, 1);
        let restante = engine.fila.load();
        assert_eq!(restante.len(), 1);
        assert_eq!(restante[0].id, "2");
        // A falha incrementa exatamente 1; a ação que passou não mexe nas outras
        assert_eq!(restante[0].retry_count, 2);
        assert!(engine.status.get_last_sync().is_some());
    }

    #[test]
    fn processa_em_ordem_fifo() {
        let acoes = vec![
            acao("a", payload_ponto(1), 0),
            acao("b", payload_ponto(2), 0),
            acao("c", payload_assinatura(3), 0),
        ];
        let engine = engine_com(acoes, MockTransport::ok());
        block_on(engine.processar_fila());
        assert_eq!(
            *engine.transporte.enviados.borrow(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(engine.fila.load().is_empty());
    }

    #[test]
    fn descarta_na_terceira_falha() {
        // retryCount 2 + falha = 3 → sai da fila e vai para o registro
        let engine = engine_com(
            vec![acao("1", payload_ponto(1), MAX_TENTATIVAS - 1)],
            MockTransport::falhando(["1"]),
        );

        let eventos = Rc::new(RefCell::new(Vec::new()));
        {
            let eventos = eventos.clone();
            engine.bus.subscribe(move |e: &SyncEvent| {
                eventos.borrow_mut().push(e.clone());
            });
        }

        let report = block_on(engine.processar_fila());
        assert_eq!(report.descartadas, 1);
        assert!(engine.fila.load().is_empty());

        let registro = engine.fila.descartadas();
        assert_eq!(registro.len(), 1);
        assert_eq!(registro[0].retry_count, MAX_TENTATIVAS);
        assert!(eventos
            .borrow()
            .contains(&SyncEvent::AcoesDescartadas { quantidade: 1 }));
    }

    #[test]
    fn cenario_misto_com_texto_do_toast() {
        let acoes = vec![
            acao("1", payload_ponto(1), 0),
            acao("2", payload_assinatura(5), 0),
        ];
        let engine = engine_com(acoes, MockTransport::falhando(["2"]));

        let sucessos_notificados = Rc::new(RefCell::new(None));
        {
            let sucessos_notificados = sucessos_notificados.clone();
            engine.bus.subscribe(move |e: &SyncEvent| {
                if let SyncEvent::SincronizacaoConcluida { sucessos } = e {
                    *sucessos_notificados.borrow_mut() = Some(*sucessos);
                }
            });
        }

        let report = block_on(engine.processar_fila());
        assert_eq!(report.sucessos, 1);
        assert_eq!(report.falhas, 1);

        let restante = engine.fila.load();
        assert_eq!(restante.len(), 1);
        assert_eq!(restante[0].id, "2");
        assert_eq!(restante[0].retry_count, 1);

        let sucessos = sucessos_notificados.borrow().unwrap();
        assert_eq!(texto_toast_sucesso(sucessos), "1 ação(ões) sincronizada(s)");
    }

    #[test]
    fn guard_impede_passada_concorrente() {
        let engine = engine_com(vec![acao("1", payload_ponto(1), 0)], MockTransport::ok());
        // Simula uma passada em andamento segurando o guard
        assert!(engine.status.begin_sync());
        let report = block_on(engine.processar_fila());
        assert_eq!(report, SyncReport::default());
        // Fila intacta, guard ainda do dono original
        assert_eq!(engine.fila.load().len(), 1);
        assert!(engine.status.get_syncing());
    }

    #[test]
    fn preserva_acao_enfileirada_durante_a_passada() {
        // Transporte que enfileira uma ação nova no meio do envio, como um
        // registrar_acao do usuário enquanto a passada aguarda a rede
        struct TransporteQueEnfileira {
            fila: Rc<OfflineQueue<MemoryStore>>,
        }

        impl ActionTransport for TransporteQueEnfileira {
            async fn enviar(&self, _acao: &PendingAction) -> Result<(), String> {
                self.fila.add(payload_assinatura(7));
                Ok(())
            }
        }

        let fila = Rc::new(OfflineQueue::new(MemoryStore::new()));
        fila.save(&[acao("1", payload_ponto(1), 0)]);
        let status = SyncStatusHandle::new();
        status.set_pending_actions(1);
        let engine = SyncEngine::new(
            fila.clone(),
            TransporteQueEnfileira { fila: fila.clone() },
            status,
            Rc::new(EventBus::new()),
        );

        let report = block_on(engine.processar_fila());
        assert_eq!(report.sucessos, 1);

        // A ação nova sobrevive à re-persistência da fila
        let restante = fila.load();
        assert_eq!(restante.len(), 1);
        assert_eq!(restante[0].payload, payload_assinatura(7));
        assert_eq!(restante[0].retry_count, 0);
        assert_eq!(engine.status.get_pending_actions(), 1);
    }

    #[test]
    fn atualiza_contador_de_pendentes() {
        let acoes = vec![
            acao("1", payload_ponto(1), 0),
            acao("2", payload_ponto(2), 0),
            acao("3", payload_ponto(3), 0),
        ];
        let engine = engine_com(acoes, MockTransport::falhando(["3"]));
        block_on(engine.processar_fila());
        assert_eq!(engine.status.get_pending_actions(), 1);
        assert_eq!(engine.fila.pending_count(), 1);
    }
}
