// ============================================================================
// APP - Raiz de composição do núcleo offline
// ============================================================================
// Constrói e conecta fila, motor, monitor de rede e coordenador do service
// worker. As dependências são injetadas daqui; nenhum serviço cria singleton.
// ============================================================================

use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::window;

use crate::models::sync::{ActionPayload, PendingAction, SyncEvent};
use crate::services::{
    ApiClient, BrowserPlatform, LocalStorageStore, NetworkMonitor, NetworkStatus, OfflineQueue,
    ServiceWorkerManager, SyncEngine,
};
use crate::state::{EventBus, SyncStatusHandle};
use crate::views::sync_indicator;

pub struct App {
    fila: Rc<OfflineQueue<LocalStorageStore>>,
    engine: Rc<SyncEngine<LocalStorageStore, ApiClient>>,
    monitor: NetworkMonitor,
    sw: Rc<ServiceWorkerManager>,
    bus: Rc<EventBus<SyncEvent>>,
    status: SyncStatusHandle,
}

impl App {
    pub fn new() -> Self {
        let bus = Rc::new(EventBus::new());
        let status = SyncStatusHandle::new();
        let fila = Rc::new(OfflineQueue::new(LocalStorageStore));
        let engine = Rc::new(SyncEngine::new(
            fila.clone(),
            ApiClient::new(),
            status.clone(),
            bus.clone(),
        ));
        let sw = Rc::new(ServiceWorkerManager::new(BrowserPlatform, bus.clone()));

        Self {
            fila,
            engine,
            monitor: NetworkMonitor::new(),
            sw,
            bus,
            status,
        }
    }

    /// Conecta monitor → motor, registra o service worker e prepara a UI
    pub fn init(&self) {
        self.status
            .set_online(self.monitor.current_status() != NetworkStatus::Offline);
        self.status.set_pending_actions(self.fila.pending_count());

        self.configurar_observador();

        // Transição de rede dispara notificação e, no online, a drenagem da
        // fila mais o registro das tags de background sync
        {
            let status = self.status.clone();
            let bus = self.bus.clone();
            let engine = self.engine.clone();
            let sw = self.sw.clone();
            self.monitor.start_monitoring(move |novo_estado| {
                let online = novo_estado.is_online();
                status.set_online(online);
                if online {
                    bus.publish(&SyncEvent::Online);
                    let engine = engine.clone();
                    let sw = sw.clone();
                    spawn_local(async move {
                        engine.processar_fila().await;
                        sw.sync_all().await;
                    });
                } else {
                    bus.publish(&SyncEvent::Offline);
                }
            });
        }

        {
            let sw = self.sw.clone();
            spawn_local(async move {
                sw.register().await;
            });
        }

        if let Err(e) = sync_indicator::atualizar_indicador(&self.status) {
            log::warn!("⚠️ [APP] Erro renderizando indicador: {:?}", e);
        }

        log::info!("🚀 [APP] Núcleo offline inicializado");
    }

    /// Reações de UI/log aos eventos do ciclo de sync
    fn configurar_observador(&self) {
        let status = self.status.clone();
        let sw = self.sw.clone();

        self.bus.subscribe(move |evento: &SyncEvent| {
            match evento {
                SyncEvent::Online => {
                    sync_indicator::mostrar_toast(sync_indicator::texto_toast_online());
                }
                SyncEvent::Offline => {
                    sync_indicator::mostrar_toast(sync_indicator::texto_toast_offline());
                }
                SyncEvent::SincronizacaoConcluida { sucessos } => {
                    sync_indicator::mostrar_toast(&sync_indicator::texto_toast_sucesso(*sucessos));
                }
                SyncEvent::AcoesDescartadas { quantidade } => {
                    sync_indicator::mostrar_toast(&format!(
                        "⚠️ {} ação(ões) descartada(s) após 3 tentativas",
                        quantidade
                    ));
                }
                SyncEvent::AtualizacaoDisponivel => {
                    let confirmado = window()
                        .and_then(|w| {
                            w.confirm_with_message(
                                "Uma nova versão do aplicativo está disponível. Deseja atualizar agora?",
                            )
                            .ok()
                        })
                        .unwrap_or(false);
                    if confirmado {
                        let sw = sw.clone();
                        spawn_local(async move {
                            sw.activate_update().await;
                        });
                    }
                }
                SyncEvent::SincronizacaoSolicitada(kind) => {
                    // Observacional: os consumidores das filas em cache reagem
                    // por conta própria
                    log::info!("📨 [APP] Background sync solicitado: {}", kind.tag());
                }
            }

            if let Err(e) = sync_indicator::atualizar_indicador(&status) {
                log::warn!("⚠️ [APP] Erro atualizando indicador: {:?}", e);
            }
        });
    }

    /// Enfileira uma ação do usuário; online, já dispara a drenagem
    pub fn registrar_acao(&self, payload: ActionPayload) -> PendingAction {
        let acao = self.fila.add(payload);
        self.status.set_pending_actions(self.fila.pending_count());

        if let Err(e) = sync_indicator::atualizar_indicador(&self.status) {
            log::warn!("⚠️ [APP] Erro atualizando indicador: {:?}", e);
        }

        if self.status.get_online() {
            let engine = self.engine.clone();
            spawn_local(async move {
                engine.processar_fila().await;
            });
        }

        acao
    }

    /// Disparo manual ("tentar novamente") — o guard do motor ignora o clique
    /// se uma passada automática já estiver em andamento
    pub fn sincronizar_agora(&self) {
        let engine = self.engine.clone();
        spawn_local(async move {
            engine.processar_fila().await;
        });
    }

    pub fn status(&self) -> &SyncStatusHandle {
        &self.status
    }

    pub fn service_worker(&self) -> Rc<ServiceWorkerManager> {
        self.sw.clone()
    }

    pub fn dispose(&self) {
        self.sw.dispose();
        log::info!("🔌 [APP] Núcleo offline finalizado");
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
