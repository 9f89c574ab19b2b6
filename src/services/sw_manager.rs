// ============================================================================
// SERVICE WORKER MANAGER - Registro, atualização e relé de background sync
// ============================================================================
// Coordenador construído explicitamente e injetado pela raiz da aplicação
// (nada de singleton de módulo). Tudo aqui degrada para log + None/false;
// a ausência de service worker nunca derruba o app.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    window, MessageChannel, MessageEvent, RegistrationOptions, ServiceWorkerContainer,
    ServiceWorkerRegistration, ServiceWorkerState,
};

use crate::config::CONFIG;
use crate::models::sync::{BackgroundSyncKind, SyncEvent};
use crate::state::EventBus;
use crate::utils::storage;

/// Acesso à API de service worker do ambiente. Seam para testar o
/// coordenador fora do navegador, como ActionStore/ActionTransport.
pub trait SwPlatform {
    fn service_worker_container(&self) -> Option<ServiceWorkerContainer>;
}

/// Implementação de produção sobre navigator.serviceWorker
pub struct BrowserPlatform;

impl SwPlatform for BrowserPlatform {
    fn service_worker_container(&self) -> Option<ServiceWorkerContainer> {
        let window = window()?;
        let navigator = window.navigator();
        let suportado =
            Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false);
        if !suportado {
            return None;
        }
        Some(navigator.service_worker())
    }
}

pub struct ServiceWorkerManager<P: SwPlatform = BrowserPlatform> {
    platform: P,
    registration: RefCell<Option<ServiceWorkerRegistration>>,
    update_interval: RefCell<Option<Interval>>,
    bus: Rc<EventBus<SyncEvent>>,
}

impl<P: SwPlatform> ServiceWorkerManager<P> {
    pub fn new(platform: P, bus: Rc<EventBus<SyncEvent>>) -> Self {
        Self {
            platform,
            registration: RefCell::new(None),
            update_interval: RefCell::new(None),
            bus,
        }
    }

    /// Registra o service worker em /sw.js com escopo "/". Plataforma sem
    /// suporte ou falha de registro devolve None, nunca erro.
    pub async fn register(&self) -> Option<ServiceWorkerRegistration> {
        let container = match self.platform.service_worker_container() {
            Some(c) => c,
            None => {
                log::debug!("Service Worker não é suportado neste navegador");
                return None;
            }
        };

        let options = RegistrationOptions::new();
        options.set_scope("/");
        let promise = container.register_with_options("/sw.js", &options);

        let registration = match JsFuture::from(promise).await {
            Ok(valor) => match valor.dyn_into::<ServiceWorkerRegistration>() {
                Ok(reg) => reg,
                Err(_) => {
                    log::error!("❌ [SW Manager] Registro devolveu um valor inesperado");
                    return None;
                }
            },
            Err(e) => {
                log::error!("❌ [SW Manager] Erro ao registrar service worker: {:?}", e);
                return None;
            }
        };

        *self.registration.borrow_mut() = Some(registration.clone());
        self.configurar_listeners(&container, &registration);
        self.iniciar_verificacoes();
        self.check_for_updates().await;

        log::info!("✅ [SW Manager] Service worker registrado");
        Some(registration)
    }

    fn configurar_listeners(
        &self,
        container: &ServiceWorkerContainer,
        registration: &ServiceWorkerRegistration,
    ) {
        // Nova versão encontrada: acompanhar a instalação e avisar quando
        // houver um worker instalado com outro já no controle
        let updatefound = Closure::wrap(Box::new({
            let registration = registration.clone();
            let container = container.clone();
            let bus = self.bus.clone();
            move |_event: web_sys::Event| {
                let Some(novo_worker) = registration.installing() else {
                    return;
                };

                let statechange = Closure::wrap(Box::new({
                    let novo_worker = novo_worker.clone();
                    let container = container.clone();
                    let bus = bus.clone();
                    move |_event: web_sys::Event| {
                        if novo_worker.state() == ServiceWorkerState::Installed
                            && container.controller().is_some()
                        {
                            log::info!("🔄 [SW Manager] Atualização instalada, aguardando ativação");
                            bus.publish(&SyncEvent::AtualizacaoDisponivel);
                        }
                    }
                }) as Box<dyn FnMut(web_sys::Event)>);

                let _ = novo_worker.add_event_listener_with_callback(
                    "statechange",
                    statechange.as_ref().unchecked_ref(),
                );
                statechange.forget();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        let _ = registration
            .add_event_listener_with_callback("updatefound", updatefound.as_ref().unchecked_ref());
        updatefound.forget();

        // Mensagens difundidas pelo worker: SYNC_* vira evento no barramento.
        // Só observação/log; quem sincroniza de fato são os consumidores.
        let message = Closure::wrap(Box::new({
            let bus = self.bus.clone();
            move |event: MessageEvent| {
                let data = event.data();
                let tipo = Reflect::get(&data, &JsValue::from_str("type"))
                    .ok()
                    .and_then(|v| v.as_string());

                if let Some(kind) = tipo.as_deref().and_then(BackgroundSyncKind::from_message_type)
                {
                    log::info!(
                        "📨 [SW Manager] Sync solicitado: {} ({} itens na fila local)",
                        kind.tag(),
                        tamanho_fila_local(kind)
                    );
                    bus.publish(&SyncEvent::SincronizacaoSolicitada(kind));
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        let _ = container
            .add_event_listener_with_callback("message", message.as_ref().unchecked_ref());
        message.forget();
    }

    /// Pede ao navegador para reverificar /sw.js
    pub async fn check_for_updates(&self) {
        let registration = { self.registration.borrow().clone() };
        let Some(registration) = registration else {
            return;
        };

        match registration.update() {
            Ok(promise) => {
                if let Err(e) = JsFuture::from(promise).await {
                    log::error!("❌ [SW Manager] Erro ao verificar atualizações: {:?}", e);
                }
            }
            Err(e) => {
                log::error!("❌ [SW Manager] Erro ao verificar atualizações: {:?}", e);
            }
        }
    }

    fn iniciar_verificacoes(&self) {
        let registration = { self.registration.borrow().clone() };
        let intervalo_ms = CONFIG.update_check_minutes * 60 * 1000;

        let interval = Interval::new(intervalo_ms, move || {
            let registration = registration.clone();
            spawn_local(async move {
                let Some(registration) = registration else {
                    return;
                };
                if let Ok(promise) = registration.update() {
                    let _ = JsFuture::from(promise).await;
                }
            });
        });

        *self.update_interval.borrow_mut() = Some(interval);
    }

    pub fn parar_verificacoes(&self) {
        // Drop do Interval cancela o timer
        self.update_interval.borrow_mut().take();
    }

    /// Manda o worker em espera assumir (SKIP_WAITING) e recarrega a página
    /// quando ele tomar o controle
    pub async fn activate_update(&self) {
        let registration = { self.registration.borrow().clone() };
        let Some(registration) = registration else {
            log::warn!("⚠️ [SW Manager] Nenhum service worker registrado");
            return;
        };
        let Some(aguardando) = registration.waiting() else {
            log::warn!("⚠️ [SW Manager] Nenhuma atualização aguardando");
            return;
        };

        let mensagem = js_sys::Object::new();
        let _ = Reflect::set(
            &mensagem,
            &JsValue::from_str("type"),
            &JsValue::from_str("SKIP_WAITING"),
        );
        if let Err(e) = aguardando.post_message(&mensagem) {
            log::error!("❌ [SW Manager] Erro enviando SKIP_WAITING: {:?}", e);
            return;
        }

        if let Some(container) = self.platform.service_worker_container() {
            let controllerchange = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if let Some(window) = window() {
                    let _ = window.location().reload();
                }
            }) as Box<dyn FnMut(web_sys::Event)>);

            let _ = container.add_event_listener_with_callback(
                "controllerchange",
                controllerchange.as_ref().unchecked_ref(),
            );
            controllerchange.forget();
        }
    }

    /// Background Sync é melhor-esforço: sem suporte vira warn + false.
    /// O binding de SyncManager é instável no web-sys, então o acesso a
    /// registration.sync é via Reflect.
    pub async fn register_sync(&self, kind: BackgroundSyncKind) -> bool {
        let registration = { self.registration.borrow().clone() };
        let Some(registration) = registration else {
            log::warn!("⚠️ [SW Manager] Background Sync sem registro ativo");
            return false;
        };

        let sync = match Reflect::get(&registration, &JsValue::from_str("sync")) {
            Ok(sync) if !sync.is_undefined() => sync,
            _ => {
                log::warn!("⚠️ [SW Manager] Background Sync não é suportado");
                return false;
            }
        };

        let register_fn = match Reflect::get(&sync, &JsValue::from_str("register"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
        {
            Some(f) => f,
            None => {
                log::warn!("⚠️ [SW Manager] Background Sync não é suportado");
                return false;
            }
        };

        let promise = match register_fn.call1(&sync, &JsValue::from_str(kind.tag())) {
            Ok(p) => p,
            Err(e) => {
                log::error!("❌ [SW Manager] Erro ao registrar sincronização: {:?}", e);
                return false;
            }
        };

        match promise.dyn_into::<Promise>() {
            Ok(promise) => match JsFuture::from(promise).await {
                Ok(_) => {
                    log::info!("🔁 [SW Manager] Background sync registrado: {}", kind.tag());
                    true
                }
                Err(e) => {
                    log::error!("❌ [SW Manager] Erro ao registrar sincronização: {:?}", e);
                    false
                }
            },
            Err(_) => false,
        }
    }

    /// Registra as três tags de sincronização pendentes
    pub async fn sync_all(&self) {
        for kind in BackgroundSyncKind::TODAS {
            self.register_sync(kind).await;
        }
    }

    /// Requisição-resposta com o worker ativo via MessageChannel
    pub async fn send_message(&self, mensagem: JsValue) -> Option<JsValue> {
        let container = self.platform.service_worker_container()?;
        let Some(controller) = container.controller() else {
            log::warn!("⚠️ [SW Manager] Nenhum service worker ativo");
            return None;
        };

        let canal = MessageChannel::new().ok()?;
        let porta_resposta = canal.port1();

        let promise = Promise::new(&mut |resolve, _reject| {
            let resposta = Closure::once_into_js(move |event: MessageEvent| {
                let _ = resolve.call1(&JsValue::NULL, &event.data());
            });
            porta_resposta.set_onmessage(Some(resposta.unchecked_ref()));
        });

        let transferencia = Array::of1(&canal.port2());
        if let Err(e) = controller.post_message_with_transferable(&mensagem, &transferencia) {
            log::error!("❌ [SW Manager] Erro enviando mensagem ao worker: {:?}", e);
            return None;
        }

        JsFuture::from(promise).await.ok()
    }

    /// Versão corrente do worker (mensagem GET_VERSION)
    pub async fn get_version(&self) -> Option<String> {
        let mensagem = js_sys::Object::new();
        let _ = Reflect::set(
            &mensagem,
            &JsValue::from_str("type"),
            &JsValue::from_str("GET_VERSION"),
        );
        let resposta = self.send_message(mensagem.into()).await?;
        Reflect::get(&resposta, &JsValue::from_str("version"))
            .ok()
            .and_then(|v| v.as_string())
    }

    /// Pede ao worker para limpar todos os caches
    pub async fn clear_cache(&self) -> bool {
        let mensagem = js_sys::Object::new();
        let _ = Reflect::set(
            &mensagem,
            &JsValue::from_str("type"),
            &JsValue::from_str("CLEAR_CACHE"),
        );
        match self.send_message(mensagem.into()).await {
            Some(resposta) => Reflect::get(&resposta, &JsValue::from_str("success"))
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            None => false,
        }
    }

    /// Desregistra o worker (útil para depuração)
    pub async fn unregister(&self) {
        let registration = { self.registration.borrow_mut().take() };
        let Some(registration) = registration else {
            return;
        };

        self.parar_verificacoes();
        match registration.unregister() {
            Ok(promise) => {
                if let Err(e) = JsFuture::from(promise).await {
                    log::error!("❌ [SW Manager] Erro ao desregistrar: {:?}", e);
                }
            }
            Err(e) => log::error!("❌ [SW Manager] Erro ao desregistrar: {:?}", e),
        }
    }

    /// Encerra timers; chamado pela raiz da aplicação no teardown
    pub fn dispose(&self) {
        self.parar_verificacoes();
    }
}

/// Tamanho da fila em cache dos consumidores (diagnóstico apenas)
fn tamanho_fila_local(kind: BackgroundSyncKind) -> usize {
    storage::load_raw(kind.chave_fila())
        .and_then(|json| serde_json::from_str::<Vec<serde_json::Value>>(&json).ok())
        .map(|fila| fila.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    /// Ambiente sem service worker (navegador antigo, webview restrita)
    struct PlataformaSemSuporte;

    impl SwPlatform for PlataformaSemSuporte {
        fn service_worker_container(&self) -> Option<ServiceWorkerContainer> {
            None
        }
    }

    fn manager_sem_suporte() -> ServiceWorkerManager<PlataformaSemSuporte> {
        ServiceWorkerManager::new(PlataformaSemSuporte, Rc::new(EventBus::new()))
    }

    #[test]
    fn register_sem_suporte_devolve_none_sem_erro() {
        let manager = manager_sem_suporte();
        assert!(block_on(manager.register()).is_none());
        // Nada fica registrado nem agendado
        assert!(manager.registration.borrow().is_none());
        assert!(manager.update_interval.borrow().is_none());
    }

    #[test]
    fn register_sync_sem_registro_devolve_false() {
        let manager = manager_sem_suporte();
        assert!(!block_on(manager.register_sync(BackgroundSyncKind::Ponto)));
    }

    #[test]
    fn send_message_sem_container_devolve_none() {
        let manager = manager_sem_suporte();
        assert!(block_on(manager.send_message(JsValue::NULL)).is_none());
    }
}
