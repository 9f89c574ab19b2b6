// ============================================================================
// MONITOR DE REDE - Transições online/offline do navegador
// ============================================================================
// Sem debounce: toda transição dispara o callback, incondicionalmente.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Event};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

impl NetworkStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

/// Observa os eventos online/offline da janela. O registro de listeners é
/// feito uma única vez; chamadas repetidas são ignoradas.
pub struct NetworkMonitor {
    status: Rc<Cell<NetworkStatus>>,
    monitorando: Rc<Cell<bool>>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        Self {
            status: Rc::new(Cell::new(estado_inicial())),
            monitorando: Rc::new(Cell::new(false)),
        }
    }

    /// Registra os listeners de online/offline. O callback recebe o novo
    /// estado a cada transição.
    pub fn start_monitoring<F>(&self, callback: F)
    where
        F: Fn(NetworkStatus) + 'static,
    {
        if self.monitorando.replace(true) {
            log::warn!("⚠️ NetworkMonitor: listeners já registrados, ignorando chamada duplicada");
            return;
        }

        let window = match window() {
            Some(w) => w,
            None => return,
        };

        let callback = Rc::new(callback);

        let online_closure = Closure::wrap(Box::new({
            let status = self.status.clone();
            let callback = callback.clone();
            move |_event: Event| {
                log::info!("🌐 Rede: ONLINE");
                status.set(NetworkStatus::Online);
                callback(NetworkStatus::Online);
            }
        }) as Box<dyn FnMut(Event)>);

        let offline_closure = Closure::wrap(Box::new({
            let status = self.status.clone();
            let callback = callback.clone();
            move |_event: Event| {
                log::warn!("📴 Rede: OFFLINE");
                status.set(NetworkStatus::Offline);
                callback(NetworkStatus::Offline);
            }
        }) as Box<dyn FnMut(Event)>);

        let _ = window
            .add_event_listener_with_callback("online", online_closure.as_ref().unchecked_ref());
        let _ = window
            .add_event_listener_with_callback("offline", offline_closure.as_ref().unchecked_ref());

        // Listeners de janela vivem até o fim da sessão
        online_closure.forget();
        offline_closure.forget();

        log::info!("✅ NetworkMonitor: listeners registrados");
    }

    pub fn current_status(&self) -> NetworkStatus {
        self.status.get()
    }

    pub fn is_online(&self) -> bool {
        self.current_status().is_online()
    }
}

/// Lê navigator.onLine via Reflect (evita depender do binding direto)
fn estado_inicial() -> NetworkStatus {
    let Some(window) = window() else {
        return NetworkStatus::Unknown;
    };

    let on_line = js_sys::Reflect::get(&window, &JsValue::from_str("navigator"))
        .ok()
        .and_then(|nav| js_sys::Reflect::get(&nav, &JsValue::from_str("onLine")).ok())
        .and_then(|v| v.as_bool());

    match on_line {
        Some(true) => NetworkStatus::Online,
        Some(false) => NetworkStatus::Offline,
        None => NetworkStatus::Unknown,
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
