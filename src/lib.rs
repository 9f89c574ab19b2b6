// ============================================================================
// IRBANA PWA - Núcleo offline (fila de ações + sincronização + service worker)
// ============================================================================
// - Models: ações pendentes tipadas e eventos do ciclo de sync
// - Services: fila persistente, motor de sync, monitor de rede, coordenador SW
// - State: estado derivado + barramento de eventos
// - Views: indicador e toasts de sincronização
// ============================================================================

pub mod app;
pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod views;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::app::App;

// Instância única da aplicação, viva durante toda a sessão
thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("🏗️ IRBANA PWA - núcleo offline iniciando...");

    let app = App::new();
    app.init();

    APP.with(|slot| {
        *slot.borrow_mut() = Some(app);
    });

    Ok(())
}
