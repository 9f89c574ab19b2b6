// ============================================================================
// SYNC INDICATOR - Indicador de estado e toasts de sincronização
// ============================================================================

use wasm_bindgen::JsValue;
use web_sys::{window, Element};

use crate::state::SyncStatusHandle;

/// Texto do indicador; None quando sincronizado e online (não mostrar nada)
pub fn texto_indicador(is_online: bool, pendentes: usize, is_syncing: bool) -> Option<String> {
    if is_syncing {
        return Some("🔄 Sincronizando...".to_string());
    }
    if !is_online {
        return Some(if pendentes > 0 {
            format!("📴 Offline ({} pendentes)", pendentes)
        } else {
            "📴 Offline".to_string()
        });
    }
    if pendentes > 0 {
        return Some(format!("⏳ Pendente ({})", pendentes));
    }
    None
}

/// Texto do toast de sucesso, com a contagem de ações enviadas
pub fn texto_toast_sucesso(sucessos: usize) -> String {
    format!("{} ação(ões) sincronizada(s)", sucessos)
}

pub fn texto_toast_offline() -> &'static str {
    "📴 Você está offline. As ações serão sincronizadas quando a conexão voltar."
}

pub fn texto_toast_online() -> &'static str {
    "🌐 Conexão restaurada. Sincronizando ações pendentes..."
}

/// Atualiza (ou cria) o elemento #sync-indicator no body
pub fn atualizar_indicador(status: &SyncStatusHandle) -> Result<(), JsValue> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("Sem document"))?;

    let indicador: Element = match document.get_element_by_id("sync-indicator") {
        Some(el) => el,
        None => {
            let el = document.create_element("div")?;
            el.set_id("sync-indicator");
            el.set_class_name("sync-indicator");
            if let Some(body) = document.body() {
                body.append_child(&el)?;
            }
            el
        }
    };

    match texto_indicador(
        status.get_online(),
        status.get_pending_actions(),
        status.get_syncing(),
    ) {
        Some(texto) => {
            indicador.set_text_content(Some(&texto));
            let _ = indicador.set_attribute("style", "display:block");
        }
        None => {
            let _ = indicador.set_attribute("style", "display:none");
        }
    }

    Ok(())
}

/// Toast simples anexado ao body, removido depois de alguns segundos
pub fn mostrar_toast(mensagem: &str) {
    let Some(document) = window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(toast) = document.create_element("div") else {
        return;
    };
    toast.set_class_name("sync-toast");
    toast.set_text_content(Some(mensagem));

    if let Some(body) = document.body() {
        let _ = body.append_child(&toast);
        gloo_timers::callback::Timeout::new(4000, move || {
            toast.remove();
        })
        .forget();
    }
}
