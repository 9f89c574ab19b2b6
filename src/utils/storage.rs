use serde::{de::DeserializeOwned, Serialize};
use web_sys::{window, Storage};

pub fn get_local_storage() -> Option<Storage> {
    window()?.local_storage().ok()?
}

pub fn save_to_storage<T: Serialize>(chave: &str, valor: &T) -> Result<(), String> {
    let storage = get_local_storage().ok_or("Não foi possível acessar o localStorage")?;
    let json = serde_json::to_string(valor)
        .map_err(|e| format!("Erro serializando dados: {}", e))?;
    storage
        .set_item(chave, &json)
        .map_err(|_| "Erro gravando no localStorage".to_string())?;
    Ok(())
}

pub fn load_from_storage<T: DeserializeOwned>(chave: &str) -> Option<T> {
    let json = load_raw(chave)?;
    serde_json::from_str(&json).ok()
}

/// Lê o valor bruto de uma chave (token, blobs de outros consumidores)
pub fn load_raw(chave: &str) -> Option<String> {
    let storage = get_local_storage()?;
    storage.get_item(chave).ok()?
}

pub fn remove_from_storage(chave: &str) -> Result<(), String> {
    let storage = get_local_storage().ok_or("Não foi possível acessar o localStorage")?;
    storage
        .remove_item(chave)
        .map_err(|_| "Erro removendo do localStorage".to_string())?;
    Ok(())
}
