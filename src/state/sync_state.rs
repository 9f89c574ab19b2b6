// ============================================================================
// SYNC STATE - Estado derivado da sincronização (não persistido)
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

/// Estado observável do ciclo de sincronização, recomputado a partir da fila
/// e da conectividade. A fila persistida é a única fonte de verdade do
/// trabalho pendente; isto aqui é espelho para a UI e para o guard de
/// exclusão mútua entre disparos concorrentes.
#[derive(Clone)]
pub struct SyncStatusHandle {
    is_online: Rc<RefCell<bool>>,
    pending_actions: Rc<RefCell<usize>>,
    last_sync: Rc<RefCell<Option<i64>>>,
    is_syncing: Rc<RefCell<bool>>,
}

impl SyncStatusHandle {
    pub fn new() -> Self {
        Self {
            is_online: Rc::new(RefCell::new(true)),
            pending_actions: Rc::new(RefCell::new(0)),
            last_sync: Rc::new(RefCell::new(None)),
            is_syncing: Rc::new(RefCell::new(false)),
        }
    }

    pub fn set_online(&self, online: bool) {
        *self.is_online.borrow_mut() = online;
    }

    pub fn get_online(&self) -> bool {
        *self.is_online.borrow()
    }

    pub fn set_pending_actions(&self, quantidade: usize) {
        *self.pending_actions.borrow_mut() = quantidade;
    }

    pub fn get_pending_actions(&self) -> usize {
        *self.pending_actions.borrow()
    }

    pub fn set_last_sync(&self, instante: Option<i64>) {
        *self.last_sync.borrow_mut() = instante;
    }

    pub fn get_last_sync(&self) -> Option<i64> {
        *self.last_sync.borrow()
    }

    pub fn get_syncing(&self) -> bool {
        *self.is_syncing.borrow()
    }

    /// Tenta assumir a passada de sincronização. Retorna false se outra
    /// passada já está em andamento (single-flight; um clique de "tentar de
    /// novo" não pode correr junto com o disparo automático do online).
    pub fn begin_sync(&self) -> bool {
        let mut syncing = self.is_syncing.borrow_mut();
        if *syncing {
            return false;
        }
        *syncing = true;
        true
    }

    pub fn end_sync(&self) {
        *self.is_syncing.borrow_mut() = false;
    }
}

impl Default for SyncStatusHandle {
    fn default() -> Self {
        Self::new()
    }
}
