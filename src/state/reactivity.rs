// ============================================================================
// REACTIVITY - Barramento explícito de eventos entre coordenador e consumidores
// ============================================================================
// Substitui CustomEvents do DOM: quem quer reagir ao ciclo de sync se inscreve
// aqui, e os publicadores não conhecem os inscritos.
// ============================================================================

use std::cell::RefCell;

type Assinante<E> = Box<dyn Fn(&E)>;

/// Registro de inscritos com publicação síncrona na thread principal
pub struct EventBus<E> {
    assinantes: RefCell<Vec<Assinante<E>>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            assinantes: RefCell::new(Vec::new()),
        }
    }

    /// Inscreve um callback para todos os eventos futuros
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&E) + 'static,
    {
        self.assinantes.borrow_mut().push(Box::new(callback));
    }

    /// Entrega o evento a todos os inscritos, na ordem de inscrição
    pub fn publish(&self, evento: &E) {
        for assinante in self.assinantes.borrow().iter() {
            assinante(evento);
        }
    }

    pub fn len(&self) -> usize {
        self.assinantes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assinantes.borrow().is_empty()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sync::SyncEvent;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publica_para_todos_os_inscritos_em_ordem() {
        let bus = EventBus::<SyncEvent>::new();
        let recebidos = Rc::new(RefCell::new(Vec::new()));

        for marca in ["a", "b"] {
            let recebidos = recebidos.clone();
            bus.subscribe(move |evento: &SyncEvent| {
                recebidos.borrow_mut().push((marca, evento.clone()));
            });
        }

        bus.publish(&SyncEvent::Online);
        bus.publish(&SyncEvent::SincronizacaoConcluida { sucessos: 2 });

        let recebidos = recebidos.borrow();
        assert_eq!(recebidos.len(), 4);
        assert_eq!(recebidos[0], ("a", SyncEvent::Online));
        assert_eq!(recebidos[1], ("b", SyncEvent::Online));
        assert_eq!(
            recebidos[2],
            ("a", SyncEvent::SincronizacaoConcluida { sucessos: 2 })
        );
    }

    #[test]
    fn publicar_sem_inscritos_nao_falha() {
        let bus = EventBus::<SyncEvent>::new();
        assert!(bus.is_empty());
        bus.publish(&SyncEvent::Offline);
    }
}
