//! Collection - Contenitore generico in memoria condiviso da tutti i repository
//!
//! Ogni repository possiede una `Collection` della propria entità: nessuno stato è
//! condiviso tra repository diversi. Il lock della collezione non viene mai tenuto
//! durante la latenza simulata; le scritture sullo stesso id sono invece serializzate
//! da un mutex per id (FIFO), preso prima della latenza.

use crate::core::AppError;
use crate::core::latency::{Latency, Op};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

/// Entità gestibile da una `Collection`
pub trait Entity: Clone + Send + Sync + 'static {
    /// Messaggio di errore quando l'id non esiste, es. "Chat not found"
    const NOT_FOUND: &'static str;

    fn id(&self) -> &str;
}

/// Generatore di id basato sul timestamp in millisecondi, strettamente crescente
/// anche quando due create cadono nello stesso millisecondo.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn next(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

type Sequencer = DashMap<String, Arc<Mutex<()>>>;

/// Turno di scrittura su un id. Al rilascio la voce del sequencer viene rimossa se
/// nessun'altra chiamata la sta aspettando.
pub struct Turn<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    sequencer: &'a Sequencer,
    id: String,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        // prima si libera il mutex, altrimenti la guard conta come riferimento
        self.guard.take();
        self.sequencer
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct Collection<E: Entity> {
    items: RwLock<Vec<E>>,
    latency: Latency,
    ids: IdGenerator,
    sequencer: Sequencer,
}

impl<E: Entity> Collection<E> {
    pub fn new(seed: Vec<E>, latency: Latency) -> Self {
        Self {
            items: RwLock::new(seed),
            latency,
            ids: IdGenerator::default(),
            sequencer: DashMap::new(),
        }
    }

    pub fn next_id(&self) -> String {
        let mut id = self.ids.next();
        // i seed possono contenere id numerici: evitiamo collisioni
        while self.contains_blocking(&id) {
            id = self.ids.next();
        }
        id
    }

    fn contains_blocking(&self, id: &str) -> bool {
        match self.items.try_read() {
            Ok(items) => items.iter().any(|e| e.id() == id),
            // writer attivo: l'id generato è comunque successivo a quelli già assegnati
            Err(_) => false,
        }
    }

    /// Attende la latenza simulata di `op`
    pub async fn pause(&self, op: Op) {
        self.latency.wait(op).await;
    }

    /// Prende il turno per scrivere su `id`. Le chiamate concorrenti sullo stesso id
    /// vengono servite in ordine di arrivo.
    pub async fn sequence(&self, id: &str) -> Turn<'_> {
        let lock = self
            .sequencer
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Turn {
            guard: Some(lock.lock_owned().await),
            sequencer: &self.sequencer,
            id: id.to_string(),
        }
    }

    pub async fn snapshot(&self) -> Vec<E> {
        self.items.read().await.clone()
    }

    pub async fn filter<F>(&self, predicate: F) -> Vec<E>
    where
        F: Fn(&E) -> bool,
    {
        self.items
            .read()
            .await
            .iter()
            .filter(|e| predicate(*e))
            .cloned()
            .collect()
    }

    pub async fn find(&self, id: &str) -> Result<E, AppError> {
        self.items
            .read()
            .await
            .iter()
            .find(|e| e.id() == id)
            .cloned()
            .ok_or_else(|| not_found::<E>(id))
    }

    pub async fn any<F>(&self, predicate: F) -> bool
    where
        F: Fn(&E) -> bool,
    {
        self.items.read().await.iter().any(predicate)
    }

    pub async fn insert(&self, entity: E) -> E {
        debug!(id = entity.id(), "Appending entity");
        self.items.write().await.push(entity.clone());
        entity
    }

    /// Inserisce `entity` solo se nessun record esistente è in conflitto con essa.
    /// Controllo e inserimento avvengono sotto lo stesso lock.
    pub async fn insert_unique<F>(&self, entity: E, conflicts: F) -> Option<E>
    where
        F: Fn(&E, &E) -> bool,
    {
        let mut items = self.items.write().await;
        if items.iter().any(|existing| conflicts(existing, &entity)) {
            return None;
        }
        items.push(entity.clone());
        Some(entity)
    }

    /// Applica `change` al record con id `id` e ne restituisce la copia aggiornata.
    /// Se `change` fallisce il record resta invariato.
    pub async fn modify<F>(&self, id: &str, change: F) -> Result<E, AppError>
    where
        F: FnOnce(&mut E) -> Result<(), AppError>,
    {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| not_found::<E>(id))?;
        let mut updated = slot.clone();
        change(&mut updated)?;
        *slot = updated.clone();
        Ok(updated)
    }

    /// Applica `change` a tutti i record che soddisfano `predicate`.
    /// `change` restituisce true se ha modificato il record.
    pub async fn modify_where<P, F>(&self, predicate: P, mut change: F) -> Vec<E>
    where
        P: Fn(&E) -> bool,
        F: FnMut(&mut E) -> bool,
    {
        let mut items = self.items.write().await;
        items
            .iter_mut()
            .filter(|e| predicate(&**e))
            .filter_map(|e| change(&mut *e).then(|| e.clone()))
            .collect()
    }

    pub async fn remove(&self, id: &str) -> Result<E, AppError> {
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| not_found::<E>(id))?;
        Ok(items.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

fn not_found<E: Entity>(id: &str) -> AppError {
    AppError::not_found(E::NOT_FOUND).with_details(format!("id {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Note {
        id: String,
        text: String,
    }

    impl Entity for Note {
        const NOT_FOUND: &'static str = "Note not found";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_ids_are_strictly_increasing() {
        let ids = IdGenerator::default();
        let generated: Vec<i64> = (0..1000).map(|_| ids.next().parse().unwrap()).collect();
        assert!(generated.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_failed_change_leaves_record_untouched() {
        let coll = Collection::new(vec![note("1", "a")], Latency::none());
        let res = coll
            .modify("1", |n| {
                n.text = "b".into();
                Err(AppError::validation("nope"))
            })
            .await;
        assert!(res.is_err());
        assert_eq!(coll.find("1").await.unwrap().text, "a");
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let coll = Collection::new(vec![note("1", "a")], Latency::none());
        let err = coll.remove("2").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Note not found");
        assert_eq!(coll.len().await, 1);
    }

    #[tokio::test]
    async fn test_turns_are_released_on_missing_ids() {
        let coll = Collection::new(vec![note("1", "a")], Latency::none());
        for _ in 0..3 {
            let _turn = coll.sequence("nope").await;
            assert!(coll.remove("nope").await.is_err());
        }
        assert!(coll.sequencer.is_empty());

        {
            let _turn = coll.sequence("1").await;
            assert_eq!(coll.sequencer.len(), 1);
            coll.remove("1").await.unwrap();
        }
        assert!(coll.sequencer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_on_same_id_run_in_call_order() {
        let coll = Collection::new(vec![note("1", "a")], Latency::chats(1.0));
        let write = |text: &'static str| {
            let coll = &coll;
            async move {
                let _turn = coll.sequence("1").await;
                coll.pause(Op::Update).await;
                coll.modify("1", |n| {
                    n.text.push_str(text);
                    Ok(())
                })
                .await
            }
        };

        let (first, second, third) = tokio::join!(write("b"), write("c"), write("d"));
        assert_eq!(first.unwrap().text, "ab");
        assert_eq!(second.unwrap().text, "abc");
        assert_eq!(third.unwrap().text, "abcd");
        assert!(coll.sequencer.is_empty());
    }

    #[tokio::test]
    async fn test_next_id_skips_seeded_ids() {
        let now = Utc::now().timestamp_millis();
        let seeded: Vec<Note> = (0..5)
            .map(|i| note(&(now + i).to_string(), "seed"))
            .collect();
        let coll = Collection::new(seeded, Latency::none());
        let id = coll.next_id();
        assert!(coll.find(&id).await.is_err());
    }
}
