//! Application State - Stato globale dell'applicazione
//!
//! Contiene i tre store, l'hub degli eventi e la configurazione. Viene costruito una
//! volta all'avvio e condiviso come `Arc<AppState>` con il controller e con i chiamanti.

use crate::core::Config;
use crate::core::latency::Latency;
use crate::events::EventHub;
use crate::repositories::{ChatRepository, MessageRepository, UserRepository};
use crate::seed::Seed;

/// Stato condiviso tra controller e chiamanti
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per la gestione delle chat
    pub chat: ChatRepository,

    /// Repository per la gestione dei messaggi
    pub msg: MessageRepository,

    /// Notifiche verso la UI (consegne, risposte simulate, typing)
    pub events: EventHub,

    pub config: Config,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// a partire dai dati di seed.
    ///
    /// # Arguments
    /// * `config` - Configurazione effettiva (latenze, ritardo di consegna, utente corrente)
    /// * `seed` - Contenuto iniziale delle tre collezioni
    pub fn new(config: Config, seed: Seed) -> Self {
        let events = EventHub::new(config.event_channel_capacity);
        let scale = config.latency_scale;

        Self {
            user: UserRepository::new(
                seed.users,
                Latency::users(scale),
                config.current_user_id.clone(),
                config.online_window,
            ),
            chat: ChatRepository::new(seed.chats, Latency::chats(scale)),
            msg: MessageRepository::new(
                seed.messages,
                Latency::messages(scale),
                config.delivery_delay,
                events.clone(),
            ),
            events,
            config,
        }
    }
}
