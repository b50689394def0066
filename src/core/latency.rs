//! Latency - Latenze di rete simulate per ogni operazione degli store

use std::time::Duration;

/// Operazioni degli store che attendono una latenza simulata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    GetAll,
    GetById,
    GetByChatId,
    Create,
    Update,
    Delete,
    MarkAsRead,
    UpdateUnread,
    UpdateStatus,
    GetCurrentUser,
    Search,
    UpdateLastSeen,
}

/// Tabella delle latenze di uno store, in millisecondi, scalata da `Config::latency_scale`
#[derive(Debug, Clone)]
pub struct Latency {
    table: fn(Op) -> u64,
    scale: f64,
}

impl Latency {
    pub fn chats(scale: f64) -> Self {
        Self { table: chat_ms, scale }
    }

    pub fn messages(scale: f64) -> Self {
        Self {
            table: message_ms,
            scale,
        }
    }

    pub fn users(scale: f64) -> Self {
        Self { table: user_ms, scale }
    }

    pub fn none() -> Self {
        Self {
            table: chat_ms,
            scale: 0.0,
        }
    }

    pub fn delay(&self, op: Op) -> Duration {
        let ms = (self.table)(op) as f64 * self.scale;
        Duration::from_micros((ms * 1000.0).round() as u64)
    }

    pub async fn wait(&self, op: Op) {
        let delay = self.delay(op);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn chat_ms(op: Op) -> u64 {
    match op {
        Op::GetAll | Op::Delete => 300,
        Op::GetById | Op::Update => 250,
        Op::Create => 400,
        Op::MarkAsRead => 200,
        Op::UpdateUnread => 150,
        _ => 200,
    }
}

fn message_ms(op: Op) -> u64 {
    match op {
        Op::GetAll | Op::Create | Op::Delete => 300,
        Op::GetById | Op::MarkAsRead => 200,
        Op::GetByChatId => 400,
        Op::Update => 250,
        Op::UpdateStatus => 100,
        _ => 200,
    }
}

fn user_ms(op: Op) -> u64 {
    match op {
        Op::GetAll | Op::Delete | Op::Search => 300,
        Op::GetById => 200,
        Op::Create => 400,
        Op::Update => 250,
        Op::GetCurrentUser => 150,
        Op::UpdateLastSeen => 100,
        _ => 200,
    }
}
