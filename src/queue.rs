use super::{
    errors::SnapshotError,
    gate::ConcurrencyGate,
    result::SnapshotResult,
    work::WorkItem,
};
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError, TryLockError},
};


struct QueueState {
    items: VecDeque<WorkItem>,
    gate: ConcurrencyGate,
}

/// Итог постановки в очередь
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Слот занят под новый диспетчер, его нужно запустить
    Admitted,
    /// Все слоты заняты, задачу подберёт уже живой диспетчер
    Queued,
}

/// Что делать со слотом диспетчера, который разматывается после паники
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Очередь пуста, слот освобождён
    Released,
    /// В очереди есть работа, слот передаётся новому диспетчеру
    Replace,
}

/// FIFO ожидающих задач и счётчик диспетчеров под одним замком.
///
/// Постановка в очередь и допуск нового диспетчера (как и извлечение и
/// освобождение слота) выполняются в одной критической секции, поэтому
/// непустая очередь никогда не остаётся без диспетчера.
pub struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                gate: ConcurrencyGate::new(max_concurrency),
            }),
        }
    }

    // Под замком не выполняется пользовательский код, отравление не несёт смысла.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, item: WorkItem) {
        self.lock().items.push_back(item);
    }

    pub fn enqueue_and_admit(&self, item: WorkItem) -> Admission {
        let mut state = self.lock();
        state.items.push_back(item);
        if state.gate.try_admit() {
            Admission::Admitted
        } else {
            Admission::Queued
        }
    }

    pub fn try_pop_front(&self) -> Option<WorkItem> {
        self.lock().items.pop_front()
    }

    /// Шаг диспетчера: голова очереди, либо (если пусто) освобождение слота и `None`
    pub fn pop_or_retire(&self) -> Option<WorkItem> {
        let mut state = self.lock();
        match state.items.pop_front() {
            Some(item) => Some(item),
            None => {
                state.gate.release();
                None
            }
        }
    }

    /// Освобождает слот диспетчера, который так и не был запущен
    pub fn release_slot(&self) {
        self.lock().gate.release();
    }

    pub fn handoff_after_panic(&self) -> Handoff {
        let mut state = self.lock();
        if state.items.is_empty() {
            state.gate.release();
            Handoff::Released
        } else {
            Handoff::Replace
        }
    }

    /// Удаляет первое вхождение по идентичности
    pub fn remove(&self, item: &WorkItem) -> bool {
        let mut state = self.lock();
        match state.items.iter().position(|queued| queued == item) {
            Some(idx) => state.items.remove(idx).is_some(),
            None => false,
        }
    }

    /// Неблокирующий снимок, только для диагностики
    pub fn try_snapshot(&self) -> SnapshotResult {
        match self.state.try_lock() {
            Ok(state) => Ok(state.items.iter().cloned().collect()),
            Err(TryLockError::Poisoned(poisoned)) => {
                Ok(poisoned.into_inner().items.iter().cloned().collect())
            }
            Err(TryLockError::WouldBlock) => Err(SnapshotError::Busy),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn active(&self) -> usize {
        self.lock().gate.active()
    }

    pub fn max_concurrency(&self) -> usize {
        self.lock().gate.max()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.items.is_empty() && state.gate.active() == 0
    }

    /// `(queued, active)` из одной критической секции
    pub fn counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.items.len(), state.gate.active())
    }
}
