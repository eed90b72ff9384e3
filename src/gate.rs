/// Счётчик живых диспетчеров с фиксированным потолком.
///
/// Сам по себе не синхронизирован: живёт внутри замка
/// [`crate::queue::PendingQueue`], вместе с очередью.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    active: usize,
    max: usize,
}

impl ConcurrencyGate {
    /// `max < 1` приводится к 1
    pub fn new(max: usize) -> Self {
        Self {
            active: 0,
            max: max.max(1),
        }
    }

    /// Занимает слот, если он есть. На `true` вызывающий обязан запустить диспетчер.
    #[inline]
    pub fn try_admit(&mut self) -> bool {
        if self.active < self.max {
            self.active += 1;
            true
        } else {
            false
        }
    }

    /// Ровно один раз на каждый завершившийся диспетчер
    #[inline]
    pub fn release(&mut self) {
        debug_assert!(self.active > 0, "release without a matching admission");
        self.active = self.active.saturating_sub(1);
    }

    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.active >= self.max
    }
}
