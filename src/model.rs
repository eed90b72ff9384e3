/// Снимок счётчиков планировщика.
///
/// `executed` и `executed_inline` считают начатые задачи, `panicked` те из
/// них, что завершились паникой (перехваченной или нет).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerMetrics {
    pub active_dispatchers: usize,
    pub max_concurrency: usize,
    pub queued_items: usize,
    pub total_submitted: usize,
    pub executed: usize,
    pub executed_inline: usize,
    pub cancelled: usize,
    pub panicked: usize,
    pub dispatchers_spawned: usize,
}

impl SchedulerMetrics {
    pub fn utilization(&self) -> f64 {
        if self.max_concurrency == 0 {
            return 0.0;
        }
        self.active_dispatchers as f64 / self.max_concurrency as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_items as f64 / self.max_concurrency.max(1) as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.executed + self.executed_inline;
        if total == 0 {
            return 1.0;
        }
        total.saturating_sub(self.panicked) as f64 / total as f64
    }

    pub fn is_idle(&self) -> bool {
        self.active_dispatchers == 0 && self.queued_items == 0
    }
}
