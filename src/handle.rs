use super::{
    errors::SpawnError,
    result::SpawnResult,
    scheduler::Scheduler,
    work::WorkItem,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll}
};
use tokio::{
    sync::oneshot,
    time::Duration,
};


/// Handle на результат задачи из [`Scheduler::spawn`] с поддержкой отмены и timeout.
///
/// Отмена работает, пока задача ждёт в очереди; отменённая задача
/// завершает handle с [`SpawnError::Cancelled`].
pub struct JoinHandle<T> {
    scheduler: Scheduler,
    item: WorkItem,
    receiver: oneshot::Receiver<SpawnResult<T>>,
}

impl<T> JoinHandle<T> {

    pub(crate) fn new
    (
        scheduler: Scheduler,
        item: WorkItem,
        receiver: oneshot::Receiver<SpawnResult<T>>,
    ) -> Self {
        Self {
            scheduler,
            item,
            receiver
        }
    }

    #[inline]
    pub fn cancel(&self) -> bool {
        self.scheduler.cancel(&self.item)
    }

    /// Задача, стоящая за handle: для inline-выполнения из другой задачи
    #[inline]
    pub fn work_item(&self) -> &WorkItem {
        &self.item
    }

    pub async fn await_timeout(self, timeout: Duration) -> SpawnResult<T> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(SpawnError::Timeout),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SpawnResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            // отправитель уничтожен без результата: тело выброшено отменой
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(SpawnError::Cancelled))),
            Poll::Pending => Poll::Pending,
        }
    }
}
