use super::dispatcher::DispatchContext;
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};


/// Тело задачи: выполняется один раз, получает контекст диспетчера
pub type Job = Box<dyn FnOnce(&DispatchContext) + Send + 'static>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkItemId(u64);

impl WorkItemId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


struct ItemInner {
    id: WorkItemId,
    job: Mutex<Option<Job>>,
}

/// Единица отложенной работы.
///
/// Клоны разделяют одну и ту же задачу: сравнение и хеширование идут по
/// идентичности, а не по содержимому. Вызывающий оставляет себе клон, чтобы
/// потом отменить задачу или выполнить её inline.
#[derive(Clone)]
pub struct WorkItem {
    inner: Arc<ItemInner>,
}

impl WorkItem {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&DispatchContext) + Send + 'static,
    {
        Self::from_job(Box::new(f))
    }

    pub fn from_job(job: Job) -> Self {
        Self {
            inner: Arc::new(ItemInner {
                id: WorkItemId::next(),
                job: Mutex::new(Some(job)),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> WorkItemId {
        self.inner.id
    }

    /// `true`, если тело уже забрано (выполнено, выполняется или отменено)
    pub fn is_consumed(&self) -> bool {
        self.lock_job().is_none()
    }

    /// Забирает тело для выполнения. `None`, если его уже забрали.
    ///
    /// Замок отпускается до вызова тела: паника внутри задачи не отравляет его.
    pub(crate) fn take(&self) -> Option<Job> {
        self.lock_job().take()
    }

    /// Выбрасывает тело без выполнения, освобождая всё, что оно захватило
    pub(crate) fn discard(&self) -> bool {
        let job = self.lock_job().take();
        job.is_some()
    }

    fn lock_job(&self) -> std::sync::MutexGuard<'_, Option<Job>> {
        self.inner.job.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WorkItem {}

impl Hash for WorkItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.inner.id)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}
