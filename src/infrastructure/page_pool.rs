//! 页面池 - 基础设施层
//!
//! 持有固定数量的可复用句柄（通常是浏览器页面），借出期间由单个任务独占。
//! 句柄通过 [`PooledHandle`] 借出，守卫在任何退出路径上（成功、失败、panic）
//! 被 drop 时都会把句柄放回池中。
//!
//! 池不做健康检查：出过错的句柄同样会被放回并继续复用。

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{JobError, JobErrorKind};

/// 固定大小的句柄池
#[derive(Debug)]
pub struct PagePool<H> {
    idle: Mutex<Vec<H>>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl<H: Send + 'static> PagePool<H> {
    /// 用给定句柄构建池，池大小即句柄数量
    pub fn new(handles: Vec<H>) -> Arc<Self> {
        let capacity = handles.len();
        Arc::new(Self {
            idle: Mutex::new(handles),
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// 池大小
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前空闲句柄数
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// 借出一个句柄，没有空闲句柄时等待
    ///
    /// 没有超时：外部调用卡住时，等待者会一直等待
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledHandle<H>, JobError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| JobError::new(JobErrorKind::Resource, format!("页面池已关闭: {}", e)))?;

        // 许可与空闲句柄一一对应，拿到许可时一定有句柄
        let handle = self.lock_idle().pop().ok_or_else(|| {
            JobError::new(JobErrorKind::Resource, "页面池状态不一致: 没有空闲句柄")
        })?;
        debug!("借出句柄，剩余空闲 {}", self.permits.available_permits());

        Ok(PooledHandle {
            handle: Some(handle),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    /// 取回所有句柄（用于关闭），只应在没有任务运行时调用
    pub fn drain(&self) -> Vec<H> {
        std::mem::take(&mut *self.lock_idle())
    }

    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<H>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 借出的句柄
///
/// 句柄先放回空闲列表，之后许可才随字段一起释放，
/// 因此等待者拿到许可时一定能取到句柄
pub struct PooledHandle<H: Send + 'static> {
    handle: Option<H>,
    pool: Arc<PagePool<H>>,
    _permit: OwnedSemaphorePermit,
}

impl<H: Send + 'static> Deref for PooledHandle<H> {
    type Target = H;

    fn deref(&self) -> &H {
        // 只有 drop 时才会取走
        self.handle.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<H: Send + 'static> DerefMut for PooledHandle<H> {
    fn deref_mut(&mut self) -> &mut H {
        self.handle.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<H: Send + 'static> Drop for PooledHandle<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.lock_idle().push(handle);
        }
    }
}

impl<H: Send + 'static> std::fmt::Debug for PooledHandle<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledHandle")
            .field("pool_capacity", &self.pool.capacity)
            .finish()
    }
}
