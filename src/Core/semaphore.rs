// Named POSIX counting semaphores shared across processes

use std::ffi::CString;
use std::fmt::Debug;
use std::io;
use std::ptr::NonNull;
use std::time::Duration;

/// A counting semaphore usable from several processes.
///
/// Every wait is a real blocking call on the calling thread.
pub trait CountingSemaphore: Send + Sync + Debug {
    /// Block until the count is positive, then decrement it.
    fn wait(&self) -> io::Result<()>;

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    /// Returns `Ok(false)` on timeout.
    fn wait_timeout(&self, timeout: Duration) -> io::Result<bool>;

    /// Decrement the count if positive without blocking.
    fn try_wait(&self) -> io::Result<bool>;

    /// Increment the count, waking one waiter.
    fn post(&self) -> io::Result<()>;

    /// Snapshot of the current count.
    fn value(&self) -> io::Result<u32>;
}

/// A handle to a named semaphore (`sem_open`).
///
/// Dropping the handle closes it; the name is only removed by [`NamedSemaphore::unlink`].
#[derive(Debug)]
pub struct NamedSemaphore {
    sem: NonNull<libc::sem_t>,
    name: String,
}

// sem_t is designed for concurrent use from any thread.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

fn sem_name(name: &str) -> io::Result<CString> {
    let name = if name.starts_with('/') {
        name.to_owned()
    } else {
        format!("/{}", name)
    };
    CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

impl NamedSemaphore {
    /// Create a fresh semaphore with `initial` count.
    ///
    /// A stale semaphore left behind under the same name is removed first,
    /// then the name is created exclusively.
    pub fn create(name: &str, initial: u32) -> io::Result<Self> {
        let c_name = sem_name(name)?;
        unsafe { libc::sem_unlink(c_name.as_ptr()) };

        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        Self::from_raw(sem, name)
    }

    /// Open a semaphore some other process created. Never creates.
    pub fn open(name: &str) -> io::Result<Self> {
        let c_name = sem_name(name)?;
        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        Self::from_raw(sem, name)
    }

    /// Remove `name` from the system namespace. Open handles stay usable.
    pub fn unlink(name: &str) -> io::Result<()> {
        let c_name = sem_name(name)?;
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn from_raw(sem: *mut libc::sem_t, name: &str) -> io::Result<Self> {
        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }
        let sem = NonNull::new(sem)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sem_open returned null"))?;
        Ok(Self {
            sem,
            name: name.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close this handle, reporting failure instead of swallowing it in `Drop`.
    pub fn close(mut self) -> io::Result<()> {
        let sem = self.sem;
        drop(std::mem::take(&mut self.name));
        std::mem::forget(self);
        if unsafe { libc::sem_close(sem.as_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn timed_wait_once(&self, timeout: Duration) -> io::Result<bool> {
        let mut now = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let nanos = now.tv_nsec as u64 + u64::from(timeout.subsec_nanos());
        let deadline = libc::timespec {
            tv_sec: now.tv_sec + timeout.as_secs() as libc::time_t + (nanos / 1_000_000_000) as libc::time_t,
            tv_nsec: (nanos % 1_000_000_000) as _,
        };

        loop {
            if unsafe { libc::sem_timedwait(self.sem.as_ptr(), &deadline) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ETIMEDOUT) => return Ok(false),
                _ => return Err(err),
            }
        }
    }

    // No sem_timedwait outside Linux: poll with short sleeps.
    #[cfg(not(target_os = "linux"))]
    fn timed_wait_once(&self, timeout: Duration) -> io::Result<bool> {
        let start = std::time::Instant::now();
        loop {
            if self.try_wait()? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            std::thread::sleep(Duration::from_millis(1).min(timeout));
        }
    }
}

impl CountingSemaphore for NamedSemaphore {
    fn wait(&self) -> io::Result<()> {
        loop {
            if unsafe { libc::sem_wait(self.sem.as_ptr()) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(err);
            }
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> io::Result<bool> {
        self.timed_wait_once(timeout)
    }

    fn try_wait(&self) -> io::Result<bool> {
        loop {
            if unsafe { libc::sem_trywait(self.sem.as_ptr()) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::EAGAIN) => return Ok(false),
                _ => return Err(err),
            }
        }
    }

    fn post(&self) -> io::Result<()> {
        if unsafe { libc::sem_post(self.sem.as_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn value(&self) -> io::Result<u32> {
        let mut value: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.sem.as_ptr(), &mut value) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // Linux reports 0 rather than a negative waiter count.
        Ok(value.max(0) as u32)
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        unsafe { libc::sem_close(self.sem.as_ptr()) };
    }
}
