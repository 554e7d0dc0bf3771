// Shared memory and named semaphore backend tests for Linux
// Run with: cargo test --test shared_memory -- --nocapture

#[cfg(target_os = "linux")]
mod linux_tests {
    use fas_shm::Core::{
        attach_shared_memory, create_shared_memory, unlink_shared_memory, CountingSemaphore,
        NamedSemaphore, RawHandle,
    };
    use std::time::{Duration, Instant};

    fn unique(name: &str) -> String {
        format!("fas_test_{}_{}", name, std::process::id())
    }

    #[test]
    fn test_create_shared_memory() {
        let name = unique("create");
        let size = 4096;
        let shm = create_shared_memory(&name, size).unwrap();

        assert_eq!(shm.size(), size);
        assert!(!shm.as_ptr().is_null());

        // Test writing to the memory
        unsafe {
            let slice = std::slice::from_raw_parts_mut(shm.as_ptr(), size);
            slice[0] = 0x42;
            assert_eq!(slice[0], 0x42);
        }

        shm.close().unwrap();
        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_mmap_zero_initialized() {
        let name = unique("zero");
        let size = 1024;
        let shm = create_shared_memory(&name, size).unwrap();

        unsafe {
            let slice = std::slice::from_raw_parts(shm.as_ptr(), size);
            assert!(slice.iter().all(|&b| b == 0), "fresh segment should be zero-filled");
        }

        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_attach_sees_owner_writes() {
        let name = unique("attach");
        let size = 4096;
        let owner = create_shared_memory(&name, size).unwrap();
        let attached = attach_shared_memory(&name, size).unwrap();
        assert_eq!(attached.size(), size);

        unsafe {
            *owner.as_ptr().add(100) = 0xAA;
            assert_eq!(*attached.as_ptr().add(100), 0xAA);
            *attached.as_ptr().add(200) = 0x55;
            assert_eq!(*owner.as_ptr().add(200), 0x55);
        }

        attached.close().unwrap();
        owner.close().unwrap();
        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_attach_never_creates() {
        let name = unique("missing");
        let result = attach_shared_memory(&name, 4096);
        assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::NotFound);
        assert!(!std::path::Path::new(&format!("/dev/shm/{}", name)).exists());
    }

    #[test]
    fn test_attach_rejects_small_segment() {
        let name = unique("small");
        let _owner = create_shared_memory(&name, 64).unwrap();
        let err = attach_shared_memory(&name, 4096).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_create_replaces_stale_segment() {
        let name = unique("restart");
        let stale = create_shared_memory(&name, 4096).unwrap();
        unsafe { *stale.as_ptr() = 0xAA };

        let fresh = create_shared_memory(&name, 4096).unwrap();
        unsafe {
            assert_eq!(*fresh.as_ptr(), 0, "fresh segment must not share the stale inode");
            *stale.as_ptr().add(1) = 0x55;
            assert_eq!(*fresh.as_ptr().add(1), 0);
        }

        let attached = attach_shared_memory(&name, 4096).unwrap();
        unsafe {
            *fresh.as_ptr().add(2) = 7;
            assert_eq!(*attached.as_ptr().add(2), 7);
        }
        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_unlink_keeps_mapping_valid() {
        let name = unique("unlinked");
        let shm = create_shared_memory(&name, 4096).unwrap();
        unlink_shared_memory(&name).unwrap();
        unsafe {
            *shm.as_ptr() = 7;
            assert_eq!(*shm.as_ptr(), 7);
        }
        assert!(unlink_shared_memory(&name).is_err());
    }

    #[test]
    fn test_raw_handle() {
        let name = unique("handle");
        let shm = create_shared_memory(&name, 4096).unwrap();
        match shm.raw_handle() {
            RawHandle::Fd(fd) => assert!(fd > 0, "File descriptor should be positive"),
        }
        unlink_shared_memory(&name).unwrap();
    }

    #[test]
    fn test_named_semaphore_counts() {
        let name = unique("sem_counts");
        let sem = NamedSemaphore::create(&name, 2).unwrap();
        assert_eq!(sem.value().unwrap(), 2);

        assert!(sem.try_wait().unwrap());
        sem.wait().unwrap();
        assert_eq!(sem.value().unwrap(), 0);
        assert!(!sem.try_wait().unwrap());

        sem.post().unwrap();
        assert_eq!(sem.value().unwrap(), 1);

        sem.close().unwrap();
        NamedSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_named_semaphore_timeout() {
        let name = unique("sem_timeout");
        let sem = NamedSemaphore::create(&name, 0).unwrap();

        let start = Instant::now();
        assert!(!sem.wait_timeout(Duration::from_millis(50)).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(40));

        sem.post().unwrap();
        assert!(sem.wait_timeout(Duration::from_millis(50)).unwrap());

        NamedSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_named_semaphore_shared_between_handles() {
        let name = unique("sem_shared");
        let created = NamedSemaphore::create(&name, 0).unwrap();
        let opened = NamedSemaphore::open(&name).unwrap();

        let waiter = std::thread::spawn(move || opened.wait_timeout(Duration::from_secs(5)).unwrap());
        std::thread::sleep(Duration::from_millis(20));
        created.post().unwrap();
        assert!(waiter.join().unwrap());

        NamedSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_open_missing_semaphore_fails() {
        assert!(NamedSemaphore::open(&unique("sem_missing")).is_err());
    }

    #[test]
    fn test_create_replaces_stale_semaphore() {
        let name = unique("sem_stale");
        let stale = NamedSemaphore::create(&name, 5).unwrap();
        drop(stale);

        // Left behind without unlink, e.g. by a crashed supervisor
        let fresh = NamedSemaphore::create(&name, 1).unwrap();
        assert_eq!(fresh.value().unwrap(), 1);
        NamedSemaphore::unlink(&name).unwrap();
    }
}

#[cfg(not(target_os = "linux"))]
mod non_linux_tests {
    use fas_shm::Core::{attach_shared_memory, create_shared_memory};

    #[test]
    fn test_unsupported_platform() {
        let result = create_shared_memory("test", 4096);
        assert!(result.is_err());

        if let Err(err) = result {
            assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        }
    }

    #[test]
    fn test_attach_unsupported_platform() {
        let result = attach_shared_memory("test", 4096);
        assert!(result.is_err());

        if let Err(err) = result {
            assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        }
    }
}
