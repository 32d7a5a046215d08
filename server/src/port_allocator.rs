//! Bounded pool of listen ports handed out to registering clients.

use crate::error::RegistryError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO pool over an inclusive port range.
///
/// `acquire` and `release` are safe to call from concurrent dispatch
/// paths; the internal lock is never held across an await point.
pub struct PortAllocator {
    pool: Mutex<VecDeque<u16>>,
    min_port: u16,
    max_port: u16,
}

impl PortAllocator {
    /// Pre-fills the pool with every port in `[min_port, max_port]`.
    pub fn new(min_port: u16, max_port: u16) -> Self {
        Self {
            pool: Mutex::new((min_port..=max_port).collect()),
            min_port,
            max_port,
        }
    }

    /// Takes a port from the pool. Non-blocking: fails immediately with
    /// [`RegistryError::PortsExhausted`] when the pool is empty.
    pub fn acquire(&self) -> Result<u16, RegistryError> {
        self.pool
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(RegistryError::PortsExhausted)
    }

    /// Returns a port to the pool.
    ///
    /// Out-of-range values are ignored, as are releases that would grow
    /// the pool past its capacity. Releasing a port still held by another
    /// client is not detected.
    pub fn release(&self, port: u16) {
        if port < self.min_port || port > self.max_port {
            return;
        }

        let mut pool = self.pool.lock().unwrap();
        if pool.len() < self.capacity() {
            pool.push_back(port);
        }
    }

    /// Number of ports currently available.
    pub fn available(&self) -> usize {
        self.pool.lock().unwrap().len()
    }

    /// Total size of the configured range.
    pub fn capacity(&self) -> usize {
        (self.max_port - self.min_port) as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_pool_prefilled_with_range() {
        let allocator = PortAllocator::new(9001, 9010);
        assert_eq!(allocator.capacity(), 10);
        assert_eq!(allocator.available(), 10);
    }

    #[test]
    fn test_acquire_yields_distinct_ports_until_exhausted() {
        let allocator = PortAllocator::new(9001, 9005);
        let mut seen = HashSet::new();

        for _ in 0..5 {
            let port = allocator.acquire().unwrap();
            assert!((9001..=9005).contains(&port));
            assert!(seen.insert(port));
        }

        assert_eq!(allocator.acquire(), Err(RegistryError::PortsExhausted));
        assert_eq!(allocator.available(), 0);
    }

    #[test]
    fn test_released_port_becomes_acquirable() {
        let allocator = PortAllocator::new(9001, 9001);
        let port = allocator.acquire().unwrap();
        assert_eq!(allocator.acquire(), Err(RegistryError::PortsExhausted));

        allocator.release(port);
        assert_eq!(allocator.acquire(), Ok(port));
    }

    #[test]
    fn test_out_of_range_release_is_ignored() {
        let allocator = PortAllocator::new(9001, 9005);
        allocator.release(9000);
        allocator.release(9006);
        allocator.release(80);
        assert_eq!(allocator.available(), 5);
    }

    #[test]
    fn test_release_never_overfills_pool() {
        let allocator = PortAllocator::new(9001, 9002);
        allocator.release(9001);
        allocator.release(9002);
        assert_eq!(allocator.available(), 2);
    }

    #[test]
    fn test_concurrent_acquire_hands_out_each_port_once() {
        let allocator = Arc::new(PortAllocator::new(9001, 9064));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let allocator = Arc::clone(&allocator);
            handles.push(std::thread::spawn(move || {
                let mut ports = Vec::new();
                for _ in 0..8 {
                    ports.push(allocator.acquire().unwrap());
                }
                ports
            }));
        }

        let mut all_ports = HashSet::new();
        for handle in handles {
            for port in handle.join().unwrap() {
                assert!(all_ports.insert(port), "port handed out twice");
            }
        }

        assert_eq!(all_ports.len(), 64);
        assert_eq!(allocator.acquire(), Err(RegistryError::PortsExhausted));
    }
}
