//! Bounded polling for conditions that have no completion signal, such as a
//! freshly started daemon becoming reachable.
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::host::Host;

pub trait ReadinessCheck {
    fn is_ready(&self) -> bool;
}

/// Ready once something accepts connections on `socket`.
pub struct SocketReadiness<'a> {
    host: &'a dyn Host,
    socket: &'a Path,
}

impl<'a> SocketReadiness<'a> {
    pub fn new(host: &'a dyn Host, socket: &'a Path) -> Self {
        Self { host, socket }
    }
}

impl ReadinessCheck for SocketReadiness<'_> {
    fn is_ready(&self) -> bool {
        self.host.probe_socket(self.socket)
    }
}

impl<F: Fn() -> bool> ReadinessCheck for F {
    fn is_ready(&self) -> bool {
        self()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Poll {
    timeout: Duration,
    interval: Duration,
}

impl Poll {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Checks immediately, then every `interval` until the check passes or
    /// `timeout` has elapsed. Returns the time waited, as `Err` on timeout.
    pub fn wait(&self, check: &dyn ReadinessCheck) -> Result<Duration, Duration> {
        let start = Instant::now();
        loop {
            if check.is_ready() {
                return Ok(start.elapsed());
            }
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(elapsed);
            }
            thread::sleep(self.interval.min(self.timeout - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::host::test::TestHelperHost;

    #[test]
    fn test_ready_immediately() {
        let poll = Poll::new(Duration::from_secs(5), Duration::from_secs(1));
        let waited = poll.wait(&|| true).unwrap();
        assert!(waited < Duration::from_secs(1));
    }

    #[test]
    fn test_ready_after_some_checks() {
        let remaining = Cell::new(3usize);
        let check = || {
            let n = remaining.get();
            remaining.set(n.saturating_sub(1));
            n == 0
        };
        let poll = Poll::new(Duration::from_secs(5), Duration::from_millis(1));
        assert!(poll.wait(&check).is_ok());
        assert_eq!(remaining.get(), 0);
    }

    #[test]
    fn test_timeout() {
        let poll = Poll::new(Duration::from_millis(20), Duration::from_millis(5));
        let waited = poll.wait(&|| false).unwrap_err();
        assert!(waited >= Duration::from_millis(20));
    }

    #[test]
    fn test_socket_readiness_probes_host() {
        let host = TestHelperHost::default();
        host.set_ready_after(2);
        let socket = Path::new("/var/run/docker.sock");
        let check = SocketReadiness::new(&host, socket);

        let poll = Poll::new(Duration::from_secs(5), Duration::from_millis(1));
        assert!(poll.wait(&check).is_ok());
        assert_eq!(host.get_calls().len(), 3);
    }
}
