//! Mock transports for exercising the port manager and acquisition loop
//! without a sensor board attached.

use ambifan_core::{AmbifanError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::port_manager::PortOpener;
use crate::serial_driver::LineTransport;

/// One scripted outcome of `read_line`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    /// A complete line
    Line(String),
    /// Bytes arrived but no terminator before the timeout
    Timeout,
    /// Non-timeout I/O failure
    Error(String),
}

/// Shared handle for queueing reads after the transport has been moved
#[derive(Debug, Clone, Default)]
pub struct MockFeed {
    reads: Arc<Mutex<VecDeque<MockRead>>>,
}

impl MockFeed {
    pub fn push(&self, read: MockRead) {
        self.reads.lock().unwrap().push_back(read);
    }

    pub fn push_line(&self, line: &str) {
        self.push(MockRead::Line(line.to_string()));
    }

    /// Reads still queued
    pub fn pending(&self) -> usize {
        self.reads.lock().unwrap().len()
    }
}

/// Scripted line transport
pub struct MockTransport {
    port_name: String,
    feed: MockFeed,
    cleared: Arc<Mutex<usize>>,
    reads: Arc<Mutex<usize>>,
}

impl MockTransport {
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            feed: MockFeed::default(),
            cleared: Arc::new(Mutex::new(0)),
            reads: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_lines<'a>(self, lines: impl IntoIterator<Item = &'a str>) -> Self {
        for line in lines {
            self.feed.push_line(line);
        }
        self
    }

    pub fn feed(&self) -> MockFeed {
        self.feed.clone()
    }

    /// Number of `clear_input_buffer` calls
    pub fn clear_count(&self) -> Arc<Mutex<usize>> {
        self.cleared.clone()
    }

    /// Number of `read_line` calls
    pub fn read_count(&self) -> Arc<Mutex<usize>> {
        self.reads.clone()
    }
}

#[async_trait]
impl LineTransport for MockTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        let reads = self.feed.reads.lock().unwrap();
        Ok(reads
            .iter()
            .map(|read| match read {
                MockRead::Line(line) => line.len() + 1,
                MockRead::Timeout | MockRead::Error(_) => 1,
            })
            .sum())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        *self.reads.lock().unwrap() += 1;

        let next = self.feed.reads.lock().unwrap().pop_front();
        match next {
            Some(MockRead::Line(line)) => Ok(Some(line)),
            Some(MockRead::Timeout) | None => Ok(None),
            Some(MockRead::Error(msg)) => Err(AmbifanError::Read(msg)),
        }
    }

    fn clear_input_buffer(&mut self) -> Result<()> {
        *self.cleared.lock().unwrap() += 1;
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Port opener backed by scripted transports
pub struct MockOpener {
    ports: Vec<String>,
    transports: Mutex<HashMap<String, MockTransport>>,
    failing: HashSet<String>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl MockOpener {
    pub fn new<S: Into<String>>(ports: impl IntoIterator<Item = S>) -> Self {
        Self {
            ports: ports.into_iter().map(Into::into).collect(),
            transports: Mutex::new(HashMap::new()),
            failing: HashSet::new(),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make opening `port` fail
    pub fn fail_on(mut self, port: &str) -> Self {
        self.failing.insert(port.to_string());
        self
    }

    /// Transport handed out when `port` is opened
    pub fn with_transport(self, port: &str, transport: MockTransport) -> Self {
        self.transports
            .lock()
            .unwrap()
            .insert(port.to_string(), transport);
        self
    }

    /// Ports passed to `open`, in call order
    pub fn attempts(&self) -> Arc<Mutex<Vec<String>>> {
        self.attempts.clone()
    }
}

impl PortOpener for MockOpener {
    fn list_ports(&self) -> Result<Vec<String>> {
        Ok(self.ports.clone())
    }

    fn open(&self, port: &str) -> Result<Box<dyn LineTransport>> {
        self.attempts.lock().unwrap().push(port.to_string());

        if self.failing.contains(port) {
            return Err(AmbifanError::OpenFailed {
                port: port.to_string(),
                reason: "mock open failure".to_string(),
            });
        }

        let transport = self
            .transports
            .lock()
            .unwrap()
            .remove(port)
            .unwrap_or_else(|| MockTransport::new(port));
        Ok(Box::new(transport))
    }
}
