//! Reactive store configuration.

/// Default buffer capacity for row streams.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Configuration for a reactive store.
#[derive(Debug, Clone)]
pub struct ReactiveConfig {
    /// Buffer capacity for row streams produced by `ResultSet::stream`.
    ///
    /// The worker fills the buffer and then waits for the consumer, so a
    /// small buffer trades worker throughput for memory.
    pub stream_buffer: usize,
}

impl ReactiveConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Set the row stream buffer capacity.
    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self::new()
    }
}
