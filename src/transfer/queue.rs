use std::collections::VecDeque;

/// A FIFO of non-empty chunks, optionally bounded. When full, the oldest chunks are evicted.
#[derive(Debug, Clone)]
pub struct Queue<T = Vec<u8>> {
    chunks: VecDeque<T>,
    max_size: Option<usize>,
}

impl<T: AsRef<[u8]> + Default> Queue<T> {
    /// Creates an unbounded queue.
    pub fn new() -> Queue<T> {
        Queue { chunks: VecDeque::new(), max_size: None }
    }

    /// Creates a queue keeping at most the last max_size chunks. Zero means unbounded.
    pub fn with_max_size(max_size: usize) -> Queue<T> {
        Queue { chunks: VecDeque::new(), max_size: (max_size > 0).then_some(max_size) }
    }

    /// Appends a chunk. Empty chunks are ignored.
    pub fn write(&mut self, chunk: T) {
        if chunk.as_ref().is_empty() {
            return;
        }
        self.chunks.push_back(chunk);
        if let Some(max_size) = self.max_size {
            while self.chunks.len() > max_size {
                self.chunks.pop_front();
            }
        }
    }

    /// Removes and returns the oldest chunk, or an empty value if the queue is empty.
    pub fn read(&mut self) -> T {
        self.chunks.pop_front().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Iterates without consuming.
    pub fn iter(&self) -> impl Iterator<Item=&T> {
        self.chunks.iter()
    }
}

impl<T: AsRef<[u8]> + Default> Default for Queue<T> {
    fn default() -> Self {
        Queue::new()
    }
}
