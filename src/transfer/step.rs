use std::cmp::min;
use std::io::{BufRead, ErrorKind, Read};

/// Most body bytes decoded in one step of a transfer.
pub const BODY_STEP_BYTES: usize = 16 * 1024;

/// Lets a decoder consume at most a fixed number of bytes from the reader. Once they are used up
/// every read fails with WouldBlock, like a socket that ran dry.
pub struct StepReader<'a, R> {
    inner: &'a mut R,
    budget: usize,
}

impl<'a, R: BufRead> StepReader<'a, R> {
    pub fn new(inner: &'a mut R, budget: usize) -> StepReader<'a, R> {
        StepReader { inner, budget }
    }

    /// True once the budget is used up. A WouldBlock seen after that is not the socket's.
    pub fn is_spent(&self) -> bool {
        self.budget == 0
    }
}

impl<R: BufRead> Read for StepReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let available = self.fill_buf()?;
        let amount = min(available.len(), buf.len());
        buf[..amount].copy_from_slice(&available[..amount]);
        self.consume(amount);
        Ok(amount)
    }
}

impl<R: BufRead> BufRead for StepReader<'_, R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        if self.budget == 0 {
            return Err(ErrorKind::WouldBlock.into());
        }
        let budget = self.budget;
        let buf = self.inner.fill_buf()?;
        Ok(&buf[..min(buf.len(), budget)])
    }

    fn consume(&mut self, amount: usize) {
        self.inner.consume(amount);
        self.budget -= min(amount, self.budget);
    }
}
