use std::io::{self, Read};

// Splits a byte stream into fixed-size blocks numbered from 1.
//
// The stream ends with the first block shorter than the block size, which
// may be empty. That makes the number of blocks `size / block_size + 1`.
pub struct BlockReader<R> {
    inner: R,
    block_size: usize,
    next_index: u64,
    done: bool,
}

impl<R: Read> BlockReader<R> {
    pub fn new(inner: R, block_size: usize) -> Self {
        Self {
            inner,
            block_size,
            next_index: 1,
            done: false,
        }
    }

    // Index of the block the next call to `next_block` returns.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    // Reads the next block into `buf`, returning its 1-based index, or None
    // once the final short block has been handed out.
    pub fn next_block(&mut self, buf: &mut Vec<u8>) -> io::Result<Option<u64>> {
        if self.done {
            return Ok(None);
        }
        buf.clear();
        buf.resize(self.block_size, 0);
        let mut filled = 0;
        while filled < self.block_size {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buf.truncate(filled);
        if filled < self.block_size {
            self.done = true;
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(index))
    }
}
