//! Fixed-size chunking
//!
//! A file is read twice: the first pass computes the identifier and size of
//! every block so storage can be negotiated before any payload moves, the
//! second pass yields the payload bytes in the same order. Neither pass holds
//! more than one block in memory.

use crate::addressing::content_id;
use crate::types::BlockId;
use std::io::{self, ErrorKind, Read};

/// Identifier and size of one block of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub id: BlockId,
    pub size: u64,
}

impl BlockInfo {
    pub fn new(id: impl Into<BlockId>, size: u64) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }
}

fn check_block_size(block_size: usize) -> io::Result<()> {
    if block_size == 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "block size must be positive",
        ));
    }
    Ok(())
}

/// Read up to `block_size` bytes. A short block means the reader is
/// exhausted; an empty block ends the sequence and is not itself a block.
pub fn read_next_block<R: Read>(reader: &mut R, block_size: usize) -> io::Result<Vec<u8>> {
    check_block_size(block_size)?;
    let mut buf = vec![0u8; block_size];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

/// First pass: identifier and size of every block in `reader`.
pub fn block_infos<R: Read>(reader: &mut R, block_size: usize) -> io::Result<Vec<BlockInfo>> {
    let mut infos = Vec::new();
    for block in Blocks::new(reader, block_size)? {
        let block = block?;
        infos.push(BlockInfo {
            id: content_id(&block),
            size: block.len() as u64,
        });
    }
    Ok(infos)
}

/// Second pass: iterator over block payloads in file order.
pub struct Blocks<R> {
    reader: R,
    block_size: usize,
    done: bool,
}

impl<R: Read> Blocks<R> {
    pub fn new(reader: R, block_size: usize) -> io::Result<Self> {
        check_block_size(block_size)?;
        Ok(Self {
            reader,
            block_size,
            done: false,
        })
    }
}

impl<R: Read> Iterator for Blocks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_next_block(&mut self.reader, self.block_size) {
            Ok(block) if block.is_empty() => {
                self.done = true;
                None
            }
            Ok(block) => {
                if block.len() < self.block_size {
                    self.done = true;
                }
                Some(Ok(block))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
