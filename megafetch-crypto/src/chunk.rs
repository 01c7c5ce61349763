//! Chunk schedule for streamed downloads.
//!
//! Chunks start at 128 KiB and grow by 128 KiB per chunk until they reach
//! 1 MiB. The final chunk takes whatever remains. The schedule bounds I/O
//! buffers and delimits the per-chunk MAC passes.

/// Size of the first chunk and the growth step.
pub const CHUNK_STEP: u64 = 128 * 1024;

/// Largest chunk the schedule emits.
pub const CHUNK_MAX: u64 = 1024 * 1024;

/// One `(offset, length)` span of the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub len: u64,
}

impl Chunk {
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Iterator over the chunks covering `[0, file_size)`.
///
/// An empty file yields no chunks.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    file_size: u64,
    offset: u64,
    next_len: u64,
}

impl ChunkPlan {
    pub fn new(file_size: u64) -> Self {
        Self {
            file_size,
            offset: 0,
            next_len: CHUNK_STEP,
        }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.offset >= self.file_size {
            return None;
        }

        if self.offset + self.next_len < self.file_size {
            let chunk = Chunk {
                offset: self.offset,
                len: self.next_len,
            };
            self.offset += self.next_len;
            if self.next_len < CHUNK_MAX {
                self.next_len = (self.next_len + CHUNK_STEP).min(CHUNK_MAX);
            }
            return Some(chunk);
        }

        let chunk = Chunk {
            offset: self.offset,
            len: self.file_size - self.offset,
        };
        self.offset = self.file_size;
        Some(chunk)
    }
}
