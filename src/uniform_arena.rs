//! Per-frame uniform storage addressed with dynamic offsets.
//!
//! Every draw stages its own parameter block, so writing them all to one
//! small uniform buffer would leave every draw reading the last write. The
//! arena instead hands each flushed block its own aligned region of one large
//! buffer and the bind group selects it with a dynamic offset. The cursor is
//! rewound at the start of every frame.

use log::debug;

use crate::error::FrameError;
use crate::gpu::GpuContext;

/// Default arena size: 4096 blocks at 256-byte alignment.
pub const DEFAULT_ARENA_SIZE: u64 = 1 << 20;

/// Bump allocator over a fixed byte range.
#[derive(Clone, Debug)]
pub struct ArenaCursor {
    capacity: u64,
    alignment: u64,
    offset: u64,
}

impl ArenaCursor {
    pub fn new(capacity: u64, alignment: u64) -> Self {
        debug_assert!(alignment.is_power_of_two());
        Self {
            capacity,
            alignment,
            offset: 0,
        }
    }

    /// Reserve `len` bytes and return their start offset.
    pub fn allocate(&mut self, len: u64) -> Result<u64, FrameError> {
        let start = self.offset;
        let end = start + len;
        if end > self.capacity {
            return Err(FrameError::UniformArenaFull {
                requested: len,
                remaining: self.capacity - start,
            });
        }
        self.offset = align_up(end, self.alignment).min(self.capacity);
        Ok(start)
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> u64 {
        self.offset
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
pub fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}

/// One uniform buffer shared by every shader program in a frame.
pub struct UniformArena {
    buffer: wgpu::Buffer,
    cursor: ArenaCursor,
}

impl UniformArena {
    pub fn new(gpu: &GpuContext, capacity: u64) -> Self {
        let alignment = gpu.device.limits().min_uniform_buffer_offset_alignment as u64;
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Arena"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        debug!("Uniform arena: {capacity} bytes, {alignment}-byte alignment");
        Self {
            buffer,
            cursor: ArenaCursor::new(capacity, alignment),
        }
    }

    /// Copy `data` into the next free region and return its dynamic offset.
    pub fn push(&mut self, gpu: &GpuContext, data: &[u8]) -> Result<u32, FrameError> {
        let offset = self.cursor.allocate(data.len() as u64)?;
        gpu.queue.write_buffer(&self.buffer, offset, data);
        Ok(offset as u32)
    }

    /// Rewind to the start of the buffer. Call once per frame before any
    /// program is flushed.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_aligned() {
        let mut cursor = ArenaCursor::new(1024, 256);
        assert_eq!(cursor.allocate(208).unwrap(), 0);
        assert_eq!(cursor.allocate(16).unwrap(), 256);
        assert_eq!(cursor.allocate(256).unwrap(), 512);
        assert_eq!(cursor.used(), 768);
    }

    #[test]
    fn test_overflow_reports_remaining() {
        let mut cursor = ArenaCursor::new(512, 256);
        cursor.allocate(300).unwrap();
        assert_eq!(
            cursor.allocate(300),
            Err(FrameError::UniformArenaFull {
                requested: 300,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_exact_fit_at_end() {
        let mut cursor = ArenaCursor::new(512, 256);
        cursor.allocate(256).unwrap();
        assert_eq!(cursor.allocate(256).unwrap(), 256);
        assert_eq!(cursor.used(), 512);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut cursor = ArenaCursor::new(512, 256);
        cursor.allocate(10).unwrap();
        cursor.reset();
        assert_eq!(cursor.allocate(10).unwrap(), 0);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(100, 64), 128);
    }
}
