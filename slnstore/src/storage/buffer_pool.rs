// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reusable copy buffers
//!
//! Streamed copies check a fixed-size buffer out of the pool and the guard
//! puts it back when dropped, on success and error paths alike.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Pool of equally sized byte buffers shared by all storage handles
#[derive(Debug)]
pub struct BufferPool {
    buffer_size: usize,
    max_retained: usize,
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create a pool; a zero `buffer_size` is raised to one byte
    pub fn new(buffer_size: usize, max_retained: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size: buffer_size.max(1),
            max_retained,
            buffers: Mutex::new(Vec::with_capacity(max_retained)),
        })
    }

    /// Check out a buffer, allocating one if the pool is empty
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buffer = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.buffer_size]);

        PooledBuffer {
            buffer,
            pool: Arc::clone(self),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of idle buffers currently held
    pub fn idle_count(&self) -> usize {
        self.buffers.lock().len()
    }

    fn give_back(&self, buffer: Vec<u8>) {
        if buffer.len() != self.buffer_size {
            return;
        }
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_retained {
            buffers.push(buffer);
        }
    }
}

/// A buffer checked out of a `BufferPool`
pub struct PooledBuffer {
    buffer: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buffer));
    }
}
