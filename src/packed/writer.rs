//! Append-only writer for the packed region.

use bytemuck::Pod;

use super::format::PackedRegion;

/// Growable 32/16/8-bit lanes plus the writer's guard counter.
#[derive(Debug, Default)]
pub struct PackedWriter {
    region: PackedRegion,
    guard: u32,
}

impl PackedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push_u32(&mut self, value: u32) {
        self.region.words.push(value);
    }

    #[inline]
    pub fn push_i32(&mut self, value: i32) {
        self.push_u32(value as u32);
    }

    #[inline]
    pub fn push_f32(&mut self, value: f32) {
        self.push_u32(value.to_bits());
    }

    /// Write a count as a signed 32-bit value.
    #[inline]
    pub fn push_count(&mut self, count: usize) {
        self.push_i32(count as i32);
    }

    #[inline]
    pub fn push_u16(&mut self, value: u16) {
        self.region.halves.push(value);
    }

    #[inline]
    pub fn push_u8(&mut self, value: u8) {
        self.region.bytes.push(value);
    }

    /// Append 32-bit-tiled records.
    pub fn extend32<T: Pod>(&mut self, values: &[T]) {
        self.region.words.extend(bytemuck::pod_collect_to_vec::<T, u32>(values));
    }

    /// Append 16-bit-tiled records.
    pub fn extend16<T: Pod>(&mut self, values: &[T]) {
        self.region.halves.extend(bytemuck::pod_collect_to_vec::<T, u16>(values));
    }

    pub fn extend8(&mut self, values: &[u8]) {
        self.region.bytes.extend_from_slice(values);
    }

    /// Zero-filled placeholder words.
    pub fn zeros32(&mut self, count: usize) {
        self.region.words.resize(self.region.words.len() + count, 0);
    }

    /// Append the next guard value to every lane.
    pub fn write_guard(&mut self) {
        let guard = self.guard;
        self.region.words.push(guard);
        self.region.halves.push(guard as u16);
        self.region.bytes.push(guard as u8);
        self.guard += 1;
    }

    /// Number of guards written so far.
    pub fn guards(&self) -> u32 {
        self.guard
    }

    pub fn finish(self) -> PackedRegion {
        self.region
    }
}
