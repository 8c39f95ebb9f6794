//! N-channel audio block buffer for the router's render entry point.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// A multi-channel f32 block buffer (channel-major).
///
/// Pre-allocated at construction; the render path never resizes it.
pub struct ChannelBuffer {
    channels: Vec<Vec<f32>>,
    block_size: usize,
}

impl ChannelBuffer {
    /// Creates a zeroed buffer with `channels` channels of `block_size`
    /// samples each.
    pub fn new(channels: usize, block_size: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| vec![0.0; block_size]).collect(),
            block_size,
        }
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the number of samples per channel.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the samples of channel `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c >= channel_count()`.
    #[inline]
    pub fn channel(&self, c: usize) -> &[f32] {
        &self.channels[c]
    }

    /// Returns the samples of channel `c` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `c >= channel_count()`.
    #[inline]
    pub fn channel_mut(&mut self, c: usize) -> &mut [f32] {
        &mut self.channels[c]
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.fill(0.0);
        }
    }

    /// Resizes every channel to a new block size, zeroing new samples.
    ///
    /// Mutation-time only; never called from the render path.
    pub fn resize(&mut self, block_size: usize) {
        self.block_size = block_size;
        for ch in &mut self.channels {
            ch.resize(block_size, 0.0);
        }
    }

    /// Copies a slice into channel `c`, truncating to the block size.
    pub fn fill_channel(&mut self, c: usize, samples: &[f32]) {
        let len = samples.len().min(self.block_size);
        self.channels[c][..len].copy_from_slice(&samples[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let buf = ChannelBuffer::new(3, 64);
        assert_eq!(buf.channel_count(), 3);
        assert_eq!(buf.block_size(), 64);
        for c in 0..3 {
            assert!(buf.channel(c).iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn channels_are_independent() {
        let mut buf = ChannelBuffer::new(2, 4);
        buf.channel_mut(0).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.channel(0), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.channel(1), &[0.0; 4]);
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut buf = ChannelBuffer::new(2, 4);
        buf.fill_channel(0, &[1.0, 1.0, 1.0, 1.0]);
        buf.fill_channel(1, &[2.0, 2.0, 2.0, 2.0]);
        buf.clear();
        assert_eq!(buf.channel(0), &[0.0; 4]);
        assert_eq!(buf.channel(1), &[0.0; 4]);
    }

    #[test]
    fn resize_preserves_prefix() {
        let mut buf = ChannelBuffer::new(1, 2);
        buf.fill_channel(0, &[5.0, 6.0]);
        buf.resize(4);
        assert_eq!(buf.channel(0), &[5.0, 6.0, 0.0, 0.0]);
        assert_eq!(buf.block_size(), 4);
    }
}
