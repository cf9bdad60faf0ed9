use super::ingest::StereoSample;

/// Rolling per-channel analysis window, advanced one hop at a time.
pub struct FrameAssembler {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    primed: usize,
}

impl FrameAssembler {
    pub fn new(fft_size: usize) -> Self {
        Self {
            left: vec![0.0; fft_size],
            right: vec![0.0; fft_size],
            primed: 0,
        }
    }

    /// Shift out the oldest `hop.len()` samples and append `hop` at the tail.
    pub fn push_hop(&mut self, hop: &[StereoSample]) {
        let size = self.left.len();
        let hop_len = hop.len().min(size);
        let hop = &hop[hop.len() - hop_len..];

        self.left.copy_within(hop_len.., 0);
        self.right.copy_within(hop_len.., 0);

        let tail = size - hop_len;
        for (i, sample) in hop.iter().enumerate() {
            self.left[tail + i] = sample.left;
            self.right[tail + i] = sample.right;
        }

        self.primed = (self.primed + hop_len).min(size);
    }

    /// True once a full frame of real audio has been appended.
    pub fn is_primed(&self) -> bool {
        self.primed >= self.left.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(values: &[f32]) -> Vec<StereoSample> {
        values
            .iter()
            .map(|&v| StereoSample { left: v, right: -v })
            .collect()
    }

    #[test]
    fn frame_slides_by_hop() {
        let mut frame = FrameAssembler::new(4);
        frame.push_hop(&hop(&[1.0, 2.0]));
        assert_eq!(frame.left, vec![0.0, 0.0, 1.0, 2.0]);
        assert!(!frame.is_primed());

        frame.push_hop(&hop(&[3.0, 4.0]));
        assert_eq!(frame.left, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frame.right, vec![-1.0, -2.0, -3.0, -4.0]);
        assert!(frame.is_primed());

        frame.push_hop(&hop(&[5.0, 6.0]));
        assert_eq!(frame.left, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn oversized_hop_keeps_newest_samples() {
        let mut frame = FrameAssembler::new(2);
        frame.push_hop(&hop(&[1.0, 2.0, 3.0]));
        assert_eq!(frame.left, vec![2.0, 3.0]);
        assert!(frame.is_primed());
    }
}
