//! Stride downsampling shared by the image frames.

use super::FrameError;

/// Downsampled extent of a captured image together with the wire factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Extent {
    pub width: u16,
    pub height: u16,
    pub downsample: i32,
    stride: usize,
}

impl Extent {
    /// Compute the extent kept when reading every `downsample`-th row and
    /// column of a `width × height` source. Factors below one read every
    /// pixel.
    pub fn downsampled(width: usize, height: usize, downsample: usize) -> Result<Self, FrameError> {
        let stride = downsample.max(1);
        let wire_downsample =
            i32::try_from(stride).map_err(|_| FrameError::DownsampleOverflow(stride))?;
        let kept_width = width.div_ceil(stride);
        let kept_height = height.div_ceil(stride);
        let overflow = || FrameError::DimensionOverflow {
            width: kept_width,
            height: kept_height,
        };
        Ok(Self {
            width: u16::try_from(kept_width).map_err(|_| overflow())?,
            height: u16::try_from(kept_height).map_err(|_| overflow())?,
            downsample: wire_downsample,
            stride,
        })
    }

    pub fn pixel_count(&self) -> usize { usize::from(self.width) * usize::from(self.height) }

    /// Source pixel offsets visited in row-major order.
    pub fn source_offsets(
        &self,
        source_width: usize,
        source_height: usize,
    ) -> impl Iterator<Item = usize> + '_ {
        (0..source_height).step_by(self.stride).flat_map(move |row| {
            (0..source_width)
                .step_by(self.stride)
                .map(move |column| row * source_width + column)
        })
    }
}

/// Ensure a captured buffer covers its declared extent.
pub(super) fn check_source_len(expected: usize, actual: usize) -> Result<(), FrameError> {
    if actual < expected {
        return Err(FrameError::SourceTooSmall { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Extent;

    #[rstest]
    #[case(640, 480, 1, 640, 480)]
    #[case(640, 480, 2, 320, 240)]
    #[case(5, 3, 2, 3, 2)]
    #[case(7, 7, 0, 7, 7)]
    fn extent_rounds_up(
        #[case] width: usize,
        #[case] height: usize,
        #[case] downsample: usize,
        #[case] kept_width: u16,
        #[case] kept_height: u16,
    ) {
        let extent = Extent::downsampled(width, height, downsample).expect("extent fits");
        assert_eq!((extent.width, extent.height), (kept_width, kept_height));
    }

    #[test]
    fn offsets_skip_rows_and_columns() {
        let extent = Extent::downsampled(5, 3, 2).expect("extent fits");
        let offsets: Vec<usize> = extent.source_offsets(5, 3).collect();
        assert_eq!(offsets, vec![0, 2, 4, 10, 12, 14]);
        assert_eq!(offsets.len(), extent.pixel_count());
    }

    #[test]
    fn oversized_extent_is_rejected() {
        assert!(Extent::downsampled(70_000, 1, 1).is_err());
    }
}
