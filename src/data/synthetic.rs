//! Synthetic images used by the demo command and the test-suite.
//!
//! All images are 10 x 10. The linear TAN WCS matches the one used across
//! the viewer's own regression tests.

use super::Dataset;
use crate::frame::{BoundingBox, FitsWcs, TransformChain, TransformStep};
use ndarray::Array2;

pub const IMAGE_SIZE: usize = 10;

/// RA/Dec of pixel (0, 0) in [`image_2d_wcs`].
pub const LINEAR_TAN_CRVAL: [f64; 2] = [337.5202808, -20.833333059999998];

/// RA/Dec of pixel (0, 0) in [`rotated_gwcs`].
pub const GWCS_CRVAL: [f64; 2] = [3.5817255823, -30.392058074];

const ARCSEC: f64 = 0.0002777777778;

/// Linear TAN WCS: one arcsecond pixels, reference pixel at the array origin.
pub fn image_2d_wcs() -> FitsWcs {
    linear_tan_with_crpix([1.0, 1.0])
}

fn linear_tan_with_crpix(crpix: [f64; 2]) -> FitsWcs {
    FitsWcs::from_cdelt(
        ["RA---TAN", "DEC--TAN"],
        crpix,
        LINEAR_TAN_CRVAL,
        [-ARCSEC, ARCSEC],
        None,
    )
    .expect("static WCS definition is valid")
}

/// Zero-filled image carrying [`image_2d_wcs`].
pub fn image_with_wcs(label: &str) -> Dataset {
    Dataset::filled(label, IMAGE_SIZE, IMAGE_SIZE, 0.0).with_frame(image_2d_wcs())
}

/// One-filled image whose WCS is [`image_2d_wcs`] shifted by one pixel in x,
/// so its pixel (1, 0) sits on the other image's pixel (0, 0).
pub fn image_with_shifted_wcs(label: &str) -> Dataset {
    Dataset::filled(label, IMAGE_SIZE, IMAGE_SIZE, 1.0).with_frame(linear_tan_with_crpix([2.0, 1.0]))
}

/// Zero-filled image without any coordinate frame.
pub fn image_without_wcs(label: &str) -> Dataset {
    Dataset::filled(label, IMAGE_SIZE, IMAGE_SIZE, 0.0)
}

/// Image with a blank, non-celestial two-axis WCS.
pub fn image_with_blank_wcs(label: &str) -> Dataset {
    image_without_wcs(label).with_frame(FitsWcs::blank())
}

/// gwcs-style chain rotated by 30 degrees with a bounding box around the array.
pub fn rotated_gwcs() -> TransformChain {
    TransformChain::new(
        vec![
            TransformStep::Rotation { angle_deg: 30.0 },
            TransformStep::Scale {
                sx: -ARCSEC,
                sy: ARCSEC,
            },
            TransformStep::Gnomonic { crval: GWCS_CRVAL },
        ],
        Some(BoundingBox::around_extent(IMAGE_SIZE, IMAGE_SIZE)),
    )
    .expect("static chain definition is valid")
}

/// FITS WCS centred on the [`rotated_gwcs`] footprint, unrotated and unbounded.
pub fn fits_wcs_near_gwcs() -> FitsWcs {
    FitsWcs::from_cdelt(
        ["RA---TAN", "DEC--TAN"],
        [3.0, 3.0],
        GWCS_CRVAL,
        [-ARCSEC, ARCSEC],
        None,
    )
    .expect("static WCS definition is valid")
}

/// Ramp image `value = y * width + x` with the gwcs frame and a surface brightness unit.
pub fn gwcs_image(label: &str) -> Dataset {
    let values = Array2::from_shape_fn((IMAGE_SIZE, IMAGE_SIZE), |(y, x)| {
        (y * IMAGE_SIZE + x) as f32
    });
    Dataset::new(label, values)
        .with_frame(rotated_gwcs())
        .with_unit("electron / s")
}

/// One-filled image with [`fits_wcs_near_gwcs`].
pub fn fits_image_near_gwcs(label: &str) -> Dataset {
    Dataset::filled(label, IMAGE_SIZE, IMAGE_SIZE, 1.0)
        .with_frame(fits_wcs_near_gwcs())
        .with_unit("electron / s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_frames_are_celestial() {
        assert!(image_with_wcs("a").celestial_frame().is_some());
        assert!(image_with_shifted_wcs("b").celestial_frame().is_some());
        assert!(gwcs_image("c").celestial_frame().is_some());
        assert!(image_without_wcs("d").frame().is_none());
        assert!(image_with_blank_wcs("e").celestial_frame().is_none());
    }

    #[test]
    fn test_gwcs_origin_is_crval() {
        let (ra, dec) = rotated_gwcs().pixel_to_world(0.0, 0.0);
        assert_eq!(ra, GWCS_CRVAL[0]);
        assert_eq!(dec, GWCS_CRVAL[1]);
    }
}
