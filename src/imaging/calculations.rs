//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Bounds;

/// Calculate the size of an image scaled to fit inside `bounds`.
///
/// The aspect ratio is preserved and the result never exceeds either bound.
/// Sources already inside the box keep their original size: this is a
/// shrink-to-fit, not a scale-to-fit.
///
/// # Examples
/// ```
/// # use image_depot::imaging::fit_within;
/// # use image_depot::imaging::Bounds;
/// // 2000x1500 (4:3) into 640x480 → 640x480
/// assert_eq!(fit_within((2000, 1500), Bounds::new(640, 480)), (640, 480));
///
/// // 300x200 is already inside 640x480 → unchanged
/// assert_eq!(fit_within((300, 200), Bounds::new(640, 480)), (300, 200));
/// ```
pub fn fit_within(source: (u32, u32), bounds: Bounds) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }
    if fits(source, bounds) {
        return source;
    }

    let scale_w = bounds.width as f64 / src_w as f64;
    let scale_h = bounds.height as f64 / src_h as f64;
    let scale = scale_w.min(scale_h);

    // Round, then clamp so rounding never pushes an edge past its bound or to zero
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, bounds.width.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, bounds.height.max(1));
    (w, h)
}

/// Whether `size` fits inside `bounds` on both axes.
pub fn fits(size: (u32, u32), bounds: Bounds) -> bool {
    size.0 <= bounds.width && size.1 <= bounds.height
}
