use crate::foundation::error::{CardError, CardResult};

const Q16_ONE: u32 = 1 << 16;

/// Gaussian blur of a premultiplied RGBA8 shadow silhouette.
///
/// Runs one horizontal and one vertical pass with Q16 fixed-point weights. Samples outside the
/// surface repeat the edge pixel, so `radius` is capped at the larger surface side.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> CardResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| CardError::render("blur surface too large"))?;
    if src.len() != len {
        return Err(CardError::render(format!(
            "blur input is {} bytes, expected {len} for {width}x{height}",
            src.len()
        )));
    }
    let radius = radius.min(width.max(height));
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius, sigma)?;
    let (w, h) = (width as usize, height as usize);
    let mut rows = vec![0u8; len];
    blur_axis(src, &mut rows, w, h, Axis::Row, &kernel);
    let mut out = vec![0u8; len];
    blur_axis(&rows, &mut out, w, h, Axis::Column, &kernel);
    Ok(out)
}

/// Kernel radius and sigma for a CSS shadow blur length (`sigma = blur / 2`).
///
/// `max_radius` bounds the kernel; a blur wider than the surface cannot spread further.
pub fn blur_params(blur_px: f64, max_radius: u32) -> Option<(u32, f32)> {
    if !blur_px.is_finite() || blur_px <= 0.0 || max_radius == 0 {
        return None;
    }
    let sigma = (blur_px / 2.0).min(f64::from(f32::MAX));
    let radius = (sigma * 3.0).ceil().clamp(1.0, f64::from(max_radius)) as u32;
    Some((radius, sigma as f32))
}

/// Normalized weights for offsets `-radius..=radius`, summing to exactly `Q16_ONE`.
fn kernel_q16(radius: u32, sigma: f32) -> CardResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CardError::validation("blur sigma must be > 0"));
    }
    let taps = radius
        .checked_mul(2)
        .and_then(|d| d.checked_add(1))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| CardError::render(format!("blur radius {radius} is too large")))?;

    let two_sigma_sq = 2.0 * f64::from(sigma).powi(2);
    let center = f64::from(radius);
    let gauss: Vec<f64> = (0..taps)
        .map(|i| {
            let d = i as f64 - center;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();
    let total: f64 = gauss.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return Err(CardError::render("blur kernel has no weight"));
    }

    let mut kernel: Vec<u32> = gauss
        .iter()
        .map(|g| ((g / total) * f64::from(Q16_ONE)).round() as u32)
        .collect();
    // Rounding drift goes to the centre tap so flat regions stay flat.
    let sum: u64 = kernel.iter().map(|&k| u64::from(k)).sum();
    let mid = taps / 2;
    let fixed = i64::from(kernel[mid]) + i64::from(Q16_ONE) - sum as i64;
    kernel[mid] = fixed.clamp(0, i64::from(Q16_ONE)) as u32;
    Ok(kernel)
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Column,
}

/// Convolve every line along `axis` with `kernel`, clamping at the edges.
fn blur_axis(src: &[u8], dst: &mut [u8], w: usize, h: usize, axis: Axis, kernel: &[u32]) {
    let (lines, line_len) = match axis {
        Axis::Row => (h, w),
        Axis::Column => (w, h),
    };
    let pixel_index = |line: usize, pos: usize| match axis {
        Axis::Row => line * w + pos,
        Axis::Column => pos * w + line,
    };
    let radius = kernel.len() / 2;
    let last = line_len - 1;

    for line in 0..lines {
        for pos in 0..line_len {
            let mut acc = [0u64; 4];
            for (tap, &weight) in kernel.iter().enumerate() {
                let sample = (pos + tap).saturating_sub(radius).min(last);
                let at = pixel_index(line, sample) * 4;
                for (a, &v) in acc.iter_mut().zip(&src[at..at + 4]) {
                    *a += u64::from(weight) * u64::from(v);
                }
            }
            let at = pixel_index(line, pos) * 4;
            for (d, a) in dst[at..at + 4].iter_mut().zip(acc) {
                *d = ((a + u64::from(Q16_ONE / 2)) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
