use crate::foundation::core::Size;
use crate::foundation::error::{CardError, CardResult};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

fn check_size(label: &str, s: Size) -> CardResult<()> {
    if !s.width.is_finite() || !s.height.is_finite() || s.width <= 0.0 || s.height <= 0.0 {
        return Err(CardError::validation(format!(
            "{label} size must be finite and > 0, got {}x{}",
            s.width, s.height
        )));
    }
    Ok(())
}

/// Uniform scale that makes `source` fully cover `dest` (the larger ratio).
pub fn scale_to_cover(source: Size, dest: Size) -> CardResult<f64> {
    check_size("source", source)?;
    check_size("destination", dest)?;
    Ok((dest.width / source.width).max(dest.height / source.height))
}

/// Uniform scale that makes `source` fit entirely inside `dest` (the smaller ratio).
pub fn scale_to_fit(source: Size, dest: Size) -> CardResult<f64> {
    check_size("source", source)?;
    check_size("destination", dest)?;
    Ok((dest.width / source.width).min(dest.height / source.height))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
