use serde::{Deserialize, Serialize};

use crate::foundation::error::{CardError, CardResult};

/// Straight-alpha colour with channels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
    /// Alpha channel.
    pub a: f64,
}

impl Rgba {
    /// Construct from normalized channels.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Construct from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        )
    }

    /// Opaque black.
    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Parse a CSS colour string (`#hex`, `rgb[a]()`, `hsl[a]()`, a few names, `transparent`).
    pub fn parse(s: &str) -> CardResult<Self> {
        parse_css(s).map_err(CardError::validation)
    }

    /// Channels quantized to 8 bits, straight alpha.
    pub fn to_rgba8(self) -> [u8; 4] {
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// `#rrggbb`, lowercase. Alpha is dropped.
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Css(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Css(s) => parse_css(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::new(r, g, b, a)),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Self::new(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_css(s: &str) -> Result<Rgba, String> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = func_args(&lower, "rgba").or_else(|| func_args(&lower, "rgb")) {
        return parse_rgb_args(&args);
    }
    if let Some(args) = func_args(&lower, "hsla").or_else(|| func_args(&lower, "hsl")) {
        return parse_hsl_args(&args);
    }
    named(&lower).ok_or_else(|| format!("unsupported colour \"{s}\""))
}

fn func_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?;
    let inner = inner.strip_suffix(')')?;
    Some(
        inner
            .split([',', '/', ' '])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect(),
    )
}

fn parse_hex(s: &str) -> Result<Rgba, String> {
    fn nib(c: u8) -> Result<u8, String> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit '{}'", c as char))
    }

    let b = s.as_bytes();
    let (r, g, bl, a) = match b.len() {
        3 | 4 => {
            let r = nib(b[0])? * 17;
            let g = nib(b[1])? * 17;
            let bl = nib(b[2])? * 17;
            let a = if b.len() == 4 { nib(b[3])? * 17 } else { 255 };
            (r, g, bl, a)
        }
        6 | 8 => {
            let pair = |i: usize| -> Result<u8, String> { Ok(nib(b[i])? * 16 + nib(b[i + 1])?) };
            let a = if b.len() == 8 { pair(6)? } else { 255 };
            (pair(0)?, pair(2)?, pair(4)?, a)
        }
        _ => return Err("hex colour must have 3, 4, 6 or 8 digits".to_owned()),
    };
    Ok(Rgba::from_rgba8(r, g, bl, a))
}

fn parse_number(p: &str) -> Result<f64, String> {
    p.parse::<f64>()
        .map_err(|_| format!("invalid colour component \"{p}\""))
}

fn parse_channel(p: &str) -> Result<f64, String> {
    match p.strip_suffix('%') {
        Some(pct) => Ok((parse_number(pct)? / 100.0).clamp(0.0, 1.0)),
        None => Ok((parse_number(p)? / 255.0).clamp(0.0, 1.0)),
    }
}

fn parse_alpha(p: Option<&String>) -> Result<f64, String> {
    match p {
        None => Ok(1.0),
        Some(p) => match p.strip_suffix('%') {
            Some(pct) => Ok((parse_number(pct)? / 100.0).clamp(0.0, 1.0)),
            None => Ok(parse_number(p)?.clamp(0.0, 1.0)),
        },
    }
}

fn parse_rgb_args(args: &[String]) -> Result<Rgba, String> {
    if args.len() != 3 && args.len() != 4 {
        return Err("rgb() expects 3 or 4 components".to_owned());
    }
    Ok(Rgba::new(
        parse_channel(&args[0])?,
        parse_channel(&args[1])?,
        parse_channel(&args[2])?,
        parse_alpha(args.get(3))?,
    ))
}

fn parse_hsl_args(args: &[String]) -> Result<Rgba, String> {
    if args.len() != 3 && args.len() != 4 {
        return Err("hsl() expects 3 or 4 components".to_owned());
    }
    let h = parse_number(args[0].trim_end_matches("deg"))?;
    let pct = |p: &str| -> Result<f64, String> {
        Ok((parse_number(p.trim_end_matches('%'))? / 100.0).clamp(0.0, 1.0))
    };
    Ok(hsla_to_rgba(
        h,
        pct(&args[1])?,
        pct(&args[2])?,
        parse_alpha(args.get(3))?,
    ))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Rgba {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;

    if s == 0.0 {
        return Rgba::new(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Rgba::new(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

fn named(s: &str) -> Option<Rgba> {
    let rgb = match s {
        "transparent" => return Some(Rgba::new(0.0, 0.0, 0.0, 0.0)),
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "navy" => [0, 0, 128],
        "gold" => [255, 215, 0],
        _ => return None,
    };
    Some(Rgba::from_rgba8(rgb[0], rgb[1], rgb[2], 255))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
