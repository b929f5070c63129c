use crate::foundation::color::Rgba;
use crate::foundation::error::{CardError, CardResult};

/// Drop shadow attached to a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    /// Shadow colour (alpha included).
    pub color: Rgba,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Blur radius in pixels.
    pub blur: f64,
    /// When set, offset and blur are in canvas pixels regardless of the layer scale.
    pub non_scaling: bool,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: Rgba::black(),
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            non_scaling: false,
        }
    }
}

impl Shadow {
    /// Parse a CSS-like shadow declaration such as `"rgba(0,0,0,0.3) 5px 5px 10px"`.
    ///
    /// The colour may precede or follow the lengths. Missing lengths are zero and a
    /// missing colour is opaque black.
    pub fn parse(src: &str) -> CardResult<Self> {
        let src = src.trim();
        if src.is_empty() {
            return Err(CardError::validation("empty shadow declaration"));
        }

        let mut color = None;
        let mut lengths = Vec::with_capacity(3);
        for token in tokenize(src) {
            match parse_length(&token) {
                Some(v) => lengths.push(v),
                None if color.is_none() => color = Some(Rgba::parse(&token)?),
                None => {
                    return Err(CardError::validation(format!(
                        "unexpected token \"{token}\" in shadow \"{src}\""
                    )));
                }
            }
        }
        if lengths.len() > 3 {
            return Err(CardError::validation(format!(
                "shadow \"{src}\" has more than 3 lengths"
            )));
        }

        let at = |i: usize| lengths.get(i).copied().unwrap_or(0.0);
        Ok(Self {
            color: color.unwrap_or_else(Rgba::black),
            offset_x: at(0),
            offset_y: at(1),
            blur: at(2).max(0.0),
            non_scaling: false,
        })
    }

    /// Same shadow with `non_scaling` set.
    pub fn non_scaling(mut self) -> Self {
        self.non_scaling = true;
        self
    }
}

/// Split on whitespace, keeping parenthesized colour functions in one token.
fn tokenize(src: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    for ch in src.chars() {
        match ch {
            '(' => {
                depth += 1;
                cur.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                cur.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn parse_length(token: &str) -> Option<f64> {
    let t = token.strip_suffix("px").unwrap_or(token);
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shadow.rs"]
mod tests;
