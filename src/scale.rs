//! Visual encodings: power scale for radius, ordinal scale for colour.

use std::collections::HashMap;
use std::fmt;

/// The ten-colour categorical palette (`#rrggbb`)
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Continuous power scale: `range` interpolated over `domain^exponent`.
///
/// Values outside the domain extrapolate linearly; the scale does not clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    exponent: f64,
    domain: [f64; 2],
    range: [f64; 2],
}

impl Default for PowScale {
    fn default() -> Self {
        Self {
            exponent: 1.0,
            domain: [0.0, 1.0],
            range: [0.0, 1.0],
        }
    }
}

impl PowScale {
    pub fn new(exponent: f64) -> Self {
        Self {
            exponent,
            ..Self::default()
        }
    }

    /// Square-root scale, the area-preserving choice for circle radii
    pub fn sqrt() -> Self {
        Self::new(0.5)
    }

    pub fn domain(mut self, min: f64, max: f64) -> Self {
        self.domain = [min, max];
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = [min, max];
        self
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Sign-preserving power so negative inputs stay negative
    fn transform(&self, x: f64) -> f64 {
        if x < 0.0 {
            -(-x).powf(self.exponent)
        } else {
            x.powf(self.exponent)
        }
    }

    /// Map a domain value to the range
    pub fn scale(&self, x: f64) -> f64 {
        let d0 = self.transform(self.domain[0]);
        let d1 = self.transform(self.domain[1]);
        let span = d1 - d0;

        // A degenerate domain maps everything to the middle of the range; a NaN
        // span falls through and poisons the result
        let t = if span == 0.0 {
            0.5
        } else {
            (self.transform(x) - d0) / span
        };

        self.range[0] + (self.range[1] - self.range[0]) * t
    }
}

/// Discrete scale from category keys to palette entries.
///
/// Keys not in the domain are appended on first lookup, so every new
/// category takes the next palette slot. The palette is recycled.
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    domain: Vec<String>,
    index: HashMap<String, usize>,
    range: Vec<Rgb>,
}

impl OrdinalScale {
    pub fn new(range: Vec<Rgb>) -> Self {
        Self {
            domain: Vec::new(),
            index: HashMap::new(),
            range,
        }
    }

    /// Replace the domain; duplicate keys keep their first position
    pub fn with_domain<I, S>(mut self, domain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain.clear();
        self.index.clear();
        for key in domain {
            self.insert(key.into());
        }
        self
    }

    fn insert(&mut self, key: String) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.domain.len();
        self.index.insert(key.clone(), i);
        self.domain.push(key);
        i
    }

    /// Look up the colour for `key`, growing the domain if it is new.
    ///
    /// Returns `None` only when the range is empty.
    pub fn get(&mut self, key: &str) -> Option<Rgb> {
        if self.range.is_empty() {
            return None;
        }
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => self.insert(key.to_string()),
        };
        Some(self.range[i % self.range.len()])
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }
}

/// An sRGB colour with 0-255 channels kept as floats until formatting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

const DARKER: f64 = 0.7;
const BRIGHTER: f64 = 1.0 / DARKER;

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').filter(|h| h.is_ascii())?;
        let channel = |h: &str| u8::from_str_radix(h, 16).ok().map(f64::from);

        match hex.len() {
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17.0);
                Some(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }

    /// Scale every channel by `0.7^k`
    pub fn darker(&self, k: f64) -> Self {
        let f = DARKER.powf(k);
        Self::new(self.r * f, self.g * f, self.b * f)
    }

    /// Scale every channel by `(1/0.7)^k`
    pub fn brighter(&self, k: f64) -> Self {
        let f = BRIGHTER.powf(k);
        Self::new(self.r * f, self.g * f, self.b * f)
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = |v: f64| {
            if v.is_nan() {
                0u8
            } else {
                v.round().clamp(0.0, 255.0) as u8
            }
        };
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category10() -> Vec<Rgb> {
        CATEGORY10.iter().filter_map(|c| Rgb::parse_hex(c)).collect()
    }

    #[test]
    fn sqrt_scale_maps_domain_ends_to_range_ends() {
        let scale = PowScale::sqrt().domain(0.0, 1600.0).range(2.0, 85.0);
        assert_eq!(scale.scale(0.0), 2.0);
        assert_eq!(scale.scale(1600.0), 85.0);
    }

    #[test]
    fn sqrt_scale_encodes_area() {
        let scale = PowScale::sqrt().domain(0.0, 1600.0).range(2.0, 85.0);
        // sqrt(100) / sqrt(1600) = 0.25
        assert!((scale.scale(100.0) - 22.75).abs() < 1e-12);
    }

    #[test]
    fn pow_scale_extrapolates_and_keeps_sign() {
        let scale = PowScale::new(2.0).domain(0.0, 2.0).range(0.0, 4.0);
        assert_eq!(scale.scale(4.0), 16.0);
        assert_eq!(scale.scale(-1.0), -1.0);
    }

    #[test]
    fn degenerate_domain_maps_to_range_midpoint() {
        let scale = PowScale::sqrt().domain(0.0, 0.0).range(2.0, 84.0);
        assert_eq!(scale.scale(0.0), 43.0);
        assert_eq!(scale.scale(10.0), 43.0);
    }

    #[test]
    fn nan_propagates() {
        let scale = PowScale::sqrt().domain(0.0, 100.0).range(2.0, 85.0);
        assert!(scale.scale(f64::NAN).is_nan());
        let nan_domain = PowScale::sqrt().domain(0.0, f64::NAN);
        assert!(nan_domain.scale(1.0).is_nan());
    }

    #[test]
    fn ordinal_uses_domain_order() {
        let mut scale = OrdinalScale::new(category10()).with_domain(["US", "UK", "China"]);
        assert_eq!(scale.get("UK").unwrap().to_hex(), "#ff7f0e");
        assert_eq!(scale.get("US").unwrap().to_hex(), "#1f77b4");
    }

    #[test]
    fn ordinal_grows_domain_for_unknown_keys() {
        let mut scale = OrdinalScale::new(category10()).with_domain(["US"]);
        assert_eq!(scale.get("Japan").unwrap().to_hex(), "#ff7f0e");
        assert_eq!(scale.get("Japan").unwrap().to_hex(), "#ff7f0e");
        assert_eq!(scale.domain(), ["US", "Japan"]);
    }

    #[test]
    fn ordinal_recycles_range() {
        let palette = vec![Rgb::new(0.0, 0.0, 0.0), Rgb::new(255.0, 255.0, 255.0)];
        let mut scale = OrdinalScale::new(palette).with_domain(["a", "b", "c"]);
        assert_eq!(scale.get("c").unwrap().to_hex(), "#000000");
    }

    #[test]
    fn ordinal_with_empty_range_has_no_colour() {
        let mut scale = OrdinalScale::new(Vec::new());
        assert!(scale.get("US").is_none());
    }

    #[test]
    fn parse_hex_forms() {
        assert_eq!(Rgb::parse_hex("#1f77b4"), Some(Rgb::new(31.0, 119.0, 180.0)));
        assert_eq!(Rgb::parse_hex("#fff"), Some(Rgb::new(255.0, 255.0, 255.0)));
        assert_eq!(Rgb::parse_hex("1f77b4"), None);
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#zzzzzz"), None);
        // Multi-byte characters must not be split when slicing channels
        assert_eq!(Rgb::parse_hex("#a\u{e9}aaa"), None);
        assert_eq!(Rgb::parse_hex("#\u{e9}a"), None);
    }

    #[test]
    fn darker_and_brighter() {
        let blue = Rgb::parse_hex("#1f77b4").unwrap();
        insta::assert_snapshot!(blue.darker(1.0), @"#16537e");
        assert_eq!(Rgb::new(200.0, 200.0, 200.0).brighter(1.0).to_hex(), "#ffffff");
    }
}
