use crate::foundation::math::mul_div255_u8;

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (255 = opaque).
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Color from straight channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color with alpha replaced.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with alpha scaled by `factor` (clamped to `0..=1`).
    pub fn scale_alpha(self, factor: f32) -> Self {
        let a = (f32::from(self.a) * factor.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(a)
    }

    /// Premultiplied `[r, g, b, a]`.
    pub fn to_premul(self) -> [u8; 4] {
        let a = u16::from(self.a);
        [
            mul_div255_u8(u16::from(self.r), a),
            mul_div255_u8(u16::from(self.g), a),
            mul_div255_u8(u16::from(self.b), a),
            self.a,
        ]
    }

    /// HSV (all components in `0..=1`) to opaque RGB.
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        let h = h.rem_euclid(1.0) * 6.0;
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let i = h.floor();
        let f = h - i;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match i as u8 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        let to_u8 = |x: f64| (x * 255.0) as u8;
        Self::opaque(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Brighten each channel as `min(255, c * gain + lift)`.
    pub fn brighten(self, gain: f32, lift: f32) -> Self {
        let f = |c: u8| (f32::from(c) * gain + lift).clamp(0.0, 255.0) as u8;
        Self::new(f(self.r), f(self.g), f(self.b), self.a)
    }

    /// `#rrggbb` or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parse a user color.
///
/// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` (alpha either
/// `0..=1` or `0..=255`) and the basic CSS color names. Channels are clamped.
pub fn parse_color(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some(body) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_functional(body);
    }
    named_color(&lower).ok_or_else(|| format!("unrecognized color \"{s}\""))
}

/// [`parse_color`] falling back to white with a warning.
pub fn parse_color_or_white(s: &str) -> Rgba8 {
    parse_color(s).unwrap_or_else(|err| {
        tracing::warn!(%err, "falling back to white");
        Rgba8::WHITE
    })
}

fn parse_hex(hex: &str) -> Result<Rgba8, String> {
    fn byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }
    if !hex.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }
    match hex.len() {
        3 => Ok(Rgba8::opaque(
            nibble(&hex[0..1])?,
            nibble(&hex[1..2])?,
            nibble(&hex[2..3])?,
        )),
        6 => Ok(Rgba8::opaque(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
        )),
        8 => Ok(Rgba8::new(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        )),
        _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}

fn parse_functional(body: &str) -> Result<Rgba8, String> {
    let parts: Vec<f64> = body
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid color component \"{}\"", p.trim()))
        })
        .collect::<Result<_, _>>()?;
    let channel = |v: f64| v.clamp(0.0, 255.0).round() as u8;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba8::opaque(channel(*r), channel(*g), channel(*b))),
        [r, g, b, a] => {
            let a = if *a <= 1.0 { *a * 255.0 } else { *a };
            Ok(Rgba8::new(channel(*r), channel(*g), channel(*b), channel(a)))
        }
        _ => Err("rgb()/rgba() expects 3 or 4 components".to_owned()),
    }
}

fn named_color(name: &str) -> Option<Rgba8> {
    let c = match name {
        "white" => Rgba8::WHITE,
        "black" => Rgba8::BLACK,
        "red" => Rgba8::opaque(255, 0, 0),
        "green" => Rgba8::opaque(0, 128, 0),
        "lime" => Rgba8::opaque(0, 255, 0),
        "blue" => Rgba8::opaque(0, 0, 255),
        "yellow" => Rgba8::opaque(255, 255, 0),
        "cyan" | "aqua" => Rgba8::opaque(0, 255, 255),
        "magenta" | "fuchsia" => Rgba8::opaque(255, 0, 255),
        "orange" => Rgba8::opaque(255, 165, 0),
        "purple" => Rgba8::opaque(128, 0, 128),
        "pink" => Rgba8::opaque(255, 192, 203),
        "gray" | "grey" => Rgba8::opaque(128, 128, 128),
        "silver" => Rgba8::opaque(192, 192, 192),
        "navy" => Rgba8::opaque(0, 0, 128),
        "teal" => Rgba8::opaque(0, 128, 128),
        "maroon" => Rgba8::opaque(128, 0, 0),
        "olive" => Rgba8::opaque(128, 128, 0),
        "transparent" => Rgba8::TRANSPARENT,
        _ => return None,
    };
    Some(c)
}

impl serde::Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Arr(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => parse_color(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => {
                let channel = |x: f64| x.clamp(0.0, 255.0).round() as u8;
                match v.as_slice() {
                    [r, g, b] => Ok(Rgba8::opaque(channel(*r), channel(*g), channel(*b))),
                    [r, g, b, a] => Ok(Rgba8::new(
                        channel(*r),
                        channel(*g),
                        channel(*b),
                        channel(*a),
                    )),
                    _ => Err(serde::de::Error::custom(
                        "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                    )),
                }
            }
        }
    }
}
