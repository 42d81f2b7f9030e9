//! Цвета рамок.
//!
//! `ColorOutcome` закрывает все допустимые значения цвета рамки: явный RGB,
//! "none" (рамки нет) и "default" (системный цвет). Строковые токены
//! разбираются один раз при загрузке конфигурации.

use std::fmt;
use std::str::FromStr;

/// COLORREF, означающий системный цвет рамки
pub const DWMWA_COLOR_DEFAULT: u32 = 0xFFFF_FFFF;
/// COLORREF, отключающий рамку
pub const DWMWA_COLOR_NONE: u32 = 0xFFFF_FFFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    /// Подставляется вместо "default" там, где анимации нужен конкретный цвет
    pub const NEUTRAL_GRAY: Rgb = Rgb::new(0x80, 0x80, 0x80);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Линейная интерполяция по каналам, `t` ограничивается [0, 1]
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let (a, b) = (f64::from(a), f64::from(b));
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn lighten(self, amount: f64) -> Rgb {
        self.lerp(Rgb::WHITE, amount)
    }

    pub fn darken(self, amount: f64) -> Rgb {
        self.lerp(Rgb::BLACK, amount)
    }

    /// HSV -> RGB; `hue` в градусах, `saturation` и `value` в [0, 1]
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Rgb {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let to_byte = |channel: f64| ((channel + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(to_byte(r), to_byte(g), to_byte(b))
    }

    /// Windows COLORREF: 0x00BBGGRR
    pub fn to_colorref(self) -> u32 {
        (u32::from(self.b) << 16) | (u32::from(self.g) << 8) | u32::from(self.r)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("ожидался цвет вида #RRGGBB, получено '{}'", s));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("'{}': {}", s, e))
        };

        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Итоговое значение рамки окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorOutcome {
    Rgb(Rgb),
    /// Рамка отключена ("none")
    NoBorder,
    /// Оставить системный цвет ("default")
    OsDefault,
}

impl ColorOutcome {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        ColorOutcome::Rgb(Rgb::new(r, g, b))
    }

    pub fn as_rgb(&self) -> Option<Rgb> {
        match self {
            ColorOutcome::Rgb(rgb) => Some(*rgb),
            ColorOutcome::NoBorder | ColorOutcome::OsDefault => None,
        }
    }

    /// Значение для DWMWA_BORDER_COLOR
    pub fn to_colorref(&self) -> u32 {
        match self {
            ColorOutcome::Rgb(rgb) => rgb.to_colorref(),
            ColorOutcome::NoBorder => DWMWA_COLOR_NONE,
            ColorOutcome::OsDefault => DWMWA_COLOR_DEFAULT,
        }
    }
}

impl fmt::Display for ColorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorOutcome::Rgb(rgb) => write!(f, "{}", rgb),
            ColorOutcome::NoBorder => f.write_str("none"),
            ColorOutcome::OsDefault => f.write_str("default"),
        }
    }
}

impl FromStr for ColorOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("none") {
            Ok(ColorOutcome::NoBorder)
        } else if token.eq_ignore_ascii_case("default") {
            Ok(ColorOutcome::OsDefault)
        } else {
            token.parse::<Rgb>().map(ColorOutcome::Rgb)
        }
    }
}
