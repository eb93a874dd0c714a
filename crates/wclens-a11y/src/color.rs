//! Color parsing and WCAG contrast math.

/// An sRGB color with 8-bit channels. Alpha is dropped during parsing;
/// fully transparent values parse to `None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Parses a CSS color value: `#rgb`, `#rrggbb`, `rgb()`, `rgba()` and the
/// handful of named colors that show up in computed styles.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
        return parse_rgb_func(&lower);
    }
    named_color(&lower)
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some(Rgb::new(r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        _ => None,
    }
}

fn parse_rgb_func(value: &str) -> Option<Rgb> {
    let open = value.find('(')?;
    let close = value.rfind(')')?;
    let args = &value[open + 1..close];
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    if parts.len() >= 4 {
        let alpha: f32 = parts[3].parse().ok()?;
        if alpha <= 0.0 {
            return None;
        }
    }
    let channel = |s: &str| -> Option<u8> {
        if let Some(pct) = s.strip_suffix('%') {
            let v: f32 = pct.trim().parse().ok()?;
            Some((v.clamp(0.0, 100.0) * 2.55).round() as u8)
        } else {
            let v: f32 = s.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        }
    };
    Some(Rgb::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "orange" => Rgb::new(255, 165, 0),
        "purple" => Rgb::new(128, 0, 128),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "silver" => Rgb::new(192, 192, 192),
        "transparent" => return None,
        _ => return None,
    };
    Some(rgb)
}

/// WCAG relative luminance of an sRGB color.
pub fn relative_luminance(color: Rgb) -> f32 {
    let channel = |c: u8| {
        let c = c as f32 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * channel(color.r) + 0.7152 * channel(color.g) + 0.0722 * channel(color.b)
}

/// Contrast ratio between two colors, from 1.0 to 21.0.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f32 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let lighter = la.max(lb);
    let darker = la.min(lb);
    (lighter + 0.05) / (darker + 0.05)
}

/// Large text per WCAG: 24px and up, or bold 18.66px and up.
pub fn is_large_text(font_size_px: f32, font_weight: u16) -> bool {
    font_size_px >= 24.0 || (font_size_px >= 18.66 && font_weight >= 700)
}

/// Whether a ratio meets the AA minimum for the given text size class.
pub fn meets_minimum(ratio: f32, large_text: bool) -> bool {
    if large_text {
        ratio >= 3.0
    } else {
        ratio >= 4.5
    }
}
