use image::Rgba;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const FALLBACK: Rgba<u8> = Rgba([107, 114, 128, 255]);

/// Parses the subset of CSS colors the detection service sends:
/// `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and a few names.
pub fn parse_css_color(input: &str) -> Option<Rgba<u8>> {
    let s = input.trim().to_ascii_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<u8> = inner
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        if let [r, g, b] = parts[..] {
            return Some(Rgba([r, g, b, 255]));
        }
        return None;
    }

    let rgb = match s.as_str() {
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "orange" => [255, 165, 0],
        "yellow" => [255, 255, 0],
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "gray" | "grey" => [128, 128, 128],
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(Rgba(out))
        }
        6 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => None,
    }
}

/// Resolves a color, falling back to neutral gray.
pub fn color_or_fallback(input: &str) -> Rgba<u8> {
    parse_css_color(input).unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_css_color("#ef4444"), Some(Rgba([0xef, 0x44, 0x44, 255])));
        assert_eq!(parse_css_color("#F00"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_css_color("#10b98180"), Some(Rgba([0x10, 0xb9, 0x81, 0x80])));
    }

    #[test]
    fn parses_rgb_and_names() {
        assert_eq!(parse_css_color("rgb(1, 2, 3)"), Some(Rgba([1, 2, 3, 255])));
        assert_eq!(parse_css_color("Orange"), Some(Rgba([255, 165, 0, 255])));
    }

    #[test]
    fn unknown_falls_back() {
        assert_eq!(parse_css_color("#12"), None);
        assert_eq!(parse_css_color("#zzzzzz"), None);
        assert_eq!(color_or_fallback("chartreuse-ish"), FALLBACK);
    }
}
