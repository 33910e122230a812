use ratatui::style::Color;

/// Config names for the terminal palette, in the order they are listed
const NAMED: &[(&str, Color)] = &[
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("gray", Color::Gray),
    ("darkgray", Color::DarkGray),
    ("lightred", Color::LightRed),
    ("lightgreen", Color::LightGreen),
    ("lightyellow", Color::LightYellow),
    ("lightblue", Color::LightBlue),
    ("lightmagenta", Color::LightMagenta),
    ("lightcyan", Color::LightCyan),
];

/// Parse a theme color: a palette name ("grey" spellings accepted), `#RRGGBB`,
/// `#RGB` or `rgb(r, g, b)`. Anything else is white.
pub fn parse_color(color_str: &str) -> Color {
    let s = color_str.trim().to_lowercase();
    let s = s.replace("grey", "gray");
    if s == "lightgray" {
        return Color::Gray;
    }
    if let Some((_, color)) = NAMED.iter().find(|(name, _)| *name == s) {
        return *color;
    }
    let parsed = if let Some(hex) = s.strip_prefix('#') {
        parse_hex(hex)
    } else if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
        parse_rgb(body)
    } else {
        None
    };
    parsed.unwrap_or(Color::White)
}

fn parse_hex(hex: &str) -> Option<Color> {
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            // #abc is #aabbcc
            let short = |i: usize| channel(i..i + 1).map(|v| (v << 4) | v);
            Some(Color::Rgb(short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

fn parse_rgb(body: &str) -> Option<Color> {
    let parts: Vec<u8> = body
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
        _ => None,
    }
}

/// Config spelling of a color
pub fn format_color_for_display(color: &Color) -> String {
    if let Color::Rgb(r, g, b) = color {
        return format!("#{:02X}{:02X}{:02X}", r, g, b);
    }
    NAMED
        .iter()
        .find(|(_, c)| c == color)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "reset".to_string())
}

/// WCAG relative luminance of an RGB color, 0.0 (dark) to 1.0 (light)
fn luminance(r: u8, g: u8, b: u8) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Black or white, whichever reads better on `background`.
/// Palette colors use a fixed split since terminals render them differently.
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = match background {
        Color::Rgb(r, g, b) => luminance(r, g, b) < 0.5,
        other => matches!(other, Color::Black | Color::Blue | Color::Magenta | Color::Red),
    };
    if dark { Color::White } else { Color::Black }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_hex_and_rgb() {
        assert_eq!(parse_color("LightBlue"), Color::LightBlue);
        assert_eq!(parse_color("darkgrey"), Color::DarkGray);
        assert_eq!(parse_color("#ff8000"), Color::Rgb(255, 128, 0));
        assert_eq!(parse_color("#0f0"), Color::Rgb(0, 255, 0));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Color::Rgb(1, 2, 3));
        assert_eq!(parse_color("chartreuse-ish"), Color::White);
    }

    #[test]
    fn contrast_picks_readable_text() {
        assert_eq!(get_contrast_text_color(Color::Blue), Color::White);
        assert_eq!(get_contrast_text_color(Color::Yellow), Color::Black);
        assert_eq!(get_contrast_text_color(Color::Rgb(250, 250, 250)), Color::Black);
        assert_eq!(format_color_for_display(&Color::Rgb(1, 2, 3)), "#010203");
        assert_eq!(format_color_for_display(&Color::Cyan), "cyan");
    }
}
