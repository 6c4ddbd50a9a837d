use ratatui::style::Color;
use term_color_support::ColorSupport;

/// How many colors the terminal can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Ansi256,
    Basic,
}

impl Depth {
    pub fn detect() -> Depth {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Ansi256
        } else {
            Depth::Basic
        }
    }
}

/// One palette entry in all three depths
#[derive(Debug, Clone, Copy)]
struct Swatch {
    rgb: (u8, u8, u8),
    index256: u8,
    basic: Color,
}

impl Swatch {
    const fn new(rgb: (u8, u8, u8), index256: u8, basic: Color) -> Self {
        Swatch { rgb, index256, basic }
    }

    fn at(&self, depth: Depth) -> Color {
        match depth {
            Depth::TrueColor => Color::Rgb(self.rgb.0, self.rgb.1, self.rgb.2),
            Depth::Ansi256 => Color::Indexed(self.index256),
            Depth::Basic => self.basic,
        }
    }
}

// Classic Minesweeper number colors, 1 through 8
const NUMBERS: [Swatch; 8] = [
    Swatch::new((59, 120, 255), 63, Color::LightBlue),
    Swatch::new((19, 161, 14), 28, Color::Green),
    Swatch::new((231, 72, 86), 203, Color::LightRed),
    Swatch::new((0, 55, 218), 20, Color::Blue),
    Swatch::new((197, 15, 31), 160, Color::Red),
    Swatch::new((58, 150, 221), 38, Color::Cyan),
    Swatch::new((12, 12, 12), 232, Color::Black),
    Swatch::new((118, 118, 118), 243, Color::DarkGray),
];

const BOARD_BG: Swatch = Swatch::new((118, 118, 118), 243, Color::DarkGray);
const OPEN_BG: Swatch = Swatch::new((204, 204, 204), 250, Color::Gray);
const CURSOR_BG: Swatch = Swatch::new((59, 120, 255), 63, Color::LightBlue);
const HIDDEN_FG: Swatch = Swatch::new((204, 204, 204), 250, Color::Gray);
const MINE_FG: Swatch = Swatch::new((12, 12, 12), 232, Color::Black);
const FLAG_FG: Swatch = Swatch::new((197, 15, 31), 160, Color::Red);
const ACCENT_FG: Swatch = Swatch::new((193, 156, 0), 178, Color::Yellow);

/// Colors resolved once for the detected terminal depth
#[derive(Debug, Clone)]
pub struct Palette {
    pub board_bg: Color,
    pub open_bg: Color,
    pub cursor_bg: Color,
    pub hidden_fg: Color,
    pub mine_fg: Color,
    pub flag_fg: Color,
    pub accent_fg: Color, // menu keys
    numbers: [Color; 8],
}

impl Palette {
    pub fn new(depth: Depth) -> Self {
        Palette {
            board_bg: BOARD_BG.at(depth),
            open_bg: OPEN_BG.at(depth),
            cursor_bg: CURSOR_BG.at(depth),
            hidden_fg: HIDDEN_FG.at(depth),
            mine_fg: MINE_FG.at(depth),
            flag_fg: FLAG_FG.at(depth),
            accent_fg: ACCENT_FG.at(depth),
            numbers: NUMBERS.map(|s| s.at(depth)),
        }
    }

    /// Color for an adjacent-mine count; zero has no number to draw
    pub fn number(&self, n: u8) -> Color {
        match n {
            1..=8 => self.numbers[n as usize - 1],
            _ => self.hidden_fg,
        }
    }
}
