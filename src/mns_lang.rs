// Multi-language support module
// Localized UI strings for English and Chinese

use crate::mns_game::Difficulty;

#[derive(Clone)]
pub struct Assets {
    // Menu row
    pub menu_help: &'static str,
    pub menu_new: &'static str,
    pub menu_difficulty: &'static str,
    pub menu_language: &'static str,
    pub menu_exit: &'static str,

    // Difficulty names
    pub diff_easy: &'static str,
    pub diff_medium: &'static str,
    pub diff_hard: &'static str,

    // Difficulty menu
    pub diff_hint: &'static str,
    pub diff_mines_fmt: &'static str, // "{} mines"
    pub rec_best_fmt: &'static str,   // "best {}s ({})"
    pub rec_no_record: &'static str,

    // Help modal
    pub help_title: &'static str,
    pub help_lines: [&'static str; 6],

    // Status bar
    pub status_fmt: &'static str, // " Mines: {}   Time: {}s "
    pub status_ready: &'static str,
    pub status_won: &'static str,
    pub status_won_record: &'static str,
    pub status_lost: &'static str,

    // Terminal size messages
    pub tsmsg_line1: &'static str,
    pub tsmsg_line2: &'static str, // "Minimum size required: {} x {}"
    pub tsmsg_title: &'static str,
}

/// Returns English language assets
pub fn english_assets() -> Assets {
    Assets {
        menu_help: "Help",
        menu_new: "New",
        menu_difficulty: "Difficulty",
        menu_language: "中文",
        menu_exit: "Exit",

        diff_easy: "Easy",
        diff_medium: "Medium",
        diff_hard: "Hard",

        diff_hint: "1-3 / Enter: select   Esc: close",
        diff_mines_fmt: "{} mines",
        rec_best_fmt: "best {}s ({})",
        rec_no_record: "no record",

        help_title: "Help",
        help_lines: [
            "  Mouse | Arrows     - move cursor",
            "  L-Click | Space    - reveal",
            "  R-Click | F        - toggle flag",
            "  F2                 - new game",
            "  F5 | 1-3           - difficulty",
            "  L                  - language",
        ],

        status_fmt: " Mines: {}   Time: {}s ",
        status_ready: "Click any cell to start",
        status_won: "You win!",
        status_won_record: "You win! New record!",
        status_lost: "Game over",

        tsmsg_line1: "Terminal too small",
        tsmsg_line2: "Minimum size required: {} x {}",
        tsmsg_title: "Resize needed",
    }
}

/// Returns Chinese language assets
pub fn chinese_assets() -> Assets {
    Assets {
        menu_help: "帮助",
        menu_new: "重启",
        menu_difficulty: "难度",
        menu_language: "English",
        menu_exit: "退出",

        diff_easy: "简单模式",
        diff_medium: "中等模式",
        diff_hard: "困难模式",

        diff_hint: "1-3 / 回车：选择   Esc：关闭",
        diff_mines_fmt: "{} 个雷",
        rec_best_fmt: "最佳 {} 秒（{}）",
        rec_no_record: "暂无纪录",

        help_title: "帮助",
        help_lines: [
            "  鼠标 | 方向键     - 移动光标",
            "  左键 | 空格       - 翻开",
            "  右键 | F          - 标记/取消",
            "  F2                - 重新开始",
            "  F5 | 1-3          - 选择难度",
            "  L                 - 切换语言",
        ],

        status_fmt: " 地雷：{}   时间：{} 秒 ",
        status_ready: "点击任意格子开始",
        status_won: "胜利",
        status_won_record: "胜利 新纪录！",
        status_lost: "游戏结束",

        tsmsg_line1: "终端屏幕布局过小",
        tsmsg_line2: "最小需要尺寸：{} x {}",
        tsmsg_title: "需要调整大小",
    }
}

/// Holds the current language code and active string assets
pub struct Lang {
    pub current_lang: String,
    pub assets: Assets,
}

impl Lang {
    /// Normalizes input (e.g. "zh-CN" → "zh") and defaults to English
    pub fn new(lang_code: &str) -> Self {
        let mut lang = Lang {
            current_lang: String::new(),
            assets: english_assets(),
        };
        lang.switch_to(lang_code);
        lang
    }

    pub fn switch_to(&mut self, lang_code: &str) {
        let code = if lang_code.to_lowercase().starts_with("zh") {
            "zh"
        } else {
            "en"
        };
        self.current_lang = code.to_string();
        self.assets = if code == "zh" {
            chinese_assets()
        } else {
            english_assets()
        };
    }

    /// Flip between English and Chinese; returns the new code
    pub fn toggle(&mut self) -> &str {
        let next = if self.current_lang == "zh" { "en" } else { "zh" };
        self.switch_to(next);
        &self.current_lang
    }

    pub fn diff_name(&self, d: Difficulty) -> &'static str {
        match d {
            Difficulty::Easy => self.assets.diff_easy,
            Difficulty::Medium => self.assets.diff_medium,
            Difficulty::Hard => self.assets.diff_hard,
        }
    }

    /// Format an ISO date (YYYY-MM-DD) according to the current language
    pub fn format_date(&self, iso_date: &str) -> String {
        let parts: Vec<&str> = iso_date.split('-').collect();
        if parts.len() != 3 {
            return iso_date.to_string();
        }

        if self.current_lang == "zh" {
            format!("{}年{}月{}日", parts[0], parts[1], parts[2])
        } else {
            format!("{}/{}/{}", parts[1], parts[2], parts[0])
        }
    }
}

/// Fill `{}` placeholders in order
pub fn fill(fmt: &str, args: &[&dyn std::fmt::Display]) -> String {
    let mut out = String::with_capacity(fmt.len());
    let mut rest = fmt;
    for arg in args {
        match rest.find("{}") {
            Some(i) => {
                out.push_str(&rest[..i]);
                out.push_str(&arg.to_string());
                rest = &rest[i + 2..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}
