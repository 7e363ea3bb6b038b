//! Characters used to draw quality bars and panel decorations.

#[derive(Clone, Copy, Debug)]
pub struct Glyphs {
    /// Quality bar levels, lowest first.
    pub quality_levels: [&'static str; 8],
    pub more_left: &'static str,
    pub more_right: &'static str,
}

impl Glyphs {
    /// Bar for a Phred score; 60 and above is full height.
    pub fn quality_bar(&self, score: u8) -> &'static str {
        let level = (usize::from(score.min(60)) * (self.quality_levels.len() - 1)) / 60;
        self.quality_levels[level]
    }
}

pub fn select(fancy_requested: bool) -> Glyphs {
    if fancy_requested {
        fancy()
    } else {
        ascii()
    }
}

fn ascii() -> Glyphs {
    Glyphs {
        quality_levels: [".", ",", ":", ";", "=", "+", "*", "#"],
        more_left: "<",
        more_right: ">",
    }
}

fn fancy() -> Glyphs {
    Glyphs {
        quality_levels: ["▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"],
        more_left: "◀",
        more_right: "▶",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bar_levels() {
        let g = select(false);
        assert_eq!(g.quality_bar(0), ".");
        assert_eq!(g.quality_bar(60), "#");
        assert_eq!(g.quality_bar(99), "#");
        assert_eq!(select(true).quality_bar(30), "▄");
    }

    #[test]
    fn test_scroll_markers() {
        assert_eq!((select(false).more_left, select(false).more_right), ("<", ">"));
        assert_eq!((select(true).more_left, select(true).more_right), ("◀", "▶"));
    }
}
