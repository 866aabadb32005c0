//! Per-node commentary: text comments, annotation codes, board markup and
//! clock readings, plus extraction of `[%cmd ...]` syntax out of raw comments.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Square};

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%(\w+)\s+([^\]]*)\]").expect("command regex"));

static HMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})(?:\.(\d{1,2}))?$").expect("clock regex")
});

/// A duration in hundredths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Centis(pub u32);

impl Centis {
    pub fn from_secs(secs: u32) -> Self {
        Self(secs.saturating_mul(100))
    }

    /// Parse `H:MM:SS` with optional tenths or hundredths.
    pub fn parse_hms(s: &str) -> Option<Self> {
        let caps = HMS_RE.captures(s.trim())?;
        let hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps[2].parse().ok()?;
        let seconds: u32 = caps[3].parse().ok()?;
        let fraction = match caps.get(4) {
            Some(m) if m.as_str().len() == 1 => m.as_str().parse::<u32>().ok()?.checked_mul(10)?,
            Some(m) => m.as_str().parse::<u32>().ok()?,
            None => 0,
        };
        let total = hours
            .checked_mul(60)?
            .checked_add(minutes)?
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(100)?
            .checked_add(fraction)?;
        Some(Self(total))
    }
}

impl fmt::Display for Centis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0 / 100;
        let fraction = self.0 % 100;
        write!(
            f,
            "{}:{:02}:{:02}",
            total_secs / 3600,
            (total_secs / 60) % 60,
            total_secs % 60
        )?;
        if fraction == 0 {
            Ok(())
        } else if fraction % 10 == 0 {
            write!(f, ".{}", fraction / 10)
        } else {
            write!(f, ".{fraction:02}")
        }
    }
}

/// Remaining time per side after a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clocks {
    pub white: Option<Centis>,
    pub black: Option<Centis>,
}

impl Clocks {
    pub fn get(&self, color: Color) -> Option<Centis> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn set(&mut self, color: Color, value: Option<Centis>) {
        match color {
            Color::White => self.white = value,
            Color::Black => self.black = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Brush {
    Green,
    Red,
    Yellow,
    Blue,
}

impl Brush {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'G' => Some(Self::Green),
            'R' => Some(Self::Red),
            'Y' => Some(Self::Yellow),
            'B' => Some(Self::Blue),
            _ => None,
        }
    }

    pub fn char(self) -> char {
        match self {
            Self::Green => 'G',
            Self::Red => 'R',
            Self::Yellow => 'Y',
            Self::Blue => 'B',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
        }
    }
}

/// Board markup: an arrow when `dest` is set, a highlighted square otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub orig: Square,
    pub dest: Option<Square>,
    pub brush: Brush,
}

impl Shape {
    fn parse(token: &str, arrow: bool) -> Option<Self> {
        let token = token.trim();
        let brush = Brush::from_char(token.chars().next()?)?;
        let squares = token.get(1..)?;
        match (arrow, squares.len()) {
            (false, 2) => Some(Self {
                orig: squares.parse().ok()?,
                dest: None,
                brush,
            }),
            (true, 4) => Some(Self {
                orig: squares.get(..2)?.parse().ok()?,
                dest: Some(squares.get(2..)?.parse().ok()?),
                brush,
            }),
            _ => None,
        }
    }

    fn parse_list(list: &str, arrow: bool) -> Option<Vec<Self>> {
        list.split(',')
            .filter(|t| !t.trim().is_empty())
            .map(|t| Self::parse(t, arrow))
            .collect()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.brush.char(), self.orig)?;
        if let Some(dest) = self.dest {
            write!(f, "{dest}")?;
        }
        Ok(())
    }
}

/// A closing brace would end the comment early when written out.
fn user_text(text: &str) -> String {
    text.replace('}', "")
}

/// What one raw comment string contributes to a node.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedComment {
    pub text: Option<String>,
    pub clock: Option<Centis>,
    pub emt: Option<Centis>,
    pub shapes: Vec<Shape>,
}

/// Split a raw comment into its free text and recognized commands.
/// Unknown or unparsable commands are left in the text untouched.
pub fn parse_comment(raw: &str) -> ParsedComment {
    let mut parsed = ParsedComment::default();

    let stripped = COMMAND_RE.replace_all(raw, |caps: &Captures| {
        let arg = caps[2].trim();
        let consumed = match &caps[1] {
            "clk" => Centis::parse_hms(arg).map(|c| parsed.clock = Some(c)).is_some(),
            "emt" => Centis::parse_hms(arg).map(|c| parsed.emt = Some(c)).is_some(),
            "csl" => Shape::parse_list(arg, false)
                .map(|s| parsed.shapes.extend(s))
                .is_some(),
            "cal" => Shape::parse_list(arg, true)
                .map(|s| parsed.shapes.extend(s))
                .is_some(),
            _ => false,
        };
        if consumed {
            " ".to_string()
        } else {
            caps[0].to_string()
        }
    });

    let text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        parsed.text = Some(text);
    }
    parsed
}

/// Annotation data carried by every node, root included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub comments: Vec<String>,
    nags: Vec<u8>,
    pub shapes: Vec<Shape>,
    /// Clock reading recorded on this node itself.
    pub clock: Option<Centis>,
    /// Time spent on this move.
    pub emt: Option<Centis>,
    /// Both sides' clocks after this node, inherited where not recorded.
    pub clocks: Clocks,
}

impl Annotations {
    pub fn nags(&self) -> &[u8] {
        &self.nags
    }

    /// Returns false when the code was already present.
    pub fn add_nag(&mut self, code: u8) -> bool {
        if self.nags.contains(&code) {
            return false;
        }
        self.nags.push(code);
        true
    }

    pub fn remove_nag(&mut self, code: u8) -> bool {
        let before = self.nags.len();
        self.nags.retain(|&c| c != code);
        self.nags.len() != before
    }

    /// Add user text as a comment. Commands in it are applied to the node
    /// the same way they are when a document is read.
    pub fn add_comment(&mut self, text: &str) {
        self.absorb_comment(&user_text(text));
    }

    /// Replace comment `index`. A replacement that leaves no free text once
    /// its commands are applied removes the comment.
    pub fn edit_comment(&mut self, index: usize, text: &str) -> bool {
        if index >= self.comments.len() {
            return false;
        }
        match self.apply_commands(parse_comment(&user_text(text))) {
            Some(text) => self.comments[index] = text,
            None => {
                self.comments.remove(index);
            }
        }
        true
    }

    pub fn delete_comment(&mut self, index: usize) -> Option<String> {
        (index < self.comments.len()).then(|| self.comments.remove(index))
    }

    /// Fold one raw comment (as found in a document) into this node.
    pub fn absorb_comment(&mut self, raw: &str) {
        if let Some(text) = self.apply_commands(parse_comment(raw)) {
            self.comments.push(text);
        }
    }

    fn apply_commands(&mut self, parsed: ParsedComment) -> Option<String> {
        if parsed.clock.is_some() {
            self.clock = parsed.clock;
        }
        if parsed.emt.is_some() {
            self.emt = parsed.emt;
        }
        self.shapes.extend(parsed.shapes);
        parsed.text
    }

    /// The node's own commands in document syntax, if it has any.
    pub fn command_text(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(clock) = self.clock {
            parts.push(format!("[%clk {clock}]"));
        }
        if let Some(emt) = self.emt {
            parts.push(format!("[%emt {emt}]"));
        }
        let (arrows, circles): (Vec<&Shape>, Vec<&Shape>) =
            self.shapes.iter().partition(|s| s.dest.is_some());
        if !circles.is_empty() {
            let list: Vec<String> = circles.iter().map(|s| s.to_string()).collect();
            parts.push(format!("[%csl {}]", list.join(",")));
        }
        if !arrows.is_empty() {
            let list: Vec<String> = arrows.iter().map(|s| s.to_string()).collect();
            parts.push(format!("[%cal {}]", list.join(",")));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_formats() {
        assert_eq!(Centis::parse_hms("0:03:00"), Some(Centis(18_000)));
        assert_eq!(Centis::parse_hms("1:00:05.5"), Some(Centis(360_550)));
        assert_eq!(Centis::parse_hms("0:00:01.25"), Some(Centis(125)));
        assert_eq!(Centis::parse_hms("abc"), None);
        assert_eq!(Centis::parse_hms("50000:00:00"), None);
    }

    #[test]
    fn test_oversized_clock_stays_in_text() {
        let parsed = parse_comment("slow [%clk 50000:00:00]");
        assert_eq!(parsed.clock, None);
        assert_eq!(parsed.text.as_deref(), Some("slow [%clk 50000:00:00]"));
    }

    #[test]
    fn test_non_ascii_shape_is_not_a_command() {
        let parsed = parse_comment("[%cal Ga\u{e9}4] [%csl G\u{e9}]");
        assert!(parsed.shapes.is_empty());
        assert_eq!(parsed.text.as_deref(), Some("[%cal Ga\u{e9}4] [%csl G\u{e9}]"));
    }

    #[test]
    fn test_clock_display() {
        assert_eq!(Centis(18_000).to_string(), "0:03:00");
        assert_eq!(Centis(360_550).to_string(), "1:00:05.5");
        assert_eq!(Centis(125).to_string(), "0:00:01.25");
    }

    #[test]
    fn test_parse_comment_strips_commands() {
        let parsed = parse_comment("Good move [%clk 0:02:58] [%cal Ge2e4,Rd1h5] [%csl Yf7]");
        assert_eq!(parsed.text.as_deref(), Some("Good move"));
        assert_eq!(parsed.clock, Some(Centis(17_800)));
        assert_eq!(parsed.shapes.len(), 3);
        assert_eq!(
            parsed.shapes[0],
            Shape { orig: Square::E2, dest: Some(Square::E4), brush: Brush::Green }
        );
        assert_eq!(
            parsed.shapes[2],
            Shape { orig: Square::F7, dest: None, brush: Brush::Yellow }
        );
    }

    #[test]
    fn test_parse_comment_keeps_unknown_commands() {
        let parsed = parse_comment("[%eval 0.34] fine");
        assert_eq!(parsed.text.as_deref(), Some("[%eval 0.34] fine"));
        assert_eq!(parsed.clock, None);
    }

    #[test]
    fn test_command_only_comment_has_no_text() {
        let parsed = parse_comment("  [%emt 0:00:07]  ");
        assert_eq!(parsed.text, None);
        assert_eq!(parsed.emt, Some(Centis(700)));
    }

    #[test]
    fn test_nag_set_semantics() {
        let mut ann = Annotations::default();
        assert!(ann.add_nag(1));
        assert!(!ann.add_nag(1));
        assert!(ann.add_nag(14));
        assert_eq!(ann.nags(), &[1, 14]);
        assert!(ann.remove_nag(1));
        assert!(!ann.remove_nag(1));
        assert_eq!(ann.nags(), &[14]);
    }

    #[test]
    fn test_comment_list_edits() {
        let mut ann = Annotations::default();
        ann.add_comment("a");
        ann.add_comment("a");
        assert_eq!(ann.comments, vec!["a", "a"]);
        assert!(ann.edit_comment(1, "b"));
        assert!(!ann.edit_comment(5, "x"));
        assert_eq!(ann.delete_comment(7), None);
        assert_eq!(ann.delete_comment(0).as_deref(), Some("a"));
        assert_eq!(ann.comments, vec!["b"]);
    }

    #[test]
    fn test_user_comments_parse_like_document_comments() {
        let mut ann = Annotations::default();
        ann.add_comment("threat } Qh5");
        ann.add_comment("time  [%clk 0:01:00]");
        assert_eq!(ann.comments, vec!["threat Qh5", "time"]);
        assert_eq!(ann.clock, Some(Centis(6000)));

        assert!(ann.edit_comment(0, "[%csl Rh5]"));
        assert_eq!(ann.comments, vec!["time"]);
        assert_eq!(ann.shapes.len(), 1);
    }

    #[test]
    fn test_command_text_round_trip() {
        let mut ann = Annotations::default();
        ann.absorb_comment("[%clk 0:01:00] [%csl Ra1] [%cal Bb1c3]");
        let text = ann.command_text().unwrap();
        assert_eq!(text, "[%clk 0:01:00] [%csl Ra1] [%cal Bb1c3]");

        let mut again = Annotations::default();
        again.absorb_comment(&text);
        assert_eq!(again.clock, ann.clock);
        assert_eq!(again.shapes, ann.shapes);
        assert!(again.comments.is_empty());
    }
}
