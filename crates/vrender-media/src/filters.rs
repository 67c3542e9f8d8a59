//! Burned-in title overlay filter.

use std::path::PathBuf;

/// Fixed look of the title overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleStyle {
    pub font_size: u32,
    pub font_color: String,
    pub border_width: u32,
    pub border_color: String,
    /// x expression, evaluated by drawtext
    pub x: String,
    /// y expression, evaluated by drawtext
    pub y: String,
    /// Explicit font file; fontconfig's default font is used otherwise
    pub font_file: Option<PathBuf>,
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            font_size: 48,
            font_color: "white".to_string(),
            border_width: 4,
            border_color: "black".to_string(),
            // Horizontally centred, near the top
            x: "(w-text_w)/2".to_string(),
            y: "h/12".to_string(),
            font_file: None,
        }
    }
}

/// Escape a value for a single drawtext option.
///
/// Two layers are escaped: the option parser (`\`, `'`, `:`) and then the
/// filtergraph parser (`\`, `'`, `,`, `;`, `[`, `]`). Control characters
/// become spaces.
pub fn escape_drawtext_text(text: &str) -> String {
    let mut option_level = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | ':' => {
                option_level.push('\\');
                option_level.push(c);
            }
            c if c.is_control() => option_level.push(' '),
            c => option_level.push(c),
        }
    }

    let mut graph_level = String::with_capacity(option_level.len() * 2);
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | ',' | ';' | '[' | ']') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}

/// Build the `drawtext` filter that burns `title` into the video.
pub fn build_title_filter(title: &str, style: &TitleStyle) -> String {
    let mut filter = format!(
        "drawtext=text={}:expansion=none:fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x={}:y={}",
        escape_drawtext_text(title),
        style.font_size,
        style.font_color,
        style.border_width,
        style.border_color,
        style.x,
        style.y,
    );

    if let Some(font_file) = &style.font_file {
        filter.push_str(":fontfile=");
        filter.push_str(&escape_drawtext_text(&font_file.to_string_lossy()));
    }

    filter
}
