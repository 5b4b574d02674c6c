//! Status tip rendering.
//!
//! Turns a (cps, combo) pair into the short text line shown to the player.
//! Digits can be swapped for resource-pack glyphs through a [`GlyphTable`];
//! none of this feeds back into the counters.

use std::collections::HashMap;

/// Template used when no display config is supplied.
pub const DEFAULT_TEMPLATE: &str = "§7CPS: §f{cps} §7| Combo: §f{combo}";

/// Character to glyph substitution applied to rendered numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphTable {
    glyphs: HashMap<char, String>,
}

impl GlyphTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: char, glyph: impl Into<String>) {
        self.glyphs.insert(from, glyph.into());
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Renders `number` in decimal, replacing each mapped character.
    pub fn render(&self, number: u32) -> String {
        number
            .to_string()
            .chars()
            .fold(String::new(), |mut out, c| {
                match self.glyphs.get(&c) {
                    Some(glyph) => out.push_str(glyph),
                    None => out.push(c),
                }
                out
            })
    }
}

impl FromIterator<(char, String)> for GlyphTable {
    fn from_iter<I: IntoIterator<Item = (char, String)>>(iter: I) -> Self {
        Self {
            glyphs: iter.into_iter().collect(),
        }
    }
}

/// Formats status tips from a template containing `{cps}` and `{combo}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipFormatter {
    template: String,
    glyphs: GlyphTable,
}

impl Default for TipFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE, GlyphTable::new())
    }
}

impl TipFormatter {
    pub fn new(template: impl Into<String>, glyphs: GlyphTable) -> Self {
        Self {
            template: template.into(),
            glyphs,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format(&self, cps: u32, combo: u32) -> String {
        self.template
            .replace("{cps}", &self.glyphs.render(cps))
            .replace("{combo}", &self.glyphs.render(combo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        let formatter = TipFormatter::default();
        assert_eq!(formatter.format(12, 3), "§7CPS: §f12 §7| Combo: §f3");
    }

    #[test]
    fn test_glyphs_replace_mapped_digits_only() {
        let mut glyphs = GlyphTable::new();
        glyphs.insert('1', "①");
        glyphs.insert('0', "⓪");

        assert_eq!(glyphs.render(105), "①⓪5");
        assert_eq!(glyphs.render(7), "7");
    }

    #[test]
    fn test_custom_template_with_glyphs() {
        let glyphs: GlyphTable = ('0'..='9')
            .zip("０１２３４５６７８９".chars())
            .map(|(digit, wide)| (digit, wide.to_string()))
            .collect();
        let formatter = TipFormatter::new("{combo}x | {cps} cps", glyphs);

        assert_eq!(formatter.format(14, 2), "２x | １４ cps");
    }

    #[test]
    fn test_template_without_placeholders() {
        let formatter = TipFormatter::new("static", GlyphTable::new());
        assert_eq!(formatter.format(1, 1), "static");
    }
}
