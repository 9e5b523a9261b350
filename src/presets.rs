//! Standard rich-text style vocabulary
//!
//! A ready-made set of styles for a typical rich-text editor toolbar, with
//! keyboard labels for the buttons and a conflict table that keeps the
//! combinations sensible.
//!
//! # Supported Styles
//! - **Inline**: Bold, Italic, Inline Code, Strikethrough, Link
//! - **Blocks**: Code Block, Headings (1-6), Lists, Blockquote

use crate::config::{ConflictRules, StyleSettings};
use crate::style::StyleDefinition;
use std::collections::BTreeMap;

/// Key of the base style in the standard vocabulary.
pub const PLAIN_KEY: &str = "plain";

const HEADING_KEYS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];
const HEADING_SIZES: [i64; 6] = [32, 26, 22, 18, 16, 14];

// ─────────────────────────────────────────────────────────────────────────────
// Standard Style Enum
// ─────────────────────────────────────────────────────────────────────────────

/// Styles in the standard vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardStyle {
    /// Bold text (`<strong>`)
    Bold,
    /// Italic text (`<em>`)
    Italic,
    /// Inline code (`<code>`)
    InlineCode,
    /// Strikethrough (`<del>`)
    Strikethrough,
    /// Hyperlink (`<a href="...">`)
    Link,
    /// Preformatted code block (`<pre>`)
    CodeBlock,
    /// Heading level 1-6
    Heading(u8),
    /// Bullet list
    BulletList,
    /// Numbered list
    NumberedList,
    /// Blockquote
    Blockquote,
}

impl StandardStyle {
    /// Every standard style in declaration order.
    pub fn all() -> Vec<StandardStyle> {
        let mut styles = vec![
            Self::Bold,
            Self::Italic,
            Self::InlineCode,
            Self::Strikethrough,
            Self::Link,
        ];
        styles.extend((1..=6).map(Self::Heading));
        styles.extend([
            Self::BulletList,
            Self::NumberedList,
            Self::Blockquote,
            Self::CodeBlock,
        ]);
        styles
    }

    fn heading_index(level: u8) -> usize {
        usize::from(level.clamp(1, 6)) - 1
    }

    /// Style key used by the state machine.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::InlineCode => "code",
            Self::Strikethrough => "strike",
            Self::Link => "link",
            Self::CodeBlock => "code-block",
            Self::Heading(level) => HEADING_KEYS[Self::heading_index(*level)],
            Self::BulletList => "bullet-list",
            Self::NumberedList => "numbered-list",
            Self::Blockquote => "quote",
        }
    }

    /// Markup element name.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::InlineCode => "code",
            Self::Strikethrough => "del",
            Self::Link => "a",
            Self::CodeBlock => "pre",
            Self::Heading(level) => HEADING_KEYS[Self::heading_index(*level)],
            Self::BulletList => "ul",
            Self::NumberedList => "ol",
            Self::Blockquote => "blockquote",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::CodeBlock
                | Self::Heading(_)
                | Self::BulletList
                | Self::NumberedList
                | Self::Blockquote
        )
    }

    /// Get the keyboard shortcut label for this style.
    pub fn shortcut_label(&self) -> &'static str {
        match self {
            Self::Bold => "Ctrl+B",
            Self::Italic => "Ctrl+I",
            Self::InlineCode => "Ctrl+`",
            Self::Strikethrough => "Ctrl+Shift+S",
            Self::Link => "Ctrl+K",
            Self::CodeBlock => "Ctrl+Shift+C",
            Self::Heading(1) => "Ctrl+1",
            Self::Heading(2) => "Ctrl+2",
            Self::Heading(3) => "Ctrl+3",
            Self::Heading(4) => "Ctrl+4",
            Self::Heading(5) => "Ctrl+5",
            Self::Heading(6) => "Ctrl+6",
            Self::Heading(_) => "Ctrl+1-6",
            Self::BulletList => "Ctrl+Shift+B",
            Self::NumberedList => "Ctrl+Shift+N",
            Self::Blockquote => "Ctrl+Q",
        }
    }

    /// Get the tooltip text for this style.
    pub fn tooltip(&self) -> String {
        let name = match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::InlineCode => "Inline Code",
            Self::Strikethrough => "Strikethrough",
            Self::Link => "Link",
            Self::CodeBlock => "Code Block",
            Self::Heading(n) => return format!("Heading {} ({})", n, self.shortcut_label()),
            Self::BulletList => "Bullet List",
            Self::NumberedList => "Numbered List",
            Self::Blockquote => "Blockquote",
        };
        format!("{} ({})", name, self.shortcut_label())
    }

    /// The style definition, including its rendering attributes.
    pub fn definition(&self) -> StyleDefinition {
        let definition = if self.is_block() {
            StyleDefinition::block(self.key(), self.tag())
        } else {
            StyleDefinition::inline(self.key(), self.tag())
        };
        match self {
            Self::Bold => definition.with_attribute("font-weight", "bold"),
            Self::Italic => definition.with_attribute("font-style", "italic"),
            Self::InlineCode | Self::CodeBlock => {
                definition.with_attribute("font-family", "monospace")
            }
            Self::Strikethrough => definition.with_attribute("strikethrough", true),
            Self::Link => definition
                .with_attribute("underline", true)
                .with_attribute("color", "link"),
            Self::Heading(level) => definition
                .with_attribute("font-size", HEADING_SIZES[Self::heading_index(*level)]),
            Self::BulletList => definition.with_attribute("list", "bullet"),
            Self::NumberedList => definition.with_attribute("list", "numbered"),
            Self::Blockquote => definition.with_attribute("indent", 1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Preset Settings
// ─────────────────────────────────────────────────────────────────────────────

fn keys(styles: &[StandardStyle]) -> Vec<String> {
    styles.iter().map(|s| s.key().to_string()).collect()
}

/// The standard vocabulary with its conflict rules.
///
/// - headings are mutually exclusive, imply bold and disable lists
/// - bullet and numbered lists are mutually exclusive
/// - a code block disables every inline style
pub fn standard_settings() -> StyleSettings {
    let mut styles = vec![StyleDefinition::plain(PLAIN_KEY)];
    styles.extend(StandardStyle::all().iter().map(StandardStyle::definition));

    let headings: Vec<StandardStyle> = (1..=6).map(StandardStyle::Heading).collect();
    let lists = [StandardStyle::BulletList, StandardStyle::NumberedList];
    let inline = [
        StandardStyle::Bold,
        StandardStyle::Italic,
        StandardStyle::InlineCode,
        StandardStyle::Strikethrough,
        StandardStyle::Link,
    ];

    let mut implies = BTreeMap::new();
    let mut disables = BTreeMap::new();
    for heading in &headings {
        implies.insert(heading.key().to_string(), keys(&[StandardStyle::Bold]));
        disables.insert(heading.key().to_string(), keys(&lists));
    }
    disables.insert(StandardStyle::CodeBlock.key().to_string(), keys(&inline));

    let mut settings = StyleSettings {
        default_key: PLAIN_KEY.to_string(),
        root_tag: StyleSettings::DEFAULT_ROOT_TAG.to_string(),
        styles,
        rules: ConflictRules {
            exclusive: vec![keys(&headings), keys(&lists)],
            implies,
            disables,
        },
    };
    settings.sanitize();
    settings
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_labels() {
        assert_eq!(StandardStyle::Bold.shortcut_label(), "Ctrl+B");
        assert_eq!(StandardStyle::Italic.shortcut_label(), "Ctrl+I");
        assert_eq!(StandardStyle::Link.shortcut_label(), "Ctrl+K");
        assert_eq!(StandardStyle::Heading(9).shortcut_label(), "Ctrl+1-6");
    }

    #[test]
    fn test_tooltips() {
        let tooltip = StandardStyle::Bold.tooltip();
        assert!(tooltip.contains("Bold"));
        assert!(tooltip.contains("Ctrl+B"));
        assert_eq!(StandardStyle::Heading(2).tooltip(), "Heading 2 (Ctrl+2)");
    }

    #[test]
    fn test_heading_level_is_clamped() {
        assert_eq!(StandardStyle::Heading(0).key(), "h1");
        assert_eq!(StandardStyle::Heading(9).tag(), "h6");
    }

    #[test]
    fn test_block_flags() {
        assert!(StandardStyle::Blockquote.is_block());
        assert!(StandardStyle::Heading(3).definition().block);
        assert!(!StandardStyle::Link.definition().block);
    }

    #[test]
    fn test_standard_settings_are_consistent() {
        let settings = standard_settings();
        let mut sanitized = settings.clone();
        sanitized.sanitize();
        assert_eq!(settings, sanitized);
        assert_eq!(settings.styles.len(), StandardStyle::all().len() + 1);
        assert_eq!(settings.rules.implies["h2"], vec!["bold".to_string()]);
        assert_eq!(settings.rules.disables["code-block"].len(), 5);
    }
}
