//! Pitch accent source resolution.
//!
//! A card can carry accent data in up to three fields; the override field
//! doubles as two sources, giving four in priority order:
//!
//! 1. override field containing a digit - that digit is the position;
//! 2. override field without digits - its content is the final markup;
//! 3. positions field - either structured dictionary groups or free text
//!    containing a digit;
//! 4. AJT word pitch field - its content is the final markup.
//!
//! Each source is a function returning `Option<PitchSource>`; resolution
//! composes them left to right and takes the first hit.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::{
    CardFields,
    markup::{self, Element},
};

/// Outcome of [`resolve`]: either a position still to be rendered, or markup
/// that is already in final form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PitchSource {
    /// Downstep position to render via the accent span builder.
    Position {
        /// Downstep position: 0 is the flat (heiban) pattern, `k > 0` a
        /// drop after the k-th mora.
        pos: u64,
        /// Where the position came from.
        label: SourceLabel,
    },
    /// Ready-made display markup; no rendering required.
    Verbatim {
        /// Raw markup to place into the display slot as-is.
        html: String,
        /// Where the markup came from.
        label: SourceLabel,
    },
}

/// Which source won resolution. Diagnostic only - never drives control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLabel {
    /// Override field, numeric content.
    OverridePosition,
    /// Override field, verbatim text content.
    OverrideText,
    /// Structured or free-text positions field.
    Dictionary {
        /// `data-details` name of the winning group, if structured.
        name: Option<String>,
        /// Whether a bold-marked entry won.
        bold: bool,
    },
    /// AJT word pitch field, verbatim.
    AjtPitchAccent,
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OverridePosition => write!(f, "Override (Position)"),
            Self::OverrideText => write!(f, "Override (Text)"),
            Self::Dictionary { name, bold } => {
                write!(f, "{}", name.as_deref().unwrap_or("?"))?;
                if *bold {
                    write!(f, " (bold)")?;
                }
                Ok(())
            }
            Self::AjtPitchAccent => write!(f, "AJT Pitch Accent"),
        }
    }
}

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("should be valid regex"));

/// First run of digits in `text`, if any.
fn first_digits(text: &str) -> Option<u64> {
    DIGITS.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Resolves the card's pitch accent source, or `None` if no field provides
/// one (the caller then shows the not-available placeholder).
#[must_use]
pub fn resolve(fields: &CardFields) -> Option<PitchSource> {
    let sources = [
        override_position,
        override_text,
        positions,
        ajt_word_pitch,
    ];
    sources.iter().find_map(|source| source(fields))
}

fn override_position(fields: &CardFields) -> Option<PitchSource> {
    if fields.pa_override.is_empty() {
        return None;
    }

    let plain = markup::plain_text(&markup::parse(fields.pa_override));
    let pos = first_digits(&plain)?;
    Some(PitchSource::Position {
        pos,
        label: SourceLabel::OverridePosition,
    })
}

// only reached when the override field has no digits
fn override_text(fields: &CardFields) -> Option<PitchSource> {
    if fields.pa_override.is_empty() {
        return None;
    }

    Some(PitchSource::Verbatim {
        html: fields.pa_override.to_owned(),
        label: SourceLabel::OverrideText,
    })
}

fn positions(fields: &CardFields) -> Option<PitchSource> {
    if fields.pa_positions.is_empty() {
        return None;
    }

    let nodes = markup::parse(fields.pa_positions);
    let groups = markup::element_children(&nodes).collect::<Vec<_>>();
    let structured = groups
        .first()
        .is_some_and(|first| first.name == "div" && first.has_class("pa-positions__group"));
    if !structured {
        // free-form field: take the first digit run anywhere in it
        let pos = first_digits(fields.pa_positions)?;
        return Some(PitchSource::Position {
            pos,
            label: SourceLabel::Dictionary {
                name: None,
                bold: false,
            },
        });
    }

    // each group is <div data-details="{name}"><div>…</div><ol><li>…</li></ol></div>;
    // the first entry overall is the fallback, a bold entry anywhere wins outright
    let mut name = groups[0].data_details.clone();
    let mut bold = false;
    let mut winner: Option<&Element> = None;
    'groups: for group in &groups {
        let Some(list) = group.element_children().nth(1) else {
            continue;
        };
        for entry in list.element_children() {
            if winner.is_none() {
                winner = Some(entry);
            }
            if entry.has_descendant_named("b") {
                winner = Some(entry);
                name = group.data_details.clone();
                bold = true;
                break 'groups;
            }
        }
    }

    let winner = winner?;
    let pos = first_digits(&markup::plain_text(&winner.children))?;
    Some(PitchSource::Position {
        pos,
        label: SourceLabel::Dictionary { name, bold },
    })
}

fn ajt_word_pitch(fields: &CardFields) -> Option<PitchSource> {
    if fields.ajt_word_pitch.is_empty() {
        debug!("no pitch accent source found");
        return None;
    }

    Some(PitchSource::Verbatim {
        html: fields.ajt_word_pitch.to_owned(),
        label: SourceLabel::AjtPitchAccent,
    })
}

#[cfg(test)]
mod tests {
    use super::{PitchSource, SourceLabel, resolve};
    use crate::CardFields;

    fn position_group(name: &str, entries: &[&str]) -> String {
        let entries = entries
            .iter()
            .map(|entry| format!("<li><span style=\"display: inline;\">{entry}</span></li>"))
            .collect::<String>();
        format!(
            concat!(
                r#"<div class="pa-positions__group" data-details="{name}">"#,
                r#"<div class="pa-positions__dictionary">{name}</div>"#,
                "<ol>{entries}</ol></div>",
            ),
            name = name,
            entries = entries,
        )
    }

    #[test]
    fn override_digits_win_over_everything() {
        let positions = position_group("NHK", &["[1]"]);
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "2",
            pa_positions: &positions,
            ajt_word_pitch: "ネコ",
        };
        assert_eq!(
            resolve(&fields),
            Some(PitchSource::Position {
                pos: 2,
                label: SourceLabel::OverridePosition,
            })
        );
    }

    #[test]
    fn override_text_used_verbatim() {
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "<b>custom</b>",
            pa_positions: "[1]",
            ajt_word_pitch: "ネコ",
        };
        assert_eq!(
            resolve(&fields),
            Some(PitchSource::Verbatim {
                html: "<b>custom</b>".to_owned(),
                label: SourceLabel::OverrideText,
            })
        );
    }

    #[test]
    fn structured_positions_fallback_is_first_entry() {
        let positions = [
            position_group("NHK", &["[1]", "[2]"]),
            position_group("大辞泉", &["[3]"]),
        ]
        .concat();
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "",
            pa_positions: &positions,
            ajt_word_pitch: "",
        };
        assert_eq!(
            resolve(&fields),
            Some(PitchSource::Position {
                pos: 1,
                label: SourceLabel::Dictionary {
                    name: Some("NHK".to_owned()),
                    bold: false,
                },
            })
        );
    }

    #[test]
    fn structured_positions_bold_entry_wins() {
        let positions = [
            position_group("NHK", &["[1]"]),
            position_group("大辞泉", &["[0]", "<b>[3]</b>"]),
        ]
        .concat();
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "",
            pa_positions: &positions,
            ajt_word_pitch: "",
        };
        assert_eq!(
            resolve(&fields),
            Some(PitchSource::Position {
                pos: 3,
                label: SourceLabel::Dictionary {
                    name: Some("大辞泉".to_owned()),
                    bold: true,
                },
            })
        );
    }

    #[test]
    fn unstructured_positions_take_any_digit() {
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "",
            pa_positions: "accent: [2]",
            ajt_word_pitch: "",
        };
        assert_eq!(
            resolve(&fields),
            Some(PitchSource::Position {
                pos: 2,
                label: SourceLabel::Dictionary {
                    name: None,
                    bold: false,
                },
            })
        );
    }

    #[test]
    fn positions_without_digits_fall_through_to_ajt() {
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "",
            pa_positions: "no digits here",
            ajt_word_pitch: "ネコ",
        };
        assert_eq!(
            resolve(&fields),
            Some(PitchSource::Verbatim {
                html: "ネコ".to_owned(),
                label: SourceLabel::AjtPitchAccent,
            })
        );
    }

    #[test]
    fn all_fields_empty_fails_resolution() {
        let fields = CardFields {
            reading: "ねこ",
            pa_override: "",
            pa_positions: "",
            ajt_word_pitch: "",
        };
        assert_eq!(resolve(&fields), None);
    }

    #[test]
    fn labels_display() {
        assert_eq!(SourceLabel::OverridePosition.to_string(), "Override (Position)");
        assert_eq!(SourceLabel::OverrideText.to_string(), "Override (Text)");
        assert_eq!(
            SourceLabel::Dictionary {
                name: Some("NHK".to_owned()),
                bold: true,
            }
            .to_string(),
            "NHK (bold)"
        );
        assert_eq!(SourceLabel::AjtPitchAccent.to_string(), "AJT Pitch Accent");
    }
}
