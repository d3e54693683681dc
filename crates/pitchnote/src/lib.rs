#![doc = include_str!("../README.md")]

pub mod ajt;
pub mod jpn;
pub mod markup;
pub mod resolve;

mod render;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::resolve::{PitchSource, SourceLabel};

/// Placeholder shown in the display slot when no pitch accent source
/// resolves.
pub const NOT_AVAILABLE: &str = "(N/A)";

/// Raw contents of the card fields the pipeline reads.
///
/// An empty string means the field is absent. `reading` is the kana
/// pronunciation with any `word[reading]` furigana syntax already stripped
/// by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardFields<'a> {
    /// Kana reading of the word.
    pub reading: &'a str,
    /// Pitch accent override field: a position number, or verbatim markup.
    pub pa_override: &'a str,
    /// Pitch accent positions field, possibly structured into dictionary
    /// groups.
    pub pa_positions: &'a str,
    /// AJT word pitch field: annotated markup, one entry per homograph.
    pub ajt_word_pitch: &'a str,
}

/// How the reading is displayed when morae are not sourced from a matched
/// AJT word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingDisplay {
    /// As written in the reading field.
    Reading,
    /// Converted to katakana.
    Katakana,
    /// Converted to katakana with long vowel marks.
    ExtendedKatakana,
}

impl TryFrom<u8> for ReadingDisplay {
    type Error = RenderError;

    fn try_from(mode: u8) -> Result<Self, RenderError> {
        match mode {
            0 => Ok(Self::Reading),
            1 => Ok(Self::Katakana),
            2 => Ok(Self::ExtendedKatakana),
            mode => Err(RenderError::InvalidDisplayMode { mode }),
        }
    }
}

/// Host-configured options, injected from the note's JSON options file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderOptions {
    /// Numeric [`ReadingDisplay`] mode. Validated at render time; an
    /// unknown value is a configuration error the user must fix.
    pub reading_display_mode: u8,
    /// Whether to search the AJT field for the card's word to carry its
    /// nasal and devoicing annotations into the indicator.
    pub search_for_ajt_word: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            reading_display_mode: 0,
            search_for_ajt_word: true,
        }
    }
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPitch {
    /// Markup to place into the display slot.
    Markup {
        /// Final indicator markup.
        html: String,
        /// Which source provided the accent data. Diagnostic only.
        source: SourceLabel,
    },
    /// No source resolved; show [`NOT_AVAILABLE`].
    NotAvailable,
    /// The reading produced no morae; leave the slot as it is.
    Skipped,
}

/// Fatal render errors. Everything else in the pipeline recovers locally and
/// reports through the diagnostic channel.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The configured reading display mode is not one of the known values.
    #[display("invalid reading display mode {mode}")]
    InvalidDisplayMode {
        /// Configured mode value.
        mode: u8,
    },
}

/// Renders the pitch accent indicator for one card.
///
/// Resolves the accent source by priority (override position, override
/// text, positions field, AJT field), then - for position sources - builds
/// the overline/downstep markup over the card's morae. Pure: the same
/// fields and options always produce the same result.
///
/// # Errors
///
/// Fails only on an invalid display mode configuration.
pub fn render_word_pitch(
    fields: &CardFields,
    options: &RenderOptions,
) -> Result<WordPitch, RenderError> {
    let Some(source) = resolve::resolve(fields) else {
        return Ok(WordPitch::NotAvailable);
    };

    match source {
        PitchSource::Verbatim { html, label } => {
            debug!(%label, "using source markup verbatim");
            Ok(WordPitch::Markup {
                html,
                source: label,
            })
        }
        PitchSource::Position { pos, label } => {
            debug!(%label, pos, reading = fields.reading, "resolved pitch position");
            Ok(
                match render::build_reading_span(pos, fields, options)? {
                    Some(html) => WordPitch::Markup {
                        html,
                        source: label,
                    },
                    None => WordPitch::Skipped,
                },
            )
        }
    }
}
