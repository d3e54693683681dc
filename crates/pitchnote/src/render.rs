//! Accent span building: turning a downstep position and a mora sequence
//! into overline/downstep markup.

use itertools::Itertools as _;
use maud::{Markup, PreEscaped, html};
use tracing::{debug, warn};

use crate::{
    CardFields, ReadingDisplay, RenderError, RenderOptions, ajt, jpn,
    markup::{self, Node},
};

/// Builds the pitch accent indicator markup for the given downstep position,
/// or `None` if the reading produced no morae (warned, caller skips).
///
/// Morae are sourced from the matched AJT word when `search_for_ajt_word` is
/// enabled and the match succeeds - carrying that word's nasal and devoicing
/// annotations along - and from the reading under the configured display
/// mode otherwise.
pub(crate) fn build_reading_span(
    pos: u64,
    fields: &CardFields,
    options: &RenderOptions,
) -> Result<Option<String>, RenderError> {
    let ajt_word = if options.search_for_ajt_word {
        ajt::find_word(fields.ajt_word_pitch, fields.reading)
    } else {
        None
    };

    let morae = match ajt_word {
        Some(word) => {
            debug!("using AJT word as mora source");
            morae_from_word(&word)
        }
        None => {
            debug!("using reading field as mora source");
            morae_from_reading(fields.reading, options.reading_display_mode)?
        }
    };
    Ok(accent_span(pos, &morae))
}

/// Derives the mora sequence from a matched AJT word's markup, preserving
/// nasal and devoicing annotations.
fn morae_from_word(word: &str) -> Vec<String> {
    // the builder recomputes its own accent shape, so the word's own
    // overline wrappers are unwrapped and its downsteps dropped
    let mut nodes = Vec::new();
    for node in markup::parse(word) {
        match node {
            Node::Element(element) if element.has_class("pitchoverline") => {
                nodes.extend(element.children);
            }
            Node::Element(element) if element.has_class("downstep") => {}
            node => nodes.push(node),
        }
    }

    if word.contains("nopron") {
        merge_devoiced_small_kana(&mut nodes);
    }

    let mut morae = Vec::<String>::new();
    for node in &nodes {
        match node {
            Node::Text(text) => morae.extend(jpn::morae(text).map(ToOwned::to_owned)),
            Node::Element(element) if element.has_class("nasal") => {
                // a nasal marker annotates the mora before it
                if let Some(last) = morae.last_mut() {
                    last.push_str(&element.to_string());
                } else {
                    debug!("nasal marker with no preceding mora, dropping");
                }
            }
            // devoiced (nopron) span: one opaque mora-equivalent unit
            Node::Element(element) => morae.push(element.to_string()),
        }
    }
    morae
}

/// Rewrites a devoicing span covering only the first character of a combined
/// mora to cover both, e.g. `<span class="nopron">シ</span>ュツ` becomes
/// `<span class="nopron">シュ</span>ツ`.
fn merge_devoiced_small_kana(nodes: &mut Vec<Node>) {
    let mut i = 0;
    while i + 1 < nodes.len() {
        let (left, right) = nodes.split_at_mut(i + 1);
        if let (Node::Element(element), Node::Text(next)) = (&mut left[i], &mut right[0]) {
            let single_char_text = match element.children.as_slice() {
                [Node::Text(text)] => text.chars().count() == 1,
                _ => false,
            };
            if element.has_class("nopron") && single_char_text {
                let small = next
                    .chars()
                    .next()
                    .filter(|&c| matches!(c, 'ュ' | 'ャ' | 'ョ'));
                if let Some(small) = small {
                    if let Some(Node::Text(text)) = element.children.first_mut() {
                        text.push(small);
                    }
                    next.drain(..small.len_utf8());
                    if next.is_empty() {
                        nodes.remove(i + 1);
                    }
                }
            }
        }
        i += 1;
    }
}

/// Derives the mora sequence from the reading under the given display mode.
fn morae_from_reading(reading: &str, mode: u8) -> Result<Vec<String>, RenderError> {
    let display = ReadingDisplay::try_from(mode)?;
    let normalized = match display {
        ReadingDisplay::Reading => reading.to_owned(),
        ReadingDisplay::Katakana => jpn::to_katakana(reading),
        ReadingDisplay::ExtendedKatakana => jpn::to_extended_katakana(reading),
    };
    let morae = jpn::morae(&normalized)
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    debug!("morae: {normalized} -> {}", morae.iter().join(", "));
    Ok(morae)
}

fn downstep() -> Markup {
    html! {
        span .downstep {
            span .downstep-inner {
                "ꜜ"
            }
        }
    }
}

/// Inserts overline and downstep markup into the mora sequence.
///
/// By pitch notation convention the first mora is never overlined (except
/// for the atamadaka `pos == 1` pattern, where only the first mora is). A
/// `pos` beyond the mora count is clamped to it with a warning.
fn accent_span(pos: u64, morae: &[String]) -> Option<String> {
    if morae.is_empty() {
        warn!("reading produced no morae, skipping pitch accent render");
        return None;
    }

    let len = morae.len();
    let pos = usize::try_from(pos).unwrap_or(len);
    let pos = if pos > len {
        warn!("pitch position {pos} exceeds mora count {len}, clamping");
        len
    } else {
        pos
    };

    // a single-mora flat word has no visual distinction
    if pos == 0 && len == 1 {
        return Some(morae[0].clone());
    }

    let markup = if pos == 0 {
        // heiban: high from the second mora onwards, no downstep
        html! {
            (PreEscaped(&morae[0]))
            span .pitchoverline {
                (PreEscaped(morae[1..].concat()))
            }
        }
    } else if pos == 1 {
        // atamadaka: only the first mora is high
        html! {
            span .pitchoverline {
                (PreEscaped(&morae[0]))
            }
            (downstep())
            (PreEscaped(morae[1..].concat()))
        }
    } else {
        html! {
            (PreEscaped(&morae[0]))
            span .pitchoverline {
                (PreEscaped(morae[1..pos].concat()))
            }
            (downstep())
            (PreEscaped(morae[pos..].concat()))
        }
    };
    Some(markup.into_string())
}
