//! Handling of the AJT pitch accent field.
//!
//! The AJT plugin fills a field with annotated markup, one entry per
//! homograph reading, separated by `・`:
//!
//! ```text
//! <span class="pitchoverline">ハ</span><span class="downstep">ꜜ</span>シ・ハシ<span class="pitchoverline">…</span>
//! ```
//!
//! Entries mark accented spans (`pitchoverline`), downsteps (`downstep`),
//! nasal consonants (`nasal`) and devoiced morae (`nopron`). Before the
//! field can be searched or compared against a card's reading it has to be
//! normalized: see [`normalize`].

use itertools::Itertools as _;
use tracing::{debug, error};

use crate::{jpn, markup};

/// か-row kana whose nasal pronunciation the AJT source marks with a `°`.
const NASAL_UNMARKED: [char; 5] = ['カ', 'キ', 'ク', 'ケ', 'コ'];
/// Nasal (voiced) counterparts of [`NASAL_UNMARKED`], in the same order.
const NASAL_MARKED: [char; 5] = ['ガ', 'ギ', 'グ', 'ゲ', 'ゴ'];

/// Normalizes raw AJT field markup for searching and comparison.
///
/// In order:
/// 1. removes the downstep glyph `ꜜ`, and its numeric character reference -
///    both exist purely for edit-view legibility;
/// 2. replaces each `<kana><span class="nasal">°</span>` with the
///    corresponding nasal kana (カ→ガ row). No nasal markers may remain
///    afterwards; if any do, the upstream blob is malformed and an error
///    diagnostic is logged;
/// 3. collapses each long vowel mark `ー` into the vowel it stands for,
///    derived from the preceding katakana's vowel family. An unresolvable
///    mark is left in place with a debug diagnostic.
///
/// Idempotent on already-normalized markup.
#[must_use]
pub fn normalize(blob: &str) -> String {
    let mut result = blob
        .replace("&#42780;", "")
        .replace("&#42780", "")
        .replace('ꜜ', "");

    if result.contains("nasal") {
        for (unmarked, marked) in NASAL_UNMARKED.iter().zip(NASAL_MARKED) {
            let pattern = format!(r#"{unmarked}<span class="nasal">°</span>"#);
            result = result.replace(&pattern, &marked.to_string());
        }
        if result.contains("nasal") {
            error!("nasal markers remain after normalization, malformed word pitch markup");
        }
    }

    let mut chars = result.chars().collect::<Vec<_>>();
    let mut prev = None;
    for i in 0..chars.len() {
        let c = chars[i];
        if !jpn::is_katakana(c) {
            continue;
        }

        if c == 'ー' {
            if let Some(prev) = prev {
                match jpn::long_vowel_replacement(prev) {
                    Some(vowel) => chars[i] = vowel,
                    None => debug!("cannot resolve long vowel mark after {prev}"),
                }
            }
        }
        // later marks see the pre-replacement character
        prev = Some(c);
    }
    chars.into_iter().collect()
}

/// Locates the entry of the AJT field whose plain text equals the card's
/// reading, returning that entry's raw markup with `<b>` emphasis stripped.
///
/// `reading` may be hiragana; it is converted to katakana to match the AJT
/// script. Matching happens on the normalized plain text, slicing on the raw
/// markup by counting `・` occurrences - the delimiter is assumed never to
/// appear inside an attribute value, which holds for the AJT source's actual
/// output.
///
/// Returns `None` if the field is empty or no entry matches.
#[must_use]
pub fn find_word(blob: &str, reading: &str) -> Option<String> {
    if blob.is_empty() {
        debug!("AJT word: empty field");
        return None;
    }

    let reading = jpn::to_katakana(reading);
    let normalized = normalize(blob);
    let plain = markup::plain_text(&markup::parse(&normalized));
    let candidates = plain.split('・').collect::<Vec<_>>();
    let Some(index) = candidates.iter().position(|&word| word == reading) else {
        debug!(
            "AJT word: {reading} not found among [{}]",
            candidates.iter().join(", ")
        );
        return None;
    };

    if candidates.len() == 1 {
        return Some(blob.to_owned());
    }

    // slice the matching entry back out of the raw markup
    let mut start = 0;
    let mut end = blob.len();
    let mut seen = 0usize;
    for (byte_index, c) in blob.char_indices() {
        if c != '・' {
            continue;
        }

        seen += 1;
        if seen == index {
            start = byte_index + c.len_utf8();
        } else if seen == index + 1 {
            end = byte_index;
            break;
        }
    }

    // bold marks the preferred entry upstream; it carries no accent info
    let word = blob[start..end].replace("<b>", "").replace("</b>", "");
    Some(word)
}
