//! Kana script conversion and mora segmentation.

use std::iter;

/// First codepoint of the hiragana block handled by [`to_katakana`] (ぁ).
const HIRAGANA_START: u32 = 0x3041;
/// Last codepoint of the hiragana block handled by [`to_katakana`] (ゖ).
const HIRAGANA_END: u32 = 0x3096;
/// Offset from a hiragana codepoint to its katakana counterpart.
const KATAKANA_OFFSET: u32 = 0x30a1 - 0x3041;

/// Checks if the given character lies in the katakana block (U+30A0..U+30FF).
///
/// Note that the block also contains `ー` and the `・` separator.
#[must_use]
pub const fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30a0}'..='\u{30ff}')
}

/// Checks if the given character is a small kana which combines with the
/// preceding character into a single [mora], for example the `ょ` of `しょ`.
///
/// Other small kana (`っ`, `ぁ`-row) count as their own mora and return
/// `false`.
///
/// [mora]: https://en.wikipedia.org/wiki/Mora_(linguistics)
#[must_use]
pub const fn is_combining_small_kana(c: char) -> bool {
    matches!(c, 'ゃ' | 'ゅ' | 'ょ' | 'ャ' | 'ュ' | 'ョ')
}

/// Converts every hiragana character in `text` to its katakana counterpart.
///
/// Characters outside the hiragana block, including katakana, punctuation and
/// embedded markup, pass through unchanged. Idempotent.
#[must_use]
pub fn to_katakana(text: &str) -> String {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (HIRAGANA_START..=HIRAGANA_END).contains(&code) {
                char::from_u32(code + KATAKANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Katakana which, when followed by the given vowel, are conventionally
/// pronounced as a lengthening of that vowel.
#[rustfmt::skip]
const fn extended_vowel_family(vowel: char) -> Option<&'static str> {
    Some(match vowel {
        'ア' => "ナタサカワラヤマハャパバダザガ",
        'イ' => "ニチシキリミヒピビヂジギネテセケレメヘペベデゼゲ",
        'ウ' => "ヌツスクルユムフュプブヅズグノトソコヲロヨモホョポボドゾゴ",
        'エ' => "ネテセケレメヘペベデゼゲ",
        'オ' => "ノトソコヲロヨモホョポボドゾゴ",
        _ => return None,
    })
}

/// Converts `text` to katakana, then rewrites vowel sequences which are
/// realized as vowel lengthening into the long vowel mark `ー`.
///
/// For example `とけい` becomes `トケー` rather than `トケイ`.
#[must_use]
pub fn to_extended_katakana(text: &str) -> String {
    let katakana = to_katakana(text);
    let mut result = katakana.chars().collect::<Vec<_>>();
    for i in 1..result.len() {
        if let Some(family) = extended_vowel_family(result[i]) {
            if family.contains(result[i - 1]) {
                result[i] = 'ー';
            }
        }
    }
    result.into_iter().collect()
}

/// Resolves the vowel that a long vowel mark `ー` stands for, given the
/// katakana immediately preceding it.
///
/// The first matching family wins, in source order. The エ row maps to `イ`
/// and the オ row to `ウ`, matching how the AJT pitch accent source spells
/// long vowels. Returns `None` for characters outside every family, such as
/// `ー` itself.
#[rustfmt::skip]
pub(crate) fn long_vowel_replacement(prev: char) -> Option<char> {
    const FAMILIES: [(&str, char); 6] = [
        ("アナタサカワラヤマハャパバダザガ",   'ア'),
        ("イニチシキリミヒピビヂジギ",         'イ'),
        ("ウヌツスクルユムフュプブヅズグ",     'ウ'),
        ("エネテセケレメヘペベデゼゲ",         'イ'),
        ("ノトソコヲロヨモホョポボドゾゴ",     'ウ'),
        ("オ",                                 'オ'),
    ];

    FAMILIES
        .iter()
        .find(|(family, _)| family.contains(prev))
        .map(|&(_, vowel)| vowel)
}

/// Splits a reading (either hiragana or katakana) into its constituent
/// [morae].
///
/// Rules:
/// - kana followed by a combining small kana is a single mora, for example
///   `ひょ`, `じゅ`;
/// - every other character, including `っ` and `ー`, is its own mora.
///
/// Segmentation is lossless: concatenating the yielded morae reproduces
/// `reading` exactly.
///
/// [morae]: https://en.wikipedia.org/wiki/Mora_(linguistics)
pub fn morae(reading: &str) -> impl Iterator<Item = &str> {
    let mut chars = reading.char_indices().peekable();
    iter::from_fn(move || {
        let (byte_index, char) = chars.next()?;
        if let Some((next_byte_index, next_char)) = chars.peek().copied() {
            if is_combining_small_kana(next_char) {
                _ = chars.next();
                let end = next_byte_index + next_char.len_utf8();
                return Some(&reading[byte_index..end]);
            }
        }

        let end = byte_index + char.len_utf8();
        Some(&reading[byte_index..end])
    })
}
