#![expect(missing_docs, reason = "example")]

use anyhow::{Context as _, Result};
use pitchnote::{CardFields, NOT_AVAILABLE, RenderOptions, WordPitch, render_word_pitch};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let options = serde_json::from_str::<RenderOptions>(
        r#"{
            "reading-display-mode": 2,
            "search-for-ajt-word": true
        }"#,
    )
    .context("failed to parse options")?;

    let cards = [
        CardFields {
            reading: "さくら",
            pa_positions: r#"<div class="pa-positions__group" data-details="NHK"><div class="pa-positions__dictionary">NHK</div><ol><li><span style="display: inline;"><span>[</span><span>2</span><span>]</span></span></li></ol></div>"#,
            ..CardFields::default()
        },
        CardFields {
            reading: "しんしゅつきぼつ",
            pa_override: "0",
            ajt_word_pitch: r#"シ<span class="pitchoverline">ン<span class="nopron">シ</span>ュツキボツ</span>"#,
            ..CardFields::default()
        },
        CardFields {
            reading: "ねこ",
            ..CardFields::default()
        },
    ];

    for fields in cards {
        let html = match render_word_pitch(&fields, &options)? {
            WordPitch::Markup { html, source } => {
                println!("# {} (from {source})", fields.reading);
                html
            }
            WordPitch::NotAvailable => {
                println!("# {}", fields.reading);
                NOT_AVAILABLE.to_owned()
            }
            WordPitch::Skipped => continue,
        };
        println!("{html}\n");
    }
    Ok(())
}
