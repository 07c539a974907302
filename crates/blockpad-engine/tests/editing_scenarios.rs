use blockpad_config::Config;
use blockpad_engine::segment::{Segmenter, StringSegmenter};
use blockpad_engine::{Cmd, Document, FixedClock, NoteFile, Selection};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn document(text: &str) -> Document {
    Document::from_text(text, &Config::default())
        .unwrap()
        .with_clock(FixedClock(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()))
}

fn assert_consistent(doc: &Document) {
    let text = doc.text();
    let list = doc.block_list();
    assert!(
        list.is_well_formed(doc.len()),
        "malformed block list {list:?} for {text:?}"
    );
    let selection = doc.selection();
    assert!(selection.anchor <= doc.len() && selection.head <= doc.len());

    let string = StringSegmenter::new(doc.languages()).unwrap();
    assert_eq!(
        &string.segment(&text, &doc.settings().default_language),
        list,
        "segmenters disagree on {text:?}"
    );
}

fn starts_with_delimiter(doc: &Document) -> bool {
    !doc.blocks()[0].is_implicit()
}

fn type_text(doc: &mut Document, text: &str) {
    for ch in text.chars() {
        let at = doc.selection().head;
        doc.apply(Cmd::InsertText {
            at,
            text: ch.to_string(),
        })
        .unwrap();
        assert_consistent(doc);
    }
}

#[test]
fn scratch_session() {
    let mut doc = document("\n∞∞∞text-a\n");
    type_text(&mut doc, "shopping\n- eggs");
    assert_eq!(
        doc.text(),
        "\n∞∞∞text-a;created=2025-01-02T03:04:05.000Z\nshopping\n- eggs"
    );

    doc.apply(Cmd::AddBlockAfterCurrent).unwrap();
    type_text(&mut doc, "SELECT 1;");
    doc.apply(Cmd::ChangeLanguage {
        token: "sql".to_string(),
        auto: false,
    })
    .unwrap();
    assert_consistent(&doc);

    let blocks = doc.blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].language, "sql");
    assert!(!blocks[1].auto);
    assert_eq!(doc.block_content(1).as_deref(), Some("SELECT 1;"));

    // Select the sql block, then everything
    doc.apply(Cmd::SelectAll).unwrap();
    assert_eq!(doc.selection().range(), doc.blocks()[1].content.clone());
    doc.apply(Cmd::SelectAll).unwrap();
    assert_eq!(doc.selection(), Selection::new(0, doc.len()));

    while doc.undo().is_some() {
        assert_consistent(&doc);
    }
    assert_eq!(doc.text(), "\n∞∞∞text-a\n");
}

#[test]
fn note_file_round_trip_through_document() {
    let input = "{\"formatVersion\":\"1.0.0\",\"name\":\"Scratch\"}\n\n∞∞∞text\nA\n∞∞∞json-a\n{\"k\": \"\\n∞∞∞text\\n\"}";
    let file = NoteFile::parse(input);
    let doc = document(&file.text);

    assert_eq!(doc.blocks().len(), 2);
    assert_eq!(doc.blocks()[1].language, "json");
    assert_eq!(doc.to_bytes(), file.text.as_bytes());

    let saved = NoteFile::new(file.metadata.clone(), doc.text());
    assert_eq!(saved.to_string(), input);
}

#[test]
fn typing_a_json_quote_keeps_later_blocks() {
    let mut doc = document("\n∞∞∞json\n{\n∞∞∞text\nshe said \"hi\"");
    doc.set_selection(Selection::caret(16));

    type_text(&mut doc, "\"k\": \"v\"}");
    assert_eq!(doc.blocks().len(), 2);
    assert_eq!(doc.block_content(0).as_deref(), Some("{\"k\": \"v\"}"));
    assert_eq!(doc.block_content(1).as_deref(), Some("she said \"hi\""));
}

/// Minimal linear congruential generator, deterministic across platforms.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n.max(1) as u64) as usize
    }
}

fn boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn random_command(rng: &mut Lcg, doc: &Document) -> Cmd {
    const SNIPPETS: &[&str] = &[
        "x",
        "∞",
        "word ",
        "\n",
        "\n\n",
        "\n∞∞∞text\n",
        "\n∞∞∞json\n",
        "é",
        "\"",
        "{\"k\": 1}",
    ];
    let text = doc.text();
    let pos = boundary(&text, rng.below(text.len() + 1));
    let end = boundary(&text, pos + rng.below(12));

    match rng.below(20) {
        0..=4 => Cmd::InsertText {
            at: pos,
            text: SNIPPETS[rng.below(SNIPPETS.len())].to_string(),
        },
        5 => Cmd::DeleteRange { range: pos..end },
        6 => Cmd::ReplaceRange {
            range: pos..end,
            text: "y".to_string(),
        },
        7 => Cmd::CursorCharLeft,
        8 => Cmd::SelectCharRight,
        9 => Cmd::CursorLineUp,
        10 => Cmd::CursorLineDown,
        11 => Cmd::GotoNextParagraph,
        12 => Cmd::SelectPreviousBlock,
        13 => [Cmd::AddBlockAfterCurrent, Cmd::AddBlockBeforeCurrent][rng.below(2)].clone(),
        14 => Cmd::MoveLineUp,
        15 => Cmd::MoveLineDown,
        16 => Cmd::DeleteLine,
        17 => Cmd::SelectAll,
        18 => Cmd::ChangeLanguage {
            token: ["text", "python", "sql", "json"][rng.below(4)].to_string(),
            auto: rng.below(2) == 0,
        },
        _ => Cmd::ReplaceAll {
            ranges: vec![pos..end],
            text: String::new(),
        },
    }
}

/// Commands that may rewrite delimiters or select the whole document.
/// `SelectAll` escalates to a whole-document selection on repeat.
fn is_structural(cmd: &Cmd) -> bool {
    matches!(
        cmd,
        Cmd::SelectAll
            | Cmd::AddBlockAfterCurrent
            | Cmd::AddBlockBeforeCurrent
            | Cmd::AddBlockAtEnd
            | Cmd::AddBlockAtStart
            | Cmd::MoveLineUp
            | Cmd::MoveLineDown
            | Cmd::ChangeLanguage { .. }
    )
}

#[test]
fn random_edits_keep_structure_and_undo_to_start() {
    let initial = "\n∞∞∞text\nfirst line\nsecond\n\n∞∞∞python-a\nprint(1)\n";
    let mut doc = document(initial);
    let mut rng = Lcg(0xb10c);

    for step in 0..400 {
        let cmd = random_command(&mut rng, &doc);
        let had_delimiter = starts_with_delimiter(&doc);
        doc.apply(cmd.clone())
            .unwrap_or_else(|err| panic!("step {step}: {cmd:?} failed: {err}"));
        assert_consistent(&doc);

        if !is_structural(&cmd) {
            let first_delimiter_end = doc.block_list().first_delimiter_end;
            assert!(
                doc.selection().from() >= first_delimiter_end,
                "step {step}: {cmd:?} left {:?} inside the first delimiter of {:?}",
                doc.selection(),
                doc.text()
            );
            if had_delimiter {
                assert!(
                    starts_with_delimiter(&doc),
                    "step {step}: {cmd:?} broke the first delimiter: {:?}",
                    doc.text()
                );
            }
        }

        if rng.below(10) == 0 {
            doc.undo();
            assert_consistent(&doc);
        }
    }

    while doc.undo().is_some() {
        assert_consistent(&doc);
    }
    assert_eq!(doc.text(), initial);
}
