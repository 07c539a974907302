use anyhow::{Context, Result, bail};
use blockpad_config::Config;
use blockpad_engine::segment::{Segmenter, StringSegmenter};
use blockpad_engine::{Block, Document, NoteFile};
use std::{env, path::PathBuf, process};

const PREVIEW_CHARS: usize = 40;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    let config = Config::load()
        .with_context(|| format!("Failed to load config file {}", config_path.display()))?
        .unwrap_or_default();

    let buffer_path = match args.as_slice() {
        [_, path] => PathBuf::from(path),
        [_] => match config.buffer_path.clone() {
            Some(path) => path,
            None => {
                eprintln!("Error: No buffer file given and none set in config");
                eprintln!("Usage: {} <buffer-file>", args[0]);
                eprintln!("Or set buffer_path in {}", config_path.display());
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [buffer-file]", args[0]);
            process::exit(1);
        }
    };

    log::info!("Reading {}", buffer_path.display());
    let file = NoteFile::read(&buffer_path)?;
    if let Some(name) = file.metadata.as_ref().and_then(|m| m.name.as_deref()) {
        println!("# {name}");
    }

    let doc = Document::from_text(&file.text, &config)?;
    for line in describe_blocks(&doc) {
        println!("{line}");
    }

    check_segmenters(&doc)
}

/// One line per block: index, language tag, creation time and a preview.
fn describe_blocks(doc: &Document) -> Vec<String> {
    doc.blocks()
        .iter()
        .enumerate()
        .map(|(index, block)| describe_block(doc, index, block))
        .collect()
}

fn describe_block(doc: &Document, index: usize, block: &Block) -> String {
    let auto = if block.auto { "-a" } else { "" };
    let created = block
        .created
        .map(|created| created.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    let content = doc.block_content(index).unwrap_or_default();
    format!(
        "{index:>3} {}{auto} {created} {:?} {}",
        block.language,
        block.content,
        preview(&content)
    )
}

fn preview(content: &str) -> String {
    let flat = content.replace('\n', "⏎");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

/// The regex scan must find the same blocks as the syntax tree.
fn check_segmenters(doc: &Document) -> Result<()> {
    let string = StringSegmenter::new(doc.languages())?;
    let scanned = string.segment(&doc.text(), &doc.settings().default_language);
    if scanned != *doc.block_list() {
        bail!(
            "Segmenters disagree: string scan finds {} blocks, syntax tree {}",
            scanned.len(),
            doc.blocks().len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(text: &str) -> Document {
        Document::from_text(text, &Config::default()).unwrap()
    }

    #[test]
    fn test_describe_blocks() {
        let doc = document("\n∞∞∞text\nhello\nworld\n∞∞∞sql-a;created=2025-01-02T03:04:05.000Z\nSELECT 1;");
        assert_eq!(
            describe_blocks(&doc),
            vec![
                "  0 text - 15..26 hello⏎world".to_string(),
                "  1 sql-a 2025-01-02T03:04:05+00:00 75..84 SELECT 1;".to_string(),
            ]
        );
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(PREVIEW_CHARS + 5);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn test_check_segmenters() {
        assert!(check_segmenters(&document("lead\n∞∞∞python\nx\n∞∞∞text\ny")).is_ok());
        // A quote left open in a JSON block ends at its line
        assert!(check_segmenters(&document("\n∞∞∞json\n{\"\n∞∞∞text\nshe said \"hi\"")).is_ok());
    }
}
