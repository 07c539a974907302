// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2

use blockpad_syntax::LanguageTable;

#[allow(dead_code)]
pub const LANGUAGES: &[&str] = &["text", "json", "python", "sql", "markdown"];

#[allow(dead_code)]
pub fn languages() -> LanguageTable {
    LanguageTable::from_tokens(LANGUAGES).unwrap()
}

/// A buffer of `blocks` blocks cycling through the benchmark languages.
#[allow(dead_code)]
pub fn generate_blocks(blocks: usize) -> String {
    let mut content = String::new();
    for i in 0..blocks {
        match i % 4 {
            0 => content.push_str(&format!(
                "\n∞∞∞text;created=2025-01-02T03:04:05.000Z\nNote {i}\nSome text with a few words.\n"
            )),
            1 => content.push_str(&format!(
                "\n∞∞∞json-a\n{{\"id\": {i}, \"tags\": [\"a\", \"b\"], \"fake\": \"\\n∞∞∞text\\n\"}}"
            )),
            2 => content.push_str(&format!(
                "\n∞∞∞python\ndef f{i}(x):\n    return x * {i}\n"
            )),
            _ => content.push_str(&format!("\n∞∞∞sql;owner=bench\nSELECT {i};")),
        }
    }
    content
}
