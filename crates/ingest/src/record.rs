use serde::{Deserialize, Serialize};

/// One pharmacopeia entry produced by the segmenter.
///
/// `name` is the unique key the rest of the pipeline uses for
/// resumability, so it must never change once a record is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerbRecord {
    pub name: String,
    pub pinyin: String,
    pub latin: String,
    pub content: String,
}

impl HerbRecord {
    pub fn new(name: String, pinyin: String, latin: String) -> Self {
        // The heading block itself is part of the entry text.
        let content = format!("{}\n{}\n{}\n", name, pinyin, latin);
        Self {
            name,
            pinyin,
            latin,
            content,
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
    }
}
