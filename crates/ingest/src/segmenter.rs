use regex::Regex;
use tracing::debug;

use crate::record::HerbRecord;

/// Splits the flat pharmacopeia text into per-herb records.
///
/// An entry starts at a three-line heading block: the Chinese drug name,
/// its pinyin transcription, and the botanical latin name, each on its
/// own line. Everything until the next heading block belongs to the
/// current entry; text before the first heading is discarded.
pub struct Segmenter {
    chinese: Regex,
    pinyin: Regex,
    // Uppercase latin plus the Greek block (Μ, μ show up in latin names)
    // and the separators botanical names use.
    latin: Regex,
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            chinese: Regex::new(r"^[一-龥]{2,15}$").unwrap(),
            pinyin: Regex::new(r"^[a-zA-Z\s]{2,50}$").unwrap(),
            latin: Regex::new(r"^[A-Z\sͰ-Ͽ\.,·]{2,100}$").unwrap(),
        }
    }

    fn is_heading(&self, l1: &str, l2: &str, l3: &str) -> bool {
        self.chinese.is_match(l1) && self.pinyin.is_match(l2) && self.latin.is_match(l3)
    }

    pub fn segment(&self, text: &str) -> Vec<HerbRecord> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        let mut herbs = Vec::new();
        let mut current: Option<HerbRecord> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if line.is_empty() {
                i += 1;
                continue;
            }

            // Probe for a heading block at the current position.
            if i + 2 < lines.len() && self.is_heading(lines[i], lines[i + 1], lines[i + 2]) {
                if let Some(done) = current.take() {
                    herbs.push(done);
                }
                debug!(name = lines[i], "found entry heading");
                current = Some(HerbRecord::new(
                    lines[i].to_string(),
                    lines[i + 1].to_string(),
                    lines[i + 2].to_string(),
                ));
                i += 3;
                continue;
            }

            if let Some(herb) = current.as_mut() {
                herb.push_line(line);
            }
            i += 1;
        }

        if let Some(done) = current.take() {
            herbs.push(done);
        }

        herbs
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
2022年版前言，不属于任何条目。

甘草
Gancao
GLYCYRRHIZAE RADIX ET RHIZOMA
【性状】根呈圆柱形。
【功能与主治】补脾益气。

丁香
Dingxiang
CARYOPHYLLI FLOS
【性状】略呈研棒状。
";

    #[test]
    fn splits_on_heading_blocks() {
        let herbs = Segmenter::new().segment(SAMPLE);
        assert_eq!(herbs.len(), 2);
        assert_eq!(herbs[0].name, "甘草");
        assert_eq!(herbs[0].pinyin, "Gancao");
        assert_eq!(herbs[0].latin, "GLYCYRRHIZAE RADIX ET RHIZOMA");
        assert_eq!(herbs[1].name, "丁香");
    }

    #[test]
    fn heading_lines_are_part_of_content() {
        let herbs = Segmenter::new().segment(SAMPLE);
        assert!(herbs[0].content.starts_with("甘草\nGancao\n"));
        assert!(herbs[0].content.contains("【功能与主治】补脾益气。"));
        // Body of the next entry must not bleed backwards.
        assert!(!herbs[0].content.contains("研棒状"));
    }

    #[test]
    fn preamble_before_first_heading_is_dropped() {
        let herbs = Segmenter::new().segment(SAMPLE);
        assert!(!herbs[0].content.contains("前言"));
    }

    #[test]
    fn lowercase_latin_is_not_a_heading() {
        let text = "甘草\nGancao\nglycyrrhizae radix\n正文\n";
        assert!(Segmenter::new().segment(text).is_empty());
    }

    #[test]
    fn greek_letters_allowed_in_latin_line() {
        let text = "某药\nMouyao\nRADIX Μ TEST\n正文\n";
        let herbs = Segmenter::new().segment(text);
        assert_eq!(herbs.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(Segmenter::new().segment("").is_empty());
    }
}
