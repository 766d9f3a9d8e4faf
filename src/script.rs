//! Script parsing
//!
//! A script is plain text, one utterance per line. A line starting with `#`
//! switches the active speaker for every following line:
//!
//! ```text
//! # ずんだもん:ノーマル
//! こんにちは。
//!
//! # 四国めたん:ノーマル
//! こんにちは、ずんだもん。
//! ```
//!
//! Parsing never fails. Unknown or empty speaker names are carried through
//! and rejected later, when the speaker registry resolves them.

use log::info;

/// Speaker used for lines before the first directive
pub const DEFAULT_SPEAKER: &str = "ずんだもん:ノーマル";

/// Marker that starts a speaker directive line
const DIRECTIVE_MARKER: char = '#';

/// One line of script text bound to its speaker and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Position among produced utterances, starting at 0
    pub sequence_index: usize,
    /// Trimmed line text, never empty
    pub text: String,
    /// Speaker in `"displayName:styleName"` form
    pub speaker_name: String,
}

/// Sequential parser tracking the active speaker
pub struct ScriptParser {
    default_speaker: String,
}

impl ScriptParser {
    /// Create a parser starting from [`DEFAULT_SPEAKER`]
    pub fn new() -> Self {
        Self::with_default_speaker(DEFAULT_SPEAKER)
    }

    /// Create a parser starting from another speaker
    pub fn with_default_speaker(speaker: impl Into<String>) -> Self {
        Self {
            default_speaker: speaker.into(),
        }
    }

    /// Turn script lines into ordered utterances
    pub fn parse<I, S>(&self, lines: I) -> Vec<Utterance>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut speaker = self.default_speaker.clone();
        let mut utterances = Vec::new();

        for line in lines {
            let line = line.as_ref().trim();

            if line.is_empty() {
                continue;
            }

            if let Some(directive) = line.strip_prefix(DIRECTIVE_MARKER) {
                // Only the segment up to a second '#' names the speaker
                let name = directive.split(DIRECTIVE_MARKER).next().unwrap_or("");
                speaker = name.trim().to_string();
                continue;
            }

            utterances.push(Utterance {
                sequence_index: utterances.len(),
                text: line.to_string(),
                speaker_name: speaker.clone(),
            });
        }

        info!("{} utterances detected", utterances.len());
        utterances
    }

    /// Parse a whole script held in memory
    ///
    /// Accepts `\n`, `\r\n` and bare `\r` line endings.
    pub fn parse_str(&self, script: &str) -> Vec<Utterance> {
        // A "\r\n" pair yields an extra blank line, which is skipped anyway
        self.parse(script.split(['\r', '\n']))
    }
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_speaker_before_first_directive() {
        let utterances = ScriptParser::new().parse(["Hello."]);
        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].speaker_name, DEFAULT_SPEAKER);
        assert_eq!(utterances[0].sequence_index, 0);
    }

    #[test]
    fn test_directive_switches_speaker() {
        let lines = ["# Alice:Normal", "Hello.", "", "# Bob:Normal", "Hi there."];
        let utterances = ScriptParser::new().parse(lines);

        assert_eq!(
            utterances,
            vec![
                Utterance {
                    sequence_index: 0,
                    text: "Hello.".into(),
                    speaker_name: "Alice:Normal".into(),
                },
                Utterance {
                    sequence_index: 1,
                    text: "Hi there.".into(),
                    speaker_name: "Bob:Normal".into(),
                },
            ]
        );
    }

    #[test]
    fn test_lines_are_trimmed() {
        let utterances = ScriptParser::new().parse(["   #   Alice:Normal  ", "\t  spaced out \r"]);
        assert_eq!(utterances[0].text, "spaced out");
        assert_eq!(utterances[0].speaker_name, "Alice:Normal");
    }

    #[test]
    fn test_empty_directive_gives_empty_speaker() {
        let utterances = ScriptParser::new().parse(["#", "Who am I?"]);
        assert_eq!(utterances[0].speaker_name, "");
    }

    #[test]
    fn test_second_hash_ends_directive() {
        let utterances = ScriptParser::new().parse(["# Alice:Normal # note", "Hi"]);
        assert_eq!(utterances[0].speaker_name, "Alice:Normal");
    }

    #[test]
    fn test_only_directives_and_blanks() {
        let utterances = ScriptParser::new().parse(["", "# Alice:Normal", "   ", "#Bob:Normal"]);
        assert!(utterances.is_empty());
    }

    #[test]
    fn test_bare_carriage_return_line_endings() {
        let utterances = ScriptParser::new().parse_str("# Alice:Normal\rHello.\rBye.\r");
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].text, "Hello.");
        assert_eq!(utterances[1].text, "Bye.");
        assert!(utterances.iter().all(|u| u.speaker_name == "Alice:Normal"));
        assert_eq!(utterances[1].sequence_index, 1);
    }

    #[test]
    fn test_custom_default_speaker() {
        let parser = ScriptParser::with_default_speaker("Carol:Whisper");
        let utterances = parser.parse_str("one\ntwo\n");
        assert_eq!(utterances.len(), 2);
        assert!(utterances.iter().all(|u| u.speaker_name == "Carol:Whisper"));
    }
}
