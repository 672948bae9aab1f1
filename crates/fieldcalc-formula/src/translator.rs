//! Name translation between the display and source naming schemes
//!
//! Translation is a text-to-text transform that never parses, so it also
//! works on incomplete formulas typed into an editor. Identifiers are matched
//! as whole tokens and keys are tried longest first, so `年龄段` is never
//! rewritten through a shorter key `年龄`.
//!
//! Three kinds of token are left untouched: text inside string literals
//! (unless enabled), a token directly followed by `(` (a function name), and
//! a member segment after `.` in a dotted path.

use ahash::AHashMap;
use fieldcalc_core::FieldCatalog;

/// One-directional identifier mapping
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    entries: AHashMap<String, String>,
    /// Keys ordered longest first
    keys: Vec<Vec<char>>,
}

impl NameMapping {
    /// Build a mapping from `(from, to)` pairs
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: AHashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        let mut keys: Vec<Vec<char>> = entries.keys().map(|k| k.chars().collect()).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self { entries, keys }
    }

    /// Display name to source name
    pub fn display_to_source(catalog: &FieldCatalog) -> Self {
        Self::new(
            catalog
                .iter()
                .map(|f| (f.display_name.as_str(), f.source_name.as_str())),
        )
    }

    /// Source name to display name
    pub fn source_to_display(catalog: &FieldCatalog) -> Self {
        Self::new(
            catalog
                .iter()
                .map(|f| (f.source_name.as_str(), f.display_name.as_str())),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite every whole-token occurrence of a key
    pub fn translate(&self, text: &str, translate_string_literals: bool) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if !translate_string_literals && (c == '"' || c == '\'') {
                let end = literal_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }

            if is_word_char(c) {
                let is_member = i > 0 && chars[i - 1] == '.';
                if !is_member {
                    if let Some((len, replacement)) = self.match_at(&chars, i) {
                        out.push_str(replacement);
                        i += len;
                        continue;
                    }
                }
                // No key here: copy the whole word so no key matches inside it
                let end = word_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }

            out.push(c);
            i += 1;
        }

        out
    }

    /// Longest key matching as a whole token at `start`
    fn match_at(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        let rest = &chars[start..];
        self.keys.iter().find_map(|key| {
            if !rest.starts_with(key) {
                return None;
            }
            let after = &rest[key.len()..];
            if after.first().map_or(false, |&c| is_word_char(c)) || followed_by_paren(after) {
                return None;
            }
            let key: String = key.iter().collect();
            self.entries.get(&key).map(|to| (key.chars().count(), to.as_str()))
        })
    }
}

/// Bidirectional translator built from a field catalog
#[derive(Debug, Clone, Default)]
pub struct Translator {
    to_source: NameMapping,
    to_display: NameMapping,
    translate_string_literals: bool,
}

impl Translator {
    pub fn from_catalog(catalog: &FieldCatalog) -> Self {
        Self {
            to_source: NameMapping::display_to_source(catalog),
            to_display: NameMapping::source_to_display(catalog),
            translate_string_literals: false,
        }
    }

    /// Also rewrite names inside quoted literals
    pub fn with_string_literals(mut self, enabled: bool) -> Self {
        self.translate_string_literals = enabled;
        self
    }

    /// Display scheme to source scheme
    pub fn to_source(&self, text: &str) -> String {
        self.to_source.translate(text, self.translate_string_literals)
    }

    /// Source scheme to display scheme
    pub fn to_display(&self, text: &str) -> String {
        self.to_display.translate(text, self.translate_string_literals)
    }

    pub fn display_to_source(&self) -> &NameMapping {
        &self.to_source
    }

    pub fn source_to_display(&self) -> &NameMapping {
        &self.to_display
    }
}

/// Translate display names to source names
pub fn to_source(text: &str, display_to_source: &NameMapping) -> String {
    display_to_source.translate(text, false)
}

/// Translate source names to display names
pub fn to_display(text: &str, source_to_display: &NameMapping) -> String {
    source_to_display.translate(text, false)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| !is_word_char(c))
        .map_or(chars.len(), |n| start + n)
}

fn followed_by_paren(chars: &[char]) -> bool {
    chars.iter().find(|c| !c.is_whitespace()) == Some(&'(')
}

/// Index just past the literal opening at `start`, or the end of input
fn literal_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut j = start + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcalc_core::{FieldDescriptor, FieldType};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn translator() -> Translator {
        let catalog = FieldCatalog::from_fields([
            FieldDescriptor::new("年龄", "age", FieldType::Number),
            FieldDescriptor::new("年龄段", "ageGroup", FieldType::Text),
            FieldDescriptor::new("名字", "name", FieldType::Text),
            FieldDescriptor::new("用户", "user", FieldType::Text),
        ])
        .unwrap();
        Translator::from_catalog(&catalog)
    }

    #[test]
    fn test_whole_token_longest_first() {
        let t = translator();
        assert_eq!(
            t.to_source("IF(GT(年龄, 18), 年龄段, 名字)"),
            "IF(GT(age, 18), ageGroup, name)"
        );
        // Not a token on its own
        assert_eq!(t.to_source("ADD(年龄2, 1)"), "ADD(年龄2, 1)");
    }

    #[test]
    fn test_to_display() {
        let t = translator();
        assert_eq!(
            t.to_display("CONCATENATE(name, ageGroup, age)"),
            "CONCATENATE(名字, 年龄段, 年龄)"
        );
        assert_eq!(t.to_display("ADD(ages, 1)"), "ADD(ages, 1)");
    }

    #[test]
    fn test_string_literals_untouched_by_default() {
        let t = translator();
        assert_eq!(
            t.to_source(r#"CONCATENATE("年龄: ", 年龄, '名字\'s')"#),
            r#"CONCATENATE("年龄: ", age, '名字\'s')"#
        );
        let t = t.with_string_literals(true);
        assert_eq!(
            t.to_source(r#"CONCATENATE("年龄 ", 年龄)"#),
            r#"CONCATENATE("age ", age)"#
        );
    }

    #[test]
    fn test_function_names_and_members_untouched() {
        let catalog = FieldCatalog::from_fields([
            FieldDescriptor::new("SUM", "total", FieldType::Number),
            FieldDescriptor::new("名字", "name", FieldType::Text),
            FieldDescriptor::new("用户", "user", FieldType::Text),
        ])
        .unwrap();
        let t = Translator::from_catalog(&catalog);
        assert_eq!(t.to_source("SUM(SUM, 1)"), "SUM(total, 1)");
        assert_eq!(t.to_source("SUM (SUM)"), "SUM (total)");
        assert_eq!(t.to_source("LEN(用户.名字)"), "LEN(user.名字)");
    }

    #[test]
    fn test_invalid_text_passes_through() {
        let t = translator();
        assert_eq!(t.to_source("GT(年龄,, \"oops"), "GT(age,, \"oops");
        assert_eq!(t.to_source(""), "");
    }

    #[test]
    fn test_free_functions() {
        let mapping = NameMapping::new([("数值", "count")]);
        assert_eq!(to_source("SUM(数值)", &mapping), "SUM(count)");
        let back = NameMapping::new([("count", "数值")]);
        assert_eq!(to_display("SUM(count)", &back), "SUM(数值)");
        assert_eq!(mapping.get("数值"), Some("count"));
    }

    const DISPLAY: [&str; 6] = ["名字", "年龄", "年龄段", "职业", "创建时间", "数值"];
    const SOURCE: [&str; 6] = ["name", "age", "ageGroup", "occupation", "createTime", "count"];

    proptest! {
        #[test]
        fn round_trip_through_source_scheme(
            tokens in prop::collection::vec((0usize..6, 0usize..4), 0..12)
        ) {
            let seps = [", ", " ", ")", ","];
            let text: String = tokens
                .iter()
                .map(|&(field, sep)| format!("{}{}", DISPLAY[field], seps[sep]))
                .collect();

            let forward = NameMapping::new(DISPLAY.iter().copied().zip(SOURCE.iter().copied()));
            let backward = NameMapping::new(SOURCE.iter().copied().zip(DISPLAY.iter().copied()));

            let source = to_source(&text, &forward);
            prop_assert_eq!(to_display(&source, &backward), text);
        }
    }
}
