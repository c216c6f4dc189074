//! Resource usages inside command lines.
//!
//! Commands show up in `.mcfunction` files and as strings inside animation
//! and animation controller JSON, so lines are scanned as plain text without
//! regard for any surrounding structure.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;

use crate::document::{DocRange, Rangeable, TextDocument};
use crate::resource::{DataKind, ResourceType};

const IDENTIFIER: &str = r"[a-z0-9_.\-]+";
const FILE_LOCATION: &str = r"([\w.\-/]+)";
const ANIMATION: &str = r"(animation\.[\w.\-]+)";
const SELECTOR: &str = r"@(?:initiator|[a-z])(?:\[[^\]]*\])?";

static RESOURCE_ID: Lazy<String> = Lazy::new(|| format!("((?:{IDENTIFIER}):?(?:{IDENTIFIER})*)"));

static RESOURCE_ID_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", *RESOURCE_ID)).unwrap());

static SELECTOR_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(?:initiator|[a-z])\[").unwrap());

/// What a usage points at: a resource, or auxiliary data of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UsageTarget {
    Resource(ResourceType),
    Data(DataKind),
}

struct Command {
    target: UsageTarget,
    patterns: Vec<Regex>,
    /// Whether the usage gets a document link, or is only completed.
    link: bool,
}

fn command(target: UsageTarget, patterns: &[String], link: bool) -> Command {
    Command {
        target,
        patterns: patterns
            .iter()
            .map(|pattern| Regex::new(pattern).unwrap())
            .collect(),
        link,
    }
}

static COMMANDS: Lazy<Vec<Command>> = Lazy::new(|| {
    let resource_id = RESOURCE_ID.as_str();
    vec![
        command(
            UsageTarget::Resource(ResourceType::McFunction),
            &[format!("function {FILE_LOCATION}")],
            true,
        ),
        command(
            UsageTarget::Resource(ResourceType::Particle),
            &[format!("particle {resource_id}")],
            true,
        ),
        command(
            UsageTarget::Data(DataKind::ServerEntityEvents),
            &[format!("event entity {SELECTOR} {resource_id}")],
            true,
        ),
        command(
            UsageTarget::Resource(ResourceType::ServerEntity),
            &[format!("summon {resource_id}")],
            true,
        ),
        command(
            UsageTarget::Resource(ResourceType::Animation),
            &[format!("playanimation {SELECTOR} {ANIMATION}")],
            true,
        ),
        command(
            UsageTarget::Resource(ResourceType::Dialogue),
            &[
                format!("dialogue open {SELECTOR} {SELECTOR} ({IDENTIFIER})"),
                format!("dialogue change {SELECTOR} ({IDENTIFIER})"),
            ],
            true,
        ),
        command(
            UsageTarget::Resource(ResourceType::SoundEffect),
            &[
                format!("playsound {resource_id}"),
                format!("stopsound {SELECTOR} {resource_id}"),
            ],
            false,
        ),
    ]
});

/// Selector arguments whose value is a resource reference.
const SELECTOR_ARGUMENTS: &[(&str, UsageTarget, bool)] = &[(
    "type",
    UsageTarget::Resource(ResourceType::ServerEntity),
    false,
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub range: DocRange,
    pub link: bool,
}

impl Rangeable for LineInfo {
    fn range(&self) -> &DocRange {
        &self.range
    }
}

/// Identifier → every place it is used.
pub type UsageData = BTreeMap<String, Vec<LineInfo>>;

pub type Usages = BTreeMap<UsageTarget, UsageData>;

/// A single usage, as found under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub target: UsageTarget,
    pub identifier: String,
    pub range: DocRange,
    pub link: bool,
}

impl Usage {
    /// The usage as typed so far: the range ends at the cursor and the
    /// identifier is cut to match.
    pub fn truncated_at(&self, position: Position) -> Usage {
        let range = self.range.truncated_at(position);
        let typed = range.end.character.saturating_sub(range.start.character) as usize;

        Usage {
            identifier: self.identifier.chars().take(typed).collect(),
            range,
            ..self.clone()
        }
    }
}

/// Usages found on one line.
#[derive(Debug, Default)]
pub struct LineParser {
    line: u32,
    usages: Usages,
}

impl LineParser {
    pub fn parse(line: u32, text: &str) -> LineParser {
        let mut parser = LineParser {
            line,
            usages: Usages::new(),
        };

        if !is_comment(text) {
            parser.extract_commands(text);
            parser.extract_selectors(text);
        }

        parser
    }

    pub fn usages(&self) -> &Usages {
        &self.usages
    }

    pub fn into_usages(self) -> Usages {
        self.usages
    }

    /// The usage whose range contains `position`, end inclusive.
    pub fn usage_at(&self, position: Position) -> Option<Usage> {
        self.usages.iter().find_map(|(target, data)| {
            data.iter().find_map(|(identifier, infos)| {
                infos
                    .iter()
                    .find(|info| info.includes_position(position))
                    .map(|info| Usage {
                        target: *target,
                        identifier: identifier.clone(),
                        range: info.range,
                        link: info.link,
                    })
            })
        })
    }

    fn push(&mut self, target: UsageTarget, identifier: &str, range: DocRange, link: bool) {
        self.usages
            .entry(target)
            .or_default()
            .entry(identifier.to_string())
            .or_default()
            .push(LineInfo { range, link });
    }

    fn extract_commands(&mut self, text: &str) {
        for command in COMMANDS.iter() {
            for pattern in &command.patterns {
                for captures in pattern.captures_iter(text) {
                    let Some(id) = captures.get(1) else {
                        continue;
                    };
                    // `function namespace:path` is a java edition call
                    if command.target == UsageTarget::Resource(ResourceType::McFunction)
                        && text[id.end()..].starts_with(':')
                    {
                        continue;
                    }

                    let start = column(text, id.start());
                    let end = start + id.as_str().chars().count() as u32;
                    let range = DocRange::on_line(self.line, start, end);
                    self.push(command.target, id.as_str(), range, command.link);
                }
            }
        }
    }

    fn extract_selectors(&mut self, text: &str) {
        for start in SELECTOR_START.find_iter(text) {
            let arguments = &text[start.end()..];
            let arguments = &arguments[..selector_end(arguments)];
            let arguments = arguments.strip_suffix('"').unwrap_or(arguments);

            for argument in selector_arguments(arguments) {
                let Some((_, target, link)) = SELECTOR_ARGUMENTS
                    .iter()
                    .find(|(key, _, _)| *key == argument.key)
                else {
                    continue;
                };
                if !argument.value.is_empty() && !RESOURCE_ID_EXACT.is_match(argument.value) {
                    continue;
                }

                let begin = column(text, start.end() + argument.value_start);
                let end = begin + argument.value.chars().count() as u32;
                let range = DocRange::on_line(self.line, begin, end);
                self.push(*target, argument.value, range, *link);
            }
        }
    }
}

fn is_comment(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with('#') || text.starts_with("//") || text.starts_with('*')
}

fn column(text: &str, byte: usize) -> u32 {
    text[..byte].chars().count() as u32
}

/// Byte length of a selector's argument list: up to the `]` closing it, or the end of the line.
fn selector_end(arguments: &str) -> usize {
    let mut depth = 0usize;
    for (index, character) in arguments.char_indices() {
        match character {
            '[' | '{' => depth += 1,
            ']' if depth == 0 => return index,
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    arguments.len()
}

/// One `key=value` pair of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorArgument<'a> {
    pub key: &'a str,
    /// Trimmed, without a leading `!`.
    pub value: &'a str,
    /// Byte offset of `value` in the argument list.
    pub value_start: usize,
}

/// Splits a selector's argument list on top level commas.
///
/// Bracketed values such as `scores={a=1,b=2}` or `hasitem=[{...},{...}]` are
/// kept whole.
pub fn selector_arguments(input: &str) -> Vec<SelectorArgument<'_>> {
    let bytes = input.as_bytes();
    let mut arguments = Vec::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let key_start = cursor;
        while cursor < bytes.len() && bytes[cursor] != b'=' && bytes[cursor] != b',' {
            cursor += 1;
        }
        let key = input[key_start..cursor].trim();
        if cursor >= bytes.len() || bytes[cursor] == b',' {
            // a key still being typed, or a bare flag
            cursor += 1;
            continue;
        }
        cursor += 1;

        let value_start = cursor;
        let mut stack: Vec<u8> = Vec::new();
        while cursor < bytes.len() {
            match bytes[cursor] {
                b'{' => stack.push(b'}'),
                b'[' => stack.push(b']'),
                close @ (b'}' | b']') if stack.last() == Some(&close) => {
                    stack.pop();
                }
                b',' if stack.is_empty() => break,
                _ => {}
            }
            cursor += 1;
        }

        let raw = &input[value_start..cursor];
        let leading = raw.len() - raw.trim_start().len();
        let mut value = raw.trim();
        let mut start = value_start + leading;
        if let Some(rest) = value.strip_prefix('!') {
            value = rest;
            start += 1;
        }

        arguments.push(SelectorArgument {
            key,
            value,
            value_start: start,
        });
        cursor += 1;
    }

    arguments
}

/// Every usage in `document`, merged over its lines.
pub fn document_usages(document: &TextDocument) -> Usages {
    let mut usages = Usages::new();

    for line in 0..document.line_count() {
        let Some(text) = document.line(line) else {
            continue;
        };
        for (target, data) in LineParser::parse(line as u32, &text).into_usages() {
            let merged = usages.entry(target).or_default();
            for (identifier, mut infos) in data {
                merged.entry(identifier).or_default().append(&mut infos);
            }
        }
    }

    usages
}

/// The usage under the cursor, with its full range.
pub fn usage_at_position(document: &TextDocument, position: Position) -> Option<Usage> {
    let text = document.line(position.line as usize)?;
    LineParser::parse(position.line, &text).usage_at(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Usages {
        LineParser::parse(0, text).into_usages()
    }

    fn identifiers(usages: &Usages, target: UsageTarget) -> Vec<String> {
        usages
            .get(&target)
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default()
    }

    const SERVER_ENTITY: UsageTarget = UsageTarget::Resource(ResourceType::ServerEntity);

    #[test]
    fn summon_range_covers_only_the_identifier() {
        let usages = parse("  summon custom:pig ~ ~ ~");

        let infos = &usages[&SERVER_ENTITY]["custom:pig"];
        assert_eq!(infos[0].range, DocRange::on_line(0, 9, 19));
        assert!(infos[0].link);
    }

    #[test]
    fn commands_inside_other_commands() {
        let usages = parse("execute as @a at @s run particle minecraft:heart_particle ~ ~1 ~");

        assert_eq!(
            identifiers(&usages, UsageTarget::Resource(ResourceType::Particle)),
            vec!["minecraft:heart_particle"]
        );
    }

    #[test]
    fn function_calls() {
        let usages = parse("function mobs/spawn_pig");

        assert_eq!(
            identifiers(&usages, UsageTarget::Resource(ResourceType::McFunction)),
            vec!["mobs/spawn_pig"]
        );
    }

    #[test]
    fn namespaced_function_calls_are_ignored() {
        let usages = parse("function custom:mobs/spawn_pig");

        assert!(identifiers(&usages, UsageTarget::Resource(ResourceType::McFunction)).is_empty());
    }

    #[test]
    fn entity_events() {
        let usages = parse("event entity @e[type=custom:pig] custom:die");

        let events = &usages[&UsageTarget::Data(DataKind::ServerEntityEvents)];
        assert_eq!(events.keys().collect::<Vec<_>>(), vec!["custom:die"]);
        assert_eq!(events["custom:die"][0].range, DocRange::on_line(0, 33, 43));
    }

    #[test]
    fn animations_dialogue_and_sounds() {
        let usages = parse("playanimation @s animation.pig.walk");
        assert_eq!(
            identifiers(&usages, UsageTarget::Resource(ResourceType::Animation)),
            vec!["animation.pig.walk"]
        );

        let usages = parse("dialogue open @e[type=npc] @p intro");
        assert_eq!(
            identifiers(&usages, UsageTarget::Resource(ResourceType::Dialogue)),
            vec!["intro"]
        );

        let usages = parse("dialogue change @e[type=npc] outro");
        assert_eq!(
            identifiers(&usages, UsageTarget::Resource(ResourceType::Dialogue)),
            vec!["outro"]
        );

        let usages = parse("stopsound @a mob.pig.say");
        let sounds = &usages[&UsageTarget::Resource(ResourceType::SoundEffect)];
        assert!(!sounds["mob.pig.say"][0].link);
    }

    /// Test: lines starting with a comment marker produce nothing.
    #[test]
    fn comments_are_skipped() {
        assert!(parse("// summon custom:pig").is_empty());
        assert!(parse("   # summon custom:pig").is_empty());
        assert!(parse(" * summon custom:pig").is_empty());
    }

    /// Test: compound selector values are one argument and `type` is still found.
    #[test]
    fn compound_selector_values() {
        let arguments = selector_arguments("type=custom:pig,scores={foo=1..5,bar=2},tag=x");

        assert_eq!(
            arguments.iter().map(|a| a.key).collect::<Vec<_>>(),
            vec!["type", "scores", "tag"]
        );
        assert_eq!(arguments[1].value, "{foo=1..5,bar=2}");

        let usages = parse("summon custom:pig ~ ~ ~ {Tags:[\"x\"]}");
        assert_eq!(identifiers(&usages, SERVER_ENTITY), vec!["custom:pig"]);

        let usages = parse("kill @e[type=custom:pig,scores={foo=1..5}]");
        let infos = &usages[&SERVER_ENTITY]["custom:pig"];
        assert_eq!(infos[0].range, DocRange::on_line(0, 13, 23));
        assert!(!infos[0].link);
    }

    #[test]
    fn nested_hasitem_values() {
        let arguments =
            selector_arguments("hasitem=[{item=apple,quantity=1..},{item=stick}],type=pig");

        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[1].key, "type");
        assert_eq!(arguments[1].value, "pig");
    }

    #[test]
    fn negated_and_spaced_selector_values() {
        let usages = parse("tp @e[ type = !custom:cow ] ~ ~ ~");

        let infos = &usages[&SERVER_ENTITY]["custom:cow"];
        assert_eq!(infos[0].range, DocRange::on_line(0, 15, 25));
    }

    #[test]
    fn empty_selector_value_is_a_usage() {
        let usages = parse("kill @e[type=]");

        assert_eq!(
            usages[&SERVER_ENTITY][""][0].range,
            DocRange::on_line(0, 13, 13)
        );
    }

    #[test]
    fn selectors_inside_json_strings() {
        let usages = parse(r#"    "on_entry": ["/kill @e[type=custom:pig"#);

        assert_eq!(identifiers(&usages, SERVER_ENTITY), vec!["custom:pig"]);
        let usages = parse(r#"    "/tp @s[type=custom:pig""#);
        assert_eq!(identifiers(&usages, SERVER_ENTITY), vec!["custom:pig"]);
    }

    #[test]
    fn document_usages_are_merged_across_lines() {
        let document = TextDocument::new(
            "/ws/BP/functions/tick.mcfunction",
            "summon custom:pig\n# summon custom:cow\nsummon custom:pig ~ ~5 ~\n",
        );

        let usages = document_usages(&document);
        let infos = &usages[&SERVER_ENTITY]["custom:pig"];

        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].range, DocRange::on_line(2, 7, 17));
        assert!(!usages[&SERVER_ENTITY].contains_key("custom:cow"));
    }

    #[test]
    fn usage_under_cursor_and_as_typed() {
        let document = TextDocument::new("/ws/tick.mcfunction", "summon custom:pig ~ ~ ~");
        let position = Position {
            line: 0,
            character: 12,
        };

        let usage = usage_at_position(&document, position).unwrap();
        assert_eq!(usage.identifier, "custom:pig");
        assert_eq!(usage.target, SERVER_ENTITY);

        let typed = usage.truncated_at(position);
        assert_eq!(typed.identifier, "custo");
        assert_eq!(typed.range, DocRange::on_line(0, 7, 12));
    }

    #[test]
    fn no_usage_away_from_identifiers() {
        let document = TextDocument::new("/ws/tick.mcfunction", "summon custom:pig ~ ~ ~");

        assert!(usage_at_position(
            &document,
            Position {
                line: 0,
                character: 2
            }
        )
        .is_none());
    }
}
