//! Parser for the nested `BEGIN ... END` game-summary block the server
//! sends in response to [`crate::client::ProtocolClient::get_game_condition`].

use std::collections::{HashMap, VecDeque};

use crate::error::ProtocolClientError;
use crate::model::Turn;

/// A node of the generic summary tree: either a leaf `key:value` pair's
/// value, or a nested block introduced by `BEGIN <tag> ... END <tag>`.
///
/// The `Position` tag is the one exception: its body is stored as a
/// [`SummaryNode::Leaf`] containing the verbatim, newline-joined block
/// rather than being recursively parsed (§4.F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryNode {
    Leaf(String),
    Block(HashMap<String, SummaryNode>),
}

impl SummaryNode {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            SummaryNode::Leaf(s) => Some(s),
            SummaryNode::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&HashMap<String, SummaryNode>> {
        match self {
            SummaryNode::Block(b) => Some(b),
            SummaryNode::Leaf(_) => None,
        }
    }

    fn get(&self, key: &str) -> Option<&SummaryNode> {
        self.as_block()?.get(key)
    }
}

fn parse_error(line: &str) -> ProtocolClientError {
    ProtocolClientError::ProtocolError(format!("malformed game summary line: {line:?}"))
}

/// Parses `lines` (the lines collected up to and including `END Game_Summary`)
/// into a generic tree, per the grammar in spec §4.F.
pub fn parse_summary_tree(lines: &[String]) -> Result<HashMap<String, SummaryNode>, ProtocolClientError> {
    let mut queue: VecDeque<String> = lines.iter().cloned().collect();
    parse_block(&mut queue)
}

fn parse_block(queue: &mut VecDeque<String>) -> Result<HashMap<String, SummaryNode>, ProtocolClientError> {
    let mut map = HashMap::new();

    while let Some(line) = queue.front() {
        if let Some(tag) = line.strip_prefix("END ") {
            // The closing tag for our caller's block; leave it for them.
            let _ = tag;
            break;
        }

        let line = queue.pop_front().unwrap();

        if let Some(tag) = line.strip_prefix("BEGIN ") {
            let tag = tag.to_string();
            let node = if tag == "Position" {
                parse_verbatim_block(queue, &tag)?
            } else {
                let nested = parse_block(queue)?;
                let end = queue.pop_front().ok_or_else(|| parse_error(&format!("BEGIN {tag}")))?;
                if end != format!("END {tag}") {
                    return Err(parse_error(&end));
                }
                SummaryNode::Block(nested)
            };
            map.insert(tag, node);
            continue;
        }

        match line.split_once(':') {
            Some((key, value)) if is_key(key) => {
                map.insert(key.to_string(), SummaryNode::Leaf(value.to_string()));
            }
            _ => return Err(parse_error(&line)),
        }
    }

    Ok(map)
}

fn parse_verbatim_block(
    queue: &mut VecDeque<String>,
    tag: &str,
) -> Result<SummaryNode, ProtocolClientError> {
    let end_marker = format!("END {tag}");
    let mut body = Vec::new();
    loop {
        let line = queue
            .pop_front()
            .ok_or_else(|| parse_error(&format!("BEGIN {tag}")))?;
        if line == end_marker {
            break;
        }
        body.push(line);
    }
    Ok(SummaryNode::Leaf(body.join("\n")))
}

fn is_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '+' || c == '-')
}

/// Mandatory `Time.*` fields nested inside `Game_Summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSettings {
    pub time_unit: String,
    pub total_time: String,
    pub least_time_per_move: String,
    pub byoyomi: Option<String>,
}

/// The parsed `Game_Summary` block, typed for the mandatory keys spec §3
/// lists, with anything else preserved verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub protocol_version: String,
    pub protocol_mode: String,
    pub format: String,
    pub declaration: String,
    pub game_id: String,
    pub name_black: String,
    pub name_white: String,
    pub your_turn: Turn,
    pub rematch_on_draw: String,
    pub to_move: Turn,
    /// The `Position` block body, verbatim, so the record reader can
    /// reconstruct the initial [`crate::model::State`] byte-for-byte.
    pub position: String,
    pub time: TimeSettings,
    pub extra: HashMap<String, String>,
}

impl GameSummary {
    /// Parses the whole tree produced by [`parse_summary_tree`] into a
    /// typed [`GameSummary`], failing if any mandatory key is absent.
    pub fn from_tree(tree: &HashMap<String, SummaryNode>) -> Result<GameSummary, ProtocolClientError> {
        let root = SummaryNode::Block(tree.clone());
        let summary = root
            .get("Game_Summary")
            .and_then(SummaryNode::as_block)
            .ok_or_else(|| ProtocolClientError::ProtocolError("missing Game_Summary block".into()))?;

        let leaf = |key: &str| -> Result<String, ProtocolClientError> {
            summary
                .get(key)
                .and_then(SummaryNode::as_leaf)
                .map(str::to_string)
                .ok_or_else(|| ProtocolClientError::ProtocolError(format!("missing {key} in Game_Summary")))
        };
        let turn = |key: &str| -> Result<Turn, ProtocolClientError> {
            let s = leaf(key)?;
            Turn::parse(s.trim().chars().next().unwrap_or('?'))
                .ok_or_else(|| ProtocolClientError::ProtocolError(format!("invalid {key}: {s}")))
        };

        let time_block = summary
            .get("Time")
            .and_then(SummaryNode::as_block)
            .ok_or_else(|| ProtocolClientError::ProtocolError("missing Time block in Game_Summary".into()))?;
        let time_leaf = |key: &str| -> Result<String, ProtocolClientError> {
            time_block
                .get(key)
                .and_then(SummaryNode::as_leaf)
                .map(str::to_string)
                .ok_or_else(|| ProtocolClientError::ProtocolError(format!("missing Time.{key}")))
        };

        let mut extra = HashMap::new();
        for (key, value) in summary {
            if let SummaryNode::Leaf(v) = value {
                extra.insert(key.clone(), v.clone());
            }
        }

        Ok(GameSummary {
            protocol_version: leaf("Protocol_Version")?,
            protocol_mode: leaf("Protocol_Mode")?,
            format: leaf("Format")?,
            declaration: leaf("Declaration")?,
            game_id: leaf("Game_ID")?,
            name_black: leaf("Name+")?,
            name_white: leaf("Name-")?,
            your_turn: turn("Your_Turn")?,
            rematch_on_draw: leaf("Rematch_On_Draw")?,
            to_move: turn("To_Move")?,
            position: leaf("Position")?,
            time: TimeSettings {
                time_unit: time_leaf("Time_Unit")?,
                total_time: time_leaf("Total_Time")?,
                least_time_per_move: time_leaf("Least_Time_Per_Move")?,
                byoyomi: time_block.get("Byoyomi").and_then(SummaryNode::as_leaf).map(str::to_string),
            },
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lines() -> Vec<String> {
        [
            "BEGIN Game_Summary",
            "Protocol_Version:1.1",
            "Protocol_Mode:Server",
            "Format:Shogi 1.0",
            "Declaration:Jishogi 1.1",
            "Game_ID:abc123",
            "Name+:alice",
            "Name-:bob",
            "Your_Turn:+",
            "Rematch_On_Draw:NO",
            "To_Move:+",
            "BEGIN Time",
            "Time_Unit:1sec",
            "Total_Time:1500",
            "Least_Time_Per_Move:1",
            "END Time",
            "BEGIN Position",
            "P1-KY-KE-GI-KI-OU-KI-GI-KE-KY",
            "P2 * -HI *  *  *  *  * -KA * ",
            "P3-FU-FU-FU-FU-FU-FU-FU-FU-FU",
            "P4 *  *  *  *  *  *  *  *  * ",
            "P5 *  *  *  *  *  *  *  *  * ",
            "P6 *  *  *  *  *  *  *  *  * ",
            "P7+FU+FU+FU+FU+FU+FU+FU+FU+FU",
            "P8 * +KA *  *  *  *  * +HI * ",
            "P9+KY+KE+GI+KI+OU+KI+GI+KE+KY",
            "+",
            "END Position",
            "END Game_Summary",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    #[test]
    fn parses_mandatory_fields() {
        let tree = parse_summary_tree(&sample_lines()).unwrap();
        let summary = GameSummary::from_tree(&tree).unwrap();
        assert_eq!(summary.protocol_version, "1.1");
        assert_eq!(summary.your_turn, Turn::Black);
        assert_eq!(summary.time.total_time, "1500");
        assert!(summary.position.starts_with("P1-KY"));
    }

    #[test]
    fn position_round_trips_verbatim() {
        let lines = sample_lines();
        let tree = parse_summary_tree(&lines).unwrap();
        let summary = GameSummary::from_tree(&tree).unwrap();
        // Body between "BEGIN Position" (16) and "END Position" (27), exclusive.
        let expected = lines[17..27].join("\n");
        assert_eq!(summary.position, expected);
    }

    #[test]
    fn rejects_malformed_line() {
        let mut lines = sample_lines();
        lines.insert(1, "not a valid line".to_string());
        assert!(parse_summary_tree(&lines).is_err());
    }
}
