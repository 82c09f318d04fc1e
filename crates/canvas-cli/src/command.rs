use std::str::FromStr;

use canvas_core::{Position, SourceHandle, Viewport};

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Tree,
    Dump,
    Say { input_id: String, text: String },
    Draft { input_id: String, text: String },
    Send { input_id: String },
    Branch {
        node_id: String,
        handle: Option<SourceHandle>,
        at: Position,
    },
    View(Viewport),
    History { node_id: String },
    State { node_id: String },
    Delete { ids: Vec<String> },
    Login { api_key: String },
    Logout,
    Quit,
}

pub const HELP: &str = "\
commands:
  tree                         show the canvas
  say <input-id> <text>        submit text from an input node
  draft <input-id> <text>      type into an input node without submitting
  send <input-id>              submit an input node's draft
  branch <node-id> [handle] <x> <y>
                               drag from a handle (bottom|left|right) to a screen point
  view <x> <y> <zoom>          set the viewport used to map screen points
  history <node-id>            transcript the model would see from a node
  state <node-id>              exchange state of a node
  delete <id>...               delete nodes and everything below them
  dump                         print the graph as JSON
  login <api-key> | logout
  quit";

fn number(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("not a number: {}", raw))
}

/// Text after the first `words` words, with its inner spacing untouched.
fn rest_after(line: &str, words: usize) -> String {
    let mut rest = line;
    for _ in 0..words {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    rest.trim_start().to_string()
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Err("empty command".to_string());
        };

        let command = match (verb, args) {
            ("help" | "?", _) => Command::Help,
            ("tree" | "ls", _) => Command::Tree,
            ("dump", _) => Command::Dump,
            ("quit" | "exit", _) => Command::Quit,
            ("logout", _) => Command::Logout,
            ("login", [key]) => Command::Login {
                api_key: key.to_string(),
            },
            ("say", [id, _, ..]) => Command::Say {
                input_id: id.to_string(),
                text: rest_after(line, 2),
            },
            ("draft", [id, ..]) => Command::Draft {
                input_id: id.to_string(),
                text: rest_after(line, 2),
            },
            ("send", [id]) => Command::Send {
                input_id: id.to_string(),
            },
            ("branch", [id, x, y]) => Command::Branch {
                node_id: id.to_string(),
                handle: None,
                at: Position::new(number(x)?, number(y)?),
            },
            ("branch", [id, handle, x, y]) => Command::Branch {
                node_id: id.to_string(),
                handle: Some(handle.parse::<SourceHandle>().map_err(|e| e.to_string())?),
                at: Position::new(number(x)?, number(y)?),
            },
            ("view", [x, y, zoom]) => Command::View(Viewport {
                x: number(x)?,
                y: number(y)?,
                zoom: number(zoom)?,
            }),
            ("history", [id]) => Command::History {
                node_id: id.to_string(),
            },
            ("state", [id]) => Command::State {
                node_id: id.to_string(),
            },
            ("delete" | "rm", ids) if !ids.is_empty() => Command::Delete {
                ids: ids.iter().map(|s| s.to_string()).collect(),
            },
            _ => return Err(format!("unrecognized command: {} (try `help`)", line.trim())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn say_keeps_the_whole_message() {
        assert_eq!(
            "say input-1 my name is Ada".parse::<Command>().unwrap(),
            Command::Say {
                input_id: "input-1".to_string(),
                text: "my name is Ada".to_string(),
            }
        );
        assert!("say input-1".parse::<Command>().is_err());
    }

    #[test]
    fn message_spacing_is_preserved() {
        assert_eq!(
            "  say\tinput-1   keep  these\tgaps".parse::<Command>().unwrap(),
            Command::Say {
                input_id: "input-1".to_string(),
                text: "keep  these\tgaps".to_string(),
            }
        );
        assert_eq!(
            "draft input-2 a   b".parse::<Command>().unwrap(),
            Command::Draft {
                input_id: "input-2".to_string(),
                text: "a   b".to_string(),
            }
        );
    }

    #[test]
    fn branch_handle_is_optional() {
        assert_eq!(
            "branch assistant-3 400 400".parse::<Command>().unwrap(),
            Command::Branch {
                node_id: "assistant-3".to_string(),
                handle: None,
                at: Position::new(400.0, 400.0),
            }
        );
        assert_eq!(
            "branch assistant-3 right 10 20".parse::<Command>().unwrap(),
            Command::Branch {
                node_id: "assistant-3".to_string(),
                handle: Some(SourceHandle::Right),
                at: Position::new(10.0, 20.0),
            }
        );
        assert!("branch assistant-3 up 10 20".parse::<Command>().is_err());
    }

    #[test]
    fn delete_takes_several_ids() {
        assert_eq!(
            "rm user-2 input-5".parse::<Command>().unwrap(),
            Command::Delete {
                ids: vec!["user-2".to_string(), "input-5".to_string()],
            }
        );
        assert!("delete".parse::<Command>().is_err());
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = "view 0 0 big".parse::<Command>().unwrap_err();
        assert!(err.contains("big"));
    }
}
