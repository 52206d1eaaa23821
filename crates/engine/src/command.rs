use std::collections::HashMap;

use thiserror::Error;

use crate::world::{Action, ActorId, Direction, RelativeDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Relative(RelativeDirection),
    Absolute(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move { heading: Heading, steps: i32 },
    Turn { relative: RelativeDirection, times: i32 },
    Wait,
    Look,
    Save,
    Load,
    Undo,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{name}'. try: help")]
    Unknown { name: String },
    #[error("{reason}. usage: {usage}")]
    BadArguments { reason: String, usage: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRegistryError {
    #[error("command name cannot be empty")]
    EmptyName,
    #[error("duplicate command registration: {name}")]
    Duplicate { name: String },
}

pub type ParseFn = fn(&[&str], &str) -> Result<Command, CommandParseError>;

pub struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: ParseFn,
}

pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

const BUILTINS: &[(&str, &str, &str, ParseFn)] = &[
    ("help", "List commands", "", parse_help),
    ("forward", "Step forward", "[steps:i32]", parse_forward),
    ("back", "Step backward", "[steps:i32]", parse_back),
    ("strafe_left", "Step to the left", "[steps:i32]", parse_strafe_left),
    ("strafe_right", "Step to the right", "[steps:i32]", parse_strafe_right),
    (
        "go",
        "Step in an absolute direction",
        "<direction:north|east|south|west> [steps:i32]",
        parse_go,
    ),
    (
        "turn",
        "Turn in place",
        "<side:left|right|back> [times:i32]",
        parse_turn,
    ),
    ("wait", "Pass the turn", "", parse_wait),
    ("look", "Redraw the map", "", parse_look),
    ("save", "Save the world", "", parse_save),
    ("load", "Load the saved world", "", parse_load),
    ("undo", "Revert the last action", "", parse_undo),
    ("quit", "Quit", "", parse_quit),
];

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, help, arg_schema, parse) in BUILTINS {
            registry
                .lookup_by_lower_name
                .insert(name.to_string(), registry.specs.len());
            registry.specs.push(CommandSpec {
                name: name.to_string(),
                help: help.to_string(),
                arg_schema: arg_schema.to_string(),
                parse: *parse,
            });
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: ParseFn,
    ) -> Result<(), CommandRegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CommandRegistryError::EmptyName);
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(CommandRegistryError::Duplicate { name });
        }
        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse,
        });
        self.lookup_by_lower_name.insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub fn parse_line(&self, line: &str) -> Result<Command, CommandParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = tokens.split_first() else {
            return Err(CommandParseError::Empty);
        };
        let lower = name.to_ascii_lowercase();
        let spec = self
            .lookup_by_lower_name
            .get(&lower)
            .and_then(|index| self.specs.get(*index))
            .ok_or_else(|| CommandParseError::Unknown {
                name: name.to_string(),
            })?;
        let usage = if spec.arg_schema.is_empty() {
            spec.name.clone()
        } else {
            format!("{} {}", spec.name, spec.arg_schema)
        };
        (spec.parse)(args, &usage)
    }

    pub fn help_lines(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| {
                if spec.arg_schema.is_empty() {
                    format!("{} - {}", spec.name, spec.help)
                } else {
                    format!("{} {} - {}", spec.name, spec.arg_schema, spec.help)
                }
            })
            .collect()
    }
}

pub fn action_for_command(command: &Command, actor: ActorId) -> Option<Action> {
    match *command {
        Command::Move {
            heading: Heading::Relative(relative),
            steps,
        } => Some(Action::MoveRelative {
            actor,
            relative,
            steps,
        }),
        Command::Move {
            heading: Heading::Absolute(direction),
            steps,
        } => Some(Action::MoveAbsolute {
            actor,
            direction,
            steps,
        }),
        Command::Turn { relative, times } => Some(Action::Turn {
            actor,
            relative,
            steps: times,
        }),
        Command::Wait => Some(Action::Wait),
        Command::Look
        | Command::Save
        | Command::Load
        | Command::Undo
        | Command::Help
        | Command::Quit => None,
    }
}

fn bad_arguments(reason: impl Into<String>, usage: &str) -> CommandParseError {
    CommandParseError::BadArguments {
        reason: reason.into(),
        usage: usage.to_string(),
    }
}

fn require_no_args(args: &[&str], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(bad_arguments("unexpected extra arguments", usage))
    }
}

fn parse_optional_count(args: &[&str], usage: &str) -> Result<i32, CommandParseError> {
    match args {
        [] => Ok(1),
        [raw] => raw
            .parse::<i32>()
            .map_err(|_| bad_arguments(format!("invalid count '{raw}' (expected i32)"), usage)),
        _ => Err(bad_arguments("unexpected extra arguments", usage)),
    }
}

fn parse_relative_move(
    relative: RelativeDirection,
    args: &[&str],
    usage: &str,
) -> Result<Command, CommandParseError> {
    Ok(Command::Move {
        heading: Heading::Relative(relative),
        steps: parse_optional_count(args, usage)?,
    })
}

fn parse_help(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Help)
}

fn parse_forward(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    parse_relative_move(RelativeDirection::Front, args, usage)
}

fn parse_back(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    parse_relative_move(RelativeDirection::Back, args, usage)
}

fn parse_strafe_left(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    parse_relative_move(RelativeDirection::Left, args, usage)
}

fn parse_strafe_right(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    parse_relative_move(RelativeDirection::Right, args, usage)
}

fn parse_go(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    let Some((raw_direction, rest)) = args.split_first() else {
        return Err(bad_arguments("missing required argument <direction>", usage));
    };
    let direction = match raw_direction.to_ascii_lowercase().as_str() {
        "north" | "n" => Direction::North,
        "east" | "e" => Direction::East,
        "south" | "s" => Direction::South,
        "west" | "w" => Direction::West,
        _ => {
            return Err(bad_arguments(
                format!("unknown direction '{raw_direction}' (expected north|east|south|west)"),
                usage,
            ));
        }
    };
    Ok(Command::Move {
        heading: Heading::Absolute(direction),
        steps: parse_optional_count(rest, usage)?,
    })
}

fn parse_turn(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    let Some((raw_side, rest)) = args.split_first() else {
        return Err(bad_arguments("missing required argument <side>", usage));
    };
    let relative = match raw_side.to_ascii_lowercase().as_str() {
        "left" | "l" => RelativeDirection::Left,
        "right" | "r" => RelativeDirection::Right,
        "back" | "around" => RelativeDirection::Back,
        _ => {
            return Err(bad_arguments(
                format!("unknown side '{raw_side}' (expected left|right|back)"),
                usage,
            ));
        }
    };
    Ok(Command::Turn {
        relative,
        times: parse_optional_count(rest, usage)?,
    })
}

fn parse_wait(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Wait)
}

fn parse_look(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Look)
}

fn parse_save(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Save)
}

fn parse_load(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Load)
}

fn parse_undo(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Undo)
}

fn parse_quit(args: &[&str], usage: &str) -> Result<Command, CommandParseError> {
    require_no_args(args, usage)?;
    Ok(Command::Quit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_commands_in_registration_order() {
        let lines = CommandRegistry::with_builtins().help_lines();
        assert_eq!(lines[0], "help - List commands");
        assert_eq!(lines[1], "forward [steps:i32] - Step forward");
        assert_eq!(
            lines[5],
            "go <direction:north|east|south|west> [steps:i32] - Step in an absolute direction"
        );
        assert_eq!(lines.last().map(String::as_str), Some("quit - Quit"));
    }

    #[test]
    fn movement_commands_parse_with_default_count() {
        let registry = CommandRegistry::with_builtins();
        assert_eq!(
            registry.parse_line("forward"),
            Ok(Command::Move {
                heading: Heading::Relative(RelativeDirection::Front),
                steps: 1,
            })
        );
        assert_eq!(
            registry.parse_line("  GO north 3 "),
            Ok(Command::Move {
                heading: Heading::Absolute(Direction::North),
                steps: 3,
            })
        );
        assert_eq!(
            registry.parse_line("turn around 2"),
            Ok(Command::Turn {
                relative: RelativeDirection::Back,
                times: 2,
            })
        );
        assert_eq!(registry.parse_line("wait"), Ok(Command::Wait));
    }

    #[test]
    fn unknown_and_empty_lines_report_errors() {
        let registry = CommandRegistry::with_builtins();
        assert_eq!(registry.parse_line("   "), Err(CommandParseError::Empty));
        assert_eq!(
            registry.parse_line("dance").map_err(|error| error.to_string()),
            Err("unknown command 'dance'. try: help".to_string())
        );
    }

    #[test]
    fn bad_args_report_usage_hint() {
        let registry = CommandRegistry::with_builtins();
        assert_eq!(
            registry
                .parse_line("forward lots")
                .map_err(|error| error.to_string()),
            Err("invalid count 'lots' (expected i32). usage: forward [steps:i32]".to_string())
        );
        assert_eq!(
            registry.parse_line("save now").map_err(|error| error.to_string()),
            Err("unexpected extra arguments. usage: save".to_string())
        );
        assert!(registry.parse_line("turn sideways").is_err());
        assert!(registry.parse_line("go").is_err());
    }

    #[test]
    fn register_rejects_duplicates_case_insensitively() {
        let mut registry = CommandRegistry::with_builtins();
        assert_eq!(
            registry.register("WAIT", "again", "", parse_wait),
            Err(CommandRegistryError::Duplicate {
                name: "WAIT".to_string()
            })
        );
        assert_eq!(
            registry.register(" ", "blank", "", parse_wait),
            Err(CommandRegistryError::EmptyName)
        );
        registry
            .register("rest", "Pass the turn", "", parse_wait)
            .expect("register");
        assert_eq!(registry.parse_line("Rest"), Ok(Command::Wait));
    }

    #[test]
    fn only_world_commands_translate_to_actions() {
        let hero = ActorId(3);
        assert_eq!(
            action_for_command(
                &Command::Move {
                    heading: Heading::Absolute(Direction::West),
                    steps: 2,
                },
                hero
            ),
            Some(Action::MoveAbsolute {
                actor: hero,
                direction: Direction::West,
                steps: 2,
            })
        );
        assert_eq!(
            action_for_command(
                &Command::Turn {
                    relative: RelativeDirection::Left,
                    times: 1,
                },
                hero
            ),
            Some(Action::Turn {
                actor: hero,
                relative: RelativeDirection::Left,
                steps: 1,
            })
        );
        assert_eq!(action_for_command(&Command::Wait, hero), Some(Action::Wait));
        for command in [
            Command::Look,
            Command::Save,
            Command::Load,
            Command::Undo,
            Command::Help,
            Command::Quit,
        ] {
            assert_eq!(action_for_command(&command, hero), None);
        }
    }
}
