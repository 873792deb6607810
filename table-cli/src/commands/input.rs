//! Parsing of interactive table commands.
//!
//! One line of input becomes one [`Input`]. Cards are referred to by any
//! unambiguous prefix of their id.

use tablesync_types::{
    Action, Card, CardId, Counter, CounterId, CounterKind, LibraryPlace, PlayerId, Position,
    TableState, Zone,
};
use thiserror::Error;

/// Help text for the interactive prompt.
pub const HELP: &str = "\
Commands:
  add <name>                    put a card on the battlefield
  library <name>[, <name>...]   put cards on top of your library
  move <card> <x> <y>           drag a card
  tap <card>                    tap or untap
  flip <card>                   turn face down or up
  remove <card>                 take a card off the table
  zone <card> <zone> [top|bottom|random]
                                move to battlefield, library, hand,
                                cemetery, exile, commander or tokens
  commander <card> [on|off]     mark your commander
  draw                          draw the top card of your library
  shuffle                       shuffle your library
  mulligan                      shuffle your hand into your library
  life <n>                      set your life total
  counter <n> [<x> <y>]         place a counter token
  show                          print the table
  help                          print this text
  leave                         leave the room";

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Send an action to the host.
    Act(Action),
    /// Print the table.
    Show,
    /// Print the command list.
    Help,
    /// Leave the room.
    Leave,
    /// Blank line.
    Nothing,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// First word is not a command.
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    /// Wrong number or shape of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// No card id starts with the given prefix.
    #[error("no card matches '{0}'")]
    UnknownCard(String),

    /// Several card ids start with the given prefix.
    #[error("'{0}' matches several cards")]
    AmbiguousCard(String),

    /// Not a zone name.
    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    /// Not a number.
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

/// Parse one line typed by player `me` against the current `table`.
pub fn parse(line: &str, me: &PlayerId, table: &TableState) -> Result<Input, ParseError> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let action = match command.to_ascii_lowercase().as_str() {
        "" => return Ok(Input::Nothing),
        "show" | "ls" => return Ok(Input::Show),
        "help" | "?" => return Ok(Input::Help),
        "leave" | "quit" | "exit" => return Ok(Input::Leave),
        "add" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("add <name>"));
            }
            Action::Add {
                card: Card::new(
                    CardId::random(),
                    rest,
                    me.clone(),
                    Zone::Battlefield,
                    Position::default(),
                ),
            }
        }
        "library" => {
            let cards: Vec<Card> = rest
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    Card::new(
                        CardId::random(),
                        name,
                        me.clone(),
                        Zone::Library,
                        Position::default(),
                    )
                })
                .collect();
            if cards.is_empty() {
                return Err(ParseError::Usage("library <name>[, <name>...]"));
            }
            Action::AddToLibrary { cards }
        }
        "move" => match args.as_slice() {
            [card, x, y] => Action::Move {
                id: resolve(table, card)?,
                position: Position::new(number(x)?, number(y)?),
            },
            _ => return Err(ParseError::Usage("move <card> <x> <y>")),
        },
        "tap" => Action::ToggleTap {
            id: single_card(table, &args, "tap <card>")?,
        },
        "flip" => Action::FlipCard {
            id: single_card(table, &args, "flip <card>")?,
        },
        "remove" | "rm" => Action::Remove {
            id: single_card(table, &args, "remove <card>")?,
        },
        "zone" => {
            const USAGE: &str = "zone <card> <zone> [top|bottom|random]";
            let (card, zone, place) = match args.as_slice() {
                [card, zone] => (card, zone, None),
                [card, zone, place] => {
                    let place = library_place(place).ok_or(ParseError::Usage(USAGE))?;
                    (card, zone, Some(place))
                }
                _ => return Err(ParseError::Usage(USAGE)),
            };
            let id = resolve(table, card)?;
            let position = table
                .card(&id)
                .map(|c| c.position)
                .unwrap_or_default();
            Action::ChangeZone {
                id,
                zone: zone_named(zone)?,
                position,
                library_place: place,
            }
        }
        "commander" => {
            const USAGE: &str = "commander <card> [on|off]";
            let (card, flag) = match args.as_slice() {
                [card] => (card, true),
                [card, "on"] => (card, true),
                [card, "off"] => (card, false),
                _ => return Err(ParseError::Usage(USAGE)),
            };
            Action::SetCommander {
                id: resolve(table, card)?,
                is_commander: flag,
            }
        }
        "draw" => Action::DrawFromLibrary {
            player_id: me.clone(),
        },
        "shuffle" => Action::ShuffleLibrary {
            player_id: me.clone(),
        },
        "mulligan" => Action::Mulligan {
            player_id: me.clone(),
        },
        "life" => match args.as_slice() {
            [life] => Action::SetPlayerLife {
                player_id: me.clone(),
                life: integer(life)?,
            },
            _ => return Err(ParseError::Usage("life <n>")),
        },
        "counter" => {
            let (value, position) = match args.as_slice() {
                [value] => (value, Position::default()),
                [value, x, y] => (value, Position::new(number(x)?, number(y)?)),
                _ => return Err(ParseError::Usage("counter <n> [<x> <y>]")),
            };
            Action::CreateCounter {
                counter: Counter {
                    id: CounterId::random(),
                    owner: me.clone(),
                    kind: CounterKind::Numeral {
                        value: integer(value)?,
                    },
                    position,
                },
            }
        }
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Input::Act(action))
}

fn single_card(
    table: &TableState,
    args: &[&str],
    usage: &'static str,
) -> Result<CardId, ParseError> {
    match args {
        [card] => resolve(table, card),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// Find the one card whose id starts with `prefix`.
fn resolve(table: &TableState, prefix: &str) -> Result<CardId, ParseError> {
    if let Some(card) = table.board.iter().find(|c| c.id.as_str() == prefix) {
        return Ok(card.id.clone());
    }
    let mut matches = table
        .board
        .iter()
        .filter(|c| c.id.as_str().starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(card), None) => Ok(card.id.clone()),
        (Some(_), Some(_)) => Err(ParseError::AmbiguousCard(prefix.to_string())),
        (None, _) => Err(ParseError::UnknownCard(prefix.to_string())),
    }
}

fn zone_named(name: &str) -> Result<Zone, ParseError> {
    match name.to_ascii_lowercase().as_str() {
        "battlefield" | "bf" => Ok(Zone::Battlefield),
        "library" | "lib" => Ok(Zone::Library),
        "hand" => Ok(Zone::Hand),
        "cemetery" | "graveyard" | "gy" => Ok(Zone::Cemetery),
        "exile" => Ok(Zone::Exile),
        "commander" | "cmd" => Ok(Zone::Commander),
        "tokens" => Ok(Zone::Tokens),
        _ => Err(ParseError::UnknownZone(name.to_string())),
    }
}

fn library_place(name: &str) -> Option<LibraryPlace> {
    match name.to_ascii_lowercase().as_str() {
        "top" => Some(LibraryPlace::Top),
        "bottom" => Some(LibraryPlace::Bottom),
        "random" => Some(LibraryPlace::Random),
        _ => None,
    }
}

fn number(text: &str) -> Result<f64, ParseError> {
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ParseError::NotANumber(text.to_string()))
}

fn integer(text: &str) -> Result<i32, ParseError> {
    text.parse()
        .map_err(|_| ParseError::NotANumber(text.to_string()))
}
