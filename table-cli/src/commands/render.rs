//! Plain-text rendering of the table and of session events.

use std::fmt::Write;

use tablesync_peer::{SessionEvent, SessionView};
use tablesync_types::{Card, CounterKind, Zone};

/// Characters of a card id shown to the user.
const SHORT_ID: usize = 8;

/// Render the whole table as seen by this peer.
pub fn table(view: &SessionView) -> String {
    let mut out = String::new();
    let host = view.host_id();
    let _ = writeln!(
        out,
        "Room {} (epoch {}, {:?})",
        view.room_id, view.epoch, view.state
    );

    let _ = writeln!(out, "Players:");
    for player in &view.table.players {
        let mut tags = Vec::new();
        if Some(&player.id) == host {
            tags.push("host");
        }
        if player.id == view.player_id {
            tags.push("you");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        let _ = writeln!(out, "  {:<16} life {:>3}{}", player.name, player.life, tags);
    }

    let battlefield: Vec<&Card> = view
        .table
        .board
        .iter()
        .filter(|c| c.zone == Zone::Battlefield)
        .collect();
    let _ = writeln!(out, "Battlefield:");
    for card in battlefield {
        let _ = writeln!(out, "  {}", card_line(card));
    }

    let mut hand: Vec<&Card> = view
        .table
        .board
        .iter()
        .filter(|c| c.zone == Zone::Hand && c.owner == view.player_id)
        .collect();
    hand.sort_by_key(|c| c.hand_index);
    let _ = writeln!(out, "Hand:");
    for card in hand {
        let _ = writeln!(out, "  {}", card_line(card));
    }

    for zone in Zone::STACKS {
        let mut cards: Vec<&Card> = view
            .table
            .board
            .iter()
            .filter(|c| c.zone == zone)
            .collect();
        if cards.is_empty() {
            continue;
        }
        cards.sort_by_key(|c| std::cmp::Reverse(c.stack_index));
        let _ = writeln!(out, "{:?}: {} card(s)", zone, cards.len());
        // Libraries stay hidden; other stacks show their top card.
        if zone != Zone::Library {
            let _ = writeln!(out, "  top: {}", card_line(cards[0]));
        }
    }

    if !view.table.counters.is_empty() {
        let _ = writeln!(out, "Counters:");
        for counter in &view.table.counters {
            let value = match counter.kind {
                CounterKind::Numeral { value } => value.to_string(),
                CounterKind::Plus { x, y } => format!("{:+}/{:+}", x, y),
            };
            let _ = writeln!(
                out,
                "  {} at ({}, {})",
                value, counter.position.x, counter.position.y
            );
        }
    }
    out
}

fn card_line(card: &Card) -> String {
    let id: String = card.id.as_str().chars().take(SHORT_ID).collect();
    let mut line = format!("{}  {}", id, card.name);
    if card.tapped {
        line.push_str(" (tapped)");
    }
    if card.flipped {
        line.push_str(" (face down)");
    }
    if card.is_commander {
        line.push_str(" (commander)");
    }
    line
}

/// One-line description of an event, or `None` for events not worth
/// printing.
pub fn event(event: &SessionEvent) -> Option<String> {
    let text = match event {
        SessionEvent::Connected { role, epoch } => {
            format!("connected as {:?} (epoch {})", role, epoch)
        }
        SessionEvent::PeerJoined { player_id, rejoined } => {
            if *rejoined {
                format!("{} rejoined", player_id)
            } else {
                format!("{} joined", player_id)
            }
        }
        SessionEvent::PeerRejected { player_id } => match player_id {
            Some(id) => format!("refused {}", id),
            None => "refused a connection".to_string(),
        },
        SessionEvent::PeerLeft { player_id } => format!("{} left", player_id),
        SessionEvent::TableChanged { .. } => return None,
        SessionEvent::ActionIgnored { kind, reason } => {
            format!("{} ignored: {}", kind, reason)
        }
        SessionEvent::Rejected { message } => format!("host refused us: {}", message),
        SessionEvent::HostLost { reason } => format!("host lost ({}), migrating", reason),
        SessionEvent::HandoverStarted { new_host } => {
            format!("host is handing over to {}", new_host)
        }
        SessionEvent::BecameHost { epoch } => format!("you are now the host (epoch {})", epoch),
        SessionEvent::RejoinFailed { attempt, error } => {
            format!("rejoin attempt {} failed: {}", attempt, error)
        }
        SessionEvent::Failed { message } => format!("session failed: {}", message),
        SessionEvent::Left => "left the room".to_string(),
    };
    Some(text)
}
