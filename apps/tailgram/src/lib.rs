//! Client-side core for tailing the relay logs: cursor bookkeeping,
//! chunk reassembly, the render dedup gate, and the session loop that
//! drives them against a relay server.

pub mod cli;
pub mod tail;
pub mod transport;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use tailgram_wire::{sanitize, Message, Role};

use crate::cli::Cli;
use crate::tail::TailSession;
use crate::transport::{Relay, RelayError};

/// Run the interactive session: load history, then poll on a fixed
/// interval while relaying stdin lines as outbound messages.
///
/// Polls are serialized by construction: each cycle is awaited inside
/// the loop before the next tick can fire, so two polls for the same
/// cursor pair are never in flight together.
pub async fn run(cli: Cli) -> Result<()> {
    let relay = Relay::new(&cli.server)?;
    info!(server = relay.base_url(), "connecting to relay");

    let mut session = TailSession::new();
    let history = relay
        .history()
        .await
        .context("initial history load failed")?;
    for message in session.reload(&history) {
        print_message(&message);
    }
    let (me_cursor, them_cursor) = session.cursors();
    info!(me_cursor, them_cursor, "history loaded");

    let mut ticker = time::interval(Duration::from_millis(cli.poll_interval_ms.max(100)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut link_up = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (from_me, from_them) = session.cursors();
                match relay.poll(from_me, from_them).await {
                    Ok(poll) => {
                        set_link_status(&mut link_up, true);
                        for message in session.apply_poll(&poll) {
                            print_message(&message);
                        }
                    }
                    Err(err) => {
                        set_link_status(&mut link_up, false);
                        warn!(error = %err, "poll failed, retrying next cycle");
                    }
                }
            }
            line = stdin_lines.next_line() => {
                match line {
                    Ok(Some(text)) => {
                        if let Err(err) = send_one(&relay, &mut session, &mut link_up, &text).await {
                            warn!(error = %err, "send failed");
                        }
                    }
                    Ok(None) => break,
                    Err(err) => return Err(err).context("reading stdin"),
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }

    info!("session closed");
    Ok(())
}

async fn send_one(
    relay: &Relay,
    session: &mut TailSession,
    link_up: &mut bool,
    text: &str,
) -> Result<(), RelayError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match relay.send(text).await {
        Ok(sent) => {
            set_link_status(link_up, true);
            let stamp = format!("[{}] [{}]", sent.stamp_date, sent.stamp_time);
            let clean = sanitize(text);
            if session.note_sent(&stamp, &clean) {
                print_message(&Message {
                    role: Role::Mine,
                    text: clean,
                    stamp,
                });
            }
            Ok(())
        }
        Err(RelayError::Rejected(reason)) => {
            // Validation failure, not a link problem.
            warn!(%reason, "relay rejected the message");
            Ok(())
        }
        Err(err) => {
            set_link_status(link_up, false);
            Err(err)
        }
    }
}

fn set_link_status(link_up: &mut bool, up: bool) {
    if *link_up != up {
        *link_up = up;
        if up {
            info!("link restored");
        } else {
            warn!("link down");
        }
    }
}

fn print_message(message: &Message) {
    let side = match message.role {
        Role::Mine => "you",
        Role::Theirs => "them",
    };
    println!("{} {:>4} | {}", message.stamp, side, message.text);
}
