use std::{
    io::{self, BufRead},
    path::PathBuf,
    thread,
};

use log::{debug, warn};
use rsvp_core::input::{Command, Event, Key, command_for_key};

use super::{EventQueue, config::parse_switch};

/// Everything the driver loop reacts to.
#[derive(Debug)]
pub(super) enum DriverEvent {
    Session(Event),
    LoadFile(PathBuf),
    Speech(bool),
    Help,
    Quit,
}

#[derive(Debug)]
pub(super) enum ParsedLine {
    Event(DriverEvent),
    Invalid(&'static str),
}

pub(super) const HELP: &str = "\
commands:
  <enter> | start       start from the first word
  p | <space>           pause / resume
  pause | resume        manual pause / resume
  + | -                 faster / slower
  wpm N                 set reading speed
  jump N                jump to word N
  find WORD             jump to the next word containing WORD
  r | reset             back to the start
  load PATH             open a .txt or .md file
  speech on|off         speech-synced playback on next start
  q | quit";

pub(super) fn parse_line(line: &str) -> ParsedLine {
    if line == " " {
        return key(Key::Space);
    }

    let trimmed = line.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" | "s" | "start" => key(Key::Enter),
        "p" | "space" => key(Key::Space),
        "pause" => command(Command::PauseManual),
        "resume" => command(Command::ResumeManual),
        "r" | "reset" => key(Key::Char('r')),
        "+" | "up" | "faster" => key(Key::ArrowUp),
        "-" | "down" | "slower" => key(Key::ArrowDown),
        "wpm" => match rest.parse() {
            Ok(wpm) => command(Command::SetRate(wpm)),
            Err(_) => ParsedLine::Invalid("wpm expects a number"),
        },
        "j" | "jump" => match rest.parse::<usize>() {
            Ok(number) if number > 0 => command(Command::JumpTo(number - 1)),
            _ => ParsedLine::Invalid("jump expects a word number starting at 1"),
        },
        "f" | "find" => command(Command::SearchNext(rest.to_string())),
        "load" if !rest.is_empty() => ParsedLine::Event(DriverEvent::LoadFile(PathBuf::from(rest))),
        "speech" => match parse_switch(rest) {
            Some(enabled) => ParsedLine::Event(DriverEvent::Speech(enabled)),
            None => ParsedLine::Invalid("speech expects on or off"),
        },
        "h" | "help" | "?" => ParsedLine::Event(DriverEvent::Help),
        "q" | "quit" | "exit" => ParsedLine::Event(DriverEvent::Quit),
        _ => ParsedLine::Invalid("unknown command; type `help`"),
    }
}

fn key(key: Key) -> ParsedLine {
    match command_for_key(key) {
        Some(cmd) => command(cmd),
        None => ParsedLine::Invalid("unbound key"),
    }
}

fn command(cmd: Command) -> ParsedLine {
    ParsedLine::Event(DriverEvent::Session(Event::Command(cmd)))
}

/// Blocking stdin reader on its own thread, feeding the driver queue. End of input quits.
pub(super) fn spawn_stdin_reader(queue: &'static EventQueue) {
    let spawned = thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("input: stdin read failed: {}", err);
                        break;
                    }
                };

                match parse_line(&line) {
                    ParsedLine::Event(event) => {
                        debug!("input: {:?}", event);
                        if queue.try_send(event).is_err() {
                            warn!("input: event queue full; dropping line {:?}", line);
                        }
                    }
                    ParsedLine::Invalid(reason) => println!("? {}", reason),
                }
            }

            if queue.try_send(DriverEvent::Quit).is_err() {
                warn!("input: event queue full; quit dropped");
            }
        });

    if let Err(err) = spawned {
        warn!("input: could not start stdin reader: {}; keyboard disabled", err);
    }
}
