use anyhow::{Context, Result};
use regex::Regex;

use crate::messages::WindowRequest;
use crate::view::DraftField;

/// One line typed into the timer window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewInput {
    Edit(DraftField, i64),
    /// A duration expression such as `25m` or `1:30:00`
    SetDuration(u64),
    /// Enter on an empty line
    Commit,
    Start,
    Stop,
    Toggle,
    Reset,
    /// Zero-based quick-select preset
    Quick(usize),
    Sound(bool),
    Visual(bool),
    Window(WindowRequest),
    Help,
    Quit,
}

/// Parses window input lines
///
/// Accepts single commands, per-field edits (`m 25`), unit durations
/// (`1h30m`, `90s`) and clock durations (`5:00`, `1:30:00`).
pub struct InputParser {
    field_edit: Regex,
    unit_duration: Regex,
    clock_duration: Regex,
    quick: Regex,
    toggle: Regex,
}

impl InputParser {
    pub fn new() -> Self {
        Self {
            field_edit: Regex::new(r"^(?i)(h|hours?|m|min|minutes?|s|sec|seconds?)\s+(-?\d+)$").unwrap(),
            unit_duration: Regex::new(r"^(?i)(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?$")
                .unwrap(),
            clock_duration: Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{2})$").unwrap(),
            quick: Regex::new(r"^(?i)(?:q|quick)\s+(\d+)$").unwrap(),
            toggle: Regex::new(r"^(?i)(sound|visual)\s+(on|off)$").unwrap(),
        }
    }

    pub fn parse(&self, line: &str) -> Result<ViewInput> {
        let line = line.trim();

        match line.to_lowercase().as_str() {
            "" | "enter" => return Ok(ViewInput::Commit),
            "start" => return Ok(ViewInput::Start),
            "stop" | "pause" => return Ok(ViewInput::Stop),
            "toggle" | "t" => return Ok(ViewInput::Toggle),
            "reset" | "r" => return Ok(ViewInput::Reset),
            "show" => return Ok(ViewInput::Window(WindowRequest::Show)),
            "hide" => return Ok(ViewInput::Window(WindowRequest::Hide)),
            "window" => return Ok(ViewInput::Window(WindowRequest::Toggle)),
            "help" | "?" => return Ok(ViewInput::Help),
            "quit" | "exit" | "q" => return Ok(ViewInput::Quit),
            _ => {}
        }

        if let Some(caps) = self.field_edit.captures(line) {
            let field = match caps[1].to_lowercase().chars().next() {
                Some('h') => DraftField::Hours,
                Some('m') => DraftField::Minutes,
                _ => DraftField::Seconds,
            };
            let value = caps[2]
                .parse()
                .with_context(|| format!("Value out of range: {}", &caps[2]))?;
            return Ok(ViewInput::Edit(field, value));
        }

        if let Some(caps) = self.quick.captures(line) {
            let number: usize = caps[1]
                .parse()
                .with_context(|| format!("Invalid preset number: {}", &caps[1]))?;
            if number == 0 {
                anyhow::bail!("Presets are numbered from 1");
            }
            return Ok(ViewInput::Quick(number - 1));
        }

        if let Some(caps) = self.toggle.captures(line) {
            let enabled = caps[2].eq_ignore_ascii_case("on");
            return Ok(if caps[1].eq_ignore_ascii_case("sound") {
                ViewInput::Sound(enabled)
            } else {
                ViewInput::Visual(enabled)
            });
        }

        if let Some(caps) = self.clock_duration.captures(line) {
            let hours = caps.get(1).map_or(Ok(0), |m| parse_number(m.as_str()))?;
            let minutes = parse_number(&caps[2])?;
            let seconds = parse_number(&caps[3])?;
            return total_seconds(hours, minutes, seconds).map(ViewInput::SetDuration);
        }

        if let Some(caps) = self.unit_duration.captures(line) {
            let parts: Vec<Option<u64>> = (1..=3)
                .map(|i| caps.get(i).map(|m| parse_number(m.as_str())).transpose())
                .collect::<Result<_>>()?;

            if parts.iter().any(Option::is_some) {
                let [hours, minutes, seconds] = [parts[0], parts[1], parts[2]].map(|p| p.unwrap_or(0));
                return total_seconds(hours, minutes, seconds).map(ViewInput::SetDuration);
            }
        }

        anyhow::bail!("Unrecognised input: {:?} (type `help` for commands)", line)
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(digits: &str) -> Result<u64> {
    digits
        .parse()
        .with_context(|| format!("Number out of range: {}", digits))
}

fn total_seconds(hours: u64, minutes: u64, seconds: u64) -> Result<u64> {
    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .context("Duration is too long")
}

pub const HELP: &str = "\
Commands:
  h|m|s <n>         set hours, minutes or seconds
  25m, 1h30m, 90s   set the duration
  5:00, 1:30:00     set the duration as a clock
  <enter>           start the entered duration
  start | stop | toggle | reset
  quick <n>         load preset n
  sound on|off      sound cues
  visual on|off     desktop notifications
  show | hide | window
  help | quit";

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ViewInput {
        InputParser::new().parse(line).unwrap()
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse(""), ViewInput::Commit);
        assert_eq!(parse("  Enter "), ViewInput::Commit);
        assert_eq!(parse("start"), ViewInput::Start);
        assert_eq!(parse("STOP"), ViewInput::Stop);
        assert_eq!(parse("toggle"), ViewInput::Toggle);
        assert_eq!(parse("reset"), ViewInput::Reset);
        assert_eq!(parse("hide"), ViewInput::Window(WindowRequest::Hide));
        assert_eq!(parse("window"), ViewInput::Window(WindowRequest::Toggle));
        assert_eq!(parse("quit"), ViewInput::Quit);
    }

    #[test]
    fn test_field_edits() {
        assert_eq!(parse("h 2"), ViewInput::Edit(DraftField::Hours, 2));
        assert_eq!(parse("minutes 45"), ViewInput::Edit(DraftField::Minutes, 45));
        assert_eq!(parse("sec -4"), ViewInput::Edit(DraftField::Seconds, -4));
    }

    #[test]
    fn test_unit_durations() {
        assert_eq!(parse("25m"), ViewInput::SetDuration(1500));
        assert_eq!(parse("1h30m"), ViewInput::SetDuration(5400));
        assert_eq!(parse("1h 2m 3s"), ViewInput::SetDuration(3723));
        assert_eq!(parse("90s"), ViewInput::SetDuration(90));
    }

    #[test]
    fn test_clock_durations() {
        assert_eq!(parse("5:00"), ViewInput::SetDuration(300));
        assert_eq!(parse("1:30:00"), ViewInput::SetDuration(5400));
    }

    #[test]
    fn test_quick_and_toggles() {
        assert_eq!(parse("quick 1"), ViewInput::Quick(0));
        assert_eq!(parse("q 4"), ViewInput::Quick(3));
        assert_eq!(parse("sound off"), ViewInput::Sound(false));
        assert_eq!(parse("Visual ON"), ViewInput::Visual(true));
    }

    #[test]
    fn test_rejects_garbage() {
        let parser = InputParser::new();

        assert!(parser.parse("launch").is_err());
        assert!(parser.parse("quick 0").is_err());
        assert!(parser.parse("5:0").is_err());
        assert!(parser.parse("99999999999999999999h").is_err());
    }
}
