//! Parsing of input lines into [`Command`]s.

use thiserror::Error;

use crate::view::LockTarget;

/// Malformed command arguments. Always reported as one line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid scale factor \"{0}\": expected a positive number")]
    InvalidFactor(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Statistics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsMode {
    /// Show the block for the next render only.
    Once,
    On,
    Off,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `// …` annotation, echoed to the log and never executed.
    Comment(String),
    Scale {
        column: Option<String>,
        factor: f64,
    },
    /// `None` for an unrecognized target, which is a no-op.
    Lock(Option<LockTarget>),
    Unlock(Option<LockTarget>),
    Hide(Vec<String>),
    Unhide(Vec<String>),
    UnhideAll,
    Stats(StatsMode),
    Quit,
    Query(String),
}

impl Command {
    /// Parse one line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with("//") {
            return Ok(Some(Self::Comment(line.to_string())));
        }

        let mut words = line.split_whitespace();
        let keyword = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match keyword.as_str() {
            "scale" => match args.as_slice() {
                [factor] => Self::Scale {
                    column: None,
                    factor: parse_factor(factor)?,
                },
                [column, factor] => Self::Scale {
                    column: Some(column.to_lowercase()),
                    factor: parse_factor(factor)?,
                },
                _ => return Err(CommandError::Usage("scale [column] <factor>")),
            },
            "lock" | "unlock" => {
                let target = match args.as_slice() {
                    [target] => target.parse::<LockTarget>().ok(),
                    _ => None,
                };
                if keyword == "lock" {
                    Self::Lock(target)
                } else {
                    Self::Unlock(target)
                }
            }
            "hide" => {
                if args.is_empty() {
                    return Err(CommandError::Usage("hide <column...>"));
                }
                Self::Hide(lowercased(&args))
            }
            "unhide" => match args.as_slice() {
                [] => return Err(CommandError::Usage("unhide <column...>|all")),
                [all] if all.eq_ignore_ascii_case("all") => Self::UnhideAll,
                _ => Self::Unhide(lowercased(&args)),
            },
            "stats" => match args.as_slice() {
                [] => Self::Stats(StatsMode::Once),
                [mode] if mode.eq_ignore_ascii_case("on") => Self::Stats(StatsMode::On),
                [mode] if mode.eq_ignore_ascii_case("off") => Self::Stats(StatsMode::Off),
                _ => return Err(CommandError::Usage("stats [on|off]")),
            },
            "quit" | "exit" if args.is_empty() => Self::Quit,
            _ => Self::Query(line.to_string()),
        };
        Ok(Some(command))
    }
}

fn parse_factor(raw: &str) -> Result<f64, CommandError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(CommandError::InvalidFactor(raw.to_string())),
    }
}

fn lowercased(args: &[&str]) -> Vec<String> {
    args.iter()
        .map(|a| a.trim_end_matches(',').to_lowercase())
        .filter(|a| !a.is_empty())
        .collect()
}
