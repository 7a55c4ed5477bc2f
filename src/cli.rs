// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Command Parsing
//!
//! Turns an input line into a [`Command`]. Parsing is purely syntactic;
//! whether a command is available on the current screen is decided by the
//! controller against the rendered binding table.

use std::path::PathBuf;

use crate::router::NavTarget;
use crate::state::FormField;

/// A parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Nav(NavTarget),
    /// Set a registration form field.
    Set(FormField, String),
    /// Attach a certificate image to the active view's form.
    Attach(PathBuf),
    Register,
    Verify,
    List,
    Revoke(String),
    /// Navigate back from a payload view.
    Back,
    /// Re-print the current screen.
    Show,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "login" => Command::Login,
        "logout" => Command::Logout,
        "nav" => match rest.to_ascii_lowercase().as_str() {
            "admin" => Command::Nav(NavTarget::Admin),
            "verify" => Command::Nav(NavTarget::Verify),
            _ => return Err(ParseError::Usage("nav <admin|verify>")),
        },
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .ok_or(ParseError::Usage("set <field> <value>"))?;
            let field =
                FormField::parse(field).ok_or(ParseError::Usage("set <field> <value>"))?;
            Command::Set(field, value.trim().to_string())
        }
        "attach" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("attach <path>"));
            }
            Command::Attach(PathBuf::from(rest))
        }
        "register" => Command::Register,
        "verify" => Command::Verify,
        "list" => Command::List,
        "revoke" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("revoke <id>"));
            }
            Command::Revoke(rest.to_string())
        }
        "back" => Command::Back,
        "show" => Command::Show,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Help text listing every command; availability depends on the screen.
pub const HELP: &str = "\
Commands:
  login                      start the interactive login flow
  logout                     end the session
  nav <admin|verify>         switch screens
  set <field> <value>        fill a registration field
                             (name, type, issuer, issued-to, issue-date, description)
  attach <path>              select a certificate image for the active form
  register                   submit the registration form (admin)
  verify                     verify the attached certificate image
  list                       list all certificates (admin)
  revoke <id>                revoke a listed certificate (admin)
  back                       leave a results/list screen
  show                       re-print the current screen
  quit                       exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_parse_to_nothing() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn simple_commands_parse() {
        assert_eq!(parse("login"), Ok(Some(Command::Login)));
        assert_eq!(parse("LOGOUT"), Ok(Some(Command::Logout)));
        assert_eq!(parse("quit"), Ok(Some(Command::Quit)));
        assert_eq!(parse("exit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn nav_requires_a_known_target() {
        assert_eq!(parse("nav admin"), Ok(Some(Command::Nav(NavTarget::Admin))));
        assert_eq!(
            parse("nav verify"),
            Ok(Some(Command::Nav(NavTarget::Verify)))
        );
        assert!(matches!(parse("nav results"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn set_preserves_spaces_in_the_value() {
        assert_eq!(
            parse("set name Advanced Rust Programming"),
            Ok(Some(Command::Set(
                FormField::Name,
                "Advanced Rust Programming".to_string()
            )))
        );
    }

    #[test]
    fn set_rejects_unknown_fields() {
        assert!(matches!(parse("set color red"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("set name"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn attach_and_revoke_require_arguments() {
        assert_eq!(
            parse("attach /tmp/cert.png"),
            Ok(Some(Command::Attach(PathBuf::from("/tmp/cert.png"))))
        );
        assert!(matches!(parse("attach"), Err(ParseError::Usage(_))));

        assert_eq!(parse("revoke 42"), Ok(Some(Command::Revoke("42".into()))));
        assert!(matches!(parse("revoke"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse("frobnicate"),
            Err(ParseError::Unknown("frobnicate".into()))
        );
    }
}
