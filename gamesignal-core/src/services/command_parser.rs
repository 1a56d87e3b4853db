// File: src/services/command_parser.rs

use crate::Error;

const CREATE_PREFIX: &str = "!create webhook ";
const RENAME_PREFIX: &str = "!rename ";
const DELETE_PREFIX: &str = "!delete webhook ";
const LIST_COMMAND: &str = "!list devices";
const HELP_COMMAND: &str = "!help";

pub const CREATE_USAGE: &str = "`!create webhook DeviceName`";
pub const RENAME_USAGE: &str = "`!rename OldName NewName`";
pub const DELETE_USAGE: &str = "`!delete webhook DeviceName`";

/// A chat line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateDevice { name: String },
    RenameDevice { old: String, new: String },
    DeleteDevice { name: String },
    ListDevices,
    Help,
    /// Not a command; the caller falls through to signal detection.
    NoCommand,
}

/// Parse a message into a [`Command`]. Prefixes are matched exactly (case and
/// spacing included); `!list devices` and `!help` must be the whole message.
///
/// A recognised prefix with unusable arguments is `Error::MalformedCommand`
/// carrying the usage hint.
pub fn classify(text: &str) -> Result<Command, Error> {
    if let Some(rest) = text.strip_prefix(CREATE_PREFIX) {
        let name = rest.trim();
        if name.is_empty() {
            return Err(Error::MalformedCommand(CREATE_USAGE.into()));
        }
        return Ok(Command::CreateDevice { name: name.to_string() });
    }

    if let Some(rest) = text.strip_prefix(RENAME_PREFIX) {
        // Only the first gap splits; everything after it is the new name.
        let Some((old, new)) = rest.trim().split_once(char::is_whitespace) else {
            return Err(Error::MalformedCommand(RENAME_USAGE.into()));
        };
        let new = new.trim();
        if old.is_empty() || new.is_empty() {
            return Err(Error::MalformedCommand(RENAME_USAGE.into()));
        }
        return Ok(Command::RenameDevice {
            old: old.to_string(),
            new: new.to_string(),
        });
    }

    if let Some(rest) = text.strip_prefix(DELETE_PREFIX) {
        let name = rest.trim();
        if name.is_empty() {
            return Err(Error::MalformedCommand(DELETE_USAGE.into()));
        }
        return Ok(Command::DeleteDevice { name: name.to_string() });
    }

    if text == LIST_COMMAND {
        return Ok(Command::ListDevices);
    }
    if text == HELP_COMMAND {
        return Ok(Command::Help);
    }

    Ok(Command::NoCommand)
}

pub fn help_text() -> String {
    format!(
        "🎮 **Gaming signal commands:**\n\
         • {CREATE_USAGE} - register a device and get its webhook URL\n\
         • {RENAME_USAGE} - rename a registered device\n\
         • {DELETE_USAGE} - delete a device and its webhook\n\
         • `!list devices` - show registered devices"
    )
}
