//! Decides whether a message may be relayed to real-time subscribers

use crate::model::Message;
use std::fmt;

/// Why a message was kept off the broadcast channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    HiddenSystemMessage,
    HiddenMessage,
    Imported,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SuppressReason::HiddenSystemMessage => "hidden_system_message",
            SuppressReason::HiddenMessage => "hidden",
            SuppressReason::Imported => "imported",
        };
        f.write_str(reason)
    }
}

/// Whether a system message of type `message_type` is configured as hidden
pub fn is_hidden_system_message(message_type: &str, hidden_types: &[String]) -> bool {
    hidden_types.iter().any(|hidden| hidden == message_type)
}

/// First suppression rule the message trips, checked in order:
/// hidden system type, hidden flag, import origin.
pub fn suppression_reason(message: &Message, hidden_types: &[String]) -> Option<SuppressReason> {
    if let Some(message_type) = message.message_type.as_deref() {
        if is_hidden_system_message(message_type, hidden_types) {
            return Some(SuppressReason::HiddenSystemMessage);
        }
    }

    if message.is_hidden() {
        return Some(SuppressReason::HiddenMessage);
    }

    if message.is_imported() {
        return Some(SuppressReason::Imported);
    }

    None
}

pub fn should_broadcast(message: &Message, hidden_types: &[String]) -> bool {
    suppression_reason(message, hidden_types).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hidden(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_regular_message_is_broadcast() {
        let message = Message::new("m1");
        assert!(should_broadcast(&message, &hidden(&["au"])));
        assert!(should_broadcast(&message, &[]));
    }

    #[test]
    fn test_hidden_system_type_wins_over_other_flags() {
        let mut message = Message::new("m1").with_type("au");
        message.hidden = Some(true);
        message.imported = Some(json!(true));

        assert_eq!(
            suppression_reason(&message, &hidden(&["ru", "au"])),
            Some(SuppressReason::HiddenSystemMessage)
        );
    }

    #[test]
    fn test_visible_system_type_is_broadcast() {
        let message = Message::new("m1").with_type("uj");
        assert!(should_broadcast(&message, &hidden(&["au", "ru"])));
    }

    #[test]
    fn test_hidden_flag_suppresses() {
        let mut message = Message::new("m1").with_type("uj");
        message.hidden = Some(true);

        assert_eq!(
            suppression_reason(&message, &hidden(&["au"])),
            Some(SuppressReason::HiddenMessage)
        );

        message.hidden = Some(false);
        assert!(should_broadcast(&message, &hidden(&["au"])));
    }

    #[test]
    fn test_import_marker_suppresses() {
        let mut message = Message::new("m1");
        message.imported = Some(json!(false));
        assert_eq!(
            suppression_reason(&message, &[]),
            Some(SuppressReason::Imported)
        );

        message.imported = Some(json!(null));
        assert!(should_broadcast(&message, &[]));
    }

    #[test]
    fn test_membership_ignores_order() {
        let message = Message::new("m1").with_type("au");
        assert!(!should_broadcast(&message, &hidden(&["au", "ru", "uj"])));
        assert!(!should_broadcast(&message, &hidden(&["uj", "ru", "au"])));
        assert_eq!(SuppressReason::HiddenSystemMessage.to_string(), "hidden_system_message");
    }
}
