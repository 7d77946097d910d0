//! History projection: stored message log -> provider context.
//!
//! The caller passes the full log *including* the just-appended user turn;
//! projection strips exactly that last element, because the provider API
//! receives the in-flight prompt separately. Getting this split wrong
//! duplicates or drops the latest user turn in the provider context.

use relaychat_types::chat::ChatMessage;
use relaychat_types::provider::ProviderTurn;

/// Project a stored message log into provider context.
///
/// Maps each `{role, content}` pair in order and excludes exactly the last
/// message in the slice. Pure: no IO, no clock.
pub fn project(messages: &[ChatMessage]) -> Vec<ProviderTurn> {
    let end = messages.len().saturating_sub(1);
    messages[..end]
        .iter()
        .map(|m| ProviderTurn {
            role: m.role,
            text: m.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaychat_types::chat::Role;

    fn log(contents: &[(&str, Role)]) -> Vec<ChatMessage> {
        contents
            .iter()
            .map(|(content, role)| match role {
                Role::User => ChatMessage::user("s1", *content),
                Role::Model => ChatMessage::model("s1", *content),
            })
            .collect()
    }

    #[test]
    fn test_project_excludes_exactly_the_last_message() {
        let messages = log(&[
            ("hi", Role::User),
            ("hello!", Role::Model),
            ("what next?", Role::User),
        ]);

        let context = project(&messages);
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context[0].text, "hi");
        assert_eq!(context[1].role, Role::Model);
        assert_eq!(context[1].text, "hello!");
    }

    #[test]
    fn test_project_preserves_order() {
        let messages = log(&[
            ("a", Role::User),
            ("b", Role::Model),
            ("c", Role::User),
            ("d", Role::Model),
            ("e", Role::User),
        ]);

        let projected = project(&messages);
        let texts: Vec<&str> = projected.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_project_single_message_yields_empty_context() {
        let messages = log(&[("hi", Role::User)]);
        assert!(project(&messages).is_empty());
    }

    #[test]
    fn test_project_empty_log() {
        assert!(project(&[]).is_empty());
    }
}
