//! Conversation state tests

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use spark_engine::{Conversation, Sender, SubmitError};

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn whitespace_only_message_is_a_no_op() {
    let mut conversation = Conversation::new();
    conversation.set_pending_input("   \n\t ");
    let mut updates = conversation.subscribe();
    updates.mark_unchanged();

    for text in ["", "   ", "\n\t  \n"] {
        assert_eq!(
            conversation.append_user_message(text, at(1)),
            Err(SubmitError::Empty)
        );
    }

    assert!(conversation.messages().is_empty());
    assert!(!conversation.is_awaiting_reply());
    assert_eq!(conversation.pending_input().text(), "   \n\t ");
    assert!(!updates.has_changed().unwrap());
}

#[test]
fn flag_is_set_from_send_until_settle() {
    let mut conversation = Conversation::new();
    assert!(!conversation.is_awaiting_reply());

    conversation.set_pending_input("Tell me a joke");
    let prompt = conversation
        .append_user_message("Tell me a joke", at(1))
        .unwrap();
    assert_eq!(prompt.as_str(), "Tell me a joke");
    assert!(conversation.is_awaiting_reply());
    assert_eq!(conversation.pending_input().text(), "");

    conversation.resolve_with_reply("Why did...", at(2));
    assert!(!conversation.is_awaiting_reply());

    let senders: Vec<Sender> = conversation.messages().iter().map(|m| m.sender()).collect();
    assert_eq!(senders, [Sender::User, Sender::Bot]);
}

#[test]
fn second_send_while_awaiting_is_refused() {
    let mut conversation = Conversation::new();
    conversation.append_user_message("first", at(1)).unwrap();

    assert_eq!(
        conversation.append_user_message("second", at(2)),
        Err(SubmitError::AwaitingReply)
    );
    assert_eq!(conversation.messages().len(), 1);
}

#[test]
fn errors_become_ordinary_bot_messages() {
    let mut conversation = Conversation::new();
    conversation.append_user_message("hi", at(1)).unwrap();
    conversation.resolve_with_error("❌ Error: boom", at(2));

    let last = conversation.messages().last().unwrap();
    assert_eq!(last.sender(), Sender::Bot);
    assert_eq!(last.text(), "❌ Error: boom");
    assert_eq!(last.timestamp(), at(2));
    assert!(!conversation.is_awaiting_reply());
}

#[test]
fn every_mutation_publishes_a_snapshot() {
    let mut conversation = Conversation::new();
    let mut updates = conversation.subscribe();
    updates.mark_unchanged();

    conversation.set_pending_input("draft");
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().pending_input.text(), "draft");

    conversation.append_user_message("draft", at(1)).unwrap();
    {
        let snapshot = updates.borrow_and_update();
        assert!(snapshot.awaiting_reply);
        assert_eq!(snapshot.messages.len(), 1);
    }

    conversation.resolve_with_reply("done", at(2));
    let snapshot = updates.borrow_and_update().clone();
    assert!(!snapshot.awaiting_reply);
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[1].text(), "done");
}
