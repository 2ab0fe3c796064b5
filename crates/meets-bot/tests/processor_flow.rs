//! Update processing against in-memory gateways and a recording sender.
//!
//! Run with:
//!   cargo test -p meets-bot --test processor_flow

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Asia::Almaty;
use meeting_core::{FixedClock, ManagerEntry};
use meets_bot::{dispatch, Inbound, ProcessResult, UpdateProcessor};
use meets_dialog::{
    Actor, Command, ConfirmAction, Conversation, DateChoice, MeetingDialog, MeetsConfig,
    RecordingSender, TimeChoice,
};
use mock_gateways::{InMemoryCalendar, InMemoryLedger, StaticDirectory};
use telegram_bot_api::{BotConfig, TelegramClient, Update};

const CHAT: i64 = -100500;
const THREAD: i64 = 7;
const USER: i64 = 42;

struct Harness {
    processor: UpdateProcessor,
    sender: Arc<RecordingSender>,
    calendar: Arc<InMemoryCalendar>,
    ledger: Arc<InMemoryLedger>,
}

fn dialog(calendar: Arc<InMemoryCalendar>, ledger: Arc<InMemoryLedger>) -> MeetingDialog {
    let now = NaiveDate::from_ymd_opt(2026, 2, 5)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    MeetingDialog::new(
        calendar,
        ledger,
        Arc::new(StaticDirectory::new(vec![ManagerEntry::new("5", "Ivan", "ivan_k")])),
        Arc::new(FixedClock::at_local(Almaty, now).unwrap()),
    )
}

fn harness() -> Harness {
    let calendar = Arc::new(InMemoryCalendar::new(Almaty));
    let ledger = Arc::new(InMemoryLedger::new());
    let sender = Arc::new(RecordingSender::new());

    // Never contacted: process_update does not acknowledge callbacks.
    let client = TelegramClient::new(BotConfig::new("123:test")).unwrap();
    let config = MeetsConfig::new(CHAT).with_thread(THREAD);

    let processor = UpdateProcessor::new(
        client,
        Arc::new(dialog(calendar.clone(), ledger.clone())),
        sender.clone(),
        config,
    );

    Harness {
        processor,
        sender,
        calendar,
        ledger,
    }
}

fn topic_text(update_id: i64, text: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "message_thread_id": THREAD,
            "from": {"id": USER, "is_bot": false, "first_name": "Op", "username": "operator"},
            "chat": {"id": CHAT, "type": "supergroup"},
            "text": text
        }
    }))
    .unwrap()
}

fn press(update_id: i64, command: Command) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb{}", update_id),
            "from": {"id": USER, "is_bot": false, "first_name": "Op", "username": "operator"},
            "data": command.payload(),
            "message": {
                "message_id": 1000 + update_id,
                "message_thread_id": THREAD,
                "chat": {"id": CHAT, "type": "supergroup"}
            }
        }
    }))
    .unwrap()
}

// ============================================================================
// Routing through the processor
// ============================================================================

mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_in_topic_starts_create() {
        let h = harness();
        let result = h.processor.process_update(&topic_text(1, "/meet")).await;

        assert_eq!(result, ProcessResult::Responded { replies: 1, delivered: 1 });
        let sent = h.sender.sent();
        assert!(sent[0].text.contains("New meeting"));
        assert_eq!(sent[0].conversation, Conversation::new(CHAT, Some(THREAD)));
    }

    #[tokio::test]
    async fn test_other_topic_is_skipped() {
        let h = harness();
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 2,
            "message": {
                "message_id": 2,
                "message_thread_id": 99,
                "from": {"id": USER, "is_bot": false, "first_name": "Op"},
                "chat": {"id": CHAT, "type": "supergroup"},
                "text": "/meet"
            }
        }))
        .unwrap();

        let result = h.processor.process_update(&update).await;
        assert!(matches!(result, ProcessResult::Skipped { .. }));
        assert!(h.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_admin_gets_instruction() {
        let h = harness();
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 3,
            "message": {
                "message_id": 3,
                "message_thread_id": THREAD,
                "from": {"id": 1087968824, "is_bot": true, "first_name": "Group"},
                "sender_chat": {"id": CHAT, "type": "supergroup"},
                "chat": {"id": CHAT, "type": "supergroup"},
                "text": "/meet"
            }
        }))
        .unwrap();

        h.processor.process_update(&update).await;
        let sent = h.sender.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("anonymous"));
        assert!(h.processor.dialog().sessions().get(1087968824).await.is_none());
    }

    #[tokio::test]
    async fn test_text_without_session_is_silent() {
        let h = harness();
        let result = h.processor.process_update(&topic_text(4, "hello")).await;
        assert_eq!(result, ProcessResult::Silent);
    }

    #[tokio::test]
    async fn test_unknown_payload_is_silent() {
        let h = harness();
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 5,
            "callback_query": {
                "id": "cb5",
                "from": {"id": USER, "is_bot": false, "first_name": "Op"},
                "data": "other:thing"
            }
        }))
        .unwrap();
        assert_eq!(h.processor.process_update(&update).await, ProcessResult::Silent);
    }

    #[tokio::test]
    async fn test_announce_start_posts_to_topic() {
        let h = harness();
        assert!(h.processor.announce_start().await);
        let sent = h.sender.sent();
        assert_eq!(sent[0].conversation, Conversation::new(CHAT, Some(THREAD)));
        assert!(sent[0].keyboard.as_ref().unwrap().contains(&Command::Start));
    }
}

// ============================================================================
// Full create flow over updates
// ============================================================================

mod flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_meeting_from_updates() {
        let h = harness();
        let ivan = Command::Manager(ManagerEntry::new("5", "Ivan", "ivan_k").to_choice());
        let updates = vec![
            topic_text(1, "/meet"),
            topic_text(2, "Acme"),
            press(3, Command::Date(DateChoice::Tomorrow)),
            press(4, Command::Time(TimeChoice::Preset(NaiveTime::from_hms_opt(15, 0, 0).unwrap()))),
            press(5, ivan),
            press(6, Command::SkipComment),
            press(7, Command::Confirm(ConfirmAction::Create)),
        ];

        for update in &updates {
            h.processor.process_update(update).await;
        }

        assert_eq!(h.calendar.len(), 1);
        let row = h.ledger.rows().pop().unwrap();
        assert_eq!(row.client, "Acme");
        assert_eq!(row.date, "06.02.2026");
        assert_eq!(row.time, "15:00");
        assert_eq!(row.chat_id, CHAT.to_string());
        assert_eq!(row.thread_id, THREAD.to_string());
        assert_eq!(row.created_by_username, "operator");

        let last = h.sender.sent().pop().unwrap();
        assert!(last.text.contains("Meeting created"));
    }

    #[tokio::test]
    async fn test_dispatch_drops_anonymous_buttons() {
        let calendar = Arc::new(InMemoryCalendar::new(Almaty));
        let ledger = Arc::new(InMemoryLedger::new());
        let dialog = dialog(calendar, ledger);

        let inbound = Inbound::Button {
            callback_id: "cb".to_string(),
            actor: None,
            payload: Command::Start.payload(),
            conversation: Conversation::new(CHAT, Some(THREAD)),
        };
        assert!(dispatch(&dialog, &inbound).await.is_empty());

        let inbound = Inbound::Button {
            callback_id: "cb".to_string(),
            actor: Some(Actor::human(USER)),
            payload: Command::Start.payload(),
            conversation: Conversation::new(CHAT, Some(THREAD)),
        };
        assert_eq!(dispatch(&dialog, &inbound).await.len(), 1);
    }
}
