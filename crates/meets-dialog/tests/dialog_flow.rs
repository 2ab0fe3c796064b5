//! End-to-end dialog flows against in-memory gateways.
//!
//! Run with:
//!   cargo test -p meets-dialog --test dialog_flow

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Asia::Almaty;
use meeting_core::{
    CalendarGateway, DescriptionFields, EventTime, FixedClock, GatewayError, LedgerRow,
    ManagerEntry,
};
use meets_dialog::{
    BackTarget, Command, ConfirmAction, Conversation, CreateStep, DateChoice, EditField,
    MeetingDialog, Reply, Session, TimeChoice,
};
use mock_gateways::{CallLog, InMemoryCalendar, InMemoryLedger, Operation, StaticDirectory};

const USER: i64 = 42;

struct Harness {
    dialog: MeetingDialog,
    calendar: Arc<InMemoryCalendar>,
    ledger: Arc<InMemoryLedger>,
    directory: Arc<StaticDirectory>,
    log: CallLog,
}

fn harness() -> Harness {
    let log = CallLog::new();
    let calendar = Arc::new(InMemoryCalendar::new(Almaty).with_log(log.clone()));
    let ledger = Arc::new(InMemoryLedger::new().with_log(log.clone()));
    let directory = Arc::new(
        StaticDirectory::new(vec![ManagerEntry::new("5", "Ivan", "ivan_k")]).with_log(log.clone()),
    );
    let now = NaiveDate::from_ymd_opt(2026, 2, 5)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let clock = FixedClock::at_local(Almaty, now).unwrap();

    let dialog = MeetingDialog::new(
        calendar.clone(),
        ledger.clone(),
        directory.clone(),
        Arc::new(clock),
    );

    Harness {
        dialog,
        calendar,
        ledger,
        directory,
        log,
    }
}

fn actor() -> meets_dialog::Actor {
    meets_dialog::Actor::human(USER).with_username("operator")
}

fn conversation() -> Conversation {
    Conversation::new(-100500, Some(7))
}

fn ivan() -> Command {
    Command::Manager(ManagerEntry::new("5", "Ivan", "ivan_k").to_choice())
}

impl Harness {
    async fn text(&self, text: &str) -> Vec<Reply> {
        self.dialog.on_text(&actor(), text, conversation()).await
    }

    async fn press(&self, command: Command) -> Vec<Reply> {
        self.dialog
            .on_button(&actor(), &command.payload(), conversation())
            .await
    }

    async fn session(&self) -> Option<Session> {
        self.dialog.sessions().get(USER).await
    }

    async fn create_step(&self) -> Option<CreateStep> {
        match self.session().await {
            Some(Session::Create(session)) => Some(session.step),
            _ => None,
        }
    }

    /// Walk the create flow up to the confirmation screen.
    async fn fill_draft(&self, client: &str) {
        self.text("/meet").await;
        self.text(client).await;
        self.press(Command::Date(DateChoice::Today)).await;
        self.press(Command::Time(TimeChoice::Preset(
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        )))
        .await;
        self.press(ivan()).await;
        self.press(Command::SkipComment).await;
    }

    async fn confirm(&self) -> Vec<Reply> {
        self.press(Command::Confirm(ConfirmAction::Create)).await
    }

    /// Create a meeting end to end and return its event id.
    async fn create_meeting(&self, client: &str) -> String {
        self.fill_draft(client).await;
        self.confirm().await;
        self.ledger.rows().last().unwrap().event_id.clone()
    }

    fn writes(&self) -> Vec<Operation> {
        self.log
            .operations()
            .into_iter()
            .filter(|op| {
                matches!(
                    op,
                    Operation::CalendarCreate
                        | Operation::CalendarPatch
                        | Operation::CalendarDelete
                        | Operation::LedgerAppend
                        | Operation::LedgerPatch
                )
            })
            .collect()
    }
}

// ============================================================================
// Create flow
// ============================================================================

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_happy_path_writes_calendar_then_ledger() {
        let h = harness();
        h.fill_draft("Acme").await;
        assert_eq!(h.create_step().await, Some(CreateStep::Confirm));

        let replies = h.confirm().await;

        assert_eq!(h.writes(), vec![Operation::CalendarCreate, Operation::LedgerAppend]);
        assert!(h.session().await.is_none());

        let row = h.ledger.rows().pop().unwrap();
        assert_eq!(row.client, "Acme");
        assert_eq!(row.date, "05.02.2026");
        assert_eq!(row.time, "11:00");
        assert_eq!(row.start_iso, "2026-02-05T11:00:00+05:00");
        assert_eq!(row.end_iso, "2026-02-05T12:00:00+05:00");
        assert_eq!(row.manager_name, "Ivan");
        assert_eq!(row.manager_telegram_id, "5");
        assert_eq!(row.created_by_id, "42");
        assert_eq!(row.created_by_username, "operator");
        assert_eq!(row.chat_id, "-100500");
        assert_eq!(row.thread_id, "7");
        assert_eq!(row.created_at, "2026-02-05 09:00:00");
        assert_eq!(row.status, "created");

        let event = h.calendar.event(&row.event_id).unwrap();
        assert_eq!(event.title, "Meeting: Acme — @ivan_k");
        let fields = DescriptionFields::decode(&event.description);
        assert!(fields.is_ours());
        assert_eq!(fields.manager_id, 5);
        assert_eq!(fields.client, "Acme");
        assert_eq!(fields.comment, "");

        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.contains("Meeting created"));
        assert_eq!(replies[0].conversation, conversation());
        let keyboard = replies[0].keyboard.as_ref().unwrap();
        assert!(keyboard.contains(&Command::Edit(row.event_id.clone())));
        assert!(keyboard.contains(&Command::Delete(row.event_id.clone())));
    }

    #[tokio::test]
    async fn test_comment_text_is_kept() {
        let h = harness();
        h.text("/meet").await;
        h.text("Acme").await;
        h.press(Command::Date(DateChoice::Tomorrow)).await;
        h.press(Command::Time(TimeChoice::Custom)).await;
        h.text("09:30").await;
        h.press(ivan()).await;
        h.text("bring the contract").await;
        h.confirm().await;

        let row = h.ledger.rows().pop().unwrap();
        assert_eq!(row.date, "06.02.2026");
        assert_eq!(row.time, "09:30");
        assert_eq!(row.comment, "bring the contract");
    }

    #[tokio::test]
    async fn test_calendar_failure_leaves_ledger_untouched() {
        let h = harness();
        h.fill_draft("Acme").await;
        h.calendar.fail_next(Operation::CalendarCreate);

        let replies = h.confirm().await;

        assert!(replies[0].text.contains("Could not create"));
        assert!(h.ledger.rows().is_empty());
        assert!(h.calendar.is_empty());
        assert_eq!(h.create_step().await, Some(CreateStep::Confirm));

        // Retrying from the same session succeeds.
        h.confirm().await;
        assert_eq!(h.calendar.len(), 1);
        assert_eq!(h.ledger.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_lost_response_does_not_duplicate() {
        let h = harness();
        h.fill_draft("Acme").await;
        h.calendar.lose_next_create_response();

        let replies = h.confirm().await;
        assert!(replies[0].text.contains("Could not create"));
        assert_eq!(h.calendar.len(), 1);
        assert!(h.ledger.rows().is_empty());

        let reserved = match h.session().await {
            Some(Session::Create(session)) => session.draft.reserved_event_id.unwrap(),
            other => panic!("expected create session, got {:?}", other),
        };

        let replies = h.confirm().await;
        assert!(replies[0].text.contains("Meeting created"));
        assert_eq!(h.calendar.len(), 1);
        let rows = h.ledger.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, reserved);
        assert!(h.calendar.event(&reserved).is_some());
    }

    #[tokio::test]
    async fn test_retry_after_draft_change_syncs_calendar() {
        let h = harness();
        h.fill_draft("Acme").await;
        h.calendar.lose_next_create_response();
        h.confirm().await;

        // Rework the draft before retrying.
        h.press(Command::Confirm(ConfirmAction::Edit)).await;
        h.text("Globex").await;
        h.press(Command::Date(DateChoice::Tomorrow)).await;
        h.press(Command::Time(TimeChoice::Preset(
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        )))
        .await;
        h.press(ivan()).await;
        h.press(Command::SkipComment).await;

        let replies = h.confirm().await;
        assert!(replies[0].text.contains("Meeting created"));
        assert_eq!(h.calendar.len(), 1);

        let rows = h.ledger.rows();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.client, "Globex");
        assert_eq!(row.date, "06.02.2026");
        assert_eq!(row.time, "16:00");

        let event = h.calendar.event(&row.event_id).unwrap();
        assert_eq!(event.title, "Meeting: Globex — @ivan_k");
        let start = chrono::DateTime::parse_from_rfc3339(&row.start_iso).unwrap();
        let end = chrono::DateTime::parse_from_rfc3339(&row.end_iso).unwrap();
        assert_eq!(event.start, Some(EventTime::At(start)));
        assert_eq!(event.end, Some(EventTime::At(end)));
        assert_eq!(DescriptionFields::decode(&event.description).client, "Globex");

        let ops = h.writes();
        assert_eq!(
            &ops[ops.len() - 3..],
            &[Operation::CalendarCreate, Operation::CalendarPatch, Operation::LedgerAppend]
        );
    }

    #[tokio::test]
    async fn test_failed_sync_of_existing_event_aborts() {
        let h = harness();
        h.fill_draft("Acme").await;
        h.calendar.lose_next_create_response();
        h.confirm().await;
        h.calendar.fail_next(Operation::CalendarPatch);

        let replies = h.confirm().await;

        assert!(replies[0].text.contains("Could not create"));
        assert!(h.ledger.rows().is_empty());
        assert_eq!(h.create_step().await, Some(CreateStep::Confirm));

        h.confirm().await;
        assert_eq!(h.calendar.len(), 1);
        assert_eq!(h.ledger.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_with_incomplete_draft_stays_on_confirm() {
        let h = harness();
        h.text("/meet").await;

        // Create button from an older confirmation card.
        let replies = h.confirm().await;

        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.contains("Missing: client, date, time, manager."));
        assert!(replies[0].text.contains("Check the meeting"));
        assert_eq!(h.log.count(Operation::CalendarCreate), 0);
        assert!(h.writes().is_empty());
        assert_eq!(h.create_step().await, Some(CreateStep::Confirm));
        assert!(h.calendar.is_empty());
        assert!(h.ledger.rows().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_failure_degrades_with_warning() {
        let h = harness();
        h.fill_draft("Acme").await;
        h.ledger.fail_next(Operation::LedgerAppend);

        let replies = h.confirm().await;

        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("Meeting created"));
        assert!(replies[1].text.contains("spreadsheet was not updated"));
        assert_eq!(h.calendar.len(), 1);
        assert!(h.ledger.rows().is_empty());
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn test_back_from_time_keeps_client() {
        let h = harness();
        h.text("/meet").await;
        h.text("Acme").await;
        h.press(Command::Date(DateChoice::Today)).await;
        assert_eq!(h.create_step().await, Some(CreateStep::Time));

        let replies = h.press(Command::Back(BackTarget::Date)).await;

        assert_eq!(h.create_step().await, Some(CreateStep::Date));
        let keyboard = replies[0].keyboard.as_ref().unwrap();
        assert!(keyboard.contains(&Command::Date(DateChoice::Today)));
        match h.session().await {
            Some(Session::Create(session)) => {
                assert_eq!(session.draft.client.as_deref(), Some("Acme"))
            }
            other => panic!("expected create session, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_custom_date_reprompts() {
        let h = harness();
        h.text("/meet").await;
        h.text("Acme").await;
        h.press(Command::Date(DateChoice::Custom)).await;

        let replies = h.text("31.02").await;

        assert!(replies[0].text.starts_with("⚠️"));
        assert_eq!(h.create_step().await, Some(CreateStep::CustomDate));

        h.text("10.03").await;
        assert_eq!(h.create_step().await, Some(CreateStep::Time));
    }

    #[tokio::test]
    async fn test_empty_client_rejected() {
        let h = harness();
        h.text("/meet").await;

        let replies = h.text("   ").await;

        assert!(replies[0].text.contains("cannot be empty"));
        assert_eq!(h.create_step().await, Some(CreateStep::Client));
    }

    #[tokio::test]
    async fn test_directory_failure_shows_back_option() {
        let h = harness();
        h.text("/meet").await;
        h.text("Acme").await;
        h.press(Command::Date(DateChoice::Today)).await;
        h.directory.fail_next();

        h.press(Command::Time(TimeChoice::Custom)).await;
        assert_eq!(h.create_step().await, Some(CreateStep::CustomTime));

        let replies = h.text("14:00").await;
        assert!(replies[0].text.contains("Could not load the manager list"));
        let keyboard = replies[0].keyboard.as_ref().unwrap();
        assert!(keyboard.contains(&Command::Back(BackTarget::Time)));
    }

    #[tokio::test]
    async fn test_text_on_button_step_hints() {
        let h = harness();
        h.text("/meet").await;
        h.text("Acme").await;

        let replies = h.text("tomorrow please").await;

        assert!(replies[0].text.contains("Use the buttons"));
        assert_eq!(h.create_step().await, Some(CreateStep::Date));
    }

    #[tokio::test]
    async fn test_cancel_clears_session() {
        let h = harness();
        h.fill_draft("Acme").await;

        h.press(Command::Cancel).await;

        assert!(h.session().await.is_none());
        assert!(h.writes().is_empty());
    }

    #[tokio::test]
    async fn test_stale_button_restarts_flow() {
        let h = harness();

        let replies = h.press(Command::Date(DateChoice::Today)).await;

        assert!(replies[0].text.contains("New meeting"));
        assert_eq!(h.create_step().await, Some(CreateStep::Client));
    }
}

// ============================================================================
// Edit flow
// ============================================================================

mod edit_tests {
    use super::*;

    #[tokio::test]
    async fn test_edit_date_keeps_ledger_time() {
        let h = harness();
        let id = h.create_meeting("Acme").await;

        let replies = h.press(Command::Edit(id.clone())).await;
        assert!(replies[0].text.contains("Edit meeting"));
        h.press(Command::EditField(EditField::Date)).await;
        let replies = h.text("10.03").await;

        assert!(replies[0].text.contains("Meeting updated"));
        assert!(h.session().await.is_none());

        let row = h.ledger.row(&id).unwrap();
        assert_eq!(row.date, "10.03.2026");
        assert_eq!(row.time, "11:00");
        assert_eq!(row.start_iso, "2026-03-10T11:00:00+05:00");
        assert_eq!(row.status, "updated");

        let event = h.calendar.event(&id).unwrap();
        let expected = chrono::DateTime::parse_from_rfc3339("2026-03-10T11:00:00+05:00").unwrap();
        assert_eq!(event.start, Some(EventTime::At(expected)));
    }

    #[tokio::test]
    async fn test_edit_client_rebuilds_title_and_description() {
        let h = harness();
        let id = h.create_meeting("Acme").await;

        h.press(Command::Edit(id.clone())).await;
        h.press(Command::EditField(EditField::Client)).await;
        h.text("Globex").await;

        let event = h.calendar.event(&id).unwrap();
        assert_eq!(event.title, "Meeting: Globex — @ivan_k");
        let fields = DescriptionFields::decode(&event.description);
        assert_eq!(fields.client, "Globex");
        assert_eq!(fields.manager_name, "Ivan");
        assert_eq!(h.ledger.row(&id).unwrap().client, "Globex");
    }

    #[tokio::test]
    async fn test_edit_comment_dash_clears() {
        let h = harness();
        let id = h.create_meeting("Acme").await;

        h.press(Command::Edit(id.clone())).await;
        h.press(Command::EditField(EditField::Comment)).await;
        h.text("call first").await;
        assert_eq!(h.ledger.row(&id).unwrap().comment, "call first");

        h.press(Command::Edit(id.clone())).await;
        h.press(Command::EditField(EditField::Comment)).await;
        h.text("-").await;
        assert_eq!(h.ledger.row(&id).unwrap().comment, "");
        let fields = DescriptionFields::decode(&h.calendar.event(&id).unwrap().description);
        assert_eq!(fields.comment, "");
    }

    #[tokio::test]
    async fn test_invalid_edit_value_keeps_session() {
        let h = harness();
        let id = h.create_meeting("Acme").await;

        h.press(Command::Edit(id.clone())).await;
        h.press(Command::EditField(EditField::Time)).await;
        let replies = h.text("25:00").await;

        assert!(replies[0].text.starts_with("⚠️"));
        assert_eq!(
            h.session().await.and_then(|s| s.edited_event().map(str::to_string)),
            Some(id.clone())
        );
        assert_eq!(h.ledger.row(&id).unwrap().time, "11:00");
    }

    #[tokio::test]
    async fn test_edit_missing_row_aborts() {
        let h = harness();

        let replies = h.press(Command::Edit("nope".to_string())).await;

        assert!(replies[0].text.contains("was not found"));
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn test_edit_of_event_gone_from_calendar() {
        let h = harness();
        h.ledger.insert(LedgerRow {
            event_id: "ghost".to_string(),
            client: "Acme".to_string(),
            date: "05.02.2026".to_string(),
            time: "11:00".to_string(),
            status: "created".to_string(),
            ..Default::default()
        });

        h.press(Command::Edit("ghost".to_string())).await;
        h.press(Command::EditField(EditField::Comment)).await;
        let replies = h.text("hello").await;

        assert!(replies[0].text.contains("was not found"));
        assert!(h.session().await.is_none());
        assert_eq!(h.ledger.row("ghost").unwrap().comment, "");
        assert!(!h.writes().contains(&Operation::LedgerPatch));
    }

    #[tokio::test]
    async fn test_calendar_failure_on_edit_keeps_session() {
        let h = harness();
        let id = h.create_meeting("Acme").await;
        h.press(Command::Edit(id.clone())).await;
        h.press(Command::EditField(EditField::Time)).await;
        h.calendar.fail_next(Operation::CalendarPatch);

        let replies = h.text("15:00").await;

        assert!(replies[0].text.contains("Could not update"));
        assert!(h.session().await.is_some());
        assert_eq!(h.ledger.row(&id).unwrap().time, "11:00");

        h.text("15:00").await;
        assert_eq!(h.ledger.row(&id).unwrap().time, "15:00");
    }

    #[tokio::test]
    async fn test_field_button_without_session_expired() {
        let h = harness();

        let replies = h.press(Command::EditField(EditField::Date)).await;

        assert!(replies[0].text.contains("expired"));
    }
}

// ============================================================================
// Delete and routing details
// ============================================================================

mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_marks_row_canceled() {
        let h = harness();
        let id = h.create_meeting("Acme").await;

        let replies = h.press(Command::Delete(id.clone())).await;

        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.contains("deleted"));
        assert!(h.calendar.event(&id).is_none());
        assert_eq!(h.ledger.row(&id).unwrap().status, "canceled");
    }

    #[tokio::test]
    async fn test_delete_with_ledger_failure_still_succeeds() {
        let h = harness();
        let id = h.create_meeting("Acme").await;
        h.ledger.fail_next(Operation::LedgerPatch);

        let replies = h.press(Command::Delete(id.clone())).await;

        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("deleted"));
        assert!(replies[1].text.contains("spreadsheet was not updated"));
        assert_eq!(h.ledger.row(&id).unwrap().status, "created");

        let again = h.calendar.delete(&id).await;
        assert!(matches!(again, Err(GatewayError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_failure_reported() {
        let h = harness();
        let id = h.create_meeting("Acme").await;
        h.calendar.fail_next(Operation::CalendarDelete);

        let replies = h.press(Command::Delete(id.clone())).await;

        assert!(replies[0].text.contains("Could not delete"));
        assert!(h.calendar.event(&id).is_some());
        assert_eq!(h.ledger.row(&id).unwrap().status, "created");
    }

    #[tokio::test]
    async fn test_deleted_card_buttons() {
        let h = harness();
        let id = h.create_meeting("Acme").await;
        let replies = h.press(Command::Delete(id)).await;
        let keyboard = replies[0].keyboard.clone().unwrap();
        assert!(keyboard.contains(&Command::DeletedNotice));

        let replies = h.press(Command::DeletedNotice).await;
        assert!(replies[0].text.contains("already deleted"));
        let replies = h.dialog.on_button(&actor(), "meet:deleted:delete", conversation()).await;
        assert!(replies[0].text.contains("already deleted"));
    }

    #[tokio::test]
    async fn test_malformed_payload_ignored() {
        let h = harness();

        for payload in ["garbage", "meet:time:25:99", "meet:back:nowhere", "meet:edit:"] {
            let replies = h.dialog.on_button(&actor(), payload, conversation()).await;
            assert!(replies.is_empty(), "payload {:?} produced replies", payload);
        }
        assert!(h.session().await.is_none());
        assert!(h.log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_text_without_session_ignored() {
        let h = harness();
        assert!(h.text("hello").await.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let h = harness();
        h.text("/meet").await;

        let other = meets_dialog::Actor::human(99);
        let replies = h.dialog.on_text(&other, "Acme", conversation()).await;

        assert!(replies.is_empty());
        assert_eq!(h.create_step().await, Some(CreateStep::Client));
    }
}
