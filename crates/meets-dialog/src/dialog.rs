//! The meeting dialog state machine.

use std::sync::Arc;

use chrono::Datelike;
use meeting_core::{
    format_date, format_time, meeting_title, parse_date, parse_time, patch_meeting_event,
    CalendarGateway, Clock, DescriptionFields, DescriptionUpdate, EventPatch, GatewayError,
    LedgerGateway, LedgerPatch, LedgerRow, ManagerDirectory, MeetingSchedule, MeetingStatus,
    NewEvent,
};
use tracing::{debug, error, info, warn};

use crate::command::{is_start_trigger, Command, ConfirmAction, DateChoice, EditField, TimeChoice};
use crate::identity::Actor;
use crate::render::{self, Conversation, Prompt, Reply};
use crate::saga::{calendar_then_ledger, require_row, WriteOutcome};
use crate::session::{
    CreateSession, CreateStep, EditSession, EditStep, InMemorySessionStore, MeetingDraft, Session,
    SessionStore, UserLocks,
};

/// Drives meeting creation, editing and deletion for every user.
///
/// Each entry point holds the acting user's lock for the whole
/// read-modify-write of their session, and returns the replies to deliver.
pub struct MeetingDialog {
    calendar: Arc<dyn CalendarGateway>,
    ledger: Arc<dyn LedgerGateway>,
    directory: Arc<dyn ManagerDirectory>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    locks: UserLocks,
}

impl MeetingDialog {
    /// Create a dialog with an in-memory session store.
    pub fn new(
        calendar: Arc<dyn CalendarGateway>,
        ledger: Arc<dyn LedgerGateway>,
        directory: Arc<dyn ManagerDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            ledger,
            directory,
            sessions: Arc::new(InMemorySessionStore::new()),
            clock,
            locks: UserLocks::new(),
        }
    }

    /// Use a different session store.
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    /// Handle free text from a resolved user.
    pub async fn on_text(&self, actor: &Actor, text: &str, conversation: Conversation) -> Vec<Reply> {
        let _guard = self.locks.acquire(actor.id).await;
        let text = text.trim();

        let prompts = if is_start_trigger(text) {
            self.start_create(actor).await
        } else {
            match self.sessions.get(actor.id).await {
                None => Vec::new(),
                Some(Session::Create(session)) => self.create_text(actor, session, text).await,
                Some(Session::Edit(session)) => self.edit_text(actor, session, text).await,
            }
        };

        wrap(conversation, prompts)
    }

    /// Handle a button press carrying `payload`. Unknown payloads are ignored.
    pub async fn on_button(
        &self,
        actor: &Actor,
        payload: &str,
        conversation: Conversation,
    ) -> Vec<Reply> {
        match Command::parse(payload) {
            Some(command) => self.on_command(actor, command, conversation).await,
            None => {
                debug!("Ignoring unknown button payload {:?}", payload);
                Vec::new()
            }
        }
    }

    /// Handle an already parsed command.
    pub async fn on_command(
        &self,
        actor: &Actor,
        command: Command,
        conversation: Conversation,
    ) -> Vec<Reply> {
        let _guard = self.locks.acquire(actor.id).await;

        let prompts = match command {
            Command::Start => self.start_create(actor).await,
            Command::Cancel => {
                self.sessions.clear(actor.id).await;
                vec![render::cancelled()]
            }
            Command::DeletedNotice => vec![render::already_deleted()],
            Command::Edit(event_id) => self.open_edit(actor, &event_id).await,
            Command::Delete(event_id) => self.delete(actor, &event_id).await,
            Command::EditField(field) => self.choose_edit_field(actor, field).await,
            other => match self.sessions.get(actor.id).await {
                Some(Session::Create(session)) => {
                    self.create_button(actor, session, other, conversation).await
                }
                // Stale create-flow keyboard without a create session: start over.
                _ => self.start_create(actor).await,
            },
        };

        wrap(conversation, prompts)
    }

    async fn save(&self, actor: &Actor, session: CreateSession) {
        self.sessions.set(actor.id, Session::Create(session)).await;
    }

    async fn start_create(&self, actor: &Actor) -> Vec<Prompt> {
        let session = CreateSession::new();
        let prompt = render::ask_client(&session.draft);
        self.save(actor, session).await;
        info!("User {} started a new meeting", actor.id);
        vec![prompt]
    }

    // ------------------------------------------------------------------
    // Create flow
    // ------------------------------------------------------------------

    async fn create_text(&self, actor: &Actor, mut session: CreateSession, text: &str) -> Vec<Prompt> {
        match session.step {
            CreateStep::Client => {
                if text.is_empty() {
                    return vec![render::empty_client()];
                }
                session.draft.client = Some(text.to_string());
                self.go_to(actor, session, CreateStep::Date).await
            }
            CreateStep::CustomDate => match parse_date(text, self.clock.today().year()) {
                Ok(date) => {
                    session.draft.date = Some(date);
                    self.go_to(actor, session, CreateStep::Time).await
                }
                Err(e) => vec![render::ask_custom_date(Some(&e.to_string()))],
            },
            CreateStep::CustomTime => match parse_time(text) {
                Ok(time) => {
                    session.draft.time = Some(time);
                    self.go_to(actor, session, CreateStep::Manager).await
                }
                Err(e) => vec![render::ask_custom_time(Some(&e.to_string()))],
            },
            CreateStep::Comment => {
                session.draft.comment = Some(text.to_string());
                self.go_to(actor, session, CreateStep::Confirm).await
            }
            CreateStep::Date | CreateStep::Time | CreateStep::Manager | CreateStep::Confirm => {
                vec![render::use_buttons()]
            }
        }
    }

    async fn create_button(
        &self,
        actor: &Actor,
        mut session: CreateSession,
        command: Command,
        conversation: Conversation,
    ) -> Vec<Prompt> {
        match command {
            Command::Date(DateChoice::Today) => {
                session.draft.date = Some(self.clock.today());
                self.go_to(actor, session, CreateStep::Time).await
            }
            Command::Date(DateChoice::Tomorrow) => {
                session.draft.date = self.clock.today().succ_opt();
                self.go_to(actor, session, CreateStep::Time).await
            }
            Command::Date(DateChoice::Custom) => {
                self.go_to(actor, session, CreateStep::CustomDate).await
            }
            Command::Time(TimeChoice::Preset(time)) => {
                session.draft.time = Some(time);
                self.go_to(actor, session, CreateStep::Manager).await
            }
            Command::Time(TimeChoice::Custom) => {
                self.go_to(actor, session, CreateStep::CustomTime).await
            }
            Command::Back(target) => self.go_to(actor, session, target.into()).await,
            Command::Manager(choice) => {
                session.draft.manager = Some(choice);
                self.go_to(actor, session, CreateStep::Comment).await
            }
            Command::SkipComment => {
                session.draft.comment = Some(String::new());
                self.go_to(actor, session, CreateStep::Confirm).await
            }
            Command::Confirm(ConfirmAction::Edit) => {
                self.go_to(actor, session, CreateStep::Client).await
            }
            Command::Confirm(ConfirmAction::Create) => {
                self.create(actor, session, conversation).await
            }
            Command::Start
            | Command::Cancel
            | Command::Edit(_)
            | Command::Delete(_)
            | Command::EditField(_)
            | Command::DeletedNotice => Vec::new(),
        }
    }

    /// Move to `step`, store the session and render its prompt.
    async fn go_to(&self, actor: &Actor, mut session: CreateSession, step: CreateStep) -> Vec<Prompt> {
        session.step = step;
        let prompt = match step {
            CreateStep::Client => render::ask_client(&session.draft),
            CreateStep::Date => render::ask_date(self.clock.today()),
            CreateStep::CustomDate => render::ask_custom_date(None),
            CreateStep::Time => render::ask_time(),
            CreateStep::CustomTime => render::ask_custom_time(None),
            CreateStep::Manager => self.manager_prompt().await,
            CreateStep::Comment => render::ask_comment(),
            CreateStep::Confirm => render::confirm(&session.draft, None),
        };
        self.save(actor, session).await;
        vec![prompt]
    }

    async fn manager_prompt(&self) -> Prompt {
        match self.directory.list().await {
            Ok(managers) if managers.is_empty() => render::no_managers(),
            Ok(managers) => render::ask_manager(&managers),
            Err(e) => {
                warn!("Failed to load managers: {}", e);
                render::managers_unavailable(&e.to_string())
            }
        }
    }

    /// Terminal create: calendar event first, then the ledger row.
    async fn create(
        &self,
        actor: &Actor,
        mut session: CreateSession,
        conversation: Conversation,
    ) -> Vec<Prompt> {
        session.step = CreateStep::Confirm;

        let draft = session.draft.clone();
        let (client, date, time, manager) = match (
            draft.client.as_deref().filter(|c| !c.trim().is_empty()),
            draft.date,
            draft.time,
            draft.manager.as_ref().filter(|m| !m.name.trim().is_empty()),
        ) {
            (Some(client), Some(date), Some(time), Some(manager)) => (client, date, time, manager),
            _ => {
                let prompt = render::confirm(&draft, Some(&missing_fields(&draft)));
                self.save(actor, session).await;
                return vec![prompt];
            }
        };

        let tz = self.clock.timezone();
        let schedule = match MeetingSchedule::at(date, time, tz) {
            Ok(schedule) => schedule,
            Err(e) => {
                let prompt = render::confirm(&draft, Some(&e.to_string()));
                self.save(actor, session).await;
                return vec![prompt];
            }
        };

        // Reserve the event id before calling out so a retry reuses it.
        let reserved_id = session
            .draft
            .reserved_event_id
            .get_or_insert_with(new_event_id)
            .clone();
        self.save(actor, session.clone()).await;

        let comment = draft.comment.clone().unwrap_or_default();
        let new_event = NewEvent {
            id: Some(reserved_id.clone()),
            title: meeting_title(client, manager.pretty()),
            start: schedule.start,
            end: schedule.end,
            description: DescriptionFields::new(
                manager.telegram_id,
                manager.name.clone(),
                client,
                comment.clone(),
            )
            .encode(),
        };
        let row = LedgerRow {
            created_at: self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string(),
            created_by_id: actor.id.to_string(),
            created_by_username: actor.username.clone().unwrap_or_default(),
            chat_id: conversation.chat_id.to_string(),
            thread_id: conversation
                .thread_id
                .map(|t| t.to_string())
                .unwrap_or_default(),
            client: client.to_string(),
            date: format_date(date),
            time: format_time(time),
            start_iso: schedule.start.to_rfc3339(),
            end_iso: schedule.end.to_rfc3339(),
            manager_name: manager.name.clone(),
            manager_username: manager.token.handle().unwrap_or_default().to_string(),
            manager_telegram_id: manager.telegram_id.to_string(),
            comment,
            event_id: String::new(),
            status: MeetingStatus::Created.as_str().to_string(),
        };

        // An earlier attempt may have landed with a since-edited draft.
        let overwrite = EventPatch {
            title: Some(new_event.title.clone()),
            start: Some(new_event.start),
            end: Some(new_event.end),
            description: Some(new_event.description.clone()),
        };

        let calendar = self.calendar.as_ref();
        let ledger = self.ledger.as_ref();
        let outcome = calendar_then_ledger(
            async {
                match calendar.create(new_event).await {
                    Ok(id) => Ok(id),
                    Err(GatewayError::AlreadyExists { .. }) => {
                        info!("Event {} already in calendar, syncing it to the draft", reserved_id);
                        calendar
                            .patch(&reserved_id, overwrite)
                            .await
                            .map(|()| reserved_id.clone())
                    }
                    Err(e) => Err(e),
                }
            },
            |event_id| async move {
                let row = LedgerRow { event_id, ..row };
                ledger.append(&row).await
            },
        )
        .await;

        match outcome {
            WriteOutcome::Aborted(e) => {
                error!("Calendar create failed for user {}: {}", actor.id, e);
                vec![render::create_failed(&e.to_string())]
            }
            WriteOutcome::Committed(event_id) => {
                self.sessions.clear(actor.id).await;
                info!("Meeting {} created by user {}", event_id, actor.id);
                vec![render::created(&draft, &event_id)]
            }
            WriteOutcome::Degraded(event_id, e) => {
                self.sessions.clear(actor.id).await;
                info!("Meeting {} created by user {} without ledger row", event_id, actor.id);
                vec![
                    render::created(&draft, &event_id),
                    render::ledger_warning(&e.to_string()),
                ]
            }
        }
    }

    // ------------------------------------------------------------------
    // Edit flow
    // ------------------------------------------------------------------

    async fn open_edit(&self, actor: &Actor, event_id: &str) -> Vec<Prompt> {
        match self.ledger.find_by_event_id(event_id).await {
            Ok(Some(row)) => {
                self.sessions
                    .set(
                        actor.id,
                        Session::Edit(EditSession {
                            event_id: event_id.to_string(),
                            step: EditStep::Menu,
                        }),
                    )
                    .await;
                vec![render::edit_menu(&row)]
            }
            Ok(None) => {
                self.sessions.clear(actor.id).await;
                vec![render::edit_target_missing(event_id)]
            }
            Err(e) => {
                warn!("Failed to read ledger row {}: {}", event_id, e);
                self.sessions.clear(actor.id).await;
                vec![render::ledger_read_failed(&e.to_string())]
            }
        }
    }

    async fn choose_edit_field(&self, actor: &Actor, field: EditField) -> Vec<Prompt> {
        match self.sessions.get(actor.id).await {
            Some(Session::Edit(mut session)) => {
                session.step = EditStep::Field(field);
                self.sessions.set(actor.id, Session::Edit(session)).await;
                vec![render::ask_edit_field(field, None)]
            }
            _ => vec![render::edit_session_expired()],
        }
    }

    async fn edit_text(&self, actor: &Actor, session: EditSession, text: &str) -> Vec<Prompt> {
        let field = match session.step {
            EditStep::Menu => return vec![render::use_buttons()],
            EditStep::Field(field) => field,
        };

        // Always edit against the current row, not what the menu showed.
        let row = match self.ledger.find_by_event_id(&session.event_id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.sessions.clear(actor.id).await;
                return vec![render::edit_target_missing(&session.event_id)];
            }
            Err(e) => {
                warn!("Failed to read ledger row {}: {}", session.event_id, e);
                return vec![render::ledger_read_failed(&e.to_string())];
            }
        };

        let edit = match self.plan_edit(field, &row, text) {
            Ok(edit) => edit,
            Err(message) => return vec![render::ask_edit_field(field, Some(&message))],
        };

        let event_id = session.event_id.as_str();
        let calendar = self.calendar.as_ref();
        let ledger = self.ledger.as_ref();
        let ledger_patch = edit.ledger.clone();
        let outcome = calendar_then_ledger(
            patch_meeting_event(calendar, event_id, edit.event, edit.description),
            |()| async move {
                let found = ledger.patch_by_event_id(event_id, &ledger_patch).await?;
                require_row(found, event_id)
            },
        )
        .await;

        let mut updated = row;
        updated.apply(&edit.ledger);

        match outcome {
            WriteOutcome::Aborted(e) if e.is_not_found() => {
                self.sessions.clear(actor.id).await;
                vec![render::edit_target_missing(event_id)]
            }
            WriteOutcome::Aborted(e) => {
                error!("Calendar update of {} failed: {}", event_id, e);
                vec![render::update_failed(&e.to_string())]
            }
            WriteOutcome::Committed(()) => {
                self.sessions.clear(actor.id).await;
                info!("Meeting {} {:?} updated by user {}", event_id, field, actor.id);
                vec![render::updated(&updated)]
            }
            WriteOutcome::Degraded((), e) => {
                self.sessions.clear(actor.id).await;
                vec![render::updated(&updated), render::ledger_warning(&e.to_string())]
            }
        }
    }

    /// Validate an edit and compute the calendar and ledger changes.
    fn plan_edit(&self, field: EditField, row: &LedgerRow, text: &str) -> Result<PlannedEdit, String> {
        let year = self.clock.today().year();
        let tz = self.clock.timezone();
        let status = LedgerPatch::new().status(MeetingStatus::Updated);

        match field {
            EditField::Date | EditField::Time => {
                let (date, time) = if field == EditField::Date {
                    let date = parse_date(text, year).map_err(|e| e.to_string())?;
                    let time = parse_time(&row.time)
                        .map_err(|_| "The meeting has no valid time in the spreadsheet.".to_string())?;
                    (date, time)
                } else {
                    let time = parse_time(text).map_err(|e| e.to_string())?;
                    let date = parse_date(&row.date, year)
                        .map_err(|_| "The meeting has no valid date in the spreadsheet.".to_string())?;
                    (date, time)
                };
                let schedule = MeetingSchedule::at(date, time, tz).map_err(|e| e.to_string())?;

                Ok(PlannedEdit {
                    event: EventPatch {
                        start: Some(schedule.start),
                        end: Some(schedule.end),
                        ..Default::default()
                    },
                    description: DescriptionUpdate::default(),
                    ledger: status
                        .set("date", format_date(date))
                        .set("time", format_time(time))
                        .set("start_iso", schedule.start.to_rfc3339())
                        .set("end_iso", schedule.end.to_rfc3339()),
                })
            }
            EditField::Client => {
                if text.is_empty() {
                    return Err("The client name cannot be empty.".to_string());
                }
                Ok(PlannedEdit {
                    event: EventPatch {
                        title: Some(meeting_title(text, &manager_label(row))),
                        ..Default::default()
                    },
                    description: DescriptionUpdate {
                        client: Some(text.to_string()),
                        ..Default::default()
                    },
                    ledger: status.set("client", text),
                })
            }
            EditField::Comment => {
                let comment = if text == "-" { "" } else { text };
                Ok(PlannedEdit {
                    event: EventPatch::default(),
                    description: DescriptionUpdate {
                        comment: Some(comment.to_string()),
                        ..Default::default()
                    },
                    ledger: status.set("comment", comment),
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    async fn delete(&self, actor: &Actor, event_id: &str) -> Vec<Prompt> {
        let calendar = self.calendar.as_ref();
        let ledger = self.ledger.as_ref();
        let outcome = calendar_then_ledger(calendar.delete(event_id), |()| async move {
            let patch = LedgerPatch::new().status(MeetingStatus::Canceled);
            let found = ledger.patch_by_event_id(event_id, &patch).await?;
            require_row(found, event_id)
        })
        .await;

        let warning = match outcome {
            WriteOutcome::Aborted(e) => {
                error!("Calendar delete of {} failed: {}", event_id, e);
                return vec![render::delete_failed(&e.to_string())];
            }
            WriteOutcome::Committed(()) => None,
            WriteOutcome::Degraded((), e) => Some(render::ledger_warning(&e.to_string())),
        };

        if let Some(session) = self.sessions.get(actor.id).await {
            if session.edited_event() == Some(event_id) {
                self.sessions.clear(actor.id).await;
            }
        }
        info!("Meeting {} deleted by user {}", event_id, actor.id);

        let mut prompts = vec![render::deleted(event_id)];
        prompts.extend(warning);
        prompts
    }
}

/// Calendar and ledger changes for one field edit.
struct PlannedEdit {
    event: EventPatch,
    description: DescriptionUpdate,
    ledger: LedgerPatch,
}

fn wrap(conversation: Conversation, prompts: Vec<Prompt>) -> Vec<Reply> {
    prompts
        .into_iter()
        .map(|prompt| Reply::new(conversation, prompt))
        .collect()
}

/// Manager label for titles: the handle when the row has one, else the name.
fn manager_label(row: &LedgerRow) -> String {
    let handle = row.manager_username.trim();
    if handle.is_empty() {
        row.manager_name.trim().to_string()
    } else if handle.starts_with('@') {
        handle.to_string()
    } else {
        format!("@{}", handle)
    }
}

fn missing_fields(draft: &MeetingDraft) -> String {
    let mut missing = Vec::new();
    if draft.client.as_deref().map_or(true, |c| c.trim().is_empty()) {
        missing.push("client");
    }
    if draft.date.is_none() {
        missing.push("date");
    }
    if draft.time.is_none() {
        missing.push("time");
    }
    if draft.manager.as_ref().map_or(true, |m| m.name.trim().is_empty()) {
        missing.push("manager");
    }
    format!("Missing: {}. Press Change to fill them in.", missing.join(", "))
}

/// Fresh client-side calendar id (lowercase hex, valid base32hex).
fn new_event_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
