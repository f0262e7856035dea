use chrono::Datelike;
use shared::{
    domain::{
        ActionId, ActionStatus, CorrectiveAction, NcId, NcStatus, NonConformity, Notification,
        NotificationId, NotificationKind, User,
    },
    error::{ApiError, ErrorCode},
    protocol::{ActionDraft, ActionPatch, NcDraft, NcPatch},
};
use tracing::{debug, info, warn};

use crate::Tracker;

impl Tracker {
    /// Declares a new non-conformity and places it at the head of the
    /// collection. Drafts are expected to have passed [`NcDraft::validate`].
    pub fn create(&mut self, draft: NcDraft, reporter: &User) -> NonConformity {
        let today = self.today();
        let assignee_name = draft.assignee_id.map(|id| self.users.display_name(id));
        let record = NonConformity {
            id: NcId::generate(),
            reference: self.next_reference(),
            title: draft.title,
            description: draft.description,
            kind: draft.kind.unwrap_or_default(),
            gravity: draft.gravity.unwrap_or_default(),
            status: NcStatus::Open,
            department: draft.department,
            post: draft.post,
            reporter_id: reporter.id,
            reporter_name: reporter.display_name(),
            assignee_id: draft.assignee_id,
            assignee_name,
            detection_date: draft.detection_date.unwrap_or(today),
            declaration_date: today,
            closure_date: None,
            root_cause: draft.root_cause,
            impact_description: draft.impact_description,
            attachments: draft.attachments,
            actions: Vec::new(),
        };

        info!(
            nc_id = %record.id,
            reference = %record.reference,
            gravity = %record.gravity,
            "non-conformity declared"
        );
        self.notify(
            NotificationKind::NewNc,
            format!("{} declared", record.reference),
            record.title.clone(),
            Some(record.id),
        );
        if let Some(name) = record.assignee_name.as_deref() {
            self.notify(
                NotificationKind::NcAssigned,
                format!("{} assigned", record.reference),
                format!("assigned to {name}"),
                Some(record.id),
            );
        }

        self.records.insert(0, record.clone());
        record
    }

    /// Merges the `Some` fields of `patch` into the record.
    pub fn update(&mut self, id: NcId, patch: NcPatch) -> Result<NonConformity, ApiError> {
        let assignee_name = patch.assignee_id.map(|uid| self.users.display_name(uid));
        let record = self.record_mut(id)?;

        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(kind) = patch.kind {
            record.kind = kind;
        }
        if let Some(gravity) = patch.gravity {
            record.gravity = gravity;
        }
        if let Some(department) = patch.department {
            record.department = department;
        }
        if let Some(post) = patch.post {
            record.post = post;
        }
        if let Some(detection_date) = patch.detection_date {
            record.detection_date = detection_date;
        }
        if let Some(root_cause) = patch.root_cause {
            record.root_cause = Some(root_cause);
        }
        if let Some(impact) = patch.impact_description {
            record.impact_description = Some(impact);
        }
        if let Some(attachments) = patch.attachments {
            record.attachments = attachments;
        }

        let reassigned = patch
            .assignee_id
            .is_some_and(|uid| record.assignee_id != Some(uid));
        if let Some(uid) = patch.assignee_id {
            record.assignee_id = Some(uid);
            record.assignee_name = assignee_name;
        }

        let snapshot = record.clone();
        info!(nc_id = %id, reference = %snapshot.reference, "non-conformity updated");
        if reassigned {
            self.notify(
                NotificationKind::NcAssigned,
                format!("{} assigned", snapshot.reference),
                format!(
                    "assigned to {}",
                    snapshot.assignee_name.as_deref().unwrap_or_default()
                ),
                Some(id),
            );
        }
        Ok(snapshot)
    }

    /// Removes the record and returns it. Callers holding a selection on it
    /// must drop that selection themselves.
    pub fn delete(&mut self, id: NcId) -> Result<NonConformity, ApiError> {
        let position = self
            .records
            .iter()
            .position(|nc| nc.id == id)
            .ok_or_else(nc_not_found)?;
        let removed = self.records.remove(position);
        info!(nc_id = %id, reference = %removed.reference, "non-conformity deleted");
        Ok(removed)
    }

    /// Moves the record to `new_status`. The closure date is stamped when the
    /// target is closed and cleared otherwise. Targets outside the workflow
    /// sequence are accepted as an administrative override.
    pub fn advance_status(
        &mut self,
        id: NcId,
        new_status: NcStatus,
    ) -> Result<NonConformity, ApiError> {
        let today = self.today();
        let record = self.record_mut(id)?;
        let previous = record.status;

        if previous != new_status && previous.next() != Some(new_status) {
            warn!(
                nc_id = %id,
                from = %previous,
                to = %new_status,
                "status change outside the workflow sequence"
            );
        }

        record.status = new_status;
        record.closure_date = new_status.is_closed().then_some(today);
        let snapshot = record.clone();
        info!(nc_id = %id, from = %previous, to = %new_status, "status changed");

        if new_status.is_closed() && !previous.is_closed() {
            self.notify(
                NotificationKind::NcClosed,
                format!("{} closed", snapshot.reference),
                snapshot.title.clone(),
                Some(id),
            );
        }
        Ok(snapshot)
    }

    /// Appends a not-started corrective action to the record's action list.
    pub fn add_action(
        &mut self,
        nc_id: NcId,
        draft: ActionDraft,
    ) -> Result<CorrectiveAction, ApiError> {
        let assignee_name = self.users.display_name(draft.assignee_id);
        let record = self.record_mut(nc_id)?;
        let action = CorrectiveAction {
            id: ActionId::generate(),
            nc_id,
            description: draft.description,
            assignee_id: draft.assignee_id,
            assignee_name,
            due_date: draft.due_date,
            completion_date: None,
            status: ActionStatus::NotStarted,
            comment: draft.comment,
            effectiveness: None,
        };
        record.actions.push(action.clone());
        info!(nc_id = %nc_id, action_id = %action.id, due = %action.due_date, "corrective action added");
        Ok(action)
    }

    /// Locates the action across every record and merges `patch`. Moving to
    /// done stamps today's date as completion date.
    pub fn update_action(
        &mut self,
        action_id: ActionId,
        patch: ActionPatch,
    ) -> Result<CorrectiveAction, ApiError> {
        let today = self.today();
        let assignee_name = patch.assignee_id.map(|uid| self.users.display_name(uid));
        let action = self
            .records
            .iter_mut()
            .flat_map(|nc| nc.actions.iter_mut())
            .find(|action| action.id == action_id)
            .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "corrective action not found"))?;

        if let Some(description) = patch.description {
            action.description = description;
        }
        if let (Some(uid), Some(name)) = (patch.assignee_id, assignee_name) {
            action.assignee_id = uid;
            action.assignee_name = name;
        }
        if let Some(due_date) = patch.due_date {
            action.due_date = due_date;
        }
        if let Some(comment) = patch.comment {
            action.comment = Some(comment);
        }
        if let Some(effectiveness) = patch.effectiveness {
            action.effectiveness = Some(effectiveness);
        }
        if let Some(status) = patch.status {
            action.status = status;
            if status == ActionStatus::Done {
                action.completion_date = Some(today);
            }
        }

        info!(action_id = %action_id, status = %action.status, "corrective action updated");
        Ok(action.clone())
    }

    /// Flags every open action whose due date has passed as overdue and
    /// returns how many were flagged.
    pub fn refresh_overdue(&mut self) -> usize {
        let today = self.today();
        let mut flagged = Vec::new();
        for record in &mut self.records {
            for action in &mut record.actions {
                let pending = matches!(
                    action.status,
                    ActionStatus::NotStarted | ActionStatus::InProgress
                );
                if pending && action.due_date < today {
                    action.status = ActionStatus::Overdue;
                    flagged.push((record.id, record.reference.clone(), action.description.clone()));
                }
            }
        }

        for (nc_id, reference, description) in &flagged {
            self.notify(
                NotificationKind::ActionDue,
                format!("{reference}: action overdue"),
                description.clone(),
                Some(*nc_id),
            );
        }
        if !flagged.is_empty() {
            info!(count = flagged.len(), "corrective actions flagged overdue");
        }
        flagged.len()
    }

    /// Adds a pre-built record at the tail of the collection, e.g. when
    /// loading a data set that is already ordered most-recent-first.
    pub fn import(&mut self, record: NonConformity) {
        debug!(nc_id = %record.id, reference = %record.reference, "record imported");
        self.records.push(record);
    }

    pub fn mark_notification_read(&mut self, id: NotificationId) -> Result<(), ApiError> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "notification not found"))?;
        notification.read = true;
        Ok(())
    }

    pub fn unread_notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.read)
    }

    /// `{prefix}-{year}-{n:03}` with `n` starting at collection size + 1 and
    /// moving forward past references already taken.
    fn next_reference(&self) -> String {
        let year = self.today().year();
        let mut sequence = self.records.len() + 1;
        loop {
            let candidate = format!("{}-{year}-{sequence:03}", self.settings.reference_prefix);
            if !self.records.iter().any(|nc| nc.reference == candidate) {
                return candidate;
            }
            sequence += 1;
        }
    }

    fn record_mut(&mut self, id: NcId) -> Result<&mut NonConformity, ApiError> {
        self.records
            .iter_mut()
            .find(|nc| nc.id == id)
            .ok_or_else(nc_not_found)
    }

    fn notify(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<NcId>,
    ) {
        self.notifications.insert(
            0,
            Notification {
                id: NotificationId::generate(),
                kind,
                title: title.into(),
                message: message.into(),
                created_at: self.clock.now(),
                read: false,
                link,
            },
        );
    }
}

fn nc_not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "non-conformity not found")
}
