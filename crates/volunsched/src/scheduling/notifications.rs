use serde::{Deserialize, Serialize};

use super::domain::{Shift, ShiftId, Volunteer, VolunteerId};

/// Outbound message hook (WhatsApp, SMS, or a log sink).
///
/// Invoked only after a state change has been committed. Failures are reported back
/// to the caller, which logs them; they never undo the change.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    Confirmed,
    Cancelled,
    Reminder,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub volunteer_id: VolunteerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<ShiftId>,
    pub event: NotificationEvent,
    pub phone: String,
    pub message: String,
}

impl Notification {
    pub fn confirmation(volunteer: &Volunteer, shift: &Shift) -> Self {
        let message = format!(
            "Confirmed! You're signed up for {} shift on {}.",
            shift.shift_type,
            shift.date.format("%A, %B %d")
        );
        Self::for_shift(volunteer, shift, NotificationEvent::Confirmed, message)
    }

    pub fn cancellation(volunteer: &Volunteer, shift: &Shift) -> Self {
        let message = format!(
            "Your signup for {} shift on {} has been cancelled.",
            shift.shift_type,
            shift.date.format("%A, %B %d")
        );
        Self::for_shift(volunteer, shift, NotificationEvent::Cancelled, message)
    }

    pub fn reminder(volunteer: &Volunteer, shift: &Shift) -> Self {
        let message = format!(
            "Reminder: You have a {} shift tomorrow ({}). See you there!",
            shift.shift_type,
            shift.date.format("%B %d")
        );
        Self::for_shift(volunteer, shift, NotificationEvent::Reminder, message)
    }

    pub fn custom(volunteer: &Volunteer, message: impl Into<String>) -> Self {
        Self {
            volunteer_id: volunteer.id,
            shift_id: None,
            event: NotificationEvent::Custom,
            phone: volunteer.phone.clone(),
            message: message.into(),
        }
    }

    fn for_shift(
        volunteer: &Volunteer,
        shift: &Shift,
        event: NotificationEvent,
        message: String,
    ) -> Self {
        Self {
            volunteer_id: volunteer.id,
            shift_id: Some(shift.id),
            event,
            phone: volunteer.phone.clone(),
            message,
        }
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}
