//! Outbound email seam.
//!
//! SMTP transport is an external collaborator; the application only renders
//! messages and hands them to a [`Mailer`]. The production binding writes the
//! rendered message to the log (the same console path the system uses when no
//! transport is configured). Tests swap in [`RecordingMailer`].

use std::sync::Mutex;

use crate::models::Employee;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), String>;
}

/// Logs rendered messages instead of delivering them.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        info!(
            "[mailer] to={} subject={:?}\n{}",
            email.to, email.subject, email.body
        );
        Ok(())
    }
}

/// Captures every send for later inspection; addresses listed in
/// `fail_for` simulate transport failures.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail_for: Mutex<Vec<String>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        if self
            .fail_for
            .lock()
            .unwrap()
            .iter()
            .any(|addr| addr == &email.to)
        {
            return Err(format!("simulated delivery failure to {}", email.to));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

impl RecordingMailer {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

/// Renders the technical-onboarding reminder for one employee.
pub fn render_onboarding_reminder(employee: &Employee, to: &str) -> OutgoingEmail {
    let date = employee
        .technical_onboarding_date
        .map(|d| d.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| "not scheduled".to_string());

    let mut body = format!(
        "Technical onboarding reminder\n\
         \n\
         The technical onboarding session for the following employee is coming up:\n\
         \n\
         Name: {}\n\
         Email: {}\n\
         Scheduled date: {}\n\
         Type: {}\n\
         Position: {}\n\
         Department: {}\n",
        employee.full_name,
        employee.email,
        date,
        employee
            .technical_onboarding_type
            .as_deref()
            .unwrap_or("not specified"),
        employee.position.as_deref().unwrap_or("not specified"),
        employee.department.as_deref().unwrap_or("not specified"),
    );

    if let Some(notes) = employee.notes.as_deref() {
        if !notes.is_empty() {
            body.push_str(&format!("\nNotes: {}\n", notes));
        }
    }

    body.push_str("\nThis is an automatic reminder sent ahead of the scheduled date.\n");

    OutgoingEmail {
        to: to.to_string(),
        subject: format!(
            "Reminder: upcoming technical onboarding - {}",
            employee.full_name
        ),
        body,
    }
}
