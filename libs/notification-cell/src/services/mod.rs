pub mod calendar;
pub mod directory;
pub mod dispatcher;
pub mod email;

pub use calendar::{CalendarSync, GoogleCalendarSync, NoopCalendarSync};
pub use directory::{ContactDirectory, SupabaseContactDirectory};
pub use dispatcher::NotificationDispatcher;
pub use email::{
    EmailSender, NoopEmailSender, NoopStatusMailer, PatientStatusMailer, ResendEmailSender,
    StatusMailer,
};
