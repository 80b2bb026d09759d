pub mod busy_slots;
pub mod memory;
pub mod status;
pub mod store;

pub use busy_slots::BusySlotService;
pub use memory::InMemoryAppointmentStore;
pub use status::AppointmentStatusService;
pub use store::{AppointmentStore, SupabaseAppointmentStore};
