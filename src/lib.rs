//! HelloDoc portal core: sessions, route gating and the appointment
//! booking workflow for patients and doctors.

pub mod appointments;
pub mod auth;
pub mod booking;
pub mod config;
pub mod directory;
pub mod error;
pub mod guard;
pub mod models;
pub mod session;
pub mod storage;

pub use appointments::AppointmentBook;
pub use auth::{AuthContext, AuthState, CredentialDirectory, SessionInfo};
pub use booking::{
    derive_slots, BookingMode, BookingService, BookingStep, BookingWorkflow, NavigationState,
    RedirectTimer, SimulatedBookingService,
};
pub use config::PortalConfig;
pub use directory::{DoctorDirectory, DoctorFilter};
pub use error::{BookingError, PortalError, PortalResult};
pub use guard::{decide, menu_for, GuardDecision, Route, View};
pub use models::{Appointment, AppointmentStatus, AppointmentType, Role, UserRecord};
pub use session::SessionStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
