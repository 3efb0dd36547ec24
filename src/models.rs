/// Data models for the appointment portal.
///
/// This module defines the core data structures used throughout the portal:
/// - Role: who is signed in (patient or doctor)
/// - UserRecord: the signed-in user as persisted with the session
/// - AvailabilitySlotTemplate: one day of a doctor's weekly availability
/// - Doctor: a directory entry
/// - Appointment: an entry in the patient's appointment list
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};

/// Role of the signed-in user.
///
/// Gates the dashboard variant and the sidebar menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Patient,
    Doctor,
}

impl Role {
    /// Convert a string to a Role value.
    pub fn from_string(value: &str) -> PortalResult<Self> {
        match value.trim().to_uppercase().as_str() {
            "PATIENT" => Ok(Role::Patient),
            "DOCTOR" => Ok(Role::Doctor),
            _ => Err(PortalError::validation(format!(
                "invalid role: '{}'. Must be one of: PATIENT, DOCTOR",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The signed-in user as stored alongside the session.
///
/// Every field is optional on the wire so partially written records still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub login_time: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// A record carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        UserRecord {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Days a doctor can list in a weekly availability template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    /// Map a calendar weekday; Sunday has no template day.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(DayOfWeek::Monday),
            Weekday::Tue => Some(DayOfWeek::Tuesday),
            Weekday::Wed => Some(DayOfWeek::Wednesday),
            Weekday::Thu => Some(DayOfWeek::Thursday),
            Weekday::Fri => Some(DayOfWeek::Friday),
            Weekday::Sat => Some(DayOfWeek::Saturday),
            Weekday::Sun => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
        }
    }
}

/// One day of a doctor's weekly availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlotTemplate {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilitySlotTemplate {
    /// Create a template entry with validation.
    pub fn new(day_of_week: DayOfWeek, start_time: NaiveTime, end_time: NaiveTime) -> PortalResult<Self> {
        if end_time <= start_time {
            return Err(PortalError::validation("end time must be after start time"));
        }

        Ok(AvailabilitySlotTemplate {
            day_of_week,
            start_time,
            end_time,
        })
    }

    /// Parse a template entry from 24-hour "HH:MM" strings.
    pub fn parse(day_of_week: DayOfWeek, start: &str, end: &str) -> PortalResult<Self> {
        Self::new(day_of_week, parse_clock(start)?, parse_clock(end)?)
    }
}

/// Parse a 24-hour "HH:MM" clock value.
pub fn parse_clock(value: &str) -> PortalResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| PortalError::validation(format!("invalid time '{}', expected HH:MM", value)))
}

/// Format a slot time as a 12-hour clock string, e.g. "09:00 AM".
pub fn format_slot_time(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// Parse a 12-hour slot string such as "04:30 PM".
pub fn parse_slot_time(value: &str) -> PortalResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%I:%M %p")
        .map_err(|_| PortalError::validation(format!("invalid slot time '{}', expected hh:mm AM/PM", value)))
}

/// Kind of visit requested when booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentType {
    Consultation,
    #[serde(rename = "Follow-up")]
    FollowUp,
    #[serde(rename = "Check-up")]
    CheckUp,
    Diagnosis,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 4] = [
        AppointmentType::Consultation,
        AppointmentType::FollowUp,
        AppointmentType::CheckUp,
        AppointmentType::Diagnosis,
    ];

    pub fn from_string(value: &str) -> PortalResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "consultation" => Ok(AppointmentType::Consultation),
            "follow-up" | "followup" => Ok(AppointmentType::FollowUp),
            "check-up" | "checkup" => Ok(AppointmentType::CheckUp),
            "diagnosis" => Ok(AppointmentType::Diagnosis),
            _ => Err(PortalError::validation(format!(
                "invalid appointment type: '{}'. Must be one of: Consultation, Follow-up, Check-up, Diagnosis",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "Consultation",
            AppointmentType::FollowUp => "Follow-up",
            AppointmentType::CheckUp => "Check-up",
            AppointmentType::Diagnosis => "Diagnosis",
        }
    }
}

/// Lifecycle of an appointment in the patient's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Applied,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn name(&self) -> &'static str {
        match self {
            AppointmentStatus::Applied => "APPLIED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only requests not yet confirmed can be rescheduled.
    pub fn can_edit(&self) -> bool {
        matches!(self, AppointmentStatus::Applied)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, AppointmentStatus::Applied)
    }
}

/// An entry in the patient's appointment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub doctor: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub status: AppointmentStatus,
    pub appointment_type: Option<AppointmentType>,
}

impl Appointment {
    /// Create a new appointment with validation.
    pub fn new(
        doctor: String,
        specialty: String,
        date: NaiveDate,
        time: Option<NaiveTime>,
        status: AppointmentStatus,
        appointment_type: Option<AppointmentType>,
    ) -> PortalResult<Self> {
        if doctor.trim().is_empty() {
            return Err(PortalError::validation("doctor name cannot be empty"));
        }

        Ok(Appointment {
            id: Uuid::new_v4(),
            doctor,
            specialty,
            date,
            time,
            status,
            appointment_type,
        })
    }

    /// The time as displayed in slot pickers, if one was chosen.
    pub fn time_label(&self) -> Option<String> {
        self.time.map(format_slot_time)
    }
}

/// A specialty a doctor practises, with years of experience in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialization {
    pub name: String,
    pub experience_years: u32,
}

/// A doctor directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: u32,
    pub name: String,
    pub email: String,
    pub specializations: Vec<Specialization>,
    pub location: String,
    pub consultation_fee: u32,
    pub rating: f32,
    pub availability: Vec<AvailabilitySlotTemplate>,
}

impl Doctor {
    /// All specialty names joined for display.
    pub fn specialty_label(&self) -> String {
        self.specializations
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn experience_years(&self) -> u32 {
        self.specializations
            .iter()
            .map(|s| s.experience_years)
            .max()
            .unwrap_or(0)
    }

    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specializations
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(specialty.trim()))
    }
}
