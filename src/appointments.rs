/// The patient's appointment list.
///
/// This module provides the AppointmentBook which holds a patient's
/// appointments and applies the status-driven actions (edit, cancel,
/// delete) along with the create/update effects of a booking.
use crate::booking::{BookingMode, BookingRequest};
use crate::error::{PortalError, PortalResult};
use crate::models::{Appointment, AppointmentStatus, AppointmentType};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppointmentBook {
    pub patient_name: String,
    appointments: HashMap<Uuid, Appointment>,
}

impl AppointmentBook {
    /// Initialize an empty appointment list.
    pub fn new(patient_name: String) -> PortalResult<Self> {
        if patient_name.trim().is_empty() {
            return Err(PortalError::validation("patient name cannot be empty"));
        }

        Ok(AppointmentBook {
            patient_name,
            appointments: HashMap::new(),
        })
    }

    /// The demo patient's four appointments, one per status, dated in `year`.
    pub fn demo(patient_name: String, year: i32) -> PortalResult<Self> {
        let mut book = Self::new(patient_name)?;
        let seed = [
            ("Dr. James Anderson", "Dermatologist", 8, 22, AppointmentStatus::Confirmed),
            ("Dr. Maria Hernandez", "Pediatrician", 8, 29, AppointmentStatus::Applied),
            ("Dr. Sarah Williams", "Cardiologist", 8, 10, AppointmentStatus::Completed),
            ("Dr. Alex Smith", "Neurologist", 8, 2, AppointmentStatus::Cancelled),
        ];

        for (doctor, specialty, month, day, status) in seed {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| PortalError::validation(format!("invalid seed date {year}-{month}-{day}")))?;
            let appointment = Appointment::new(
                doctor.to_string(),
                specialty.to_string(),
                date,
                None,
                status,
                None,
            )?;
            book.insert(appointment);
        }
        Ok(book)
    }

    pub fn insert(&mut self, appointment: Appointment) {
        self.appointments.insert(appointment.id, appointment);
    }

    /// Get all appointments sorted by date and time.
    pub fn appointments(&self) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> = self.appointments.values().cloned().collect();
        appointments.sort_by_key(|a| (a.date, a.time));
        appointments
    }

    /// Appointments with the given status, or all of them.
    pub fn with_status(&self, status: Option<AppointmentStatus>) -> Vec<Appointment> {
        self.appointments()
            .into_iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .collect()
    }

    /// Earliest upcoming appointment that is still confirmed or applied.
    pub fn next_appointment(&self, today: NaiveDate) -> Option<Appointment> {
        self.appointments().into_iter().find(|a| {
            a.date >= today
                && matches!(a.status, AppointmentStatus::Confirmed | AppointmentStatus::Applied)
        })
    }

    pub fn get_appointment_by_id(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.appointments.get(&appointment_id).cloned()
    }

    fn get_mut(&mut self, appointment_id: Uuid) -> PortalResult<&mut Appointment> {
        self.appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| PortalError::not_found("appointment", appointment_id))
    }

    /// The appointment to hand to the booking workflow in edit mode.
    pub fn begin_edit(&self, appointment_id: Uuid) -> PortalResult<Appointment> {
        let appointment = self
            .get_appointment_by_id(appointment_id)
            .ok_or_else(|| PortalError::not_found("appointment", appointment_id))?;
        ensure_allowed("edit", appointment.status, appointment.status.can_edit())?;
        Ok(appointment)
    }

    /// Cancel a confirmed appointment. The entry stays in the list.
    pub fn cancel_appointment(&mut self, appointment_id: Uuid) -> PortalResult<()> {
        let appointment = self.get_mut(appointment_id)?;
        ensure_allowed("cancel", appointment.status, appointment.status.can_cancel())?;
        appointment.status = AppointmentStatus::Cancelled;
        info!(%appointment_id, "appointment cancelled");
        Ok(())
    }

    /// Withdraw an applied appointment entirely.
    pub fn delete_appointment(&mut self, appointment_id: Uuid) -> PortalResult<Appointment> {
        let status = self.get_mut(appointment_id)?.status;
        ensure_allowed("delete", status, status.can_delete())?;
        info!(%appointment_id, "appointment deleted");
        self.appointments
            .remove(&appointment_id)
            .ok_or_else(|| PortalError::not_found("appointment", appointment_id))
    }

    /// Record a booking: a new APPLIED entry, or an update of the edited one.
    pub fn apply(&mut self, request: &BookingRequest) -> PortalResult<Appointment> {
        match request.mode {
            BookingMode::Create => {
                let appointment = Appointment::new(
                    request.doctor_name.clone(),
                    request.specialty.clone(),
                    request.date,
                    Some(request.time),
                    AppointmentStatus::Applied,
                    Some(request.appointment_type),
                )?;
                self.insert(appointment.clone());
                Ok(appointment)
            }
            BookingMode::Edit => {
                let source = request
                    .source_appointment_id
                    .ok_or_else(|| PortalError::validation("edit request without a source appointment"))?;
                self.reschedule(source, request.date, request.time, request.appointment_type)
            }
        }
    }

    fn reschedule(
        &mut self,
        appointment_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        appointment_type: AppointmentType,
    ) -> PortalResult<Appointment> {
        let appointment = self.get_mut(appointment_id)?;
        ensure_allowed("edit", appointment.status, appointment.status.can_edit())?;
        appointment.date = date;
        appointment.time = Some(time);
        appointment.appointment_type = Some(appointment_type);
        Ok(appointment.clone())
    }
}

fn ensure_allowed(action: &str, status: AppointmentStatus, allowed: bool) -> PortalResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(PortalError::ActionNotAllowed {
            action: action.to_string(),
            status: status.name().to_string(),
        })
    }
}

impl std::fmt::Display for AppointmentBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AppointmentBook({}, appointments={})",
            self.patient_name,
            self.appointments.len()
        )
    }
}
