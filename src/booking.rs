/// Appointment booking workflow.
///
/// This module provides the BookingWorkflow which walks a patient from a
/// chosen doctor (or an appointment being edited) through slot selection
/// and review to submission, plus the slot derivation it relies on.
use crate::appointments::AppointmentBook;
use crate::config::PortalConfig;
use crate::directory::DoctorDirectory;
use crate::error::{BookingError, PortalResult};
use crate::guard::Route;
use crate::models::{
    format_slot_time, Appointment, AppointmentType, AvailabilitySlotTemplate, DayOfWeek, Doctor,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Slots for `date`: every `interval_minutes` from the template's start
/// (inclusive) to its end (exclusive). Empty when no template covers the weekday.
pub fn derive_slots(
    date: NaiveDate,
    availability: &[AvailabilitySlotTemplate],
    interval_minutes: u32,
) -> Vec<NaiveTime> {
    let Some(day) = DayOfWeek::from_weekday(date.weekday()) else {
        return Vec::new();
    };
    let Some(template) = availability.iter().find(|t| t.day_of_week == day) else {
        return Vec::new();
    };
    if interval_minutes == 0 {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(interval_minutes));
    let mut slots = Vec::new();
    let mut current = template.start_time;

    while current < template.end_time {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    slots
}

/// Whether the draft creates a new appointment or reschedules one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingMode {
    Create,
    Edit,
}

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    SelectSlot,
    Review,
    Submitting,
    Succeeded,
}

impl BookingStep {
    pub fn name(&self) -> &'static str {
        match self {
            BookingStep::SelectSlot => "selecting a slot",
            BookingStep::Review => "reviewing",
            BookingStep::Submitting => "submitting",
            BookingStep::Succeeded => "booked",
        }
    }
}

/// State carried by the navigation into the booking page.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    /// Name of the doctor picked from the directory.
    pub doctor: Option<String>,
    pub editing_appointment: Option<Appointment>,
    pub is_edit_mode: bool,
}

impl NavigationState {
    pub fn select_doctor(name: impl Into<String>) -> Self {
        NavigationState {
            doctor: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn edit(appointment: Appointment) -> Self {
        NavigationState {
            doctor: None,
            editing_appointment: Some(appointment),
            is_edit_mode: true,
        }
    }
}

/// The booking being built.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub doctor_id: u32,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<NaiveTime>,
    pub appointment_type: Option<AppointmentType>,
    pub mode: BookingMode,
    pub source_appointment: Option<Appointment>,
}

impl BookingDraft {
    pub fn is_complete(&self) -> bool {
        self.selected_date.is_some() && self.selected_time.is_some() && self.appointment_type.is_some()
    }
}

/// What gets sent to the booking service.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub doctor_id: u32,
    pub doctor_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub appointment_type: AppointmentType,
    pub mode: BookingMode,
    pub source_appointment_id: Option<Uuid>,
}

/// Accepts or rejects create/update intents.
pub trait BookingService: Send + Sync {
    fn submit(&self, request: BookingRequest) -> impl Future<Output = PortalResult<Appointment>> + Send;
}

/// Booking service that records into a shared [`AppointmentBook`] after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedBookingService {
    book: Arc<Mutex<AppointmentBook>>,
    delay: std::time::Duration,
}

impl SimulatedBookingService {
    pub fn new(book: Arc<Mutex<AppointmentBook>>, delay: std::time::Duration) -> Self {
        Self { book, delay }
    }

    pub fn book(&self) -> Arc<Mutex<AppointmentBook>> {
        Arc::clone(&self.book)
    }
}

impl BookingService for SimulatedBookingService {
    async fn submit(&self, request: BookingRequest) -> PortalResult<Appointment> {
        tokio::time::sleep(self.delay).await;
        let mut book = self.book.lock().await;
        book.apply(&request)
    }
}

/// Pending navigation to the dashboard after a successful booking.
///
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct RedirectTimer {
    handle: Option<JoinHandle<Route>>,
}

impl RedirectTimer {
    pub fn start(target: Route, delay: std::time::Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            target
        });
        Self { handle: Some(handle) }
    }

    /// Wait for the timer. `None` if it was aborted.
    pub async fn fired(mut self) -> Option<Route> {
        let handle = self.handle.take()?;
        handle.await.ok()
    }

    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RedirectTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Two-step booking state machine for one doctor.
#[derive(Debug, Clone)]
pub struct BookingWorkflow {
    doctor: Doctor,
    draft: BookingDraft,
    step: BookingStep,
    slot_interval_minutes: u32,
    redirect_delay: std::time::Duration,
    error: Option<String>,
    success: Option<String>,
    confirmed: Option<Appointment>,
}

impl BookingWorkflow {
    /// Resolve the doctor from navigation state.
    ///
    /// Editing starts at review with the appointment's values; a fresh
    /// selection starts at slot selection. Without either the caller
    /// should return to the doctor list.
    pub fn enter(
        navigation: &NavigationState,
        directory: &DoctorDirectory,
        config: &PortalConfig,
    ) -> Result<Self, BookingError> {
        let editing = navigation
            .editing_appointment
            .as_ref()
            .filter(|_| navigation.is_edit_mode);

        let (doctor, draft, step) = if let Some(appointment) = editing {
            let doctor = resolve_doctor(directory, &appointment.doctor)?;
            let draft = BookingDraft {
                doctor_id: doctor.doctor_id,
                selected_date: Some(appointment.date),
                selected_time: appointment.time,
                appointment_type: appointment.appointment_type,
                mode: BookingMode::Edit,
                source_appointment: Some(appointment.clone()),
            };
            (doctor, draft, BookingStep::Review)
        } else if let Some(name) = navigation.doctor.as_deref() {
            let doctor = resolve_doctor(directory, name)?;
            let draft = BookingDraft {
                doctor_id: doctor.doctor_id,
                selected_date: None,
                selected_time: None,
                appointment_type: None,
                mode: BookingMode::Create,
                source_appointment: None,
            };
            (doctor, draft, BookingStep::SelectSlot)
        } else {
            return Err(BookingError::MissingContext);
        };

        info!(doctor = %doctor.name, mode = ?draft.mode, "booking started");
        Ok(BookingWorkflow {
            doctor,
            draft,
            step,
            slot_interval_minutes: config.slot_interval_minutes,
            redirect_delay: config.redirect_delay,
            error: None,
            success: None,
            confirmed: None,
        })
    }

    pub fn doctor(&self) -> &Doctor {
        &self.doctor
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn mode(&self) -> BookingMode {
        self.draft.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn confirmed_appointment(&self) -> Option<&Appointment> {
        self.confirmed.as_ref()
    }

    /// Slots for the selected date; empty until a date is chosen.
    pub fn available_slots(&self) -> Vec<NaiveTime> {
        match self.draft.selected_date {
            Some(date) => derive_slots(date, &self.doctor.availability, self.slot_interval_minutes),
            None => Vec::new(),
        }
    }

    pub fn slot_labels(&self) -> Vec<String> {
        self.available_slots().into_iter().map(format_slot_time).collect()
    }

    fn require_step(&self, expected: BookingStep, action: &str) -> Result<(), BookingError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(BookingError::InvalidStep {
                action: action.to_string(),
                step: self.step.name().to_string(),
            })
        }
    }

    /// Pick a date. Any previously chosen time is cleared.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), BookingError> {
        self.require_step(BookingStep::SelectSlot, "change the date")?;
        self.draft.selected_date = Some(date);
        self.draft.selected_time = None;
        Ok(())
    }

    /// Pick one of the slots offered for the selected date.
    pub fn select_time(&mut self, time: NaiveTime) -> Result<(), BookingError> {
        self.require_step(BookingStep::SelectSlot, "change the time")?;
        let date = self.draft.selected_date.ok_or(BookingError::IncompleteDraft)?;
        if !self.available_slots().contains(&time) {
            return Err(BookingError::SlotUnavailable {
                date: date.format("%A, %B %-d, %Y").to_string(),
                time: format_slot_time(time),
            });
        }
        self.draft.selected_time = Some(time);
        Ok(())
    }

    pub fn select_type(&mut self, appointment_type: AppointmentType) -> Result<(), BookingError> {
        self.require_step(BookingStep::SelectSlot, "change the appointment type")?;
        self.draft.appointment_type = Some(appointment_type);
        Ok(())
    }

    /// The "continue to review" control is enabled.
    pub fn can_continue(&self) -> bool {
        self.step == BookingStep::SelectSlot && self.draft.is_complete()
    }

    pub fn continue_to_review(&mut self) -> Result<(), BookingError> {
        self.require_step(BookingStep::SelectSlot, "continue to review")?;
        if !self.draft.is_complete() {
            return Err(BookingError::IncompleteDraft);
        }
        self.step = BookingStep::Review;
        Ok(())
    }

    /// Return from review to slot selection, keeping what was entered.
    pub fn back(&mut self) -> Result<(), BookingError> {
        self.require_step(BookingStep::Review, "go back")?;
        self.step = BookingStep::SelectSlot;
        Ok(())
    }

    /// The confirm control is disabled while a submission is in flight.
    pub fn is_submit_disabled(&self) -> bool {
        self.step != BookingStep::Review
    }

    fn build_request(&self) -> Option<BookingRequest> {
        Some(BookingRequest {
            doctor_id: self.doctor.doctor_id,
            doctor_name: self.doctor.name.clone(),
            specialty: self.doctor.specialty_label(),
            date: self.draft.selected_date?,
            time: self.draft.selected_time?,
            appointment_type: self.draft.appointment_type?,
            mode: self.draft.mode,
            source_appointment_id: self.draft.source_appointment.as_ref().map(|a| a.id),
        })
    }

    /// Submit the reviewed draft.
    ///
    /// On success the confirmation message is set and a redirect to the
    /// dashboard is scheduled; on failure the message is kept in `error`
    /// and the workflow stays in review with the draft intact.
    pub async fn submit<B: BookingService>(&mut self, service: &B) -> Result<RedirectTimer, BookingError> {
        self.require_step(BookingStep::Review, "submit")?;

        let Some(request) = self.build_request() else {
            self.error = Some(BookingError::IncompleteDraft.to_string());
            return Err(BookingError::IncompleteDraft);
        };

        self.step = BookingStep::Submitting;
        self.error = None;
        info!(doctor = %request.doctor_name, date = %request.date, mode = ?request.mode, "submitting booking");

        match service.submit(request).await {
            Ok(appointment) => {
                let message = match self.draft.mode {
                    BookingMode::Create => "Appointment booked successfully!",
                    BookingMode::Edit => "Appointment updated successfully!",
                };
                info!(appointment_id = %appointment.id, "booking confirmed");
                self.success = Some(message.to_string());
                self.confirmed = Some(appointment);
                self.step = BookingStep::Succeeded;
                Ok(RedirectTimer::start(Route::Dashboard, self.redirect_delay))
            }
            Err(e) => {
                warn!(error = %e, "booking failed");
                let message = e.to_string();
                self.error = Some(message.clone());
                self.step = BookingStep::Review;
                Err(BookingError::Rejected(message))
            }
        }
    }
}

fn resolve_doctor(directory: &DoctorDirectory, name: &str) -> Result<Doctor, BookingError> {
    directory.find_by_name(name).cloned().ok_or_else(|| {
        warn!(doctor = name, "doctor not found in directory");
        BookingError::DoctorNotFound(name.to_string())
    })
}

impl BookingError {
    /// Entry failures that send the user back to the doctor list.
    pub fn fallback_route(&self) -> Option<Route> {
        match self {
            BookingError::MissingContext | BookingError::DoctorNotFound(_) => Some(Route::AvailableDoctors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::standard_week;
    use crate::models::parse_clock;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn monday_nine_to_five_gives_sixteen_slots() {
        let template = [AvailabilitySlotTemplate::parse(DayOfWeek::Monday, "09:00", "17:00").unwrap()];
        let slots = derive_slots(monday(), &template, 30);
        assert_eq!(slots.len(), 16);
        assert_eq!(format_slot_time(slots[0]), "09:00 AM");
        assert_eq!(format_slot_time(slots[15]), "04:30 PM");
        for pair in slots.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::minutes(30));
        }
    }

    #[test]
    fn unlisted_weekdays_have_no_slots() {
        let template = [AvailabilitySlotTemplate::parse(DayOfWeek::Monday, "09:00", "17:00").unwrap()];
        for offset in 1..7 {
            let date = monday() + Duration::days(offset);
            assert!(derive_slots(date, &template, 30).is_empty(), "{date}");
        }
    }

    #[test]
    fn saturday_uses_its_own_hours() {
        let saturday = monday() + Duration::days(5);
        let slots = derive_slots(saturday, &standard_week(), 30);
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0], parse_clock("10:00").unwrap());
        assert_eq!(format_slot_time(*slots.last().unwrap()), "01:30 PM");
    }

    #[test]
    fn sunday_is_always_closed() {
        let sunday = monday() + Duration::days(6);
        assert!(derive_slots(sunday, &standard_week(), 30).is_empty());
    }

    #[test]
    fn uneven_end_excludes_partial_step() {
        let template = [AvailabilitySlotTemplate::parse(DayOfWeek::Monday, "09:00", "10:15").unwrap()];
        let labels: Vec<String> = derive_slots(monday(), &template, 30)
            .into_iter()
            .map(format_slot_time)
            .collect();
        assert_eq!(labels, vec!["09:00 AM", "09:30 AM", "10:00 AM"]);
    }

    fn pending_redirect() -> (RedirectTimer, tokio::task::AbortHandle) {
        let timer = RedirectTimer::start(Route::Dashboard, std::time::Duration::from_secs(60));
        let abort = timer.handle.as_ref().unwrap().abort_handle();
        (timer, abort)
    }

    #[tokio::test]
    async fn redirect_fires_after_delay() {
        let timer = RedirectTimer::start(Route::Dashboard, std::time::Duration::from_millis(10));
        assert_eq!(timer.fired().await, Some(Route::Dashboard));
    }

    #[tokio::test]
    async fn cancelled_redirect_is_aborted() {
        let (timer, abort) = pending_redirect();
        assert!(!abort.is_finished());
        timer.cancel();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        // finished long before the 60s delay, so it was aborted rather than fired
        assert!(abort.is_finished());
    }

    #[tokio::test]
    async fn dropped_redirect_is_aborted() {
        let (timer, abort) = pending_redirect();
        drop(timer);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(abort.is_finished());
    }

    #[test]
    fn late_templates_stop_at_midnight() {
        let template = [AvailabilitySlotTemplate::parse(DayOfWeek::Monday, "23:00", "23:59").unwrap()];
        assert_eq!(derive_slots(monday(), &template, 45).len(), 2);
        assert!(derive_slots(monday(), &template, 0).is_empty());
    }
}
