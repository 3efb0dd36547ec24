/// Integration tests for the booking workflow.
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use hellodoc::appointments::AppointmentBook;
use hellodoc::booking::{
    BookingMode, BookingRequest, BookingService, BookingStep, BookingWorkflow, NavigationState,
    SimulatedBookingService,
};
use hellodoc::config::PortalConfig;
use hellodoc::directory::DoctorDirectory;
use hellodoc::error::{BookingError, PortalError, PortalResult};
use hellodoc::guard::Route;
use hellodoc::models::{parse_slot_time, Appointment, AppointmentStatus, AppointmentType};
use tokio::sync::Mutex;

/// Service that always refuses.
struct RejectingService;

impl BookingService for RejectingService {
    async fn submit(&self, _request: BookingRequest) -> PortalResult<Appointment> {
        Err(PortalError::validation("slot already taken"))
    }
}

fn config() -> PortalConfig {
    PortalConfig {
        booking_delay: Duration::from_millis(5),
        redirect_delay: Duration::from_millis(10),
        ..PortalConfig::default()
    }
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn slot(label: &str) -> NaiveTime {
    parse_slot_time(label).unwrap()
}

fn service() -> SimulatedBookingService {
    let book = AppointmentBook::demo("John Patient".to_string(), 2026).unwrap();
    SimulatedBookingService::new(Arc::new(Mutex::new(book)), Duration::from_millis(5))
}

fn start(doctor: &str) -> BookingWorkflow {
    BookingWorkflow::enter(
        &NavigationState::select_doctor(doctor),
        &DoctorDirectory::demo(),
        &config(),
    )
    .unwrap()
}

fn ready_for_review(doctor: &str) -> BookingWorkflow {
    let mut workflow = start(doctor);
    workflow.select_date(monday()).unwrap();
    workflow.select_time(slot("10:30 AM")).unwrap();
    workflow.select_type(AppointmentType::Consultation).unwrap();
    workflow.continue_to_review().unwrap();
    workflow
}

#[test]
fn selected_doctor_starts_at_slot_selection() {
    let workflow = start("dr. maria hernandez");
    assert_eq!(workflow.step(), BookingStep::SelectSlot);
    assert_eq!(workflow.mode(), BookingMode::Create);
    assert_eq!(workflow.doctor().doctor_id, 2);
    assert!(workflow.available_slots().is_empty());
    assert!(!workflow.can_continue());
}

#[test]
fn missing_context_sends_user_to_doctor_list() {
    let err = BookingWorkflow::enter(
        &NavigationState::default(),
        &DoctorDirectory::demo(),
        &config(),
    )
    .unwrap_err();
    assert_eq!(err, BookingError::MissingContext);
    assert_eq!(err.fallback_route(), Some(Route::AvailableDoctors));
}

#[test]
fn unknown_doctor_in_edit_mode_falls_back() {
    let appointment = Appointment::new(
        "Dr. Nobody".into(),
        "Oncologist".into(),
        monday(),
        None,
        AppointmentStatus::Applied,
        None,
    )
    .unwrap();
    let err = BookingWorkflow::enter(
        &NavigationState::edit(appointment),
        &DoctorDirectory::demo(),
        &config(),
    )
    .unwrap_err();
    assert!(matches!(err, BookingError::DoctorNotFound(_)));
    assert_eq!(err.fallback_route(), Some(Route::AvailableDoctors));
}

#[test]
fn editing_without_the_edit_flag_is_missing_context() {
    let appointment = Appointment::new(
        "Dr. Alex Smith".into(),
        "Neurologist".into(),
        monday(),
        None,
        AppointmentStatus::Applied,
        None,
    )
    .unwrap();
    let navigation = NavigationState {
        editing_appointment: Some(appointment),
        is_edit_mode: false,
        doctor: None,
    };
    let err = BookingWorkflow::enter(&navigation, &DoctorDirectory::demo(), &config()).unwrap_err();
    assert_eq!(err, BookingError::MissingContext);
}

#[test]
fn edit_mode_prefills_and_jumps_to_review() {
    let appointment = Appointment::new(
        "DR. ALEX SMITH".into(),
        "Neurologist".into(),
        monday(),
        Some(slot("02:00 PM")),
        AppointmentStatus::Applied,
        Some(AppointmentType::FollowUp),
    )
    .unwrap();
    let workflow = BookingWorkflow::enter(
        &NavigationState::edit(appointment.clone()),
        &DoctorDirectory::demo(),
        &config(),
    )
    .unwrap();

    assert_eq!(workflow.step(), BookingStep::Review);
    assert_eq!(workflow.mode(), BookingMode::Edit);
    let draft = workflow.draft();
    assert_eq!(draft.selected_date, Some(monday()));
    assert_eq!(draft.selected_time, Some(slot("02:00 PM")));
    assert_eq!(draft.appointment_type, Some(AppointmentType::FollowUp));
    assert_eq!(draft.source_appointment.as_ref().map(|a| a.id), Some(appointment.id));
}

#[test]
fn changing_the_date_clears_the_time() {
    let mut workflow = start("Dr. James Anderson");
    workflow.select_date(monday()).unwrap();
    workflow.select_time(slot("09:30 AM")).unwrap();

    let tuesday = monday().succ_opt().unwrap();
    workflow.select_date(tuesday).unwrap();
    assert_eq!(workflow.draft().selected_date, Some(tuesday));
    assert_eq!(workflow.draft().selected_time, None);

    // re-selecting the same date also clears
    workflow.select_time(slot("09:30 AM")).unwrap();
    workflow.select_date(tuesday).unwrap();
    assert_eq!(workflow.draft().selected_time, None);
}

#[test]
fn slots_follow_the_doctor_template() {
    let mut workflow = start("Dr. James Anderson");
    workflow.select_date(monday()).unwrap();
    let labels = workflow.slot_labels();
    assert_eq!(labels.len(), 16);
    assert_eq!(labels.first().map(String::as_str), Some("09:00 AM"));
    assert_eq!(labels.last().map(String::as_str), Some("04:30 PM"));

    let sunday = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();
    workflow.select_date(sunday).unwrap();
    assert!(workflow.available_slots().is_empty());
    assert!(matches!(
        workflow.select_time(slot("09:00 AM")),
        Err(BookingError::SlotUnavailable { .. })
    ));
}

#[test]
fn time_outside_the_template_is_rejected() {
    let mut workflow = start("Dr. James Anderson");
    assert_eq!(
        workflow.select_time(slot("09:00 AM")),
        Err(BookingError::IncompleteDraft)
    );
    workflow.select_date(monday()).unwrap();
    assert!(workflow.select_time(slot("05:00 PM")).is_err());
    assert!(workflow.select_time(slot("09:15 AM")).is_err());
    assert_eq!(workflow.draft().selected_time, None);
}

#[test]
fn continue_requires_every_field() {
    let mut workflow = start("Dr. James Anderson");
    workflow.select_date(monday()).unwrap();
    workflow.select_time(slot("11:00 AM")).unwrap();
    assert!(!workflow.can_continue());
    assert_eq!(workflow.continue_to_review(), Err(BookingError::IncompleteDraft));
    assert_eq!(workflow.step(), BookingStep::SelectSlot);

    workflow.select_type(AppointmentType::CheckUp).unwrap();
    assert!(workflow.can_continue());
    workflow.continue_to_review().unwrap();
    assert_eq!(workflow.step(), BookingStep::Review);
}

#[test]
fn back_keeps_the_draft() {
    let mut workflow = ready_for_review("Dr. James Anderson");
    let before = workflow.draft().clone();
    workflow.back().unwrap();
    assert_eq!(workflow.step(), BookingStep::SelectSlot);
    assert_eq!(workflow.draft(), &before);
    assert!(workflow.back().is_err());
}

#[test]
fn selection_is_locked_during_review() {
    let mut workflow = ready_for_review("Dr. James Anderson");
    assert!(matches!(
        workflow.select_date(monday()),
        Err(BookingError::InvalidStep { .. })
    ));
    assert_eq!(workflow.draft().selected_time, Some(slot("10:30 AM")));
}

#[tokio::test]
async fn submit_before_review_is_rejected() {
    let mut workflow = start("Dr. James Anderson");
    let err = workflow.submit(&service()).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidStep { .. }));
}

#[tokio::test]
async fn create_booking_adds_an_applied_appointment() {
    let service = service();
    let mut workflow = ready_for_review("Dr. Sarah Williams");
    assert!(!workflow.is_submit_disabled());

    let redirect = workflow.submit(&service).await.unwrap();

    assert_eq!(workflow.step(), BookingStep::Succeeded);
    assert!(workflow.is_submit_disabled());
    assert_eq!(workflow.success_message(), Some("Appointment booked successfully!"));
    assert!(workflow.error().is_none());
    let created = workflow.confirmed_appointment().unwrap().clone();
    assert_eq!(created.status, AppointmentStatus::Applied);
    assert_eq!(created.doctor, "Dr. Sarah Williams");
    assert_eq!(created.time_label().as_deref(), Some("10:30 AM"));

    let book = service.book();
    let book = book.lock().await;
    assert_eq!(book.appointments().len(), 5);
    assert_eq!(book.get_appointment_by_id(created.id), Some(created));
    drop(book);

    assert_eq!(redirect.fired().await, Some(Route::Dashboard));
}

#[tokio::test]
async fn edit_booking_updates_in_place() {
    let service = service();
    let source = {
        let book = service.book();
        let book = book.lock().await;
        let applied = book.with_status(Some(AppointmentStatus::Applied))[0].id;
        book.begin_edit(applied).unwrap()
    };

    let mut workflow = BookingWorkflow::enter(
        &NavigationState::edit(source.clone()),
        &DoctorDirectory::demo(),
        &config(),
    )
    .unwrap();
    // the seed has no time or type, so the review cannot be submitted yet
    assert_eq!(
        workflow.submit(&service).await.unwrap_err(),
        BookingError::IncompleteDraft
    );
    assert_eq!(workflow.error(), Some("please fill all fields"));
    assert_eq!(workflow.step(), BookingStep::Review);

    workflow.back().unwrap();
    workflow.select_date(monday()).unwrap();
    workflow.select_time(slot("03:00 PM")).unwrap();
    workflow.select_type(AppointmentType::Diagnosis).unwrap();
    workflow.continue_to_review().unwrap();
    let _redirect = workflow.submit(&service).await.unwrap();

    assert_eq!(workflow.success_message(), Some("Appointment updated successfully!"));
    let book = service.book();
    let book = book.lock().await;
    assert_eq!(book.appointments().len(), 4);
    let updated = book.get_appointment_by_id(source.id).unwrap();
    assert_eq!(updated.date, monday());
    assert_eq!(updated.time, Some(slot("03:00 PM")));
    assert_eq!(updated.appointment_type, Some(AppointmentType::Diagnosis));
    assert_eq!(updated.status, AppointmentStatus::Applied);
}

#[tokio::test]
async fn rejected_submission_stays_in_review() {
    let mut workflow = ready_for_review("Dr. Priya Sharma");
    let before = workflow.draft().clone();

    let err = workflow.submit(&RejectingService).await.unwrap_err();
    assert!(matches!(err, BookingError::Rejected(_)));
    assert_eq!(workflow.step(), BookingStep::Review);
    assert!(workflow.error().unwrap().contains("slot already taken"));
    assert!(workflow.success_message().is_none());
    assert_eq!(workflow.draft(), &before);

    // retry against a working service clears the error
    workflow.submit(&service()).await.unwrap();
    assert!(workflow.error().is_none());
    assert_eq!(workflow.step(), BookingStep::Succeeded);
}

#[tokio::test]
async fn redirect_can_be_cancelled() {
    let mut workflow = ready_for_review("Dr. Rajesh Kumar");
    let redirect = workflow.submit(&service()).await.unwrap();
    redirect.cancel();
    assert_eq!(workflow.step(), BookingStep::Succeeded);
}

#[tokio::test]
async fn succeeded_workflow_refuses_a_second_submit() {
    let service = service();
    let mut workflow = ready_for_review("Dr. Rajesh Kumar");
    let _redirect = workflow.submit(&service).await.unwrap();
    assert!(matches!(
        workflow.submit(&service).await,
        Err(BookingError::InvalidStep { .. })
    ));
    assert_eq!(service.book().lock().await.appointments().len(), 5);
}
