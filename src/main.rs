/// Command-line front end for the HelloDoc portal.
///
/// Walks the same routes as the web portal: sign in, role dashboards,
/// the doctor directory and the booking workflow. The session survives
/// restarts through the file-backed store.
use std::io::{self, Write};
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use hellodoc::auth::{AuthContext, CredentialDirectory};
use hellodoc::booking::{BookingStep, BookingWorkflow, NavigationState, SimulatedBookingService};
use hellodoc::config::PortalConfig;
use hellodoc::directory::{DoctorDirectory, DoctorFilter};
use hellodoc::error::PortalResult;
use hellodoc::guard::{decide_for, menu_for, GuardDecision, MenuAction, Route, View};
use hellodoc::models::{format_slot_time, AppointmentType};
use hellodoc::storage::FileStore;
use hellodoc::AppointmentBook;
use tokio::sync::Mutex;
use tracing::warn;

struct PortalCli {
    config: PortalConfig,
    auth: AuthContext<FileStore>,
    accounts: CredentialDirectory,
    directory: DoctorDirectory,
    bookings: Option<(String, SimulatedBookingService)>,
    pending_navigation: Option<NavigationState>,
    running: bool,
}

impl PortalCli {
    fn new(config: PortalConfig) -> Self {
        let store = FileStore::new(config.storage_path.clone());
        PortalCli {
            auth: AuthContext::new(store, &config),
            accounts: CredentialDirectory::demo(),
            directory: DoctorDirectory::demo(),
            bookings: None,
            pending_navigation: None,
            running: true,
            config,
        }
    }

    /// Booking service over the signed-in patient's appointments, seeded
    /// again whenever a different patient signs in.
    fn patient_bookings(&mut self) -> PortalResult<SimulatedBookingService> {
        let patient = self
            .auth
            .user()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "Patient".to_string());
        if let Some((owner, service)) = &self.bookings {
            if *owner == patient {
                return Ok(service.clone());
            }
        }

        let book = AppointmentBook::demo(patient.clone(), Local::now().year())?;
        let service = SimulatedBookingService::new(Arc::new(Mutex::new(book)), self.config.booking_delay);
        self.bookings = Some((patient, service.clone()));
        Ok(service)
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       HELLODOC APPOINTMENT PORTAL");
        println!("{}", "=".repeat(60));
    }

    fn get_input(&mut self, prompt: &str, default: Option<&str>) -> String {
        if let Some(def) = default {
            print!("{} [{}]: ", prompt, def);
        } else {
            print!("{}: ", prompt);
        }
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => {
                self.running = false;
                return String::new();
            }
            Ok(_) => {}
        }
        let input = input.trim();

        if input.is_empty() {
            default.unwrap_or("").to_string()
        } else {
            input.to_string()
        }
    }

    fn get_int_input(&mut self, prompt: &str, default: Option<i32>) -> i32 {
        loop {
            let default_str = default.map(|d| d.to_string());
            let input = self.get_input(prompt, default_str.as_deref());
            if !self.running {
                return 0;
            }

            if let Ok(value) = input.parse::<i32>() {
                return value;
            }
            println!("Please enter a valid number");
        }
    }

    async fn run(&mut self) {
        self.print_header();

        if self.auth.is_loading() {
            println!("Loading...");
        }
        self.auth.restore().await;

        let mut route = if self.auth.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Root
        };

        while self.running {
            route = match decide_for(&self.auth, route) {
                GuardDecision::Loading => {
                    println!("Loading...");
                    self.auth.restore().await;
                    route
                }
                GuardDecision::Redirect(target) => target,
                GuardDecision::Render(view) => self.render(view).await,
            };
        }
        println!("\nGoodbye!");
    }

    async fn render(&mut self, view: View) -> Route {
        match view {
            View::SignIn => self.sign_in().await,
            View::SignUp => {
                println!("\nRegistration is handled by the clinic front desk in this demo.");
                Route::SignIn
            }
            View::PatientDashboard => match self.patient_dashboard().await {
                Some(route) => route,
                None => self.sidebar().await,
            },
            View::DoctorDashboard => {
                self.doctor_dashboard();
                self.sidebar().await
            }
            View::AvailableDoctors => self.available_doctors(),
            View::BookAppointment => self.book_appointment().await,
            View::Profile => {
                self.profile().await;
                self.sidebar().await
            }
            View::TodaysAppointments | View::MedicalReports | View::Payments | View::Settings => {
                println!("\nThis page is not available from the command line.");
                self.sidebar().await
            }
        }
    }

    async fn sign_in(&mut self) -> Route {
        println!("\n--- Sign In ---");
        println!("(leave username empty to exit)");
        let username = self.get_input("Username", None);
        if username.is_empty() {
            self.running = false;
            return Route::SignIn;
        }
        let password = self.get_input("Password", None);

        match self.auth.sign_in(&self.accounts, &username, &password).await {
            Ok(session_id) => {
                println!("\nLogin successful. Session: {}", session_id);
                Route::Dashboard
            }
            Err(e) => {
                println!("\n{}", capitalize(&e.to_string()));
                Route::SignIn
            }
        }
    }

    async fn sidebar(&mut self) -> Route {
        let sections = menu_for(self.auth.user_role());
        let mut actions = Vec::new();

        println!();
        for section in &sections {
            println!("--- {} ---", section.title);
            for item in &section.items {
                actions.push(item.action);
                println!("{}. {}", actions.len(), item.label);
            }
        }

        let choice = self.get_int_input("Enter choice", Some(1));
        if !self.running {
            return Route::Dashboard;
        }
        match usize::try_from(choice).ok().and_then(|c| c.checked_sub(1)).and_then(|i| actions.get(i)) {
            Some(MenuAction::Navigate(route)) => *route,
            Some(MenuAction::Logout) => {
                if let Err(e) = self.auth.logout().await {
                    warn!(error = %e, "logout could not clear stored session");
                }
                println!("\nSession expired - you are logged out");
                Route::SignIn
            }
            None => {
                println!("Invalid choice");
                Route::Dashboard
            }
        }
    }

    /// Shows the patient's appointments; returns a route when an action navigates away.
    async fn patient_dashboard(&mut self) -> Option<Route> {
        let name = self
            .auth
            .user()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "there".to_string());
        println!("\nHello, {}!", name);

        let book = match self.patient_bookings() {
            Ok(service) => service.book(),
            Err(e) => {
                println!("Failed to load appointments: {}", e);
                return None;
            }
        };
        let today = Local::now().date_naive();
        let appointments = {
            let book = book.lock().await;
            if let Some(next) = book.next_appointment(today) {
                println!("Next appointment: {} on {}", next.doctor, next.date.format("%d %b"));
            }
            book.appointments()
        };

        if appointments.is_empty() {
            println!("\nNo appointments yet");
            return None;
        }

        println!("\n--- Your Appointments ---");
        for (i, apt) in appointments.iter().enumerate() {
            println!(
                "  {}. {:22} {:18} {} {:8} {}",
                i + 1,
                apt.doctor,
                apt.specialty,
                apt.date.format("%d %b"),
                apt.time_label().unwrap_or_default(),
                apt.status.name()
            );
        }

        let choice = self.get_int_input("Manage appointment (0 to skip)", Some(0));
        let Some(apt) = usize::try_from(choice)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .and_then(|i| appointments.get(i))
        else {
            return None;
        };

        let mut options: Vec<(&str, u8)> = Vec::new();
        if apt.status.can_edit() {
            options.push(("Edit", 1));
        }
        if apt.status.can_cancel() {
            options.push(("Cancel", 2));
        }
        if apt.status.can_delete() {
            options.push(("Delete", 3));
        }
        if options.is_empty() {
            println!("No actions available for a {} appointment", apt.status.name());
            return None;
        }
        for (i, (label, _)) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, label);
        }
        let pick = self.get_int_input("Action (0 to close)", Some(0));
        let Some((_, action)) = usize::try_from(pick)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .and_then(|i| options.get(i))
        else {
            return None;
        };

        let mut book = book.lock().await;
        let result = match *action {
            1 => book.begin_edit(apt.id).map(|appointment| {
                self.pending_navigation = Some(NavigationState::edit(appointment));
                Some(Route::BookAppointment)
            }),
            2 => book.cancel_appointment(apt.id).map(|_| {
                println!("Appointment cancelled");
                None
            }),
            _ => book.delete_appointment(apt.id).map(|_| {
                println!("Appointment deleted");
                None
            }),
        };
        result.unwrap_or_else(|e| {
            println!("{}", e);
            None
        })
    }

    fn doctor_dashboard(&self) {
        let name = self.auth.user().map(|u| u.name.as_str()).unwrap_or("Doctor");
        println!("\nWelcome back, {}", name);
        if let Some(doctor) = self.directory.find_by_name(name) {
            println!("{} - {}", doctor.specialty_label(), doctor.location);
            println!("Weekly hours:");
            for slot in &doctor.availability {
                println!(
                    "  {:9} {} - {}",
                    slot.day_of_week.name(),
                    slot.start_time.format("%H:%M"),
                    slot.end_time.format("%H:%M")
                );
            }
        }
    }

    async fn profile(&self) {
        let info = self.auth.session_info().await;
        println!("\n--- My Profile ---");
        if let Some(user) = &info.user {
            println!("Name:  {}", user.name);
            println!("Email: {}", user.email);
        }
        println!("Role:  {}", info.user_role);
        println!("Session: {}", info.session_id.as_deref().unwrap_or("none"));
        if let Some(started) = info.started_at {
            println!("Signed in at: {}", started.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
        }
        println!("Session valid: {}", info.is_valid);
    }

    fn available_doctors(&mut self) -> Route {
        println!("\n--- Available Doctors ---");
        let specialties: Vec<String> = self.directory.specialties().iter().map(|s| s.to_string()).collect();
        println!("Specialties: {}", specialties.join(", "));

        let specialty = self.get_input("Specialty (empty for all)", None);
        let search = self.get_input("Search by name", None);
        let location = self.get_input("Location", None);
        let filter = DoctorFilter {
            specialty: if specialty.is_empty() { None } else { Some(specialty) },
            search,
            location,
        };

        let names: Vec<String> = {
            let matches = self.directory.filter(&filter);
            if matches.is_empty() {
                println!("\nNo doctors match those filters");
                return Route::Dashboard;
            }
            for (i, doctor) in matches.iter().enumerate() {
                println!(
                    "  {}. {:22} {:30} {:2} yrs  Rs.{}  {:.1}*  {}",
                    i + 1,
                    doctor.name,
                    doctor.specialty_label(),
                    doctor.experience_years(),
                    doctor.consultation_fee,
                    doctor.rating,
                    doctor.location
                );
            }
            matches.iter().map(|d| d.name.clone()).collect()
        };

        let choice = self.get_int_input("Book with (0 to go back)", Some(0));
        match usize::try_from(choice).ok().and_then(|c| c.checked_sub(1)).and_then(|i| names.get(i)) {
            Some(name) => {
                self.pending_navigation = Some(NavigationState::select_doctor(name.clone()));
                Route::BookAppointment
            }
            None => Route::Dashboard,
        }
    }

    async fn book_appointment(&mut self) -> Route {
        let navigation = self.pending_navigation.take().unwrap_or_default();
        let mut workflow = match BookingWorkflow::enter(&navigation, &self.directory, &self.config) {
            Ok(workflow) => workflow,
            Err(e) => {
                warn!(error = %e, "booking entry failed");
                return e.fallback_route().unwrap_or(Route::Dashboard);
            }
        };
        let editing = navigation.is_edit_mode;

        while self.running {
            match workflow.step() {
                BookingStep::SelectSlot => {
                    if let Some(route) = self.select_slot(&mut workflow, editing) {
                        return route;
                    }
                }
                BookingStep::Review => {
                    if let Some(route) = self.review(&mut workflow, editing).await {
                        return route;
                    }
                }
                BookingStep::Submitting => {
                    println!("Booking your appointment...");
                }
                BookingStep::Succeeded => return Route::Dashboard,
            }
        }
        Route::Dashboard
    }

    fn select_slot(&mut self, workflow: &mut BookingWorkflow, editing: bool) -> Option<Route> {
        let title = if editing {
            "Step 1: Edit Appointment Details"
        } else {
            "Step 1: Select Date & Time"
        };
        println!("\n--- {} ---", title);
        let doctor = workflow.doctor();
        println!("Selected Doctor: {}", doctor.name);
        println!("Specialization: {}", doctor.specialty_label());
        println!("Location: {}", doctor.location);
        println!("Consultation Fee: Rs.{}", doctor.consultation_fee);

        let today = Local::now().date_naive();
        let default_date = workflow
            .draft()
            .selected_date
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string();
        let raw = self.get_input("Date (YYYY-MM-DD, 'b' for doctors)", Some(&default_date));
        if !self.running || raw.eq_ignore_ascii_case("b") {
            return Some(Route::AvailableDoctors);
        }
        let date = match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) if date >= today => date,
            Ok(_) => {
                println!("Please choose today or a later date");
                return None;
            }
            Err(_) => {
                println!("Please enter a date like {}", today.format("%Y-%m-%d"));
                return None;
            }
        };
        if workflow.draft().selected_date != Some(date) {
            if let Err(e) = workflow.select_date(date) {
                println!("{}", e);
                return None;
            }
        }
        println!("{}", date.format("%A, %B %-d, %Y"));

        let slots = workflow.available_slots();
        if slots.is_empty() {
            println!("No available slots for selected date");
            return None;
        }
        for (i, slot) in slots.iter().enumerate() {
            print!("{:>3}. {}  ", i + 1, format_slot_time(*slot));
            if (i + 1) % 4 == 0 {
                println!();
            }
        }
        println!();
        let pick = self.get_int_input("Time slot", Some(1));
        let Some(time) = usize::try_from(pick).ok().and_then(|c| c.checked_sub(1)).and_then(|i| slots.get(i)) else {
            println!("Invalid choice");
            return None;
        };
        if let Err(e) = workflow.select_time(*time) {
            println!("{}", e);
            return None;
        }

        for (i, kind) in AppointmentType::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, kind.name());
        }
        let pick = self.get_int_input("Appointment type", Some(1));
        if let Some(kind) = usize::try_from(pick).ok().and_then(|c| c.checked_sub(1)).and_then(|i| AppointmentType::ALL.get(i)) {
            if let Err(e) = workflow.select_type(*kind) {
                println!("{}", e);
            }
        }

        if let Err(e) = workflow.continue_to_review() {
            println!("{}", capitalize(&e.to_string()));
        }
        None
    }

    async fn review(&mut self, workflow: &mut BookingWorkflow, editing: bool) -> Option<Route> {
        let title = if editing {
            "Step 2: Confirm Changes"
        } else {
            "Step 2: Confirm Appointment"
        };
        println!("\n--- {} ---", title);
        if editing {
            println!("Note: No additional payment required. Your original payment remains valid.");
        }
        if let Some(error) = workflow.error() {
            println!("Error: {}", error);
        }
        let doctor = workflow.doctor();
        let draft = workflow.draft();
        println!("Doctor:           {}", doctor.name);
        println!("Specialization:   {}", doctor.specialty_label());
        println!("Location:         {}", doctor.location);
        if let Some(date) = draft.selected_date {
            println!("Date:             {}", date.format("%A, %B %-d, %Y"));
        }
        println!(
            "Time:             {}",
            draft.selected_time.map(format_slot_time).unwrap_or_default()
        );
        println!(
            "Type:             {}",
            draft.appointment_type.map(|t| t.name()).unwrap_or("")
        );
        println!("Consultation Fee: Rs.{}", doctor.consultation_fee);

        let confirm = if editing {
            "Confirm & Update Appointment"
        } else {
            "Confirm & Book Appointment"
        };
        println!("\n1. {}\n2. Back\n3. Back to Doctors", confirm);
        match self.get_int_input("Enter choice", Some(1)) {
            1 => {
                println!("{}", if editing { "Updating..." } else { "Booking..." });
                let bookings = match self.patient_bookings() {
                    Ok(service) => service,
                    Err(e) => {
                        println!("Failed to load appointments: {}", e);
                        return Some(Route::Dashboard);
                    }
                };
                match workflow.submit(&bookings).await {
                    Ok(redirect) => {
                        if let Some(message) = workflow.success_message() {
                            println!("\n{}", message);
                        }
                        println!("Returning to your dashboard...");
                        Some(redirect.fired().await.unwrap_or(Route::Dashboard))
                    }
                    Err(e) => {
                        println!("{}", capitalize(&e.to_string()));
                        None
                    }
                }
            }
            2 => {
                if let Err(e) = workflow.back() {
                    println!("{}", e);
                }
                None
            }
            _ => Some(Route::AvailableDoctors),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();

    let config = PortalConfig::from_env();
    let mut cli = PortalCli::new(config);
    cli.run().await;
}
