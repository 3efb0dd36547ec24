/// Route gating and role-based navigation.
use crate::auth::{AuthContext, AuthState};
use crate::models::Role;
use crate::storage::KeyValueStore;

/// Every path the portal knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    SignIn,
    SignUp,
    Dashboard,
    AvailableDoctors,
    TodaysAppointments,
    BookAppointment,
    MedicalReports,
    Payments,
    Settings,
    Profile,
}

impl Route {
    const ALL: [Route; 11] = [
        Route::Root,
        Route::SignIn,
        Route::SignUp,
        Route::Dashboard,
        Route::AvailableDoctors,
        Route::TodaysAppointments,
        Route::BookAppointment,
        Route::MedicalReports,
        Route::Payments,
        Route::Settings,
        Route::Profile,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::SignIn => "/signin",
            Route::SignUp => "/signup",
            Route::Dashboard => "/dashboard",
            Route::AvailableDoctors => "/available-doctors",
            Route::TodaysAppointments => "/todays-appointments",
            Route::BookAppointment => "/book-appointment",
            Route::MedicalReports => "/medical-reports",
            Route::Payments => "/payments",
            Route::Settings => "/settings",
            Route::Profile => "/profile",
        }
    }

    /// Match a path, ignoring a trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    /// Routes reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Root | Route::SignIn | Route::SignUp)
    }
}

/// What ends up on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    SignIn,
    SignUp,
    PatientDashboard,
    DoctorDashboard,
    AvailableDoctors,
    TodaysAppointments,
    BookAppointment,
    MedicalReports,
    Payments,
    Settings,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session check still pending; render a placeholder only.
    Loading,
    Redirect(Route),
    Render(View),
}

/// Decide what to show for `route` given the auth state and role.
pub fn decide(state: AuthState, role: Role, route: Route) -> GuardDecision {
    if route.is_public() {
        return match route {
            Route::SignUp => GuardDecision::Render(View::SignUp),
            Route::SignIn => GuardDecision::Render(View::SignIn),
            _ => GuardDecision::Redirect(Route::SignIn),
        };
    }

    match state {
        AuthState::Initializing => GuardDecision::Loading,
        AuthState::Unauthenticated => GuardDecision::Redirect(Route::SignIn),
        AuthState::Authenticated => GuardDecision::Render(protected_view(role, route)),
    }
}

/// Shorthand for [`decide`] over a live context.
pub fn decide_for<S: KeyValueStore>(auth: &AuthContext<S>, route: Route) -> GuardDecision {
    decide(auth.state(), auth.user_role(), route)
}

fn protected_view(role: Role, route: Route) -> View {
    match route {
        Route::Dashboard => match role {
            Role::Doctor => View::DoctorDashboard,
            Role::Patient => View::PatientDashboard,
        },
        Route::AvailableDoctors => View::AvailableDoctors,
        Route::TodaysAppointments => View::TodaysAppointments,
        Route::BookAppointment => View::BookAppointment,
        Route::MedicalReports => View::MedicalReports,
        Route::Payments => View::Payments,
        Route::Settings => View::Settings,
        Route::Profile => View::Profile,
        Route::Root | Route::SignIn => View::SignIn,
        Route::SignUp => View::SignUp,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(Route),
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

impl MenuItem {
    fn link(label: &'static str, route: Route) -> Self {
        MenuItem {
            label,
            action: MenuAction::Navigate(route),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub title: &'static str,
    pub items: Vec<MenuItem>,
}

/// Sidebar contents for a role.
pub fn menu_for(role: Role) -> Vec<MenuSection> {
    let mut main = vec![MenuItem::link("Dashboard", Route::Dashboard)];
    match role {
        Role::Doctor => {
            main.push(MenuItem::link("Today's Appointments", Route::TodaysAppointments));
        }
        Role::Patient => {
            main.push(MenuItem::link("Available Doctors", Route::AvailableDoctors));
            main.push(MenuItem::link("Medical Reports", Route::MedicalReports));
            main.push(MenuItem::link("Payments", Route::Payments));
        }
    }

    vec![
        MenuSection {
            title: "MAIN",
            items: main,
        },
        MenuSection {
            title: "ACCOUNT",
            items: vec![
                MenuItem::link("Settings", Route::Settings),
                MenuItem::link("My Profile", Route::Profile),
                MenuItem {
                    label: "Logout",
                    action: MenuAction::Logout,
                },
            ],
        },
    ]
}
