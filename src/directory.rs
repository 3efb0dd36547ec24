/// Doctor directory with the portal's demo roster.
use crate::error::{PortalError, PortalResult};
use crate::models::{AvailabilitySlotTemplate, DayOfWeek, Doctor, Specialization};

/// Criteria from the "available doctors" page. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub specialty: Option<String>,
    pub search: String,
    pub location: String,
}

/// Read-only lookup over the known doctors.
#[derive(Debug, Clone, Default)]
pub struct DoctorDirectory {
    doctors: Vec<Doctor>,
}

impl DoctorDirectory {
    /// Build a directory; names must be unique ignoring case.
    pub fn new(doctors: Vec<Doctor>) -> PortalResult<Self> {
        for (i, doctor) in doctors.iter().enumerate() {
            let clash = doctors[..i]
                .iter()
                .any(|d| d.name.to_lowercase() == doctor.name.to_lowercase());
            if clash {
                return Err(PortalError::validation(format!(
                    "duplicate doctor name: {}",
                    doctor.name
                )));
            }
        }
        Ok(Self { doctors })
    }

    /// The six demo doctors, all on the standard weekly template.
    pub fn demo() -> Self {
        let weekly = standard_week();
        Self {
            doctors: vec![
                demo_doctor(1, "Dr. James Anderson", "james@apollo.com", &[("Dermatologist", 12)], "Apollo Hospital, Mumbai", 500, 4.8, &weekly),
                demo_doctor(2, "Dr. Maria Hernandez", "maria@max.com", &[("Pediatrician", 15)], "Max Healthcare, Delhi", 600, 4.7, &weekly),
                demo_doctor(3, "Dr. Sarah Williams", "sarah@fortis.com", &[("Cardiologist", 10)], "Fortis Hospital, Bangalore", 550, 4.9, &weekly),
                demo_doctor(4, "Dr. Alex Smith", "alex@aiims.com", &[("Neurologist", 18)], "AIIMS, Delhi", 700, 4.6, &weekly),
                demo_doctor(
                    5,
                    "Dr. Priya Sharma",
                    "priya@lilavati.com",
                    &[("Ophthalmologist", 8), ("General Physician", 12)],
                    "Lilavati Hospital, Mumbai",
                    450,
                    4.5,
                    &weekly,
                ),
                demo_doctor(6, "Dr. Rajesh Kumar", "rajesh@rainbow.com", &[("Orthopedic", 14)], "Rainbow Hospital, Pune", 650, 4.7, &weekly),
            ],
        }
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    /// Case-insensitive exact name match.
    pub fn find_by_name(&self, name: &str) -> Option<&Doctor> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.doctors.iter().find(|d| d.name.to_lowercase() == wanted)
    }

    pub fn filter(&self, filter: &DoctorFilter) -> Vec<&Doctor> {
        let search = filter.search.trim().to_lowercase();
        let location = filter.location.trim().to_lowercase();

        self.doctors
            .iter()
            .filter(|d| match &filter.specialty {
                Some(specialty) => d.has_specialty(specialty),
                None => true,
            })
            .filter(|d| d.name.to_lowercase().contains(&search))
            .filter(|d| d.location.to_lowercase().contains(&location))
            .collect()
    }

    /// Distinct specialty names in roster order.
    pub fn specialties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for spec in self.doctors.iter().flat_map(|d| d.specializations.iter()) {
            if !names.contains(&spec.name.as_str()) {
                names.push(&spec.name);
            }
        }
        names
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_doctor(
    doctor_id: u32,
    name: &str,
    email: &str,
    specs: &[(&str, u32)],
    location: &str,
    consultation_fee: u32,
    rating: f32,
    availability: &[AvailabilitySlotTemplate],
) -> Doctor {
    Doctor {
        doctor_id,
        name: name.to_string(),
        email: email.to_string(),
        specializations: specs
            .iter()
            .map(|(name, years)| Specialization {
                name: name.to_string(),
                experience_years: *years,
            })
            .collect(),
        location: location.to_string(),
        consultation_fee,
        rating,
        availability: availability.to_vec(),
    }
}

/// Monday to Friday 09:00-17:00, Saturday 10:00-14:00.
pub fn standard_week() -> Vec<AvailabilitySlotTemplate> {
    [
        (DayOfWeek::Monday, "09:00", "17:00"),
        (DayOfWeek::Tuesday, "09:00", "17:00"),
        (DayOfWeek::Wednesday, "09:00", "17:00"),
        (DayOfWeek::Thursday, "09:00", "17:00"),
        (DayOfWeek::Friday, "09:00", "17:00"),
        (DayOfWeek::Saturday, "10:00", "14:00"),
    ]
    .into_iter()
    .filter_map(|(day, start, end)| AvailabilitySlotTemplate::parse(day, start, end).ok())
    .collect()
}
