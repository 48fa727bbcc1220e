//! Pages of the console

pub mod crud;
pub mod doctor;
pub mod entity_page;
pub mod enums;
pub mod home;
pub mod hospital;
pub mod patient;
pub mod regulatory_doctor;
pub mod request;
pub mod specialty;
pub mod transfer;

pub use doctor::DoctorPage;
pub use entity_page::{EntitySchema, FormPage};
pub use home::HomePage;
pub use hospital::HospitalPage;
pub use patient::PatientPage;
pub use regulatory_doctor::RegulatoryDoctorPage;
pub use request::{RequestPage, RequestSources};
pub use specialty::SpecialtyPage;
pub use transfer::TransferPage;
