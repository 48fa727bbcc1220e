//! REST backend access
//!
//! One collection per entity (`/patients`, `/doctors`, `/regulatoryDoctors`,
//! `/specialties`, `/hospitals`, `/requests`) plus `/enums/{kind}` for the
//! option lists. Responses are entity-shaped; there is no shared envelope.

pub mod client;
pub mod errors;
pub mod services;
pub mod wire;

pub use client::RestClient;
pub use errors::{ApiError, ApiResult};
pub use services::{
    CrudService, DoctorService, EnumService, EnumSource, HospitalService, ListService,
    PatientService, RegulatoryDoctorService, RequestService, RestService, SpecialtyService,
};
pub use wire::FormMapping;

use std::sync::Arc;

/// Every service the console needs, built from one client
#[derive(Clone)]
pub struct Services {
    pub patients: Arc<PatientService>,
    pub doctors: Arc<DoctorService>,
    pub regulatory_doctors: Arc<RegulatoryDoctorService>,
    pub specialties: Arc<SpecialtyService>,
    pub hospitals: Arc<HospitalService>,
    pub requests: Arc<RequestService>,
    pub enums: Arc<EnumService>,
}

impl Services {
    pub fn new(client: RestClient) -> Self {
        Self {
            patients: Arc::new(RestService::new(client.clone())),
            doctors: Arc::new(RestService::new(client.clone())),
            regulatory_doctors: Arc::new(RestService::new(client.clone())),
            specialties: Arc::new(RestService::new(client.clone())),
            hospitals: Arc::new(RestService::new(client.clone())),
            requests: Arc::new(RequestService::new(client.clone())),
            enums: Arc::new(EnumService::new(client)),
        }
    }
}
