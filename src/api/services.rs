//! Per-entity services on top of [`RestClient`]

use async_trait::async_trait;
use futures::future::{try_join, try_join_all};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use tracing::debug;

use super::client::RestClient;
use super::errors::ApiResult;
use super::wire::{DoctorDto, FormMapping, PatientDto, RegulatoryDoctorDto};
use crate::models::{
    Doctor, DoctorInput, EnumItem, EnumKind, Hospital, Patient, PatientInput, RegulatoryDoctor,
    RegulatoryDoctorInput, Specialty, SpecialtyInput, TransferRequest, TransferRequestInput,
};

/// Read side of a resource collection
#[async_trait]
pub trait ListService: Send + Sync {
    type Record: Send + Sync + 'static;

    async fn list(&self) -> ApiResult<Vec<Self::Record>>;
}

/// Full create/update/delete surface of a resource collection
#[async_trait]
pub trait CrudService: ListService {
    type Input: Send + Sync + 'static;

    async fn create(&self, input: &Self::Input) -> ApiResult<Self::Record>;
    async fn update(&self, id: &str, input: &Self::Input) -> ApiResult<Self::Record>;
    async fn delete(&self, id: &str) -> ApiResult<()>;
}

/// Static description of one REST collection
pub trait Resource: Send + Sync + 'static {
    const PATH: &'static str;

    type Wire: DeserializeOwned + Send + 'static;
    type Record: Send + Sync + 'static;
    type Input: Serialize + Send + Sync + 'static;

    fn into_record(wire: Self::Wire) -> Self::Record;
}

pub struct Patients;
pub struct Doctors;
pub struct RegulatoryDoctors;
pub struct Specialties;
pub struct Hospitals;
pub struct Requests;

impl Resource for Patients {
    const PATH: &'static str = "/patients";
    type Wire = PatientDto;
    type Record = Patient;
    type Input = PatientInput;

    fn into_record(wire: PatientDto) -> Patient {
        wire.to_form()
    }
}

impl Resource for Doctors {
    const PATH: &'static str = "/doctors";
    type Wire = DoctorDto;
    type Record = Doctor;
    type Input = DoctorInput;

    fn into_record(wire: DoctorDto) -> Doctor {
        wire.to_form()
    }
}

impl Resource for RegulatoryDoctors {
    const PATH: &'static str = "/regulatoryDoctors";
    type Wire = RegulatoryDoctorDto;
    type Record = RegulatoryDoctor;
    type Input = RegulatoryDoctorInput;

    fn into_record(wire: RegulatoryDoctorDto) -> RegulatoryDoctor {
        wire.to_form()
    }
}

impl Resource for Specialties {
    const PATH: &'static str = "/specialties";
    type Wire = Specialty;
    type Record = Specialty;
    type Input = SpecialtyInput;

    fn into_record(wire: Specialty) -> Specialty {
        wire
    }
}

impl Resource for Hospitals {
    const PATH: &'static str = "/hospitals";
    type Wire = Hospital;
    type Record = Hospital;
    type Input = Hospital;

    fn into_record(wire: Hospital) -> Hospital {
        wire
    }
}

impl Resource for Requests {
    const PATH: &'static str = "/requests";
    type Wire = TransferRequest;
    type Record = TransferRequest;
    type Input = TransferRequestInput;

    fn into_record(wire: TransferRequest) -> TransferRequest {
        wire
    }
}

/// Generic REST-backed service for one [`Resource`]
pub struct RestService<Res> {
    client: RestClient,
    _resource: PhantomData<fn() -> Res>,
}

impl<Res> Clone for RestService<Res> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<Res: Resource> RestService<Res> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> ApiResult<Res::Record> {
        let wire: Res::Wire = self.client.get(Res::PATH, id).await?;
        Ok(Res::into_record(wire))
    }
}

#[async_trait]
impl<Res: Resource> ListService for RestService<Res> {
    type Record = Res::Record;

    async fn list(&self) -> ApiResult<Vec<Res::Record>> {
        let wire: Vec<Res::Wire> = self.client.get_all(Res::PATH).await?;
        debug!("Loaded {} records from {}", wire.len(), Res::PATH);
        Ok(wire.into_iter().map(Res::into_record).collect())
    }
}

#[async_trait]
impl<Res: Resource> CrudService for RestService<Res> {
    type Input = Res::Input;

    async fn create(&self, input: &Res::Input) -> ApiResult<Res::Record> {
        let wire: Res::Wire = self.client.create(Res::PATH, input).await?;
        Ok(Res::into_record(wire))
    }

    async fn update(&self, id: &str, input: &Res::Input) -> ApiResult<Res::Record> {
        let wire: Res::Wire = self.client.update(Res::PATH, id, input).await?;
        Ok(Res::into_record(wire))
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client.delete(Res::PATH, id).await
    }
}

pub type PatientService = RestService<Patients>;
pub type DoctorService = RestService<Doctors>;
pub type RegulatoryDoctorService = RestService<RegulatoryDoctors>;
pub type SpecialtyService = RestService<Specialties>;
pub type HospitalService = RestService<Hospitals>;

/// Requests only carry foreign keys; every record returned is enriched with
/// its patient and specialty before it reaches a page.
#[derive(Clone)]
pub struct RequestService {
    requests: RestService<Requests>,
    patients: PatientService,
    specialties: SpecialtyService,
}

impl RequestService {
    pub fn new(client: RestClient) -> Self {
        Self {
            requests: RestService::new(client.clone()),
            patients: RestService::new(client.clone()),
            specialties: RestService::new(client),
        }
    }

    async fn enrich(&self, mut request: TransferRequest) -> ApiResult<TransferRequest> {
        let (patient, specialty) = try_join(
            self.patients.get(&request.patient_id),
            self.specialties.get(&request.specialty_id),
        )
        .await?;
        request.patient = Some(patient);
        request.specialty = Some(specialty);
        Ok(request)
    }
}

#[async_trait]
impl ListService for RequestService {
    type Record = TransferRequest;

    async fn list(&self) -> ApiResult<Vec<TransferRequest>> {
        let requests = self.requests.list().await?;
        try_join_all(requests.into_iter().map(|r| self.enrich(r))).await
    }
}

#[async_trait]
impl CrudService for RequestService {
    type Input = TransferRequestInput;

    async fn create(&self, input: &TransferRequestInput) -> ApiResult<TransferRequest> {
        let created = self.requests.create(input).await?;
        self.enrich(created).await
    }

    async fn update(&self, id: &str, input: &TransferRequestInput) -> ApiResult<TransferRequest> {
        let updated = self.requests.update(id, input).await?;
        self.enrich(updated).await
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.requests.delete(id).await
    }
}

/// Enumerations used to fill plain selects
#[async_trait]
pub trait EnumSource: Send + Sync {
    async fn options(&self, kind: EnumKind) -> ApiResult<Vec<EnumItem>>;
}

#[derive(Clone)]
pub struct EnumService {
    client: RestClient,
}

impl EnumService {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnumSource for EnumService {
    async fn options(&self, kind: EnumKind) -> ApiResult<Vec<EnumItem>> {
        let path = format!("/enums/{}", kind.as_path());
        self.client.get_all(&path).await
    }
}
