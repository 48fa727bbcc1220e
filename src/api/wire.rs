//! Wire shapes of the person-backed entities
//!
//! Patients, doctors and regulatory doctors come back from the API with their
//! personal data nested under a `person` record (doctors one level deeper,
//! under `Employee`). The console works with flat records, so every nested
//! shape has an explicit `to_form`/`from_form` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{opaque_id, opaque_id_opt, Doctor, Patient, RegulatoryDoctor};

/// Two-way mapping between a wire shape and its flat form-facing record
pub trait FormMapping: Sized {
    type Form;

    fn to_form(self) -> Self::Form;
    /// Inputs are sent flat, so outbound traffic never takes this path; it
    /// exists to check the mapping round-trips
    fn from_form(form: &Self::Form) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonDto {
    #[serde(
        default,
        deserialize_with = "opaque_id_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    pub cpf: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: String,
}

impl PersonDto {
    fn flat(name: &str, cpf: &str, phone: &str, gender: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            cpf: cpf.to_string(),
            phone: if phone.is_empty() {
                None
            } else {
                Some(phone.to_string())
            },
            gender: gender.to_string(),
        }
    }

    fn phone(&self) -> String {
        self.phone.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub person: PersonDto,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

impl FormMapping for PatientDto {
    type Form = Patient;

    fn to_form(self) -> Patient {
        Patient {
            phone: self.person.phone(),
            id: self.id,
            name: self.person.name,
            cpf: self.person.cpf,
            gender: self.person.gender,
            blood_type: self.blood_type.unwrap_or_default(),
            // The backend stores a timestamp, the form edits a plain date
            birth_date: self
                .birth_date
                .map(|d| d.split('T').next().unwrap_or_default().to_string())
                .unwrap_or_default(),
        }
    }

    fn from_form(form: &Patient) -> Self {
        Self {
            id: form.id.clone(),
            person: PersonDto::flat(&form.name, &form.cpf, &form.phone, &form.gender),
            blood_type: Some(form.blood_type.clone()).filter(|s| !s.is_empty()),
            birth_date: Some(form.birth_date.clone()).filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDto {
    #[serde(default)]
    pub registration: String,
    pub person: PersonDto,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDto {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub crm: String,
    #[serde(rename = "Employee")]
    pub employee: EmployeeDto,
}

impl FormMapping for DoctorDto {
    type Form = Doctor;

    fn to_form(self) -> Doctor {
        let person = self.employee.person;
        Doctor {
            phone: person.phone(),
            id: self.id,
            name: person.name,
            cpf: person.cpf,
            gender: person.gender,
            crm: self.crm,
            registration: self.employee.registration,
        }
    }

    fn from_form(form: &Doctor) -> Self {
        Self {
            id: form.id.clone(),
            created_at: None,
            updated_at: None,
            crm: form.crm.clone(),
            employee: EmployeeDto {
                registration: form.registration.clone(),
                person: PersonDto::flat(&form.name, &form.cpf, &form.phone, &form.gender),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryDoctorDto {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub crm: String,
    #[serde(default)]
    pub insurance: String,
    pub person: PersonDto,
}

impl FormMapping for RegulatoryDoctorDto {
    type Form = RegulatoryDoctor;

    fn to_form(self) -> RegulatoryDoctor {
        RegulatoryDoctor {
            phone: self.person.phone(),
            id: self.id,
            name: self.person.name,
            cpf: self.person.cpf,
            gender: self.person.gender,
            crm: self.crm,
            insurance: self.insurance,
        }
    }

    fn from_form(form: &RegulatoryDoctor) -> Self {
        Self {
            id: form.id.clone(),
            created_at: None,
            updated_at: None,
            crm: form.crm.clone(),
            insurance: form.insurance.clone(),
            person: PersonDto::flat(&form.name, &form.cpf, &form.phone, &form.gender),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_response_flattens() {
        let body = r#"{
            "id": "d1",
            "createdAt": "2024-02-01T12:00:00.000Z",
            "updatedAt": "2024-02-01T12:00:00.000Z",
            "crm": "123456",
            "Employee": {
                "registration": "MAT-9",
                "person": {"name": "Dr. João Silva", "cpf": "111", "phone": "9999", "gender": "MALE"}
            }
        }"#;
        let doctor = serde_json::from_str::<DoctorDto>(body).unwrap().to_form();
        assert_eq!(doctor.id, "d1");
        assert_eq!(doctor.name, "Dr. João Silva");
        assert_eq!(doctor.registration, "MAT-9");
        assert_eq!(doctor.phone, "9999");
    }

    #[test]
    fn test_patient_birth_date_is_trimmed_to_date() {
        let body = r#"{
            "id": 12,
            "bloodType": "O_POSITIVE",
            "birthDate": "1999-09-09T00:00:00.000Z",
            "person": {"id": "x", "name": "Ana", "cpf": "123", "gender": "FEMALE"}
        }"#;
        let patient = serde_json::from_str::<PatientDto>(body).unwrap().to_form();
        assert_eq!(patient.id, "12");
        assert_eq!(patient.birth_date, "1999-09-09");
        assert_eq!(patient.phone, "");
        assert_eq!(patient.blood_type, "O_POSITIVE");
    }

    #[test]
    fn test_regulatory_doctor_mapping_is_reversible() {
        let flat = RegulatoryDoctor {
            id: "r1".to_string(),
            name: "Bia".to_string(),
            cpf: "222".to_string(),
            phone: String::new(),
            crm: "CRM-1".to_string(),
            insurance: "Unimed".to_string(),
            gender: "FEMALE".to_string(),
        };
        let nested = RegulatoryDoctorDto::from_form(&flat);
        assert_eq!(nested.person.name, "Bia");
        assert_eq!(nested.person.phone, None);
        assert_eq!(nested.to_form(), flat);
    }

    #[test]
    fn test_nested_doctor_serializes_with_employee_key() {
        let doctor = Doctor {
            id: "d2".to_string(),
            name: "Carla".to_string(),
            crm: "42".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(DoctorDto::from_form(&doctor)).unwrap();
        assert_eq!(json["Employee"]["person"]["name"], "Carla");
        assert_eq!(json["crm"], "42");
    }
}
