use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub username: String,
    /// SHA-256 hex digest, never the clear-text password.
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub join_date: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub resignation_date: Option<String>,
    #[serde(default)]
    pub epf_number: String,
    #[serde(default)]
    pub esi_number: String,
    #[serde(default)]
    pub payroll: f64,
    #[serde(default)]
    pub is_admin: bool,
    /// Classes this teacher is assigned to teach.
    #[serde(default)]
    pub classes: Vec<String>,
}

/// Students live in per-class lists; `class_name` always equals the partition key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub admission_no: String,
    pub name: String,
    #[serde(default)]
    pub roll_no: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub date_of_joining: String,
    #[serde(default)]
    pub date_of_tc: Option<String>,
    #[serde(default)]
    pub adhar_number: String,
    #[serde(default)]
    pub father_name: String,
    #[serde(default)]
    pub mother_name: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub parent_email: String,
    #[serde(default)]
    pub parent_phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub financial_status: String,
    #[serde(default)]
    pub passport_photo_path: Option<String>,
    /// Set when a parent registers against this admission number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_password: Option<String>,
}

impl Student {
    pub fn has_parent_account(&self) -> bool {
        self.parent_password
            .as_deref()
            .is_some_and(|p| !p.is_empty())
    }

    /// Copy safe to hand to callers: no credential hash.
    pub fn redacted(&self) -> Student {
        Student {
            parent_password: None,
            ..self.clone()
        }
    }
}

impl Teacher {
    pub fn redacted(&self) -> serde_json::Value {
        let mut v = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = v.as_object_mut() {
            obj.remove("password");
        }
        v
    }
}
