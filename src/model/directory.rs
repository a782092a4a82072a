use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::{Role, Scope};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub password: String,
    pub role: Role,
    pub office: Scope,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeRoster {
    #[schema(example = "Hyderabad")]
    pub office: String,
    #[schema(example = json!(["Ramesh Kumar", "Suresh Reddy"]))]
    pub employees: Vec<String>,
}

/// Static configuration: who may log in, and which employees each office has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directory {
    pub credentials: HashMap<String, Credential>,
    pub rosters: Vec<OfficeRoster>,
}

impl Directory {
    /// Reads a directory file, or falls back to the built-in company table.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(BUILTIN_DIRECTORY.clone());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading directory file {}", path.display()))?;
        let directory: Directory = serde_json::from_str(&raw)
            .with_context(|| format!("parsing directory file {}", path.display()))?;
        directory.validate()?;
        Ok(directory)
    }

    fn validate(&self) -> Result<()> {
        for (username, credential) in &self.credentials {
            match (&credential.role, &credential.office) {
                (Role::Admin, _) => {}
                (Role::OfficeUser, Scope::All) => {
                    bail!("office user '{username}' cannot have scope 'all'")
                }
                (Role::OfficeUser, Scope::Office(office)) if !self.is_office(office) => {
                    bail!("office user '{username}' is scoped to unknown office '{office}'")
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn credential(&self, username: &str) -> Option<&Credential> {
        self.credentials.get(username)
    }

    pub fn offices(&self) -> impl Iterator<Item = &str> {
        self.rosters.iter().map(|r| r.office.as_str())
    }

    pub fn is_office(&self, office: &str) -> bool {
        self.offices().any(|o| o == office)
    }

    pub fn roster(&self, office: &str) -> Option<&[String]> {
        self.rosters
            .iter()
            .find(|r| r.office == office)
            .map(|r| r.employees.as_slice())
    }
}

fn credential(password: &str, role: Role, office: &str) -> Credential {
    Credential {
        password: password.to_string(),
        role,
        office: Scope::from(office.to_string()),
    }
}

fn roster(office: &str, employees: &[&str]) -> OfficeRoster {
    OfficeRoster {
        office: office.to_string(),
        employees: employees.iter().map(|e| e.to_string()).collect(),
    }
}

pub static BUILTIN_DIRECTORY: Lazy<Directory> = Lazy::new(|| Directory {
    credentials: HashMap::from([
        ("admin".to_string(), credential("Sagittal@2024", Role::Admin, "all")),
        (
            "hyderabad".to_string(),
            credential("Hyderabad@123", Role::OfficeUser, "Hyderabad"),
        ),
        (
            "jangareddygudem".to_string(),
            credential("Jangareddy@123", Role::OfficeUser, "Jangareddygudem"),
        ),
        (
            "annavaram".to_string(),
            credential("Annavaram@123", Role::OfficeUser, "Annavaram"),
        ),
        (
            "rajamundry".to_string(),
            credential("Rajamundry@123", Role::OfficeUser, "Rajamundry"),
        ),
        (
            "koraput".to_string(),
            credential("Koraput@123", Role::OfficeUser, "Koraput"),
        ),
    ]),
    rosters: vec![
        roster(
            "Hyderabad",
            &["Ramesh Kumar", "Suresh Reddy", "Priya Sharma", "Anil Gupta", "Rajesh Verma"],
        ),
        roster(
            "Jangareddygudem",
            &["Mahesh Babu", "Lakshmi Devi", "Rajesh Kumar", "Sita Kumari"],
        ),
        roster(
            "Annavaram",
            &[
                "Mallela Srinivas",
                "GV Subba reddy",
                "M Ravi Kumar",
                "Tanneru Anusha",
                "P H Sai Ganesh",
                "M Pothiraj",
                "Yalamarthi V N S Lakshmi Durga",
                "Polugumati Sudev",
                "U Varalakshmi",
                "Gopisetti Teja",
                "Motukuri Srinu",
                "B Bobi",
                "Bodapati Raju",
                "Ravindra Reddy",
                "Narni Ganga Ramana",
                "Thirumala Giri Anil Gopi",
                "Munta Puthara Ganesh",
                "Gosu Ganesh",
                "Ponukumati Vijay Kumar",
                "Chelluboina Ravi Kumar",
                "Oleti Madhu",
                "M Madhu Babu",
                "Kolapati Ganga Chakradhar",
                "Chelluboina Ramakrishna",
                "Tanneru Saketh",
                "Bogadhi Pradeep Kumar",
                "Bandaru Manoj Kumar",
                "Muppidi Simhachalam",
                "Y Suresh",
                "Gadde S P Pavan Kumar",
                "M Veera nageswara Rao",
                "Gundrra Swamy",
                "Nanhelal",
                "Angad",
                "Manish kumar",
                "R R Virendra Kumar",
                "Dhupathi Rajubabu",
                "Gokada Maharaj",
                "Rongala Srinu",
                "Parupalli Srinu",
                "Bikas Kumar",
                "P Madhu Kumar",
                "CH Nani Babu",
                "Mayur",
                "Ashok Kumar Kushwaha",
                "B Nagendra",
                "Gampa Raju",
                "Altaf Raja",
                "Sohel",
                "Manoj Kumar",
                "Murali Krishna",
                "Kudrat Ali",
                "M Siva",
                "M Mahesh",
                "Mummina Shyam Prasad",
                "Uppalapati Rama Chandra Rao",
                "Mummana Prasad",
                "Yerra Srinivas",
                "Dasari Venkatesh",
                "Kandipalli Satyanarayana",
                "Ch Sunitha - Kodavali",
                "Ch Gangadhar-Kodavali",
                "Kotturu Nageswara Rao-BP",
                "Busala Paidiyya-BP",
                "Garllanka Nageswara rao-Garage",
                "Kakada chinnabbai-Arempudi",
                "D Chakravarthi - Garage",
                "Maddu Venkateswarulu - Arempudi",
                "M Apparao - Dharmavaram",
            ],
        ),
        roster(
            "Rajamundry",
            &["Arun Kumar", "Madhavi Latha", "Pavan Kalyan", "Sravya Sri", "Kiran Reddy"],
        ),
        roster(
            "Koraput",
            &["Biswa Ranjan", "Sunita Maharana", "Ajay Mishra", "Priyanka Das"],
        ),
    ],
});
