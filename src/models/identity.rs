use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four disjoint user classes. Each one owns its own role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    Parent,
    Student,
}

/// Order in which role tables are probed at login. Earlier roles win ties.
pub const PROBE_ORDER: [Role; 4] = [Role::Admin, Role::Supervisor, Role::Parent, Role::Student];

impl Role {
    /// Name of the backing table in the data service
    pub fn table(self) -> &'static str {
        match self {
            Role::Admin => "admin_users",
            Role::Supervisor => "supervisor_users",
            Role::Parent => "parent_users",
            Role::Student => "student_users",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Parent => "parent",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "parent" => Ok(Role::Parent),
            "student" => Ok(Role::Student),
            _ => Err(format!("{:?} is not a valid role", s)),
        }
    }
}

/// Fields shared by every resolved user, whatever the role table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// A resolved, role-tagged session principal.
///
/// Only the credential resolver builds these, and the variant never changes
/// for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin(Principal),
    Supervisor(Principal),
    Parent(Principal),
    Student(Principal),
}

impl Identity {
    pub(crate) fn from_role(role: Role, principal: Principal) -> Self {
        match role {
            Role::Admin => Identity::Admin(principal),
            Role::Supervisor => Identity::Supervisor(principal),
            Role::Parent => Identity::Parent(principal),
            Role::Student => Identity::Student(principal),
        }
    }

    pub fn principal(&self) -> &Principal {
        match self {
            Identity::Admin(p)
            | Identity::Supervisor(p)
            | Identity::Parent(p)
            | Identity::Student(p) => p,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Admin(_) => Role::Admin,
            Identity::Supervisor(_) => Role::Supervisor,
            Identity::Parent(_) => Role::Parent,
            Identity::Student(_) => Role::Student,
        }
    }

    pub fn id(&self) -> &str {
        &self.principal().id
    }

    pub fn name(&self) -> &str {
        &self.principal().name
    }

    pub fn username(&self) -> &str {
        &self.principal().username
    }
}

/// Flat JSON shape of an identity: `{id, name, username, email, role}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&Identity> for IdentityView {
    fn from(identity: &Identity) -> Self {
        let p = identity.principal();
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            username: p.username.clone(),
            email: p.email.clone(),
            role: identity.role(),
        }
    }
}
