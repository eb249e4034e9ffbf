//! Form-side drafts of a user record.
//!
//! A [`UserDraft`] is what the create form and the edit modal hold while the
//! operator types. It is converted into a wire request only on submit.

use crate::api::{CreateUserRequest, UpdateUserRequest};
use crate::error::{ModelError, Result};
use crate::role::Role;
use crate::user::User;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// Write-only credential. Zeroized on drop and never printed.
#[derive(Clone, Default)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    pub fn blank() -> Self {
        Self::default()
    }

    /// Blank means "leave unchanged" on update and "missing" on create.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            f.write_str("Password(<blank>)")
        } else {
            f.write_str("Password(***)")
        }
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Password {}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Password::new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub email: String,
    pub password: Password,
    /// Selected role names, in selection order.
    pub roles: Vec<String>,
}

impl UserDraft {
    /// Copy every field of `user` except the password, which stays blank.
    pub fn prefill(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            age: user.age,
            email: user.email.clone(),
            password: Password::blank(),
            roles: user.roles.iter().map(|r| r.name.clone()).collect(),
        }
    }

    /// Local checks run before a create request is issued.
    pub fn validate_for_create(&self, catalog: &[Role]) -> Result<()> {
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::MissingField(field));
            }
        }
        if self.password.is_blank() {
            return Err(ModelError::MissingField("password"));
        }
        if self.roles.is_empty() {
            return Err(ModelError::EmptyRoleSelection);
        }
        self.validate_roles(catalog)
    }

    /// Every selected role must come from the loaded catalog. An empty
    /// catalog means nothing has been loaded yet and is not checked.
    pub fn validate_roles(&self, catalog: &[Role]) -> Result<()> {
        if catalog.is_empty() {
            return Ok(());
        }
        match self
            .roles
            .iter()
            .find(|selected| !catalog.iter().any(|r| &r.name == *selected))
        {
            Some(unknown) => Err(ModelError::UnknownRole(unknown.clone())),
            None => Ok(()),
        }
    }

    pub fn to_create_request(&self) -> CreateUserRequest {
        CreateUserRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            age: self.age,
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            roles: self.roles.clone(),
        }
    }

    /// Only fields the operator actually filled in are sent. A blank password
    /// is dropped so the stored credential stays untouched; the role
    /// selection is always sent because an empty selection is meaningful.
    pub fn to_update_request(&self) -> UpdateUserRequest {
        fn present(value: &str) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        UpdateUserRequest {
            first_name: present(&self.first_name),
            last_name: present(&self.last_name),
            age: self.age,
            email: present(&self.email),
            password: (!self.password.is_blank())
                .then(|| self.password.clone()),
            roles: Some(self.roles.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::UserId;

    fn catalog() -> Vec<Role> {
        vec![Role::new("ADMIN"), Role::new("USER"), Role::new("EDITOR")]
    }

    fn complete_draft() -> UserDraft {
        UserDraft {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            age: Some(85),
            email: "grace@example.com".into(),
            password: Password::new("cobol"),
            roles: vec!["EDITOR".into()],
        }
    }

    #[test]
    fn create_requires_every_mandatory_field() {
        assert_eq!(complete_draft().validate_for_create(&catalog()), Ok(()));

        let mut draft = complete_draft();
        draft.last_name = "   ".into();
        assert_eq!(
            draft.validate_for_create(&catalog()),
            Err(ModelError::MissingField("lastName"))
        );

        let mut draft = complete_draft();
        draft.password = Password::blank();
        assert_eq!(
            draft.validate_for_create(&catalog()),
            Err(ModelError::MissingField("password"))
        );

        let mut draft = complete_draft();
        draft.roles.clear();
        assert_eq!(
            draft.validate_for_create(&catalog()),
            Err(ModelError::EmptyRoleSelection)
        );
    }

    #[test]
    fn roles_must_come_from_catalog() {
        let mut draft = complete_draft();
        draft.roles = vec!["USER".into(), "ROOT".into()];
        assert_eq!(
            draft.validate_for_create(&catalog()),
            Err(ModelError::UnknownRole("ROOT".into()))
        );
        assert_eq!(draft.validate_roles(&[]), Ok(()));
    }

    #[test]
    fn prefill_copies_everything_but_password() {
        let user = User {
            id: UserId(4),
            first_name: "Alan".into(),
            last_name: "Turing".into(),
            age: Some(41),
            email: "alan@example.com".into(),
            roles: vec![Role::new("USER"), Role::new("ADMIN")],
        };
        let draft = UserDraft::prefill(&user);
        assert_eq!(draft.first_name, "Alan");
        assert_eq!(draft.age, Some(41));
        assert_eq!(draft.roles, vec!["USER", "ADMIN"]);
        assert!(draft.password.is_blank());
    }

    #[test]
    fn update_request_omits_blank_fields() {
        let mut draft = complete_draft();
        draft.first_name = String::new();
        draft.password = Password::blank();
        let body = serde_json::to_value(draft.to_update_request()).unwrap();

        assert!(body.get("firstName").is_none());
        assert!(body.get("password").is_none());
        assert_eq!(body["lastName"], "Hopper");
        assert_eq!(body["roles"], serde_json::json!(["EDITOR"]));
    }

    #[test]
    fn password_never_shows_in_debug_output() {
        let rendered = format!("{:?}", complete_draft());
        assert!(!rendered.contains("cobol"));
        assert!(rendered.contains("Password(***)"));
    }
}
