//! Submitted forms and their validated forms.
//!
//! Each `*Form` type is what arrives from a client; `validate` runs every
//! field check and either returns the validated value or all of the field
//! errors at once.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::membership::Membership;
use crate::types::{Email, Role, UserId};
use crate::validation::ValidationErrors;

/// Maximum length of a project name.
pub const PROJECT_NAME_MAX: usize = 200;
/// Maximum length of a full name.
pub const FULL_NAME_MAX: usize = 100;
/// Maximum length of a phone number.
pub const PHONE_MAX: usize = 32;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 6;
/// Maximum password length.
pub const PASSWORD_MAX: usize = 100;

// =============================================================================
// Projects
// =============================================================================

/// Project create/edit submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectForm {
    pub name: String,
    pub details: String,
    pub supervisor_ids: Vec<UserId>,
    pub student_ids: Vec<UserId>,
    /// Version the editor loaded. Required on edit, ignored on create.
    pub version: Option<i32>,
}

/// A validated project submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub details: String,
    pub membership: Membership,
}

impl ProjectForm {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<ProjectDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim().to_owned();

        if name.is_empty() {
            errors.push("name", "Project Name is required");
        } else if name.chars().count() > PROJECT_NAME_MAX {
            errors.push(
                "name",
                format!("Project Name must be at most {PROJECT_NAME_MAX} characters"),
            );
        }

        errors.into_result(ProjectDraft {
            name,
            details: self.details,
            membership: Membership::from_ids(self.supervisor_ids, self.student_ids),
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// Admin create/edit user submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
}

/// A validated user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub full_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: Role,
}

impl UserForm {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<UserProfile, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let profile = validate_profile(
            &mut errors,
            &self.full_name,
            &self.email,
            self.phone.as_deref(),
            &self.role,
        );
        match profile {
            Some(profile) if errors.is_empty() => Ok(profile),
            _ => Err(errors),
        }
    }
}

fn validate_profile(
    errors: &mut ValidationErrors,
    full_name: &str,
    email: &str,
    phone: Option<&str>,
    role: &str,
) -> Option<UserProfile> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        errors.push("full_name", "Full Name is required");
    } else if full_name.chars().count() > FULL_NAME_MAX {
        errors.push(
            "full_name",
            format!("Full Name must be at most {FULL_NAME_MAX} characters"),
        );
    }

    let email = if email.trim().is_empty() {
        errors.push("email", "Email is required");
        None
    } else {
        Email::parse(email)
            .map_err(|_| errors.push("email", "Invalid Email Address"))
            .ok()
    };

    let phone = phone.map(str::trim).filter(|p| !p.is_empty());
    if let Some(p) = phone {
        let valid = p.len() <= PHONE_MAX
            && p.chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'));
        if !valid {
            errors.push("phone", "Invalid Phone Number");
        }
    }

    let role = if role.trim().is_empty() {
        errors.push("role", "User Type is required");
        None
    } else {
        role.parse::<Role>()
            .map_err(|_| errors.push("role", "Unknown User Type"))
            .ok()
    };

    Some(UserProfile {
        full_name: full_name.to_owned(),
        email: email?,
        phone: phone.map(str::to_owned),
        role: role?,
    })
}

fn validate_new_password(
    errors: &mut ValidationErrors,
    field: &str,
    password: &str,
    confirmation: &str,
) {
    let len = password.chars().count();
    if password.is_empty() {
        errors.push(field, "Password is required");
    } else if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        errors.push(
            field,
            format!(
                "The password must be at least {PASSWORD_MIN} and at most {PASSWORD_MAX} characters long."
            ),
        );
    }

    if password != confirmation {
        errors.push(
            "confirm_password",
            "The password and confirmation password do not match.",
        );
    }
}

// =============================================================================
// Account
// =============================================================================

/// Public self-registration submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
    /// Only consulted when registering as an administrator.
    pub invite_code: Option<String>,
}

/// A validated registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub profile: UserProfile,
    pub password: String,
}

impl RegistrationForm {
    /// Validate the submission.
    ///
    /// `admin_invite_code` is the configured invite code, if any. Without one,
    /// administrator registration is refused outright.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self, admin_invite_code: Option<&str>) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let profile = validate_profile(
            &mut errors,
            &self.full_name,
            &self.email,
            self.phone.as_deref(),
            &self.role,
        );
        validate_new_password(&mut errors, "password", &self.password, &self.confirm_password);

        if let Some(UserProfile { role, .. }) = &profile
            && !role.is_self_registrable()
        {
            let supplied = self.invite_code.as_deref().map(str::trim);
            match admin_invite_code {
                None => errors.push("role", "Administrator registration is not available"),
                Some(expected) if !invite_code_matches(supplied, expected) => {
                    errors.push("invite_code", "Invalid invite code");
                }
                Some(_) => {}
            }
        }

        match profile {
            Some(profile) if errors.is_empty() => Ok(Registration {
                profile,
                password: self.password,
            }),
            _ => Err(errors),
        }
    }
}

/// Compare a supplied invite code with the configured one in constant time.
fn invite_code_matches(supplied: Option<&str>, expected: &str) -> bool {
    supplied.is_some_and(|code| bool::from(code.as_bytes().ct_eq(expected.as_bytes())))
}

/// Login submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Check that both fields are present and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<(Email, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
            None
        } else {
            Email::parse(&self.email)
                .map_err(|_| errors.push("email", "Invalid Email Address"))
                .ok()
        };
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        match email {
            Some(email) if errors.is_empty() => Ok((email, self.password)),
            _ => Err(errors),
        }
    }
}

/// Change password submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    /// Validate the new password and its confirmation.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.current_password.is_empty() {
            errors.push("current_password", "Current password is required");
        }
        validate_new_password(
            &mut errors,
            "new_password",
            &self.new_password,
            &self.confirm_password,
        );
        errors.into_result(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration(role: &str) -> RegistrationForm {
        RegistrationForm {
            full_name: "Ada Lovelace".to_owned(),
            email: "ada@uni.edu".to_owned(),
            phone: None,
            password: "secret1".to_owned(),
            confirm_password: "secret1".to_owned(),
            role: role.to_owned(),
            invite_code: None,
        }
    }

    #[test]
    fn test_project_form_trims_and_dedupes() {
        let draft = ProjectForm {
            name: "  Capstone A ".to_owned(),
            details: String::new(),
            supervisor_ids: vec![UserId::new(1), UserId::new(1)],
            student_ids: vec![UserId::new(3), UserId::new(2), UserId::new(3)],
            version: None,
        }
        .validate()
        .unwrap();

        assert_eq!(draft.name, "Capstone A");
        assert_eq!(draft.membership.supervisors.len(), 1);
        assert_eq!(draft.membership.students.len(), 2);
    }

    #[test]
    fn test_project_name_rules() {
        let blank = ProjectForm {
            name: "   ".to_owned(),
            ..ProjectForm::default()
        };
        assert!(blank.validate().unwrap_err().has_field("name"));

        let long = ProjectForm {
            name: "x".repeat(PROJECT_NAME_MAX + 1),
            ..ProjectForm::default()
        };
        assert!(long.validate().unwrap_err().has_field("name"));

        let exact = ProjectForm {
            name: "x".repeat(PROJECT_NAME_MAX),
            ..ProjectForm::default()
        };
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_user_form_reports_every_error() {
        let errors = UserForm {
            full_name: " ".to_owned(),
            email: "not-an-email".to_owned(),
            phone: Some("call me".to_owned()),
            role: "janitor".to_owned(),
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 4);
        for field in ["full_name", "email", "phone", "role"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_user_form_blank_phone_is_none() {
        let profile = UserForm {
            full_name: "Sam Supervisor".to_owned(),
            email: "Sam@Uni.edu".to_owned(),
            phone: Some("  ".to_owned()),
            role: "supervisor".to_owned(),
        }
        .validate()
        .unwrap();

        assert_eq!(profile.phone, None);
        assert_eq!(profile.role, Role::Supervisor);
        assert_eq!(profile.email.as_str(), "sam@uni.edu");
    }

    #[test]
    fn test_registration_password_rules() {
        let mut form = registration("Student");
        form.password = "12345".to_owned();
        form.confirm_password = "54321".to_owned();
        let errors = form.validate(None).unwrap_err();
        assert!(errors.has_field("password"));
        assert!(errors.has_field("confirm_password"));
    }

    #[test]
    fn test_invite_code_matches_exactly() {
        assert!(invite_code_matches(Some("k9-Invite-42"), "k9-Invite-42"));
        assert!(!invite_code_matches(Some("k9-Invite-41"), "k9-Invite-42"));
        assert!(!invite_code_matches(Some("k9-Invite"), "k9-Invite-42"));
        assert!(!invite_code_matches(Some(""), "k9-Invite-42"));
        assert!(!invite_code_matches(None, "k9-Invite-42"));
    }

    #[test]
    fn test_registration_student_needs_no_invite() {
        let reg = registration("Student").validate(None).unwrap();
        assert_eq!(reg.profile.role, Role::Student);
        assert_eq!(reg.password, "secret1");
    }

    #[test]
    fn test_admin_registration_refused_without_configured_code() {
        let mut form = registration("Admin");
        form.invite_code = Some("anything".to_owned());
        assert!(form.validate(None).unwrap_err().has_field("role"));
    }

    #[test]
    fn test_admin_registration_requires_matching_code() {
        let mut form = registration("Admin");
        form.invite_code = Some("wrong".to_owned());
        assert!(
            form.clone()
                .validate(Some("k9-Invite-42"))
                .unwrap_err()
                .has_field("invite_code")
        );

        form.invite_code = Some("k9-Invite-42".to_owned());
        let reg = form.validate(Some("k9-Invite-42")).unwrap();
        assert_eq!(reg.profile.role, Role::Admin);
    }

    #[test]
    fn test_login_form() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert!(errors.has_field("email") && errors.has_field("password"));

        let (email, _) = LoginForm {
            email: "Admin@Example.com".to_owned(),
            password: "Admin@123".to_owned(),
        }
        .validate()
        .unwrap();
        assert_eq!(email.as_str(), "admin@example.com");
    }

    #[test]
    fn test_change_password_form() {
        let errors = ChangePasswordForm {
            current_password: String::new(),
            new_password: "abc".to_owned(),
            confirm_password: "abc".to_owned(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.has_field("current_password"));
        assert!(errors.has_field("new_password"));
        assert!(!errors.has_field("confirm_password"));
    }
}
