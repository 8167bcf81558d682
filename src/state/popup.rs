/// Creation popup shared by the "upload concern" and "change role" flows
///
/// Only one popup is open at a time. Closing drops both forms, so any
/// unsaved input is discarded; there is no draft persistence.
use super::data::{NewConcern, Role};
use crate::error::ValidationError;

/// Fields of the upload form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub location: String,
}

impl UploadForm {
    /// Check required fields and build the request body
    pub fn validate(&self, locations: &[String]) -> Result<NewConcern, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("Title"));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingField("Description"));
        }
        let location = self.location.trim();
        if location.is_empty() {
            return Err(ValidationError::MissingField("Location"));
        }
        if !locations.iter().any(|known| known == location) {
            return Err(ValidationError::UnknownLocation(location.to_owned()));
        }
        let image_url = Some(self.image_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_owned);

        Ok(NewConcern {
            title: title.to_owned(),
            description: description.to_owned(),
            image_url,
            location: location.to_owned(),
        })
    }
}

/// Fields of the role change form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleForm {
    pub email: String,
    pub role: Role,
}

impl RoleForm {
    pub fn validate(&self) -> Result<(String, Role), ValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("Email"));
        }
        if !is_plausible_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_owned()));
        }
        Ok((email.to_owned(), self.role))
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Popup {
    #[default]
    Closed,
    Upload(UploadForm),
    Role(RoleForm),
}

impl Popup {
    /// CLOSED -> OPEN-UPLOAD with an empty form. Ignored while another popup is open.
    pub fn open_upload(&mut self) -> bool {
        if !self.is_closed() {
            return false;
        }
        *self = Popup::Upload(UploadForm::default());
        true
    }

    /// CLOSED -> OPEN-ROLE with the default role. Ignored while another popup is open.
    pub fn open_role(&mut self) -> bool {
        if !self.is_closed() {
            return false;
        }
        *self = Popup::Role(RoleForm::default());
        true
    }

    pub fn close(&mut self) {
        *self = Popup::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Popup::Closed)
    }

    pub fn upload_form_mut(&mut self) -> Option<&mut UploadForm> {
        match self {
            Popup::Upload(form) => Some(form),
            _ => None,
        }
    }

    pub fn role_form_mut(&mut self) -> Option<&mut RoleForm> {
        match self {
            Popup::Role(form) => Some(form),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> Vec<String> {
        vec!["Harbor".to_owned(), "Old Town".to_owned()]
    }

    #[test]
    fn test_close_discards_unsaved_input() {
        let mut popup = Popup::default();
        assert!(popup.open_upload());
        popup.upload_form_mut().unwrap().title = "Half written".into();

        popup.close();
        assert!(popup.open_upload());

        assert_eq!(popup, Popup::Upload(UploadForm::default()));
    }

    #[test]
    fn test_only_one_popup_at_a_time() {
        let mut popup = Popup::default();
        assert!(popup.open_role());
        assert!(!popup.open_upload());
        assert!(matches!(popup, Popup::Role(_)));
        assert!(popup.upload_form_mut().is_none());
    }

    #[test]
    fn test_role_form_starts_at_default_role() {
        let mut popup = Popup::default();
        popup.open_role();
        assert_eq!(popup.role_form_mut().unwrap().role, Role::User);
    }

    #[test]
    fn test_upload_validation() {
        let mut form = UploadForm {
            title: "  Broken swing ".into(),
            description: "Chain snapped".into(),
            image_url: "   ".into(),
            location: "Old Town".into(),
        };
        let concern = form.validate(&locations()).unwrap();
        assert_eq!(concern.title, "Broken swing");
        assert_eq!(concern.image_url, None);

        form.location = "Atlantis".into();
        assert_eq!(
            form.validate(&locations()),
            Err(ValidationError::UnknownLocation("Atlantis".into()))
        );

        form.description = " ".into();
        assert_eq!(form.validate(&locations()), Err(ValidationError::MissingField("Description")));
    }

    #[test]
    fn test_role_form_validation() {
        let form = RoleForm {
            email: "moderator@city.example".into(),
            role: Role::Moderator,
        };
        assert_eq!(form.validate(), Ok(("moderator@city.example".into(), Role::Moderator)));

        let form = RoleForm {
            email: "not-an-email".into(),
            role: Role::Admin,
        };
        assert_eq!(form.validate(), Err(ValidationError::InvalidEmail("not-an-email".into())));
    }
}
