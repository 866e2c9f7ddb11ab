use chrono::NaiveDate;

use crate::state::Upload;
use crate::validation::{self, ValidationError};

/// A finalize submission that passed every local check.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub udin: String,
    pub signing_date: NaiveDate,
    pub certificate: Upload,
}

impl FinalizeRequest {
    pub fn validate(
        udin: &str,
        signing_date: &str,
        certificate: Option<Upload>,
    ) -> Result<Self, ValidationError> {
        let udin = validation::required("UDIN", udin)?;
        if !validation::is_valid_udin(&udin) {
            return Err(ValidationError::InvalidUdin);
        }
        let signing_date = validation::parse_date("signing date", signing_date)?;
        let certificate = certificate
            .filter(|file| !file.is_empty())
            .ok_or(ValidationError::MissingCertificate)?;
        Ok(FinalizeRequest {
            udin: udin.to_uppercase(),
            signing_date,
            certificate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf() -> Option<Upload> {
        Some(Upload {
            file_name: "signed.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.4".to_vec(),
        })
    }

    #[test]
    fn accepts_complete_submission() {
        let req = FinalizeRequest::validate("24123456abcdef1234", "2025-05-30", pdf()).unwrap();
        assert_eq!(req.udin, "24123456ABCDEF1234");
        assert_eq!(req.signing_date, NaiveDate::from_ymd_opt(2025, 5, 30).unwrap());
    }

    #[test]
    fn rejects_bad_udin() {
        let err = FinalizeRequest::validate("24-123456ABCDEF123", "2025-05-30", pdf()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidUdin);
    }

    #[test]
    fn certificate_is_required() {
        assert_eq!(
            FinalizeRequest::validate("24123456ABCDEF1234", "2025-05-30", None).unwrap_err(),
            ValidationError::MissingCertificate
        );
        let empty = Some(Upload {
            file_name: "signed.pdf".into(),
            content_type: None,
            bytes: Vec::new(),
        });
        assert_eq!(
            FinalizeRequest::validate("24123456ABCDEF1234", "2025-05-30", empty).unwrap_err(),
            ValidationError::MissingCertificate
        );
    }

    #[test]
    fn signing_date_is_required() {
        assert_eq!(
            FinalizeRequest::validate("24123456ABCDEF1234", "", pdf()).unwrap_err(),
            ValidationError::Required("signing date")
        );
    }
}
