use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub const RESUME_CONTENT_TYPE: &str = "application/pdf";
/// 5 MiB.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please upload a PDF file only.")]
    NotPdf,

    #[error("File size must be less than 5MB.")]
    TooLarge,

    #[error("Unknown option '{0}'")]
    UnknownOption(String),
}

/// Declares a select-box enumeration whose wire value is its display label.
macro_rules! form_options {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = FormError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| option.label() == s)
                    .ok_or_else(|| FormError::UnknownOption(s.to_string()))
            }
        }
    };
}

form_options!(
    /// Highest education level.
    Education {
        HighSchool => "High School",
        Diploma => "Diploma",
        Bachelors => "Bachelor's Degree",
        Masters => "Master's Degree",
        Phd => "PhD",
        Other => "Other",
    }
);

form_options!(NoticePeriod {
    Immediate => "Immediate",
    Days15 => "15 Days",
    Days30 => "30 Days",
    Days45 => "45 Days",
    Days60 => "60 Days",
    Days90 => "90 Days",
    MoreThan90 => "More than 90 Days",
});

form_options!(
    /// Years of professional experience.
    Experience {
        UpToOne => "0-1 Years",
        OneToTwo => "1-2 Years",
        TwoToThree => "2-3 Years",
        ThreeToFive => "3-5 Years",
        FiveToSeven => "5-7 Years",
        SevenToTen => "7-10 Years",
        TenPlus => "10+ Years",
    }
);

/// Text fields of the application, serialized with the endpoint's wire names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFields {
    pub full_name: String,
    pub contact_number: String,
    pub education: String,
    pub notice_period: String,
    pub email: String,
    pub linkedin_url: String,
    #[serde(rename = "currentCTC")]
    pub current_ctc: String,
    pub experience: String,
    pub portfolio_link: String,
}

impl ApplicationFields {
    /// `(wire name, value)` pairs in form order.
    pub fn wire_pairs(&self) -> [(&'static str, &str); 9] {
        [
            ("fullName", self.full_name.as_str()),
            ("contactNumber", self.contact_number.as_str()),
            ("education", self.education.as_str()),
            ("noticePeriod", self.notice_period.as_str()),
            ("email", self.email.as_str()),
            ("linkedinUrl", self.linkedin_url.as_str()),
            ("currentCTC", self.current_ctc.as_str()),
            ("experience", self.experience.as_str()),
            ("portfolioLink", self.portfolio_link.as_str()),
        ]
    }
}

/// A file the applicant picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Current values of the application form.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    fields: ApplicationFields,
    resume: Option<ResumeFile>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &ApplicationFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut ApplicationFields {
        &mut self.fields
    }

    /// Sets a field by its wire name, as a change event from an input would.
    /// Returns `false` for unknown names.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            "fullName" => &mut self.fields.full_name,
            "contactNumber" => &mut self.fields.contact_number,
            "education" => &mut self.fields.education,
            "noticePeriod" => &mut self.fields.notice_period,
            "email" => &mut self.fields.email,
            "linkedinUrl" => &mut self.fields.linkedin_url,
            "currentCTC" => &mut self.fields.current_ctc,
            "experience" => &mut self.fields.experience,
            "portfolioLink" => &mut self.fields.portfolio_link,
            _ => return false,
        };
        *slot = value.into();
        true
    }

    pub fn select_education(&mut self, education: Education) {
        self.fields.education = education.label().to_string();
    }

    pub fn select_notice_period(&mut self, notice_period: NoticePeriod) {
        self.fields.notice_period = notice_period.label().to_string();
    }

    pub fn select_experience(&mut self, experience: Experience) {
        self.fields.experience = experience.label().to_string();
    }

    pub fn resume(&self) -> Option<&ResumeFile> {
        self.resume.as_ref()
    }

    /// Accepts a PDF of at most 5 MiB. A rejected file leaves the previous
    /// selection in place.
    pub fn select_resume(&mut self, file: ResumeFile) -> Result<(), FormError> {
        if file.content_type != RESUME_CONTENT_TYPE {
            return Err(FormError::NotPdf);
        }
        if file.size() > MAX_RESUME_BYTES {
            return Err(FormError::TooLarge);
        }
        self.resume = Some(file);
        Ok(())
    }

    pub fn clear_resume(&mut self) {
        self.resume = None;
    }

    /// Labels of required fields that are still blank. The server performs the
    /// same check and has the final word.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let f = &self.fields;
        [
            ("Full Name", &f.full_name),
            ("Contact Number", &f.contact_number),
            ("Highest Education", &f.education),
            ("Notice Period", &f.notice_period),
            ("Email", &f.email),
            ("Current CTC", &f.current_ctc),
            ("Experience", &f.experience),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }

    /// Clears every field and the selected resume.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
pub(crate) fn filled_form() -> FormState {
    let mut form = FormState::new();
    form.set_field("fullName", "Asha Rao");
    form.set_field("contactNumber", "+91 98765 43210");
    form.set_field("email", "asha@example.com");
    form.set_field("currentCTC", "12 LPA");
    form.select_education(Education::Masters);
    form.select_notice_period(NoticePeriod::Days30);
    form.select_experience(Experience::ThreeToFive);
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(len: usize) -> ResumeFile {
        ResumeFile {
            filename: "resume.pdf".to_string(),
            content_type: RESUME_CONTENT_TYPE.to_string(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn test_option_labels_round_trip() {
        assert_eq!("PhD".parse::<Education>().unwrap(), Education::Phd);
        assert_eq!(NoticePeriod::MoreThan90.to_string(), "More than 90 Days");
        assert_eq!(Experience::ALL.len(), 7);
        assert!("Select Option".parse::<Experience>().is_err());
    }

    #[test]
    fn test_select_resume_accepts_pdf_within_limit() {
        let mut form = FormState::new();
        form.select_resume(pdf(MAX_RESUME_BYTES)).unwrap();
        assert_eq!(form.resume().unwrap().size(), MAX_RESUME_BYTES);
    }

    #[test]
    fn test_rejected_resume_keeps_previous_selection() {
        let mut form = FormState::new();
        form.select_resume(pdf(10)).unwrap();

        let mut png = pdf(10);
        png.filename = "photo.png".to_string();
        png.content_type = "image/png".to_string();
        assert_eq!(form.select_resume(png), Err(FormError::NotPdf));

        assert_eq!(
            form.select_resume(pdf(MAX_RESUME_BYTES + 1)),
            Err(FormError::TooLarge)
        );
        assert_eq!(form.resume().unwrap().size(), 10);
    }

    #[test]
    fn test_rejection_messages_are_user_facing() {
        assert_eq!(FormError::NotPdf.to_string(), "Please upload a PDF file only.");
        assert_eq!(FormError::TooLarge.to_string(), "File size must be less than 5MB.");
    }

    #[test]
    fn test_missing_required_lists_blank_fields() {
        let mut form = filled_form();
        assert!(form.missing_required().is_empty());

        form.set_field("email", "   ");
        form.set_field("fullName", "");
        assert_eq!(form.missing_required(), vec!["Full Name", "Email"]);
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let mut form = FormState::new();
        assert!(!form.set_field("favouriteColour", "teal"));
        assert_eq!(form.fields(), &ApplicationFields::default());
    }

    #[test]
    fn test_reset_clears_fields_and_resume() {
        let mut form = filled_form();
        form.select_resume(pdf(10)).unwrap();

        form.reset();
        assert_eq!(form.fields(), &ApplicationFields::default());
        assert!(form.resume().is_none());
    }
}
