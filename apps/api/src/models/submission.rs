use serde::{Deserialize, Deserializer};

/// Submission fields exactly as they arrive on the wire, before validation.
///
/// Every shape the endpoint accepts (JSON, urlencoded, multipart) decodes into
/// this one struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSubmission {
    #[serde(deserialize_with = "scalar_text")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub contact_number: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub education: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub notice_period: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub linkedin_url: Option<String>,
    #[serde(rename = "currentCTC", deserialize_with = "scalar_text")]
    pub current_ctc: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub experience: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub portfolio_link: Option<String>,
}

/// Any JSON scalar a client might send for a text field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Flag(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Signed(n) => n.to_string(),
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

/// Numbers and booleans become their textual form; `null` is absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

impl RawSubmission {
    /// Assigns a multipart text part by its wire name. Returns `false` for
    /// names that are not submission fields.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "fullName" => &mut self.full_name,
            "contactNumber" => &mut self.contact_number,
            "education" => &mut self.education,
            "noticePeriod" => &mut self.notice_period,
            "email" => &mut self.email,
            "linkedinUrl" => &mut self.linkedin_url,
            "currentCTC" => &mut self.current_ctc,
            "experience" => &mut self.experience,
            "portfolioLink" => &mut self.portfolio_link,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A validated application. Required fields are trimmed and non-empty;
/// optional links are `None` rather than blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSubmission {
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub education: String,
    pub notice_period: String,
    pub linkedin_url: Option<String>,
    pub current_ctc: String,
    pub experience: String,
    pub portfolio_link: Option<String>,
}
