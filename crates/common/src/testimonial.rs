use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Published winner testimonial, keyed by `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub name: String,
    pub title: String,
    pub quote: String,
    pub income: String,

    /// Reference (direct URL) of the image held by object storage
    pub image: String,
}

impl Testimonial {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::BadRequest("Testimonial name is required".to_string()));
        }
        Ok(())
    }
}
