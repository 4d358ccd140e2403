//! Notation declarations.

/// A declared notation; at least one of the two identifiers is present.
#[derive(Debug, Clone)]
pub struct Notation {
    pub(crate) name: String,
    pub(crate) system_id: Option<String>,
    pub(crate) public_id: Option<String>,
}

impl Notation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }
}
