use uuid::Uuid;

/// Identifier assigned by the store to every license record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseId(Uuid);

impl LicenseId {
    pub fn generate() -> LicenseId {
        Self(Uuid::new_v4())
    }

    pub fn parse(id: String) -> Result<LicenseId, String> {
        match Uuid::parse_str(id.trim()) {
            Ok(uuid) => Ok(Self(uuid)),
            Err(err) => Err(format!("{} is not a valid license id: {}", id, err)),
        }
    }
}

impl AsRef<Uuid> for LicenseId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for LicenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
