use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Raw content of an uploaded file. It is stored inline in the license record as base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment(Vec<u8>);

impl Attachment {
    pub fn new(bytes: Vec<u8>) -> Attachment {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64 (with padding) representation of the content.
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn decode(encoded: &str) -> Result<Attachment, base64::DecodeError> {
        STANDARD.decode(encoded).map(Self)
    }
}

impl AsRef<[u8]> for Attachment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
