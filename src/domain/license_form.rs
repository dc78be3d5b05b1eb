use crate::domain::attachment::Attachment;

pub const PHOTO_FIELD: &str = "photo";
pub const NID_COPY_FIELD: &str = "nidCopy";

/// License application ready to be stored.
#[derive(Debug)]
pub struct NewLicense {
    pub name: Option<String>,
    pub email: Option<String>,
    pub applicant_id: Option<String>,
    pub vehicle_no: Option<String>,
    pub chess_no: Option<String>,
    pub present_address: Option<String>,
    pub permanent_address: Option<String>,
    pub photo: Attachment,
    pub nid_copy: Attachment,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LicenseFormError {
    #[error("Missing required attachment(s): {}.", .0.join(", "))]
    MissingAttachments(Vec<&'static str>),
    #[error("The {0} field must be valid UTF-8 text.")]
    InvalidText(String),
}

/// Collects the parts of a multipart license application as they are read from the request.
///
/// Only the first part of every field is kept and unknown fields are ignored.
/// Attachments only count when they are uploaded as files.
#[derive(Debug, Default)]
pub struct LicenseForm {
    name: Option<String>,
    email: Option<String>,
    applicant_id: Option<String>,
    vehicle_no: Option<String>,
    chess_no: Option<String>,
    present_address: Option<String>,
    permanent_address: Option<String>,
    photo: Option<Attachment>,
    nid_copy: Option<Attachment>,
}

impl LicenseForm {
    /// Stores a part that carries a filename. Only `photo` and `nidCopy` files are kept.
    pub fn push_file(&mut self, field: &str, content: Vec<u8>) {
        match field {
            PHOTO_FIELD => keep_first(&mut self.photo, Attachment::new(content)),
            NID_COPY_FIELD => keep_first(&mut self.nid_copy, Attachment::new(content)),
            _ => {}
        }
    }

    /// Stores a plain form field. A text part named like an attachment is not an upload, so it
    /// is ignored and the attachment stays missing.
    pub fn push_text(&mut self, field: &str, content: Vec<u8>) -> Result<(), LicenseFormError> {
        let Some(slot) = self.text_slot(field) else {
            return Ok(());
        };
        let text =
            String::from_utf8(content).map_err(|_| LicenseFormError::InvalidText(field.into()))?;

        keep_first(slot, text);

        Ok(())
    }

    fn text_slot(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            "id" => Some(&mut self.applicant_id),
            "vehicleNo" => Some(&mut self.vehicle_no),
            "chessNo" => Some(&mut self.chess_no),
            "presentAddress" => Some(&mut self.present_address),
            "permanentAddress" => Some(&mut self.permanent_address),
            _ => None,
        }
    }

    pub fn finish(self) -> Result<NewLicense, LicenseFormError> {
        let (photo, nid_copy) = match (self.photo, self.nid_copy) {
            (Some(photo), Some(nid_copy)) => (photo, nid_copy),
            (photo, nid_copy) => {
                let mut missing = Vec::new();

                if photo.is_none() {
                    missing.push(PHOTO_FIELD);
                }
                if nid_copy.is_none() {
                    missing.push(NID_COPY_FIELD);
                }

                return Err(LicenseFormError::MissingAttachments(missing));
            }
        };

        Ok(NewLicense {
            name: self.name,
            email: self.email,
            applicant_id: self.applicant_id,
            vehicle_no: self.vehicle_no,
            chess_no: self.chess_no,
            present_address: self.present_address,
            permanent_address: self.permanent_address,
            photo,
            nid_copy,
        })
    }
}

fn keep_first<T>(slot: &mut Option<T>, value: T) {
    if slot.is_none() {
        *slot = Some(value);
    }
}
