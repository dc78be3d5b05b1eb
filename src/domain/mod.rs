pub mod attachment;
pub mod license;
pub mod license_form;
pub mod license_id;
pub mod new_subscriber;
pub mod subscriber;
pub mod subscriber_email;
