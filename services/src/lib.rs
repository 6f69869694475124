pub mod attendance_validation;
pub mod device_fingerprint;
pub mod eligibility;
pub mod error;
pub mod fraud;
pub mod location;
pub mod notification;
pub mod principal;
pub mod qr_token;

#[cfg(test)]
mod test_support;
