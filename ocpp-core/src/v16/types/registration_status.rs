/// Outcome of a BootNotification.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
pub enum RegistrationStatus {
    Accepted,
    Pending,
    Rejected,
}
