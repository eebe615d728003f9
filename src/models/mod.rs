pub mod events;
pub mod participants;
pub mod profiles;
pub mod status;
pub mod users;

pub use events::{EventRow, EventWithCountsRow};
pub use participants::{ParticipantDetailRow, ParticipantRow};
pub use profiles::{ProfileRow, ProfileWithUserRow};
pub use status::ReviewStatus;
pub use users::{RegistrationType, Role, UserRow};
