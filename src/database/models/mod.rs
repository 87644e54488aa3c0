pub mod bulletin;
pub mod expense;
pub mod form_layout;
pub mod metric;
pub mod profile;
pub mod role;
pub mod team;

pub use bulletin::{BulletinReadReceipt, TeamBulletin};
pub use expense::LeadExpense;
pub use form_layout::{FormFieldPosition, FormSectionPosition};
pub use metric::DailyMetric;
pub use profile::{Language, Profile, ProfileUpdate};
pub use role::UserRoleRow;
pub use team::{Team, TeamMember, TeamRole};
