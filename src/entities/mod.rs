//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod consultant;
pub mod consultation;
pub mod user;

// Re-export specific types to avoid conflicts
pub use consultant::{Column as ConsultantColumn, Entity as Consultant, Model as ConsultantModel};
pub use consultation::{
    Column as ConsultationColumn, Entity as Consultation, Model as ConsultationModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
